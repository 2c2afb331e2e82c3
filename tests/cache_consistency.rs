#![deny(clippy::all, clippy::pedantic)]

//! End-to-end cache behavior: deduplication, mutation-driven invalidation,
//! failure isolation, and the health poller, against a mock HTTP server.

use std::sync::Arc;
use std::time::Duration;

use httpmock::MockServer;
use serde_json::json;
use tokio::time::sleep;
use url::Url;

use folio::cache::{QueryCache, QueryStatus};
use folio::client::{ApiClient, ApiError};
use folio::config::ApiSettings;
use folio::domain::{AuthorDraft, CategoryDraft, ListParams};
use folio::service::{CatalogService, Notification, RecordingNotifier};

fn harness(server: &MockServer) -> (CatalogService, Arc<RecordingNotifier>, Arc<QueryCache>) {
    let settings = ApiSettings {
        base_url: Url::parse(&server.base_url()).expect("mock url"),
        timeout: Duration::from_secs(5),
    };
    let client = Arc::new(ApiClient::new(&settings).expect("client should build"));
    let cache = Arc::new(QueryCache::new());
    let notifier = Arc::new(RecordingNotifier::new());
    let service = CatalogService::new(client, Arc::clone(&cache), notifier.clone());
    (service, notifier, cache)
}

fn book_json(id: i64) -> serde_json::Value {
    json!({
        "id": id,
        "title": "Dune",
        "price": 9.99,
        "stock_quantity": 3,
    })
}

fn author_json(id: i64) -> serde_json::Value {
    json!({
        "id": id,
        "name": "Frank Herbert",
        "email": "frank@example.com",
    })
}

/// Give spawned background revalidations time to run against the mock server.
async fn settle() {
    sleep(Duration::from_millis(100)).await;
}

#[tokio::test]
async fn concurrent_reads_share_one_request() {
    let server = MockServer::start();
    let books = server.mock(|when, then| {
        when.method("GET").path("/books/");
        then.status(200)
            .json_body(json!({"items": [book_json(1)], "total": 1}));
    });
    let (service, _, _) = harness(&server);

    let (a, b, c) = tokio::join!(
        service.books(ListParams::default()),
        service.books(ListParams::default()),
        service.books(ListParams::default()),
    );
    assert_eq!(a.expect("first read").total, 1);
    assert_eq!(b.expect("second read").total, 1);
    assert_eq!(c.expect("third read").total, 1);

    // A later read of the same fresh key is served from cache.
    service
        .books(ListParams::default())
        .await
        .expect("cached read");

    assert_eq!(books.hits(), 1);
}

#[tokio::test]
async fn deleting_an_author_refetches_authors_and_books() {
    let server = MockServer::start();
    let authors = server.mock(|when, then| {
        when.method("GET").path("/authors/");
        then.status(200)
            .json_body(json!({"items": [author_json(7)], "total": 1}));
    });
    let books = server.mock(|when, then| {
        when.method("GET").path("/books/");
        then.status(200)
            .json_body(json!({"items": [book_json(1)], "total": 1}));
    });
    server.mock(|when, then| {
        when.method("DELETE").path("/authors/7");
        then.status(200)
            .json_body(json!({"message": "Author deleted successfully"}));
    });
    let (service, notifier, _) = harness(&server);

    service.authors(ListParams::default()).await.expect("seed authors");
    service.books(ListParams::default()).await.expect("seed books");
    assert_eq!(authors.hits(), 1);
    assert_eq!(books.hits(), 1);

    service.delete_author(7).await.expect("delete author");
    assert_eq!(
        notifier.last(),
        Some(Notification::Success(
            "Author deleted successfully!".to_string()
        ))
    );

    // Book listings embed the author record, so both maps must refetch.
    service.authors(ListParams::default()).await.expect("reread authors");
    service.books(ListParams::default()).await.expect("reread books");
    settle().await;

    assert_eq!(authors.hits(), 2);
    assert_eq!(books.hits(), 2);
}

#[tokio::test]
async fn failed_stock_patch_leaves_cache_untouched() {
    let server = MockServer::start();
    let book = server.mock(|when, then| {
        when.method("GET").path("/books/3");
        then.status(200).json_body(book_json(3));
    });
    server.mock(|when, then| {
        when.method("PATCH").path("/books/3/stock");
        then.status(422)
            .json_body(json!({"detail": "Insufficient stock"}));
    });
    let (service, notifier, cache) = harness(&server);

    service.book(Some(3)).await.expect("seed book");

    let err = service.patch_book_stock(3, -50).await.unwrap_err();
    assert_eq!(
        err,
        ApiError::Validation {
            detail: "Insufficient stock".to_string()
        }
    );
    assert_eq!(
        notifier.last(),
        Some(Notification::Error("Insufficient stock".to_string()))
    );

    // Failure invalidates nothing; the cached record is still fresh.
    let snapshot = cache.books_by_id().snapshot(&3).expect("slot exists");
    assert_eq!(snapshot.status, QueryStatus::Success);
    assert!(!snapshot.is_stale);
    assert_eq!(snapshot.data.expect("cached book").stock_quantity, 3);

    service.book(Some(3)).await.expect("cached read");
    settle().await;
    assert_eq!(book.hits(), 1);
}

#[tokio::test]
async fn failed_create_does_not_invalidate_listings() {
    let server = MockServer::start();
    let authors = server.mock(|when, then| {
        when.method("GET").path("/authors/");
        then.status(200)
            .json_body(json!({"items": [author_json(7)], "total": 1}));
    });
    server.mock(|when, then| {
        when.method("POST").path("/authors/");
        then.status(422)
            .json_body(json!({"detail": "Email already registered"}));
    });
    let (service, notifier, _) = harness(&server);

    service.authors(ListParams::default()).await.expect("seed authors");

    let draft = AuthorDraft {
        name: "Frank Herbert".to_string(),
        email: "frank@example.com".to_string(),
        biography: None,
    };
    service.create_author(draft).await.unwrap_err();
    assert_eq!(
        notifier.last(),
        Some(Notification::Error("Email already registered".to_string()))
    );

    service.authors(ListParams::default()).await.expect("cached read");
    settle().await;
    assert_eq!(authors.hits(), 1);
}

#[tokio::test]
async fn successful_mutation_notifies_success() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method("POST").path("/categories/");
        then.status(201)
            .json_body(json!({"id": 2, "name": "Science Fiction"}));
    });
    let (service, notifier, _) = harness(&server);

    let draft = CategoryDraft {
        name: "Science Fiction".to_string(),
        description: None,
    };
    let category = service.create_category(draft).await.expect("create");

    assert_eq!(category.id, 2);
    assert_eq!(
        notifier.last(),
        Some(Notification::Success(
            "Category created successfully!".to_string()
        ))
    );
}

#[tokio::test]
async fn book_mutations_leave_search_results_cached() {
    let server = MockServer::start();
    let search = server.mock(|when, then| {
        when.method("GET")
            .path("/search/books/")
            .query_param("q", "dune");
        then.status(200).json_body(json!([book_json(1)]));
    });
    server.mock(|when, then| {
        when.method("DELETE").path("/books/1");
        then.status(200)
            .json_body(json!({"message": "Book deleted successfully"}));
    });
    let (service, _, _) = harness(&server);

    service.search("dune").await.expect("seed search");
    service.delete_book(1).await.expect("delete book");

    // Search results go stale by time, not by book mutations.
    service.search("dune").await.expect("cached search");
    settle().await;
    assert_eq!(search.hits(), 1);
}

#[tokio::test]
async fn consumer_gates_issue_no_requests() {
    let server = MockServer::start();
    let (service, _, _) = harness(&server);

    assert!(service.book(None).await.expect("gated read").is_none());
    assert!(service.search("").await.expect("gated search").is_none());
}

#[tokio::test]
async fn health_poller_refreshes_on_cadence() {
    let server = MockServer::start();
    let health = server.mock(|when, then| {
        when.method("GET").path("/health");
        then.status(200).json_body(json!({"status": "healthy"}));
    });
    let (service, _, cache) = harness(&server);

    let poller = service.spawn_health_poller_with(Duration::from_millis(50));
    sleep(Duration::from_millis(180)).await;
    poller.abort();

    assert!(health.hits() >= 2);
    let snapshot = cache.health().snapshot(&()).expect("slot exists");
    assert_eq!(snapshot.status, QueryStatus::Success);
    assert!(snapshot.data.expect("health data").is_healthy());
}
