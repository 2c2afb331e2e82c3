//! Catalog service: cached reads and cache-invalidating mutations.
//!
//! Reads go through the [`QueryCache`]; mutations call the API directly and,
//! on success, invalidate exactly the scope set listed for that mutation
//! before emitting a success notification. On failure the cache is left
//! untouched and an error notification carries the server's detail message
//! when one exists. The scope sets are deliberate cache-consistency design:
//! author and category deletions also invalidate book listings, because book
//! listings embed author and category records.

mod notify;

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::warn;

use crate::cache::{HEALTH_POLL_INTERVAL, InvalidationScope, QueryCache};
use crate::client::{ApiClient, ApiError};
use crate::domain::{
    Author, AuthorDraft, AuthorPatch, Book, BookDraft, BookPatch, Category, CategoryDraft,
    CategoryPatch, Health, ListParams, Page,
};

pub use notify::{LogNotifier, Notification, Notifier, RecordingNotifier};

pub struct CatalogService {
    client: Arc<ApiClient>,
    cache: Arc<QueryCache>,
    notifier: Arc<dyn Notifier>,
}

impl CatalogService {
    pub fn new(client: Arc<ApiClient>, cache: Arc<QueryCache>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            client,
            cache,
            notifier,
        }
    }

    pub fn cache(&self) -> &Arc<QueryCache> {
        &self.cache
    }

    // ========================================================================
    // Reads
    // ========================================================================

    pub async fn books(&self, params: ListParams) -> Result<Arc<Page<Book>>, ApiError> {
        let client = Arc::clone(&self.client);
        let query = params.clone();
        self.cache
            .book_lists()
            .fetch(params, move || async move { client.list_books(&query).await })
            .await
    }

    /// Fetch one book. `None` ids issue no network call.
    pub async fn book(&self, id: Option<i64>) -> Result<Option<Arc<Book>>, ApiError> {
        let Some(id) = id else {
            return Ok(None);
        };
        let client = Arc::clone(&self.client);
        self.cache
            .books_by_id()
            .fetch(id, move || async move { client.get_book(id).await })
            .await
            .map(Some)
    }

    pub async fn authors(&self, params: ListParams) -> Result<Arc<Page<Author>>, ApiError> {
        let client = Arc::clone(&self.client);
        let query = params.clone();
        self.cache
            .author_lists()
            .fetch(params, move || async move { client.list_authors(&query).await })
            .await
    }

    pub async fn author(&self, id: Option<i64>) -> Result<Option<Arc<Author>>, ApiError> {
        let Some(id) = id else {
            return Ok(None);
        };
        let client = Arc::clone(&self.client);
        self.cache
            .authors_by_id()
            .fetch(id, move || async move { client.get_author(id).await })
            .await
            .map(Some)
    }

    pub async fn categories(&self, params: ListParams) -> Result<Arc<Page<Category>>, ApiError> {
        let client = Arc::clone(&self.client);
        let query = params.clone();
        self.cache
            .category_lists()
            .fetch(params, move || async move {
                client.list_categories(&query).await
            })
            .await
    }

    pub async fn category(&self, id: Option<i64>) -> Result<Option<Arc<Category>>, ApiError> {
        let Some(id) = id else {
            return Ok(None);
        };
        let client = Arc::clone(&self.client);
        self.cache
            .categories_by_id()
            .fetch(id, move || async move { client.get_category(id).await })
            .await
            .map(Some)
    }

    /// Free-text book search. Empty queries issue no network call.
    pub async fn search(&self, query: &str) -> Result<Option<Arc<Vec<Book>>>, ApiError> {
        if query.is_empty() {
            return Ok(None);
        }
        let client = Arc::clone(&self.client);
        let text = query.to_string();
        self.cache
            .search_results()
            .fetch(query.to_string(), move || async move {
                client.search_books(&text).await
            })
            .await
            .map(Some)
    }

    pub async fn health(&self) -> Result<Arc<Health>, ApiError> {
        let client = Arc::clone(&self.client);
        self.cache
            .health()
            .fetch((), move || async move { client.health().await })
            .await
    }

    /// Poll the health endpoint on a fixed cadence, independent of consumer
    /// activity. Returns the task handle so callers can stop it on shutdown.
    pub fn spawn_health_poller(&self) -> JoinHandle<()> {
        self.spawn_health_poller_with(HEALTH_POLL_INTERVAL)
    }

    pub fn spawn_health_poller_with(&self, cadence: Duration) -> JoinHandle<()> {
        let client = Arc::clone(&self.client);
        let cache = Arc::clone(&self.cache);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(cadence);
            interval.tick().await; // Skip the first immediate tick
            loop {
                interval.tick().await;
                let client = Arc::clone(&client);
                let outcome = cache
                    .health()
                    .refresh((), move || async move { client.health().await })
                    .await;
                if let Err(err) = outcome {
                    warn!(error = %err, "health poll failed");
                }
            }
        })
    }

    // ========================================================================
    // Book mutations
    // ========================================================================

    pub async fn create_book(&self, draft: BookDraft) -> Result<Book, ApiError> {
        match self.client.create_book(&draft).await {
            Ok(book) => {
                self.on_success(&[InvalidationScope::Books], "Book created successfully!");
                Ok(book)
            }
            Err(err) => self.on_error(err, "Failed to create book"),
        }
    }

    pub async fn update_book(&self, id: i64, patch: BookPatch) -> Result<Book, ApiError> {
        match self.client.update_book(id, &patch).await {
            Ok(book) => {
                self.on_success(
                    &[InvalidationScope::Books, InvalidationScope::Book(id)],
                    "Book updated successfully!",
                );
                Ok(book)
            }
            Err(err) => self.on_error(err, "Failed to update book"),
        }
    }

    pub async fn delete_book(&self, id: i64) -> Result<(), ApiError> {
        match self.client.delete_book(id).await {
            Ok(()) => {
                self.on_success(
                    &[InvalidationScope::Books, InvalidationScope::Book(id)],
                    "Book deleted successfully!",
                );
                Ok(())
            }
            Err(err) => self.on_error(err, "Failed to delete book"),
        }
    }

    pub async fn patch_book_stock(&self, id: i64, quantity_change: i64) -> Result<Book, ApiError> {
        match self.client.patch_book_stock(id, quantity_change).await {
            Ok(book) => {
                self.on_success(
                    &[InvalidationScope::Books, InvalidationScope::Book(id)],
                    "Stock updated successfully!",
                );
                Ok(book)
            }
            Err(err) => self.on_error(err, "Failed to update stock"),
        }
    }

    // ========================================================================
    // Author mutations
    // ========================================================================

    pub async fn create_author(&self, draft: AuthorDraft) -> Result<Author, ApiError> {
        match self.client.create_author(&draft).await {
            Ok(author) => {
                self.on_success(&[InvalidationScope::Authors], "Author created successfully!");
                Ok(author)
            }
            Err(err) => self.on_error(err, "Failed to create author"),
        }
    }

    pub async fn update_author(&self, id: i64, patch: AuthorPatch) -> Result<Author, ApiError> {
        match self.client.update_author(id, &patch).await {
            Ok(author) => {
                self.on_success(
                    &[InvalidationScope::Authors, InvalidationScope::Author(id)],
                    "Author updated successfully!",
                );
                Ok(author)
            }
            Err(err) => self.on_error(err, "Failed to update author"),
        }
    }

    /// Deleting an author also invalidates book listings, which embed the
    /// author record.
    pub async fn delete_author(&self, id: i64) -> Result<(), ApiError> {
        match self.client.delete_author(id).await {
            Ok(()) => {
                self.on_success(
                    &[
                        InvalidationScope::Authors,
                        InvalidationScope::Author(id),
                        InvalidationScope::Books,
                    ],
                    "Author deleted successfully!",
                );
                Ok(())
            }
            Err(err) => self.on_error(err, "Failed to delete author"),
        }
    }

    // ========================================================================
    // Category mutations
    // ========================================================================

    pub async fn create_category(&self, draft: CategoryDraft) -> Result<Category, ApiError> {
        match self.client.create_category(&draft).await {
            Ok(category) => {
                self.on_success(
                    &[InvalidationScope::Categories],
                    "Category created successfully!",
                );
                Ok(category)
            }
            Err(err) => self.on_error(err, "Failed to create category"),
        }
    }

    pub async fn update_category(&self, id: i64, patch: CategoryPatch) -> Result<Category, ApiError> {
        match self.client.update_category(id, &patch).await {
            Ok(category) => {
                self.on_success(
                    &[
                        InvalidationScope::Categories,
                        InvalidationScope::Category(id),
                    ],
                    "Category updated successfully!",
                );
                Ok(category)
            }
            Err(err) => self.on_error(err, "Failed to update category"),
        }
    }

    /// Deleting a category also invalidates book listings, which embed
    /// category records.
    pub async fn delete_category(&self, id: i64) -> Result<(), ApiError> {
        match self.client.delete_category(id).await {
            Ok(()) => {
                self.on_success(
                    &[
                        InvalidationScope::Categories,
                        InvalidationScope::Category(id),
                        InvalidationScope::Books,
                    ],
                    "Category deleted successfully!",
                );
                Ok(())
            }
            Err(err) => self.on_error(err, "Failed to delete category"),
        }
    }

    // ========================================================================
    // Mutation outcome plumbing
    // ========================================================================

    fn on_success(&self, scopes: &[InvalidationScope], message: &str) {
        self.cache.invalidate_scopes(scopes);
        self.notifier.notify_success(message);
    }

    fn on_error<T>(&self, err: ApiError, fallback: &str) -> Result<T, ApiError> {
        let message = err.detail().unwrap_or(fallback);
        self.notifier.notify_error(message);
        Err(err)
    }
}
