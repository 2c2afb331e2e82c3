//! Process-wide query cache: one typed [`QueryMap`] per resource kind.

use metrics::counter;
use tracing::debug;

use crate::domain::{Author, Book, Category, Health, ListParams, Page};

use super::keys::{
    AUTHORS_STALE_AFTER, BOOKS_STALE_AFTER, CATEGORIES_STALE_AFTER, HEALTH_STALE_AFTER,
    InvalidationScope, SEARCH_STALE_AFTER,
};
use super::query::QueryMap;

/// The keyed cache of in-flight and completed reads.
///
/// Constructed once per process and shared by `Arc`; there is no ambient
/// singleton. Entries are unbounded; [`QueryCache::clear`] exists for
/// process-level resets.
pub struct QueryCache {
    book_lists: QueryMap<ListParams, Page<Book>>,
    books_by_id: QueryMap<i64, Book>,
    author_lists: QueryMap<ListParams, Page<Author>>,
    authors_by_id: QueryMap<i64, Author>,
    category_lists: QueryMap<ListParams, Page<Category>>,
    categories_by_id: QueryMap<i64, Category>,
    search_results: QueryMap<String, Vec<Book>>,
    health: QueryMap<(), Health>,
}

impl QueryCache {
    pub fn new() -> Self {
        Self {
            book_lists: QueryMap::new("book_lists", BOOKS_STALE_AFTER),
            books_by_id: QueryMap::new("books_by_id", BOOKS_STALE_AFTER),
            author_lists: QueryMap::new("author_lists", AUTHORS_STALE_AFTER),
            authors_by_id: QueryMap::new("authors_by_id", AUTHORS_STALE_AFTER),
            category_lists: QueryMap::new("category_lists", CATEGORIES_STALE_AFTER),
            categories_by_id: QueryMap::new("categories_by_id", CATEGORIES_STALE_AFTER),
            search_results: QueryMap::new("search_results", SEARCH_STALE_AFTER),
            health: QueryMap::new("health", HEALTH_STALE_AFTER),
        }
    }

    pub fn book_lists(&self) -> &QueryMap<ListParams, Page<Book>> {
        &self.book_lists
    }

    pub fn books_by_id(&self) -> &QueryMap<i64, Book> {
        &self.books_by_id
    }

    pub fn author_lists(&self) -> &QueryMap<ListParams, Page<Author>> {
        &self.author_lists
    }

    pub fn authors_by_id(&self) -> &QueryMap<i64, Author> {
        &self.authors_by_id
    }

    pub fn category_lists(&self) -> &QueryMap<ListParams, Page<Category>> {
        &self.category_lists
    }

    pub fn categories_by_id(&self) -> &QueryMap<i64, Category> {
        &self.categories_by_id
    }

    pub fn search_results(&self) -> &QueryMap<String, Vec<Book>> {
        &self.search_results
    }

    pub fn health(&self) -> &QueryMap<(), Health> {
        &self.health
    }

    /// Mark every entry covered by `scope` stale.
    pub fn invalidate(&self, scope: InvalidationScope) {
        counter!("folio_cache_invalidation_total", "scope" => scope.kind()).increment(1);
        debug!(scope = ?scope, "cache invalidation");

        match scope {
            InvalidationScope::Books => self.book_lists.invalidate_all(),
            InvalidationScope::Book(id) => self.books_by_id.invalidate_key(&id),
            InvalidationScope::Authors => self.author_lists.invalidate_all(),
            InvalidationScope::Author(id) => self.authors_by_id.invalidate_key(&id),
            InvalidationScope::Categories => self.category_lists.invalidate_all(),
            InvalidationScope::Category(id) => self.categories_by_id.invalidate_key(&id),
        }
    }

    /// Apply a mutation's full scope set in order.
    pub fn invalidate_scopes(&self, scopes: &[InvalidationScope]) {
        for scope in scopes {
            self.invalidate(*scope);
        }
    }

    /// Drop all cached data.
    pub fn clear(&self) {
        self.book_lists.clear();
        self.books_by_id.clear();
        self.author_lists.clear();
        self.authors_by_id.clear();
        self.category_lists.clear();
        self.categories_by_id.clear();
        self.search_results.clear();
        self.health.clear();
    }
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ApiError;

    fn sample_book(id: i64) -> Book {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "title": "Test Book",
            "price": 9.99,
            "stock_quantity": 3,
        }))
        .expect("sample book")
    }

    fn sample_author(id: i64) -> Author {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "name": "Test Author",
            "email": "author@example.com",
        }))
        .expect("sample author")
    }

    async fn seed(cache: &QueryCache) {
        cache
            .book_lists()
            .fetch(ListParams::default(), || async {
                Ok(Page {
                    items: vec![sample_book(1)],
                    total: 1,
                })
            })
            .await
            .expect("seed book list");
        cache
            .books_by_id()
            .fetch(1, || async { Ok(sample_book(1)) })
            .await
            .expect("seed book");
        cache
            .author_lists()
            .fetch(ListParams::default(), || async {
                Ok(Page {
                    items: vec![sample_author(7)],
                    total: 1,
                })
            })
            .await
            .expect("seed author list");
        cache
            .search_results()
            .fetch("dune".to_string(), || async {
                Ok::<_, ApiError>(vec![sample_book(1)])
            })
            .await
            .expect("seed search");
    }

    #[tokio::test(start_paused = true)]
    async fn books_scope_hits_lists_but_not_ids() {
        let cache = QueryCache::new();
        seed(&cache).await;

        cache.invalidate(InvalidationScope::Books);

        assert!(cache.book_lists().snapshot(&ListParams::default()).unwrap().is_stale);
        assert!(!cache.books_by_id().snapshot(&1).unwrap().is_stale);
    }

    #[tokio::test(start_paused = true)]
    async fn book_id_scope_hits_one_entry() {
        let cache = QueryCache::new();
        seed(&cache).await;

        cache.invalidate(InvalidationScope::Book(1));

        assert!(cache.books_by_id().snapshot(&1).unwrap().is_stale);
        assert!(!cache.book_lists().snapshot(&ListParams::default()).unwrap().is_stale);
    }

    #[tokio::test(start_paused = true)]
    async fn book_scopes_leave_search_results_alone() {
        let cache = QueryCache::new();
        seed(&cache).await;

        cache.invalidate_scopes(&[InvalidationScope::Books, InvalidationScope::Book(1)]);

        assert!(!cache.search_results().snapshot(&"dune".to_string()).unwrap().is_stale);
    }

    #[tokio::test(start_paused = true)]
    async fn author_delete_scope_set_reaches_books() {
        let cache = QueryCache::new();
        seed(&cache).await;

        // The scope set a delete-author mutation applies.
        cache.invalidate_scopes(&[
            InvalidationScope::Authors,
            InvalidationScope::Author(7),
            InvalidationScope::Books,
        ]);

        assert!(cache.author_lists().snapshot(&ListParams::default()).unwrap().is_stale);
        assert!(cache.book_lists().snapshot(&ListParams::default()).unwrap().is_stale);
    }

    #[tokio::test(start_paused = true)]
    async fn clear_drops_everything() {
        let cache = QueryCache::new();
        seed(&cache).await;

        cache.clear();

        assert!(cache.book_lists().is_empty());
        assert!(cache.books_by_id().is_empty());
        assert!(cache.author_lists().is_empty());
        assert!(cache.search_results().is_empty());
    }
}
