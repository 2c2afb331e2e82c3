//! Invalidation scopes and per-kind staleness windows.

use std::time::Duration;

/// Book and search listings churn faster than author/category records, so
/// they get a shorter window. Health is near-realtime.
pub const BOOKS_STALE_AFTER: Duration = Duration::from_secs(5 * 60);
pub const AUTHORS_STALE_AFTER: Duration = Duration::from_secs(10 * 60);
pub const CATEGORIES_STALE_AFTER: Duration = Duration::from_secs(10 * 60);
pub const SEARCH_STALE_AFTER: Duration = Duration::from_secs(5 * 60);
pub const HEALTH_STALE_AFTER: Duration = Duration::from_secs(10);

/// Cadence of the background health poll, independent of consumer activity.
pub const HEALTH_POLL_INTERVAL: Duration = Duration::from_secs(30);

/// A set of cache entries affected by a mutation.
///
/// `Books`/`Authors`/`Categories` cover every list entry of that kind;
/// the id-carrying variants cover a single fetched-by-id entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InvalidationScope {
    Books,
    Book(i64),
    Authors,
    Author(i64),
    Categories,
    Category(i64),
}

impl InvalidationScope {
    /// Stable label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Books => "books",
            Self::Book(_) => "book",
            Self::Authors => "authors",
            Self::Author(_) => "author",
            Self::Categories => "categories",
            Self::Category(_) => "category",
        }
    }
}
