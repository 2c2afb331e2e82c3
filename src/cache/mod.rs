//! Keyed query cache.
//!
//! Governs staleness windows, background refetch, deduplication of
//! concurrent identical reads, and explicit invalidation. See
//! [`query::QueryMap`] for the per-key state machine and [`store::QueryCache`]
//! for the typed per-kind maps.

mod keys;
mod lock;
mod query;
mod store;

pub use keys::{
    AUTHORS_STALE_AFTER, BOOKS_STALE_AFTER, CATEGORIES_STALE_AFTER, HEALTH_POLL_INTERVAL,
    HEALTH_STALE_AFTER, InvalidationScope, SEARCH_STALE_AFTER,
};
pub use query::{QueryMap, QuerySnapshot, QueryStatus};
pub use store::QueryCache;
