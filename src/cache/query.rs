//! Generic keyed query engine.
//!
//! Each key owns a slot moving through `Idle -> Pending -> {Success, Error}`,
//! with `Success`/`Error` returning to `Pending` on refetch while the last
//! good data stays readable (stale-while-revalidate). Concurrent readers of
//! one key share a single in-flight load; a generation fence discards results
//! that were superseded by an invalidation while in flight.

use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use metrics::counter;
use tokio::time::Instant;
use tracing::debug;

use crate::client::ApiError;

use super::lock::slots_lock;

/// Monotonic counter identifying one started load within a map.
type Generation = u64;

/// One deduplicated load; cloned by every concurrent waiter.
type SharedLoad<V> = Shared<BoxFuture<'static, Result<Arc<V>, ApiError>>>;

/// Read-side lifecycle of a cache slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStatus {
    Idle,
    Pending,
    Success,
    Error,
}

/// Point-in-time view of a slot, for consumers that render cache state.
#[derive(Debug, Clone)]
pub struct QuerySnapshot<V> {
    pub status: QueryStatus,
    pub data: Option<Arc<V>>,
    pub error: Option<ApiError>,
    pub is_stale: bool,
}

struct Slot<V> {
    status: QueryStatus,
    data: Option<Arc<V>>,
    error: Option<ApiError>,
    fetched_at: Option<Instant>,
    invalidated: bool,
    inflight: Option<(Generation, SharedLoad<V>)>,
    /// Results from generations below this watermark are never applied.
    discard_below: Generation,
}

impl<V> Slot<V> {
    fn idle() -> Self {
        Self {
            status: QueryStatus::Idle,
            data: None,
            error: None,
            fetched_at: None,
            invalidated: false,
            inflight: None,
            discard_below: 0,
        }
    }

    fn is_stale(&self, window: Duration) -> bool {
        self.invalidated || self.fetched_at.is_none_or(|at| at.elapsed() >= window)
    }

    /// Recompute `status` from held data after a load was discarded.
    fn settle(&mut self) {
        self.status = if self.data.is_some() {
            QueryStatus::Success
        } else if self.error.is_some() {
            QueryStatus::Error
        } else {
            QueryStatus::Idle
        };
    }

    fn fence(&mut self) {
        self.invalidated = true;
        if let Some((generation, _)) = &self.inflight {
            self.discard_below = generation + 1;
        }
    }
}

struct Inner<K, V> {
    name: &'static str,
    stale_after: Duration,
    slots: Mutex<HashMap<K, Slot<V>>>,
    generations: AtomicU64,
}

/// A keyed map of cached query results with one staleness window.
pub struct QueryMap<K, V> {
    inner: Arc<Inner<K, V>>,
}

impl<K, V> Clone for QueryMap<K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

enum Plan<V> {
    /// Fresh data, no network call.
    Hit(Arc<V>),
    /// Stale data returned now; a revalidation runs in the background.
    StaleHit(Arc<V>),
    /// No usable data; the caller awaits the (possibly shared) load.
    Await(SharedLoad<V>),
}

impl<K, V> QueryMap<K, V>
where
    K: Eq + Hash + Clone + Send + 'static,
    V: Send + Sync + 'static,
{
    pub fn new(name: &'static str, stale_after: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                name,
                stale_after,
                slots: Mutex::new(HashMap::new()),
                generations: AtomicU64::new(0),
            }),
        }
    }

    pub fn stale_after(&self) -> Duration {
        self.inner.stale_after
    }

    /// Read through the cache.
    ///
    /// `load` is invoked only when a network call is actually needed; at most
    /// one load is in flight per key, and every concurrent caller resolves
    /// from its single outcome. A stale slot returns its previous data
    /// immediately while a deduplicated revalidation runs in the background.
    pub async fn fetch<F, Fut>(&self, key: K, load: F) -> Result<Arc<V>, ApiError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, ApiError>> + Send + 'static,
    {
        let plan = {
            let mut slots = slots_lock(&self.inner.slots, self.inner.name);
            let slot = slots.entry(key.clone()).or_insert_with(Slot::idle);

            if let Some((_, shared)) = &slot.inflight {
                match &slot.data {
                    Some(data) => {
                        counter!("folio_query_hit_total", "map" => self.inner.name).increment(1);
                        Plan::StaleHit(data.clone())
                    }
                    None => Plan::Await(shared.clone()),
                }
            } else if let Some(data) = slot.data.clone() {
                if slot.status == QueryStatus::Success && !slot.is_stale(self.inner.stale_after) {
                    counter!("folio_query_hit_total", "map" => self.inner.name).increment(1);
                    Plan::Hit(data)
                } else {
                    counter!("folio_query_stale_hit_total", "map" => self.inner.name).increment(1);
                    Self::begin_load(&self.inner, slot, key, load);
                    Plan::StaleHit(data)
                }
            } else {
                counter!("folio_query_miss_total", "map" => self.inner.name).increment(1);
                Plan::Await(Self::begin_load(&self.inner, slot, key, load))
            }
        };

        match plan {
            Plan::Hit(data) | Plan::StaleHit(data) => Ok(data),
            Plan::Await(shared) => shared.await,
        }
    }

    /// Force a load and await its outcome, joining any in-flight load.
    ///
    /// Used by pollers and manual refresh; freshness is not consulted.
    pub async fn refresh<F, Fut>(&self, key: K, load: F) -> Result<Arc<V>, ApiError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, ApiError>> + Send + 'static,
    {
        let shared = {
            let mut slots = slots_lock(&self.inner.slots, self.inner.name);
            let slot = slots.entry(key.clone()).or_insert_with(Slot::idle);
            match &slot.inflight {
                Some((_, shared)) => shared.clone(),
                None => Self::begin_load(&self.inner, slot, key, load),
            }
        };
        shared.await
    }

    /// Mark one slot stale; the next access forces a refetch.
    ///
    /// A load already in flight for the slot is fenced off: its result is
    /// still delivered to waiters but never cached.
    pub fn invalidate_key(&self, key: &K) {
        let mut slots = slots_lock(&self.inner.slots, self.inner.name);
        if let Some(slot) = slots.get_mut(key) {
            slot.fence();
        }
    }

    /// Mark every slot in the map stale.
    pub fn invalidate_all(&self) {
        let mut slots = slots_lock(&self.inner.slots, self.inner.name);
        for slot in slots.values_mut() {
            slot.fence();
        }
    }

    pub fn snapshot(&self, key: &K) -> Option<QuerySnapshot<V>> {
        let slots = slots_lock(&self.inner.slots, self.inner.name);
        slots.get(key).map(|slot| QuerySnapshot {
            status: slot.status,
            data: slot.data.clone(),
            error: slot.error.clone(),
            is_stale: slot.is_stale(self.inner.stale_after),
        })
    }

    /// Drop every slot. In-flight loads complete but their results are
    /// applied to nothing.
    pub fn clear(&self) {
        slots_lock(&self.inner.slots, self.inner.name).clear();
    }

    pub fn len(&self) -> usize {
        slots_lock(&self.inner.slots, self.inner.name).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn begin_load<F, Fut>(
        inner: &Arc<Inner<K, V>>,
        slot: &mut Slot<V>,
        key: K,
        load: F,
    ) -> SharedLoad<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, ApiError>> + Send + 'static,
    {
        let generation = inner.generations.fetch_add(1, Ordering::SeqCst) + 1;
        let fut = load();
        let apply_to = Arc::clone(inner);

        let shared = async move {
            let result = fut.await.map(Arc::new);
            apply_to.apply(&key, generation, result.clone());
            result
        }
        .boxed()
        .shared();

        slot.status = QueryStatus::Pending;
        slot.inflight = Some((generation, shared.clone()));

        // Drive the load to completion even if every waiter is dropped;
        // the outcome still lands in the shared cache.
        tokio::spawn(shared.clone().map(|_| ()));

        shared
    }
}

impl<K, V> Inner<K, V>
where
    K: Eq + Hash,
{
    fn apply(&self, key: &K, generation: Generation, result: Result<Arc<V>, ApiError>) {
        let mut slots = slots_lock(&self.slots, self.name);
        let Some(slot) = slots.get_mut(key) else {
            return;
        };

        if matches!(&slot.inflight, Some((current, _)) if *current == generation) {
            slot.inflight = None;
        }

        if generation < slot.discard_below {
            counter!("folio_query_discarded_total", "map" => self.name).increment(1);
            debug!(map = self.name, generation, "discarded superseded load result");
            slot.settle();
            return;
        }

        match result {
            Ok(data) => {
                slot.status = QueryStatus::Success;
                slot.data = Some(data);
                slot.error = None;
                slot.fetched_at = Some(Instant::now());
                slot.invalidated = false;
            }
            Err(err) => {
                slot.status = QueryStatus::Error;
                slot.data = None;
                slot.error = Some(err);
                slot.fetched_at = None;
            }
        }
    }
}
