use std::sync::{Mutex, MutexGuard};

use tracing::warn;

/// Lock a slot-table mutex, recovering from poisoning.
///
/// A panic while holding the lock leaves entries no worse than stale; the
/// next access refetches, so recovery is preferable to propagating the panic.
pub(crate) fn slots_lock<'a, T>(lock: &'a Mutex<T>, map: &'static str) -> MutexGuard<'a, T> {
    match lock.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            warn!(
                map,
                result = "poisoned_recovered",
                "Recovered from poisoned query cache lock"
            );
            poisoned.into_inner()
        }
    }
}
