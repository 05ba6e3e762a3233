use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Per-room mutual-exclusion registry.
///
/// The room store is a plain load/mutate/save document store with no
/// transactional isolation, so every mutating operation must hold its room's
/// lock across the whole read-modify-write span. This serializes concurrent
/// joins, starts, submissions, and leaves per room code while leaving
/// unrelated rooms fully parallel.
#[derive(Default)]
pub struct RoomLocks {
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl RoomLocks {
    /// Create an empty lock registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the lock for a room code, creating it on first use.
    ///
    /// The guard owns the underlying mutex so it can be held across await
    /// points for the duration of a load-mutate-save sequence.
    pub async fn acquire(&self, code: &str) -> OwnedMutexGuard<()> {
        // Clone the Arc before awaiting so the map shard is not held locked.
        let lock = self
            .locks
            .entry(code.to_owned())
            .or_default()
            .value()
            .clone();
        lock.lock_owned().await
    }
}
