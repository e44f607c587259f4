//! Keyed locks serializing rollup recomputation.
//!
//! Concurrent writes to the same (year, kind) pair must not interleave
//! their rollup passes: recomputation reads all level-3 rows and rewrites
//! the derived levels, so two interleaved passes can persist a stale
//! total. Writes to different (year, kind) pairs touch disjoint derived
//! rows and run in parallel.
//!
//! Only the recompute sequence is held under the lock; the level-3 write
//! itself relies on the (year_id, category_id) unique constraint.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use anggara_core::category::CategoryKind;

/// Per-(year, kind) mutex registry.
///
/// Lock entries are created on first use and kept for the process
/// lifetime; the key space is small (years x three kinds).
#[derive(Clone, Default)]
pub struct RollupLocks {
    locks: Arc<DashMap<(Uuid, CategoryKind), Arc<Mutex<()>>>>,
}

impl RollupLocks {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquires the lock for one (year, kind) pair, waiting if another
    /// rollup for the same pair is in flight.
    pub async fn acquire(&self, year_id: Uuid, kind: CategoryKind) -> OwnedMutexGuard<()> {
        let lock = self
            .locks
            .entry((year_id, kind))
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        lock.lock_owned().await
    }
}
