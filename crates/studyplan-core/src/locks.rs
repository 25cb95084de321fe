//! Per-learner mutual exclusion.
//!
//! A learner's read-outstanding → compute → write-plan sequence runs under
//! that learner's lock, so a request-path save and a periodic re-plan for
//! the same learner never interleave. Different learners never contend.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::model::LearnerId;
use crate::traits::LearnerLease;

/// A lock table keyed by learner id. Cloning shares the table.
#[derive(Debug, Clone, Default)]
pub struct LearnerLocks {
    table: Arc<Mutex<HashMap<LearnerId, Arc<AsyncMutex<()>>>>>,
}

impl LearnerLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `learner`. Released when the guard drops.
    pub async fn lock(&self, learner: &LearnerId) -> OwnedMutexGuard<()> {
        let slot = {
            let mut table = self.table.lock().unwrap_or_else(|e| e.into_inner());
            // Entries nobody holds or waits on can go.
            table.retain(|_, slot| Arc::strong_count(slot) > 1);
            Arc::clone(table.entry(learner.clone()).or_default())
        };
        slot.lock_owned().await
    }

    /// Number of learners with a lock currently held or awaited.
    pub fn active(&self) -> usize {
        let table = self.table.lock().unwrap_or_else(|e| e.into_inner());
        table
            .values()
            .filter(|slot| Arc::strong_count(slot) > 1)
            .count()
    }
}

/// Both halves of a learner's exclusion: the in-process lock and, for
/// stores shared between processes, the store's lease.
pub struct LearnerGuard {
    _local: OwnedMutexGuard<()>,
    _lease: Option<LearnerLease>,
}

impl LearnerGuard {
    pub(crate) fn new(local: OwnedMutexGuard<()>, lease: Option<LearnerLease>) -> Self {
        Self {
            _local: local,
            _lease: lease,
        }
    }
}
