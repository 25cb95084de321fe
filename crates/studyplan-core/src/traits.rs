//! Collaborator trait definitions.
//!
//! The engine reads the backlog, per-learner outstanding state, and stored
//! plans through these traits. `studyplan-store` provides file-backed and
//! in-memory implementations.

use std::any::Any;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::model::{Item, LearnerId, OutstandingState, StoredPlan};

// ---------------------------------------------------------------------------
// Backlog and progress sources
// ---------------------------------------------------------------------------

/// Full read of the item backlog.
#[async_trait]
pub trait ItemSource: Send + Sync {
    /// Load every backlog item, in authoring order.
    async fn load_items(&self) -> anyhow::Result<Vec<Item>>;
}

/// Per-learner item statuses (the performance store).
#[async_trait]
pub trait OutstandingSource: Send + Sync {
    /// Returns `None` when the learner has no record at all.
    async fn outstanding(&self, learner: &LearnerId) -> anyhow::Result<Option<OutstandingState>>;
}

// ---------------------------------------------------------------------------
// Plan store
// ---------------------------------------------------------------------------

/// Held for the length of a learner's read-compute-write. Dropping it
/// releases the learner.
pub type LearnerLease = Box<dyn Any + Send + Sync>;

/// Whole-plan persistence keyed by learner.
#[async_trait]
pub trait PlanStore: Send + Sync {
    /// Every learner that currently has a stored plan.
    async fn learners(&self) -> anyhow::Result<Vec<LearnerId>>;

    async fn load_plan(&self, learner: &LearnerId) -> anyhow::Result<Option<StoredPlan>>;

    /// Replace the learner's stored plan with `plan`.
    async fn save_plan(&self, plan: &StoredPlan) -> anyhow::Result<()>;

    /// Exclusive access to `learner` across every process sharing the store.
    ///
    /// Stores only ever shared within one process return `None`; the
    /// scheduler's in-process locks already cover them.
    async fn lock_learner(&self, _learner: &LearnerId) -> anyhow::Result<Option<LearnerLease>> {
        Ok(None)
    }
}

// ---------------------------------------------------------------------------
// Clock
// ---------------------------------------------------------------------------

/// Source of "today".
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

/// The local calendar date.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        chrono::Local::now().date_naive()
    }
}

/// A clock pinned to a date, for tests and `--today` overrides.
#[derive(Debug)]
pub struct FixedClock {
    today: Mutex<NaiveDate>,
}

impl FixedClock {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            today: Mutex::new(today),
        }
    }

    pub fn set(&self, today: NaiveDate) {
        *self.today.lock().unwrap_or_else(|e| e.into_inner()) = today;
    }

    pub fn advance_days(&self, days: u64) {
        let mut today = self.today.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(next) = today.checked_add_days(chrono::Days::new(days)) {
            *today = next;
        }
    }
}

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        *self.today.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_clock_advances() {
        let clock = FixedClock::new(NaiveDate::from_ymd_opt(2026, 2, 27).unwrap());
        clock.advance_days(2);
        assert_eq!(clock.today(), NaiveDate::from_ymd_opt(2026, 3, 1).unwrap());
        clock.set(NaiveDate::from_ymd_opt(2030, 1, 1).unwrap());
        assert_eq!(clock.today(), NaiveDate::from_ymd_opt(2030, 1, 1).unwrap());
    }
}
