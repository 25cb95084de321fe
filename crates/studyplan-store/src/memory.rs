//! In-memory store for testing.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use studyplan_core::model::{Item, LearnerId, OutstandingState, StoredPlan};
use studyplan_core::traits::{ItemSource, OutstandingSource, PlanStore};

/// A store that keeps everything in memory and can be told to fail.
///
/// Implements all three collaborator traits, so one `Arc<MemoryStore>` can
/// back a whole `Scheduler`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    items: Mutex<Vec<Item>>,
    outstanding: Mutex<HashMap<LearnerId, OutstandingState>>,
    plans: Mutex<BTreeMap<LearnerId, StoredPlan>>,
    /// Learners whose outstanding-state reads fail.
    unavailable: Mutex<HashSet<LearnerId>>,
    backlog_down: AtomicBool,
    backlog_reads: AtomicU32,
    plan_saves: AtomicU32,
}

impl MemoryStore {
    pub fn new(items: Vec<Item>) -> Self {
        Self {
            items: Mutex::new(items),
            ..Default::default()
        }
    }

    pub fn set_items(&self, items: Vec<Item>) {
        *self.items.lock().unwrap() = items;
    }

    pub fn set_outstanding(&self, learner: impl Into<LearnerId>, state: OutstandingState) {
        self.outstanding.lock().unwrap().insert(learner.into(), state);
    }

    pub fn insert_plan(&self, plan: StoredPlan) {
        self.plans
            .lock()
            .unwrap()
            .insert(plan.learner_id.clone(), plan);
    }

    /// The stored plan for `learner`, if any.
    pub fn plan(&self, learner: &LearnerId) -> Option<StoredPlan> {
        self.plans.lock().unwrap().get(learner).cloned()
    }

    /// Make outstanding-state reads for `learner` fail.
    pub fn fail_outstanding_for(&self, learner: impl Into<LearnerId>) {
        self.unavailable.lock().unwrap().insert(learner.into());
    }

    /// Make every backlog read fail (or succeed again).
    pub fn set_backlog_down(&self, down: bool) {
        self.backlog_down.store(down, Ordering::Relaxed);
    }

    /// Number of backlog reads so far.
    pub fn backlog_reads(&self) -> u32 {
        self.backlog_reads.load(Ordering::Relaxed)
    }

    /// Number of plan saves so far.
    pub fn plan_saves(&self) -> u32 {
        self.plan_saves.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl ItemSource for MemoryStore {
    async fn load_items(&self) -> anyhow::Result<Vec<Item>> {
        self.backlog_reads.fetch_add(1, Ordering::Relaxed);
        if self.backlog_down.load(Ordering::Relaxed) {
            anyhow::bail!("backlog source is down");
        }
        Ok(self.items.lock().unwrap().clone())
    }
}

#[async_trait]
impl OutstandingSource for MemoryStore {
    async fn outstanding(&self, learner: &LearnerId) -> anyhow::Result<Option<OutstandingState>> {
        if self.unavailable.lock().unwrap().contains(learner) {
            anyhow::bail!("outstanding-state read for {learner} timed out");
        }
        Ok(self.outstanding.lock().unwrap().get(learner).cloned())
    }
}

#[async_trait]
impl PlanStore for MemoryStore {
    async fn learners(&self) -> anyhow::Result<Vec<LearnerId>> {
        Ok(self.plans.lock().unwrap().keys().cloned().collect())
    }

    async fn load_plan(&self, learner: &LearnerId) -> anyhow::Result<Option<StoredPlan>> {
        Ok(self.plan(learner))
    }

    async fn save_plan(&self, plan: &StoredPlan) -> anyhow::Result<()> {
        self.plan_saves.fetch_add(1, Ordering::Relaxed);
        self.insert_plan(plan.clone());
        Ok(())
    }
}
