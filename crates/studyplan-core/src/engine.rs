//! The planning pipeline and the request-path scheduler.
//!
//! A plan request flows proficiency filter → ranker → topic partitioner →
//! day allocator. [`build_schedule`] is the pure form; [`Scheduler`] wires
//! it to the backlog, outstanding-state, plan-store and clock collaborators.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::allocator::{allocate, Schedule};
use crate::error::PlanError;
use crate::filter::filter_by_proficiency;
use crate::locks::{LearnerGuard, LearnerLocks};
use crate::model::{
    DifficultyWeights, Item, LearnerId, OutstandingState, ProficiencyMap, StoredPlan, TimeTable,
};
use crate::partition::partition;
use crate::ranker::rank;
use crate::traits::{Clock, ItemSource, OutstandingSource, PlanStore};

/// Lookup tables the pipeline runs with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannerConfig {
    /// Minutes allocated per difficulty.
    #[serde(default)]
    pub minutes: TimeTable,
    /// Ranking weight per difficulty.
    #[serde(default)]
    pub weights: DifficultyWeights,
}

/// Inputs of one `GenerateSchedule` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleRequest {
    #[serde(default)]
    pub proficiency: ProficiencyMap,
    pub daily_budget_minutes: u32,
    pub horizon_end: NaiveDate,
    #[serde(default)]
    pub outstanding: OutstandingState,
}

/// Run filter → rank → partition → allocate over `items`.
///
/// Input is validated before anything is allocated: the budget must be
/// positive, the horizon must not end before `today`, and every item that
/// survives filtering must have a positive time estimate. Repeated item ids
/// keep only their first occurrence.
pub fn plan_items(
    items: Vec<Item>,
    proficiency: &ProficiencyMap,
    daily_budget_minutes: u32,
    today: NaiveDate,
    horizon_end: NaiveDate,
    config: &PlannerConfig,
) -> Result<Schedule, PlanError> {
    if daily_budget_minutes == 0 {
        return Err(PlanError::InvalidBudget(daily_budget_minutes));
    }
    if horizon_end < today {
        return Err(PlanError::HorizonBeforeToday { today, horizon_end });
    }

    let total = items.len();
    let filtered = filter_by_proficiency(dedup_by_id(items), proficiency);
    if let Some(item) = filtered
        .iter()
        .find(|item| config.minutes.minutes_for(item.difficulty) == 0)
    {
        return Err(PlanError::NonPositiveEstimate {
            item_id: item.id.clone(),
        });
    }

    let ranked = rank(filtered, &config.weights);
    let queues = partition(ranked);
    tracing::debug!(
        total,
        eligible = queues.iter().map(|q| q.len()).sum::<usize>(),
        topics = queues.len(),
        "planning"
    );

    Ok(allocate(
        queues,
        daily_budget_minutes,
        today,
        horizon_end,
        &config.minutes,
    ))
}

/// Plan the backlog for a learner, skipping items they completed or skipped.
pub fn build_schedule(
    backlog: Vec<Item>,
    request: &ScheduleRequest,
    today: NaiveDate,
    config: &PlannerConfig,
) -> Result<Schedule, PlanError> {
    let open: Vec<Item> = backlog
        .into_iter()
        .filter(|item| !request.outstanding.is_resolved(&item.id))
        .collect();

    plan_items(
        open,
        &request.proficiency,
        request.daily_budget_minutes,
        today,
        request.horizon_end,
        config,
    )
}

/// Drop every item whose id was already seen, keeping backlog order.
pub fn dedup_by_id(items: Vec<Item>) -> Vec<Item> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| {
            let first = seen.insert(item.id.clone());
            if !first {
                tracing::warn!(
                    item = %item.id,
                    topic = %item.topic,
                    "duplicate item id; keeping the first"
                );
            }
            first
        })
        .collect()
}

/// The collaborators a scheduler talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub items: Arc<dyn ItemSource>,
    pub outstanding: Arc<dyn OutstandingSource>,
    pub plans: Arc<dyn PlanStore>,
    pub clock: Arc<dyn Clock>,
}

/// Request-path entry point. Cloning shares collaborators and locks.
#[derive(Clone)]
pub struct Scheduler {
    collaborators: Collaborators,
    locks: LearnerLocks,
    config: PlannerConfig,
}

impl Scheduler {
    pub fn new(collaborators: Collaborators, config: PlannerConfig) -> Self {
        Self {
            collaborators,
            locks: LearnerLocks::new(),
            config,
        }
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    pub fn collaborators(&self) -> &Collaborators {
        &self.collaborators
    }

    pub fn locks(&self) -> &LearnerLocks {
        &self.locks
    }

    pub fn today(&self) -> NaiveDate {
        self.collaborators.clock.today()
    }

    /// Exclusive access to `learner`: the in-process lock first, then the
    /// plan store's cross-process lease.
    pub async fn lock_learner(&self, learner: &LearnerId) -> Result<LearnerGuard, PlanError> {
        let local = self.locks.lock(learner).await;
        let lease = self
            .collaborators
            .plans
            .lock_learner(learner)
            .await
            .map_err(|e| PlanError::collaborator("plan store", Some(learner), e))?;
        Ok(LearnerGuard::new(local, lease))
    }

    /// Load the full backlog.
    pub async fn backlog(&self) -> Result<Vec<Item>, PlanError> {
        self.collaborators
            .items
            .load_items()
            .await
            .map_err(|e| PlanError::collaborator("backlog", None, e))
    }

    /// The learner's outstanding state. A learner with no record yet is
    /// treated as having resolved nothing.
    pub async fn outstanding_for(&self, learner: &LearnerId) -> Result<OutstandingState, PlanError> {
        self.collaborators
            .outstanding
            .outstanding(learner)
            .await
            .map(Option::unwrap_or_default)
            .map_err(|e| PlanError::collaborator("outstanding-state source", Some(learner), e))
    }

    /// `GenerateSchedule`: plan the backlog for the given request, from today.
    pub async fn generate(&self, request: &ScheduleRequest) -> Result<Schedule, PlanError> {
        let today = self.today();
        let backlog = self.backlog().await?;
        build_schedule(backlog, request, today, &self.config)
    }

    /// Generate a plan for `learner` from their stored outstanding state and
    /// replace their stored plan with it, under the learner's lock.
    pub async fn generate_and_save(
        &self,
        learner: &LearnerId,
        proficiency: ProficiencyMap,
        daily_budget_minutes: u32,
        horizon_end: NaiveDate,
    ) -> Result<Schedule, PlanError> {
        let _guard = self.lock_learner(learner).await?;

        let outstanding = self.outstanding_for(learner).await?;
        let request = ScheduleRequest {
            proficiency,
            daily_budget_minutes,
            horizon_end,
            outstanding,
        };
        let today = self.today();
        let backlog = self.backlog().await?;
        let schedule = build_schedule(backlog, &request, today, &self.config)?;

        let stored = StoredPlan {
            learner_id: learner.clone(),
            generated_on: today,
            daily_budget_minutes,
            horizon_end,
            proficiency: request.proficiency,
            plan: schedule.plan.clone(),
        };
        self.save(&stored).await?;

        tracing::info!(
            learner = %learner,
            days = schedule.plan.day_count(),
            items = schedule.plan.item_count(),
            "plan saved"
        );
        Ok(schedule)
    }

    /// The learner's stored plan, if any.
    pub async fn plan_for(&self, learner: &LearnerId) -> Result<Option<StoredPlan>, PlanError> {
        self.collaborators
            .plans
            .load_plan(learner)
            .await
            .map_err(|e| PlanError::collaborator("plan store", Some(learner), e))
    }

    pub async fn has_plan(&self, learner: &LearnerId) -> Result<bool, PlanError> {
        Ok(self
            .plan_for(learner)
            .await?
            .is_some_and(|stored| !stored.plan.is_empty()))
    }

    pub(crate) async fn save(&self, stored: &StoredPlan) -> Result<(), PlanError> {
        self.collaborators
            .plans
            .save_plan(stored)
            .await
            .map_err(|e| PlanError::collaborator("plan store", Some(&stored.learner_id), e))
    }
}
