//! Periodic re-planning of every stored plan.
//!
//! For each learner with a stored plan, the outstanding work (items marked
//! pending plus items still sitting on today's or later days of the stored
//! plan) is run back through the pipeline from today, and the stored plan
//! is replaced wholesale. Learners are processed concurrently; each one
//! under its own lock, and a failure for one learner never stops the batch.

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{Days, NaiveDate};
use futures::stream::{FuturesUnordered, StreamExt};
use tokio::sync::Semaphore;
use tokio::time::MissedTickBehavior;
use uuid::Uuid;

use crate::allocator::Schedule;
use crate::engine::{dedup_by_id, plan_items, Scheduler};
use crate::error::PlanError;
use crate::model::{Item, ItemId, LearnerId, OutstandingState, StoredPlan};
use crate::report::{LearnerOutcome, Outcome, ReplanReport};

/// Configuration for the re-planner.
#[derive(Debug, Clone)]
pub struct ReplannerConfig {
    /// Maximum learners processed at once.
    pub parallelism: usize,
    /// Budget used when a stored plan does not carry a usable one.
    pub default_daily_minutes: u32,
    /// Horizon length used when the stored horizon has already passed.
    pub default_horizon_days: u64,
}

impl Default for ReplannerConfig {
    fn default() -> Self {
        Self {
            parallelism: 4,
            default_daily_minutes: 120,
            default_horizon_days: 30,
        }
    }
}

/// Re-derives every stored plan from current progress.
pub struct Replanner {
    scheduler: Scheduler,
    config: ReplannerConfig,
}

impl Replanner {
    /// Shares the scheduler's collaborators and per-learner locks.
    pub fn new(scheduler: Scheduler, config: ReplannerConfig) -> Self {
        Self { scheduler, config }
    }

    /// Re-plan every learner, using the clock's today.
    pub async fn run(&self) -> Result<ReplanReport, PlanError> {
        self.run_at(self.scheduler.today()).await
    }

    /// `RunPeriodicReplan`: re-plan every learner as of `today`.
    ///
    /// Only a failure to list learners fails the run as a whole; every other
    /// failure is recorded against its learner in the report.
    pub async fn run_at(&self, today: NaiveDate) -> Result<ReplanReport, PlanError> {
        let start = Instant::now();
        let started_at = chrono::Utc::now();
        let run_id = Uuid::new_v4();

        let learners = self
            .scheduler
            .collaborators()
            .plans
            .learners()
            .await
            .map_err(|e| PlanError::collaborator("plan store", None, e))?;

        tracing::info!(%run_id, %today, learners = learners.len(), "re-planning");

        // One backlog read per run. If it fails every learner fails with it.
        let backlog = self.scheduler.backlog().await.map(Arc::new);

        let semaphore = Arc::new(Semaphore::new(self.config.parallelism.max(1)));
        let mut futures = FuturesUnordered::new();

        for learner in learners {
            let semaphore = Arc::clone(&semaphore);
            let backlog = backlog.clone();
            futures.push(async move {
                let result = match backlog {
                    Ok(backlog) => match semaphore.acquire_owned().await {
                        Ok(_permit) => self.replan_learner(&learner, today, &backlog).await,
                        Err(_) => Err(PlanError::CollaboratorUnavailable {
                            collaborator: "re-planner",
                            learner: Some(learner.clone()),
                            message: "semaphore closed".into(),
                        }),
                    },
                    Err(e) => Err(e),
                };
                (learner, result)
            });
        }

        let mut outcomes = Vec::new();
        while let Some((learner, result)) = futures.next().await {
            let outcome = match result {
                Ok(schedule) => {
                    tracing::info!(
                        learner = %learner,
                        days = schedule.plan.day_count(),
                        items = schedule.plan.item_count(),
                        "re-planned"
                    );
                    Outcome::Replanned {
                        days: schedule.plan.day_count(),
                        items: schedule.plan.item_count(),
                        warnings: schedule.warnings,
                    }
                }
                Err(e) => {
                    tracing::error!(learner = %learner, "re-plan failed: {e}");
                    Outcome::Failed {
                        error: e.to_string(),
                    }
                }
            };
            outcomes.push(LearnerOutcome {
                learner_id: learner,
                outcome,
            });
        }
        outcomes.sort_by(|a, b| a.learner_id.cmp(&b.learner_id));

        let report = ReplanReport {
            id: run_id,
            started_at,
            today,
            outcomes,
            duration_ms: start.elapsed().as_millis() as u64,
        };
        tracing::info!(
            %run_id,
            succeeded = report.succeeded(),
            failed = report.failed(),
            "re-plan run complete"
        );
        Ok(report)
    }

    /// Read → compute → replace for one learner, under that learner's lock.
    async fn replan_learner(
        &self,
        learner: &LearnerId,
        today: NaiveDate,
        backlog: &[Item],
    ) -> Result<Schedule, PlanError> {
        let _guard = self.scheduler.lock_learner(learner).await?;

        let stored = self
            .scheduler
            .plan_for(learner)
            .await?
            .ok_or_else(|| PlanError::MissingPlan(learner.clone()))?;

        let outstanding = self
            .scheduler
            .collaborators()
            .outstanding
            .outstanding(learner)
            .await
            .map_err(|e| PlanError::collaborator("outstanding-state source", Some(learner), e))?
            .ok_or_else(|| PlanError::MissingOutstanding(learner.clone()))?;

        let wanted = outstanding_ids(&stored, &outstanding, today);
        let items = resolve(backlog, &wanted, learner);

        let daily_budget_minutes = if stored.daily_budget_minutes > 0 {
            stored.daily_budget_minutes
        } else {
            self.config.default_daily_minutes
        };
        let horizon_end = if stored.horizon_end >= today {
            stored.horizon_end
        } else {
            today
                .checked_add_days(Days::new(self.config.default_horizon_days))
                .unwrap_or(today)
        };

        let schedule = plan_items(
            items,
            &stored.proficiency,
            daily_budget_minutes,
            today,
            horizon_end,
            self.scheduler.config(),
        )?;

        let replacement = StoredPlan {
            learner_id: learner.clone(),
            generated_on: today,
            daily_budget_minutes,
            horizon_end,
            proficiency: stored.proficiency,
            plan: schedule.plan.clone(),
        };
        self.scheduler.save(&replacement).await?;

        Ok(schedule)
    }

    /// Re-plan on every tick of `interval` until `shutdown` resolves.
    ///
    /// The first run starts immediately. A failed run is logged and the loop
    /// carries on. Returns the number of runs started.
    pub async fn run_periodically<F>(
        &self,
        interval: Duration,
        shutdown: F,
        mut on_report: impl FnMut(&ReplanReport),
    ) -> usize
    where
        F: Future<Output = ()>,
    {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        let mut runs = 0usize;
        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                _ = ticker.tick() => {
                    runs += 1;
                    match self.run().await {
                        Ok(report) => on_report(&report),
                        Err(e) => tracing::error!("re-plan run failed: {e}"),
                    }
                }
            }
        }
        tracing::info!(runs, "periodic re-planning stopped");
        runs
    }
}

/// Pending items ∪ items on the stored plan from `today` on that have not
/// since been completed or skipped.
fn outstanding_ids(
    stored: &StoredPlan,
    outstanding: &OutstandingState,
    today: NaiveDate,
) -> HashSet<ItemId> {
    let mut ids: HashSet<ItemId> = outstanding.pending().cloned().collect();
    ids.extend(
        stored
            .plan
            .days_from(today)
            .flat_map(|(_, items)| items)
            .map(|planned| &planned.item_id)
            .filter(|id| !outstanding.is_resolved(id))
            .cloned(),
    );
    ids
}

/// Look `wanted` up in the backlog, keeping backlog order so a re-plan ranks
/// ties the same way the first request did. Each id resolves at most once.
fn resolve(backlog: &[Item], wanted: &HashSet<ItemId>, learner: &LearnerId) -> Vec<Item> {
    let by_id: HashMap<&ItemId, &Item> = backlog.iter().map(|item| (&item.id, item)).collect();
    for id in wanted {
        if !by_id.contains_key(id) {
            tracing::warn!(learner = %learner, item = %id, "outstanding item not in backlog; dropping");
        }
    }
    dedup_by_id(
        backlog
            .iter()
            .filter(|item| wanted.contains(&item.id))
            .cloned()
            .collect(),
    )
}
