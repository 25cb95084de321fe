//! Planning error types.
//!
//! Invalid input is rejected before any allocation work starts. Collaborator
//! failures carry the learner they concern so a batch run can report and
//! skip them without string matching.

use chrono::NaiveDate;
use thiserror::Error;

use crate::model::{ItemId, LearnerId};

/// Errors surfaced by the scheduler and the re-planner.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanError {
    /// The daily budget must be at least one minute.
    #[error("daily budget must be positive, got {0} minutes")]
    InvalidBudget(u32),

    /// The horizon ends before the first day that would be planned.
    #[error("horizon end {horizon_end} is before today ({today})")]
    HorizonBeforeToday {
        today: NaiveDate,
        horizon_end: NaiveDate,
    },

    /// The time table assigns zero minutes to an item's difficulty.
    #[error("item {item_id} has a non-positive time estimate")]
    NonPositiveEstimate { item_id: ItemId },

    /// A backlog, outstanding-state, or plan store call failed.
    #[error("{collaborator} unavailable{}: {message}", learner_suffix(.learner))]
    CollaboratorUnavailable {
        collaborator: &'static str,
        learner: Option<LearnerId>,
        message: String,
    },

    /// The learner has a stored plan but no outstanding-state record.
    #[error("no outstanding-state record for learner {0}")]
    MissingOutstanding(LearnerId),

    /// The learner was listed by the plan store but has no stored plan.
    #[error("no stored plan for learner {0}")]
    MissingPlan(LearnerId),
}

fn learner_suffix(learner: &Option<LearnerId>) -> String {
    learner
        .as_ref()
        .map(|l| format!(" for learner {l}"))
        .unwrap_or_default()
}

impl PlanError {
    /// Returns `true` for errors caused by the caller's input rather than a
    /// collaborator; these are never worth retrying unchanged.
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            PlanError::InvalidBudget(_)
                | PlanError::HorizonBeforeToday { .. }
                | PlanError::NonPositiveEstimate { .. }
        )
    }

    /// Wrap a collaborator error, keeping its full context chain.
    pub fn collaborator(
        collaborator: &'static str,
        learner: Option<&LearnerId>,
        error: anyhow::Error,
    ) -> Self {
        PlanError::CollaboratorUnavailable {
            collaborator,
            learner: learner.cloned(),
            message: format!("{error:#}"),
        }
    }
}
