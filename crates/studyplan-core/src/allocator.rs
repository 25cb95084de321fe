//! Greedy, day-by-day packing of topic queues into a daily time budget.
//!
//! Each day starts with the full budget and visits the topic queues once, in
//! partition order. A topic contributes at most its head item per day, and
//! only if that item fits in what is left of the day. Heads that do not fit
//! stay at the front of their queue and are retried the next day.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::model::{ItemId, Plan, PlannedItem, TimeTable};
use crate::partition::TopicQueue;

/// An item whose estimate exceeds the daily budget. It can never be placed
/// and holds up every item queued behind it in its topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StalledItem {
    pub item_id: ItemId,
    pub topic: String,
    pub estimated_minutes: u32,
    pub daily_budget_minutes: u32,
    /// Items of the same topic stuck behind this one.
    pub blocked_behind: usize,
}

/// Output of one allocation run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    pub plan: Plan,
    /// Queues that stopped draining because their head never fits.
    #[serde(default)]
    pub warnings: Vec<StalledItem>,
    /// Everything still queued when allocation stopped, stalled items included.
    #[serde(default)]
    pub unscheduled: Vec<ItemId>,
}

impl Schedule {
    pub fn is_complete(&self) -> bool {
        self.unscheduled.is_empty()
    }
}

/// Pack `queues` into days from `today` through `horizon_end` inclusive.
///
/// Counting always starts at `today`, the real current date, not at any
/// start date the learner asked for. This may well be a latent bug rather
/// than intent; confirm with product before honoring a requested start date.
///
/// Items still queued after `horizon_end` are dropped from the plan and
/// listed in [`Schedule::unscheduled`].
pub fn allocate(
    mut queues: Vec<TopicQueue>,
    daily_budget_minutes: u32,
    today: NaiveDate,
    horizon_end: NaiveDate,
    minutes: &TimeTable,
) -> Schedule {
    let mut plan = Plan::new();
    let mut current = today;

    while current <= horizon_end && queues.iter().any(|q| !q.is_empty()) {
        // Once no head can fit even an empty day, later days stay empty too.
        if !queues
            .iter()
            .filter_map(|q| head_cost(q, minutes))
            .any(|c| c <= daily_budget_minutes)
        {
            break;
        }

        let mut remaining = daily_budget_minutes;
        let mut day = Vec::new();

        for queue in &mut queues {
            let Some(cost) = head_cost(queue, minutes) else {
                continue;
            };
            if cost > remaining {
                continue;
            }
            if let Some(item) = queue.pop_front() {
                remaining -= cost;
                day.push(PlannedItem {
                    item_id: item.id,
                    allocated_minutes: cost,
                });
            }
        }

        plan.insert_day(current, day);

        match current.succ_opt() {
            Some(next) => current = next,
            None => break,
        }
    }

    let mut warnings = Vec::new();
    let mut unscheduled = Vec::new();
    for queue in &queues {
        if let Some(head) = queue.front() {
            let estimated_minutes = minutes.minutes_for(head.difficulty);
            if estimated_minutes > daily_budget_minutes {
                tracing::warn!(
                    item = %head.id,
                    topic = %queue.topic,
                    estimated_minutes,
                    daily_budget_minutes,
                    "item never fits the daily budget; topic queue is stalled"
                );
                warnings.push(StalledItem {
                    item_id: head.id.clone(),
                    topic: queue.topic.clone(),
                    estimated_minutes,
                    daily_budget_minutes,
                    blocked_behind: queue.len() - 1,
                });
            }
        }
        unscheduled.extend(queue.iter().map(|item| item.id.clone()));
    }

    if !unscheduled.is_empty() {
        tracing::debug!(
            count = unscheduled.len(),
            %horizon_end,
            "items left unscheduled"
        );
    }

    Schedule {
        plan,
        warnings,
        unscheduled,
    }
}

fn head_cost(queue: &TopicQueue, minutes: &TimeTable) -> Option<u32> {
    queue.front().map(|item| minutes.minutes_for(item.difficulty))
}
