//! Re-plan run reports with JSON persistence.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::allocator::StalledItem;
use crate::model::LearnerId;

/// The result of one `RunPeriodicReplan` pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplanReport {
    /// Unique run identifier.
    pub id: Uuid,
    /// Wall-clock start of the run.
    pub started_at: DateTime<Utc>,
    /// The date plans were re-derived from.
    pub today: NaiveDate,
    /// One entry per learner, ordered by learner id.
    pub outcomes: Vec<LearnerOutcome>,
    /// Total wall-clock duration in milliseconds.
    pub duration_ms: u64,
}

/// What happened to one learner's plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LearnerOutcome {
    pub learner_id: LearnerId,
    #[serde(flatten)]
    pub outcome: Outcome,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    /// The stored plan was replaced.
    Replanned {
        days: usize,
        items: usize,
        #[serde(default)]
        warnings: Vec<StalledItem>,
    },
    /// The learner was skipped; their stored plan is untouched.
    Failed { error: String },
}

impl ReplanReport {
    pub fn succeeded(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.outcome, Outcome::Replanned { .. }))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }

    /// Learners whose new plan has at least one stalled topic.
    pub fn stalled(&self) -> impl Iterator<Item = (&LearnerId, &StalledItem)> {
        self.outcomes.iter().flat_map(|o| {
            let warnings: &[StalledItem] = match &o.outcome {
                Outcome::Replanned { warnings, .. } => warnings,
                Outcome::Failed { .. } => &[],
            };
            warnings.iter().map(move |w| (&o.learner_id, w))
        })
    }

    /// Save the report as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        Ok(())
    }

    /// Load a report from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read report from {}", path.display()))?;
        let report: ReplanReport =
            serde_json::from_str(&content).context("failed to parse report JSON")?;
        Ok(report)
    }

    /// Format the report as markdown.
    pub fn to_markdown(&self) -> String {
        let mut md = String::new();

        md.push_str(&format!(
            "**Re-plan {}:** {} re-planned, {} failed ({}ms)\n\n",
            self.today,
            self.succeeded(),
            self.failed(),
            self.duration_ms
        ));

        md.push_str("| Learner | Status | Days | Items | Detail |\n");
        md.push_str("|---------|--------|------|-------|--------|\n");
        for o in &self.outcomes {
            match &o.outcome {
                Outcome::Replanned {
                    days,
                    items,
                    warnings,
                } => {
                    let detail = if warnings.is_empty() {
                        String::new()
                    } else {
                        format!("{} stalled", warnings.len())
                    };
                    md.push_str(&format!(
                        "| {} | replanned | {} | {} | {} |\n",
                        o.learner_id, days, items, detail
                    ));
                }
                Outcome::Failed { error } => {
                    md.push_str(&format!("| {} | failed | - | - | {} |\n", o.learner_id, error));
                }
            }
        }

        md
    }
}
