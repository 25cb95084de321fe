//! Subcommand implementations and the wiring they share.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use comfy_table::{Cell, Table};

use studyplan_core::engine::{Collaborators, Scheduler};
use studyplan_core::model::{Item, ItemId, Plan, ProficiencyLevel, ProficiencyMap};
use studyplan_core::report::{Outcome, ReplanReport};
use studyplan_core::traits::{Clock, FixedClock, SystemClock};
use studyplan_store::config::{load_config_from, StudyplanConfig};
use studyplan_store::{JsonFileStore, TomlBacklogSource};

pub mod generate;
pub mod init;
pub mod mark;
pub mod replan;
pub mod show;
pub mod topics;
pub mod validate;
pub mod watch;

/// Flags accepted by every subcommand.
pub struct GlobalArgs {
    pub config: Option<PathBuf>,
    pub today: Option<NaiveDate>,
}

impl GlobalArgs {
    pub fn load_config(&self) -> Result<StudyplanConfig> {
        load_config_from(self.config.as_deref())
    }
}

/// A scheduler wired to the configured file store and backlog.
pub struct App {
    pub config: StudyplanConfig,
    pub store: Arc<JsonFileStore>,
    pub scheduler: Scheduler,
}

impl App {
    pub fn open(global: &GlobalArgs) -> Result<Self> {
        let config = global.load_config()?;
        let store = Arc::new(JsonFileStore::new(&config.data_dir));
        let clock: Arc<dyn Clock> = match global.today {
            Some(today) => Arc::new(FixedClock::new(today)),
            None => Arc::new(SystemClock),
        };
        let scheduler = Scheduler::new(
            Collaborators {
                items: Arc::new(TomlBacklogSource::new(&config.backlog)),
                outstanding: store.clone(),
                plans: store.clone(),
                clock,
            },
            config.planner(),
        );
        Ok(Self {
            config,
            store,
            scheduler,
        })
    }
}

/// Parse `"Arrays=expert, Trees=Intermediate"` into a proficiency map.
pub fn parse_proficiency(spec: &str) -> Result<ProficiencyMap> {
    let mut map = ProficiencyMap::new();
    for pair in spec.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let (topic, level) = pair
            .split_once('=')
            .with_context(|| format!("invalid proficiency entry '{pair}', expected topic=level"))?;
        let level: ProficiencyLevel = level
            .parse()
            .map_err(|e: String| anyhow::anyhow!("{e} (in '{pair}')"))?;
        map.insert(topic.trim(), level);
    }
    Ok(map)
}

/// Backlog file or directory: the flag if given, else the configured one.
pub fn backlog_path(global: &GlobalArgs, flag: Option<PathBuf>) -> Result<PathBuf> {
    match flag {
        Some(path) => Ok(path),
        None => Ok(global.load_config()?.backlog),
    }
}

/// Render a plan as a table, one row per planned item.
pub fn plan_table(plan: &Plan, backlog: &[Item]) -> Table {
    let by_id: HashMap<&ItemId, &Item> = backlog.iter().map(|i| (&i.id, i)).collect();

    let mut table = Table::new();
    table.set_header(vec!["Date", "Item", "Topic", "Difficulty", "Minutes"]);
    for (day, items) in plan.days() {
        for planned in items {
            let item = by_id.get(&planned.item_id);
            table.add_row(vec![
                Cell::new(day),
                Cell::new(item.and_then(|i| i.title.as_deref()).unwrap_or(planned.item_id.as_str())),
                Cell::new(item.map(|i| i.topic.as_str()).unwrap_or("?")),
                Cell::new(item.map(|i| i.difficulty.to_string()).unwrap_or_default()),
                Cell::new(planned.allocated_minutes),
            ]);
        }
    }
    table
}

pub fn print_replan_summary(report: &ReplanReport) {
    let mut table = Table::new();
    table.set_header(vec!["Learner", "Status", "Days", "Items", "Detail"]);
    for o in &report.outcomes {
        let row = match &o.outcome {
            Outcome::Replanned {
                days,
                items,
                warnings,
            } => vec![
                Cell::new(&o.learner_id),
                Cell::new("replanned"),
                Cell::new(days),
                Cell::new(items),
                Cell::new(if warnings.is_empty() {
                    String::new()
                } else {
                    format!("{} stalled", warnings.len())
                }),
            ],
            Outcome::Failed { error } => vec![
                Cell::new(&o.learner_id),
                Cell::new("failed"),
                Cell::new("-"),
                Cell::new("-"),
                Cell::new(error),
            ],
        };
        table.add_row(row);
    }

    println!(
        "Re-plan {}: {} re-planned, {} failed ({}ms)",
        report.today,
        report.succeeded(),
        report.failed(),
        report.duration_ms
    );
    if !report.outcomes.is_empty() {
        println!("{table}");
    }
}

/// Items of the backlog at `path`, or empty if it cannot be read.
pub fn backlog_or_empty(path: &Path) -> Vec<Item> {
    match studyplan_core::parser::load_items(path) {
        Ok(items) => items,
        Err(e) => {
            tracing::warn!("could not read backlog {}: {e:#}", path.display());
            Vec::new()
        }
    }
}
