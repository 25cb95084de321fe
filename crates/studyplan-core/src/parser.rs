//! TOML backlog parser.
//!
//! Loads backlogs from TOML files and directories, and validates them.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::engine::PlannerConfig;
use crate::model::{Item, ItemId};

/// A parsed backlog file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Backlog {
    pub id: String,
    pub name: String,
    pub description: String,
    /// Items in authoring order.
    pub items: Vec<Item>,
}

/// Intermediate TOML structure for parsing backlog files.
#[derive(Debug, Deserialize)]
struct TomlBacklogFile {
    backlog: TomlBacklogHeader,
    #[serde(default)]
    items: Vec<TomlItem>,
}

#[derive(Debug, Deserialize)]
struct TomlBacklogHeader {
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct TomlItem {
    id: String,
    topic: String,
    difficulty: String,
    #[serde(default = "default_priority")]
    priority: u32,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    link: Option<String>,
}

fn default_priority() -> u32 {
    1
}

/// Parse a single TOML file into a `Backlog`.
pub fn parse_backlog(path: &Path) -> Result<Backlog> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read backlog file: {}", path.display()))?;

    parse_backlog_str(&content, path)
}

/// Parse a TOML string into a `Backlog`.
pub fn parse_backlog_str(content: &str, source_path: &Path) -> Result<Backlog> {
    let parsed: TomlBacklogFile = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;

    let items = parsed
        .items
        .into_iter()
        .map(|i| {
            let difficulty = i
                .difficulty
                .parse()
                .map_err(|e: String| anyhow::anyhow!("item {}: {}", i.id, e))?;
            Ok(Item {
                id: ItemId(i.id),
                topic: i.topic,
                difficulty,
                priority: i.priority,
                title: i.title,
                link: i.link,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Backlog {
        id: parsed.backlog.id,
        name: parsed.backlog.name,
        description: parsed.backlog.description,
        items,
    })
}

/// Recursively load all `.toml` backlog files from a directory.
///
/// Files are visited in name order so item order is reproducible.
pub fn load_backlog_directory(dir: &Path) -> Result<Vec<Backlog>> {
    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    let mut paths = std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<std::io::Result<Vec<_>>>()?;
    paths.sort();

    let mut backlogs = Vec::new();
    for path in paths {
        if path.is_dir() {
            backlogs.extend(load_backlog_directory(&path)?);
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            match parse_backlog(&path) {
                Ok(backlog) => backlogs.push(backlog),
                Err(e) => {
                    tracing::warn!("skipping {}: {:#}", path.display(), e);
                }
            }
        }
    }

    Ok(backlogs)
}

/// Load a backlog file, or every backlog under a directory.
pub fn load_backlogs(path: &Path) -> Result<Vec<Backlog>> {
    if path.is_dir() {
        load_backlog_directory(path)
    } else {
        Ok(vec![parse_backlog(path)?])
    }
}

/// Every item of `path`, concatenated in load order.
pub fn load_items(path: &Path) -> Result<Vec<Item>> {
    Ok(load_backlogs(path)?
        .into_iter()
        .flat_map(|b| b.items)
        .collect())
}

/// A warning from backlog validation.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// The item ID (if applicable).
    pub item_id: Option<ItemId>,
    /// Warning message.
    pub message: String,
}

/// Validate a backlog for common issues.
///
/// With a `daily_budget_minutes`, items that could never fit in one day are
/// reported too.
pub fn validate_backlog(
    backlog: &Backlog,
    config: &PlannerConfig,
    daily_budget_minutes: Option<u32>,
) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    let mut seen_ids = HashSet::new();
    for item in &backlog.items {
        if !seen_ids.insert(&item.id) {
            warnings.push(ValidationWarning {
                item_id: Some(item.id.clone()),
                message: format!("duplicate item ID: {}", item.id),
            });
        }
    }

    for item in &backlog.items {
        if item.topic.trim().is_empty() {
            warnings.push(ValidationWarning {
                item_id: Some(item.id.clone()),
                message: "topic is empty".into(),
            });
        }
    }

    for item in &backlog.items {
        let minutes = config.minutes.minutes_for(item.difficulty);
        if minutes == 0 {
            warnings.push(ValidationWarning {
                item_id: Some(item.id.clone()),
                message: format!("{} items are estimated at 0 minutes", item.difficulty),
            });
        } else if let Some(budget) = daily_budget_minutes.filter(|b| minutes > *b) {
            warnings.push(ValidationWarning {
                item_id: Some(item.id.clone()),
                message: format!(
                    "needs {minutes} minutes but the daily budget is {budget}; \
                     its topic will stall"
                ),
            });
        }
    }

    warnings
}
