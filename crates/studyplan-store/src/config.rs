//! Configuration loading.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use studyplan_core::engine::PlannerConfig;
use studyplan_core::model::{DifficultyWeights, TimeTable};
use studyplan_core::replan::ReplannerConfig;

/// Top-level studyplan configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudyplanConfig {
    /// Directory holding plans and outstanding records.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Backlog TOML file or directory.
    #[serde(default = "default_backlog")]
    pub backlog: PathBuf,
    /// Budget for learners whose stored plan has none.
    #[serde(default = "default_daily_minutes")]
    pub default_daily_minutes: u32,
    /// Horizon length when a stored horizon has passed.
    #[serde(default = "default_horizon_days")]
    pub default_horizon_days: u64,
    /// Seconds between periodic re-plan runs.
    #[serde(default = "default_replan_interval")]
    pub replan_interval_secs: u64,
    /// Max learners re-planned concurrently.
    #[serde(default = "default_parallelism")]
    pub parallelism: usize,
    /// Minutes per difficulty.
    #[serde(default)]
    pub minutes: TimeTable,
    /// Ranking weight per difficulty.
    #[serde(default)]
    pub weights: DifficultyWeights,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./studyplan-data")
}
fn default_backlog() -> PathBuf {
    PathBuf::from("./backlog.toml")
}
fn default_daily_minutes() -> u32 {
    120
}
fn default_horizon_days() -> u64 {
    30
}
fn default_replan_interval() -> u64 {
    24 * 60 * 60
}
fn default_parallelism() -> usize {
    4
}

impl Default for StudyplanConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            backlog: default_backlog(),
            default_daily_minutes: default_daily_minutes(),
            default_horizon_days: default_horizon_days(),
            replan_interval_secs: default_replan_interval(),
            parallelism: default_parallelism(),
            minutes: TimeTable::default(),
            weights: DifficultyWeights::default(),
        }
    }
}

impl StudyplanConfig {
    pub fn planner(&self) -> PlannerConfig {
        PlannerConfig {
            minutes: self.minutes,
            weights: self.weights,
        }
    }

    pub fn replanner(&self) -> ReplannerConfig {
        ReplannerConfig {
            parallelism: self.parallelism,
            default_daily_minutes: self.default_daily_minutes,
            default_horizon_days: self.default_horizon_days,
        }
    }

    pub fn replan_interval(&self) -> Duration {
        Duration::from_secs(self.replan_interval_secs.max(1))
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
fn resolve_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    while let Some(start) = result.find("${") {
        if let Some(end) = result[start..].find('}') {
            let var_name = &result[start + 2..start + end];
            let value = std::env::var(var_name).unwrap_or_default();
            result = format!(
                "{}{}{}",
                &result[..start],
                value,
                &result[start + end + 1..]
            );
        } else {
            break;
        }
    }
    result
}

fn resolve_path(path: &Path) -> PathBuf {
    PathBuf::from(resolve_env_vars(&path.to_string_lossy()))
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `studyplan.toml` in the current directory
/// 2. `~/.config/studyplan/config.toml`
///
/// Environment variable overrides: `STUDYPLAN_DATA_DIR`, `STUDYPLAN_DAILY_MINUTES`.
pub fn load_config() -> Result<StudyplanConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<StudyplanConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("studyplan.toml");
        if local.exists() {
            Some(local)
        } else if let Some(home) = dirs_path() {
            let global = home.join("config.toml");
            if global.exists() {
                Some(global)
            } else {
                None
            }
        } else {
            None
        }
    };

    let mut config = match &config_path {
        Some(path) => parse_config(path)?,
        None => StudyplanConfig::default(),
    };

    if let Ok(dir) = std::env::var("STUDYPLAN_DATA_DIR") {
        config.data_dir = PathBuf::from(dir);
    }
    if let Ok(minutes) = std::env::var("STUDYPLAN_DAILY_MINUTES") {
        config.default_daily_minutes = minutes
            .trim()
            .parse()
            .with_context(|| format!("invalid STUDYPLAN_DAILY_MINUTES: {minutes:?}"))?;
    }

    config.data_dir = resolve_path(&config.data_dir);
    config.backlog = resolve_path(&config.backlog);

    tracing::debug!(
        source = ?config_path,
        data_dir = %config.data_dir.display(),
        backlog = %config.backlog.display(),
        "configuration loaded"
    );
    Ok(config)
}

fn parse_config(path: &Path) -> Result<StudyplanConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config: {}", path.display()))?;
    toml::from_str::<StudyplanConfig>(&content)
        .with_context(|| format!("failed to parse config: {}", path.display()))
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("studyplan"))
}
