//! TOML backlog source.

use std::path::{Path, PathBuf};

use anyhow::Context;
use async_trait::async_trait;

use studyplan_core::model::Item;
use studyplan_core::parser;
use studyplan_core::traits::ItemSource;

/// Reads the backlog from a TOML file, or every TOML file under a directory.
///
/// The backlog is re-read on every call so edits are picked up by the next
/// request or re-plan run.
#[derive(Debug, Clone)]
pub struct TomlBacklogSource {
    path: PathBuf,
}

impl TomlBacklogSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl ItemSource for TomlBacklogSource {
    async fn load_items(&self) -> anyhow::Result<Vec<Item>> {
        let path = self.path.clone();
        let items = tokio::task::spawn_blocking(move || parser::load_items(&path))
            .await
            .context("backlog loader task failed")??;
        tracing::debug!(path = %self.path.display(), items = items.len(), "backlog loaded");
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BACKLOG: &str = r#"
[backlog]
id = "dsa"
name = "DSA"

[[items]]
id = "two-sum"
topic = "Arrays"
difficulty = "Easy"

[[items]]
id = "lru"
topic = "Design"
difficulty = "Hard"
priority = 3
"#;

    #[tokio::test]
    async fn loads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("backlog.toml");
        std::fs::write(&path, BACKLOG).unwrap();

        let items = TomlBacklogSource::new(&path).load_items().await.unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[1].priority, 3);
    }

    #[tokio::test]
    async fn loads_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.toml"), BACKLOG).unwrap();
        std::fs::write(dir.path().join("b.toml"), BACKLOG.replace("dsa", "dsa-2")).unwrap();

        let items = TomlBacklogSource::new(dir.path()).load_items().await.unwrap();
        assert_eq!(items.len(), 4);
    }

    #[tokio::test]
    async fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let source = TomlBacklogSource::new(dir.path().join("nope.toml"));
        let err = source.load_items().await.unwrap_err();
        assert!(format!("{err:#}").contains("failed to read backlog file"));
    }
}
