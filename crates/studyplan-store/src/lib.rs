//! studyplan-store — Collaborator implementations for studyplan.
//!
//! Implements the core's `ItemSource`, `OutstandingSource`, and `PlanStore`
//! traits over JSON files and TOML backlogs, plus an in-memory store for
//! tests, and loads `studyplan.toml`.

pub mod backlog;
pub mod config;
pub mod error;
pub mod fs;
pub mod memory;

pub use backlog::TomlBacklogSource;
pub use config::{load_config, load_config_from, StudyplanConfig};
pub use error::StoreError;
pub use fs::JsonFileStore;
pub use memory::MemoryStore;
