//! The `studyplan topics` command.

use std::path::PathBuf;

use anyhow::Result;

use studyplan_core::{parser, partition};

use super::{backlog_path, GlobalArgs};

pub fn execute(global: &GlobalArgs, backlog: Option<PathBuf>) -> Result<()> {
    let path = backlog_path(global, backlog)?;
    let items = parser::load_items(&path)?;
    for topic in partition::topics(&items) {
        println!("{topic}");
    }
    Ok(())
}
