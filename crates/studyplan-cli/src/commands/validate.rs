//! The `studyplan validate` command.

use std::path::PathBuf;

use anyhow::Result;

use studyplan_core::parser;

use super::GlobalArgs;

pub fn execute(
    global: &GlobalArgs,
    backlog: Option<PathBuf>,
    daily_minutes: Option<u32>,
) -> Result<()> {
    let config = global.load_config()?;
    let backlog_path = backlog.unwrap_or_else(|| config.backlog.clone());
    let backlogs = parser::load_backlogs(&backlog_path)?;
    let planner = config.planner();

    let mut total_warnings = 0;

    for backlog in &backlogs {
        let name = if backlog.name.is_empty() {
            &backlog.id
        } else {
            &backlog.name
        };
        println!("Backlog: {} ({} items)", name, backlog.items.len());

        let warnings = parser::validate_backlog(backlog, &planner, daily_minutes);
        for w in &warnings {
            let prefix = w
                .item_id
                .as_ref()
                .map(|id| format!("  [{id}]"))
                .unwrap_or_else(|| "  ".to_string());
            println!("{prefix} WARNING: {}", w.message);
        }
        total_warnings += warnings.len();
    }

    if total_warnings == 0 {
        println!("All backlogs valid.");
    } else {
        println!("\n{total_warnings} warning(s) found.");
    }

    Ok(())
}
