//! The `studyplan replan` command.

use std::path::PathBuf;

use anyhow::Result;

use studyplan_core::replan::Replanner;

use super::{print_replan_summary, App, GlobalArgs};

pub async fn execute(global: &GlobalArgs, output: Option<PathBuf>, format: String) -> Result<()> {
    let app = App::open(global)?;
    let replanner = Replanner::new(app.scheduler.clone(), app.config.replanner());

    let report = replanner.run().await?;

    match format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&report)?),
        "markdown" | "md" => println!("{}", report.to_markdown()),
        _ => print_replan_summary(&report),
    }

    if let Some(path) = output {
        report.save_json(&path)?;
        eprintln!("Report saved to: {}", path.display());
    }

    Ok(())
}
