//! The `studyplan watch` command.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;

use studyplan_core::replan::Replanner;

use super::{print_replan_summary, App, GlobalArgs};

pub async fn execute(
    global: &GlobalArgs,
    interval_secs: Option<u64>,
    output_dir: Option<PathBuf>,
) -> Result<()> {
    let app = App::open(global)?;
    let interval = match interval_secs {
        Some(secs) => {
            anyhow::ensure!(secs >= 1, "interval must be at least 1 second");
            Duration::from_secs(secs)
        }
        None => app.config.replan_interval(),
    };
    let replanner = Replanner::new(app.scheduler.clone(), app.config.replanner());

    eprintln!(
        "Re-planning every {}s. Press Ctrl-C to stop.",
        interval.as_secs()
    );

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
    };

    let runs = replanner
        .run_periodically(interval, shutdown, |report| {
            print_replan_summary(report);
            if let Some(dir) = &output_dir {
                let timestamp = report.started_at.format("%Y-%m-%dT%H%M%S");
                let path = dir.join(format!("replan-{timestamp}.json"));
                if let Err(e) = report.save_json(&path) {
                    tracing::error!("failed to save report: {e:#}");
                }
            }
        })
        .await;

    eprintln!("Stopped after {runs} run(s).");
    Ok(())
}
