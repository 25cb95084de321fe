//! The `studyplan show` command.

use anyhow::Result;

use studyplan_core::model::LearnerId;

use super::{backlog_or_empty, plan_table, App, GlobalArgs};

pub async fn execute(global: &GlobalArgs, learner: String, format: String) -> Result<()> {
    let app = App::open(global)?;
    let learner = LearnerId::new(learner);

    let Some(stored) = app.scheduler.plan_for(&learner).await? else {
        println!("No plan stored for {learner}.");
        return Ok(());
    };

    match format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&stored)?),
        _ => {
            println!(
                "Plan for {learner}: generated {}, {} min/day through {}",
                stored.generated_on, stored.daily_budget_minutes, stored.horizon_end
            );
            if stored.plan.is_empty() {
                println!("Nothing scheduled.");
            } else {
                let backlog = backlog_or_empty(&app.config.backlog);
                println!("{}", plan_table(&stored.plan, &backlog));
            }
        }
    }

    Ok(())
}
