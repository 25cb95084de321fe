//! The `studyplan generate` command.

use anyhow::Result;
use chrono::NaiveDate;

use studyplan_core::allocator::Schedule;
use studyplan_core::engine::ScheduleRequest;
use studyplan_core::model::{LearnerId, ProficiencyMap};

use super::{backlog_or_empty, parse_proficiency, plan_table, App, GlobalArgs};

#[allow(clippy::too_many_arguments)]
pub async fn execute(
    global: &GlobalArgs,
    learner: String,
    until: NaiveDate,
    daily_minutes: Option<u32>,
    proficiency: Option<String>,
    save: bool,
    format: String,
) -> Result<()> {
    let app = App::open(global)?;
    let learner = LearnerId::new(learner);
    let proficiency = match &proficiency {
        Some(spec) => parse_proficiency(spec)?,
        None => ProficiencyMap::new(),
    };
    let budget = daily_minutes.unwrap_or(app.config.default_daily_minutes);

    let schedule = if save {
        // A saved plan needs a progress record for the re-planner to read.
        if app.store.ensure_outstanding(&learner).await? {
            tracing::info!(learner = %learner, "created empty progress record");
        }
        app.scheduler
            .generate_and_save(&learner, proficiency, budget, until)
            .await?
    } else {
        let outstanding = app.scheduler.outstanding_for(&learner).await?;
        let request = ScheduleRequest {
            proficiency,
            daily_budget_minutes: budget,
            horizon_end: until,
            outstanding,
        };
        app.scheduler.generate(&request).await?
    };

    match format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&schedule)?),
        _ => print_schedule(&app, &learner, budget, &schedule, save),
    }

    Ok(())
}

fn print_schedule(app: &App, learner: &LearnerId, budget: u32, schedule: &Schedule, saved: bool) {
    println!(
        "Plan for {learner}: {} day(s), {} item(s), {budget} min/day",
        schedule.plan.day_count(),
        schedule.plan.item_count()
    );
    if !schedule.plan.is_empty() {
        let backlog = backlog_or_empty(&app.config.backlog);
        println!("{}", plan_table(&schedule.plan, &backlog));
    }

    for w in &schedule.warnings {
        println!(
            "Warning: {} ({}) needs {} min but the daily budget is {}; {} item(s) behind it are blocked",
            w.item_id, w.topic, w.estimated_minutes, w.daily_budget_minutes, w.blocked_behind
        );
    }
    if !schedule.is_complete() {
        println!(
            "{} item(s) did not fit before the horizon.",
            schedule.unscheduled.len()
        );
    }
    if saved {
        println!("Saved plan for {learner}.");
    }
}
