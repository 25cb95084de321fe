//! The `studyplan mark` command.

use anyhow::Result;

use studyplan_core::model::{ItemId, ItemStatus, LearnerId};

use super::{App, GlobalArgs};

pub async fn execute(
    global: &GlobalArgs,
    learner: String,
    item: String,
    status: ItemStatus,
) -> Result<()> {
    let app = App::open(global)?;
    let learner = LearnerId::new(learner);
    let item = ItemId::new(item);

    match app.scheduler.backlog().await {
        Ok(backlog) if !backlog.iter().any(|i| i.id == item) => {
            eprintln!("Warning: {item} is not in the backlog");
        }
        Ok(_) => {}
        Err(e) => tracing::warn!("could not check backlog: {e}"),
    }

    let state = app.store.set_status(&learner, item.clone(), status).await?;
    println!(
        "Marked {item} as {status} for {learner} ({} pending).",
        state.pending().count()
    );
    Ok(())
}
