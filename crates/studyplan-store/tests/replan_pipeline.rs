//! End-to-end re-planning over the file store and the in-memory store.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;

use studyplan_core::engine::{Collaborators, PlannerConfig, ScheduleRequest, Scheduler};
use studyplan_core::model::{
    Difficulty, Item, ItemStatus, LearnerId, OutstandingState, ProficiencyLevel, ProficiencyMap,
};
use studyplan_core::replan::{Replanner, ReplannerConfig};
use studyplan_core::report::{Outcome, ReplanReport};
use studyplan_core::traits::FixedClock;
use studyplan_store::{JsonFileStore, MemoryStore, TomlBacklogSource};

const BACKLOG: &str = r#"
[backlog]
id = "interview"
name = "Interview prep"

[[items]]
id = "two-sum"
topic = "Arrays"
difficulty = "Easy"

[[items]]
id = "3sum"
topic = "Arrays"
difficulty = "Medium"

[[items]]
id = "trap-water"
topic = "Arrays"
difficulty = "Hard"

[[items]]
id = "invert-tree"
topic = "Trees"
difficulty = "Easy"

[[items]]
id = "lca"
topic = "Trees"
difficulty = "Medium"

[[items]]
id = "course-schedule"
topic = "Graphs"
difficulty = "Medium"
priority = 2
"#;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn file_scheduler(dir: &std::path::Path, today: NaiveDate) -> (Arc<JsonFileStore>, Scheduler) {
    let backlog = dir.join("backlog.toml");
    std::fs::write(&backlog, BACKLOG).unwrap();
    let store = Arc::new(JsonFileStore::new(dir.join("data")));
    let scheduler = Scheduler::new(
        Collaborators {
            items: Arc::new(TomlBacklogSource::new(backlog)),
            outstanding: store.clone(),
            plans: store.clone(),
            clock: Arc::new(FixedClock::new(today)),
        },
        PlannerConfig::default(),
    );
    (store, scheduler)
}

fn memory_scheduler(store: Arc<MemoryStore>, today: NaiveDate) -> Scheduler {
    Scheduler::new(
        Collaborators {
            items: store.clone(),
            outstanding: store.clone(),
            plans: store,
            clock: Arc::new(FixedClock::new(today)),
        },
        PlannerConfig::default(),
    )
}

fn backlog_items() -> Vec<Item> {
    vec![
        Item::new("a1", "Arrays", Difficulty::Easy),
        Item::new("a2", "Arrays", Difficulty::Medium),
        Item::new("t1", "Trees", Difficulty::Easy),
        Item::new("g1", "Graphs", Difficulty::Hard),
    ]
}

fn outcome_for<'a>(report: &'a ReplanReport, learner: &str) -> &'a Outcome {
    &report
        .outcomes
        .iter()
        .find(|o| o.learner_id.as_str() == learner)
        .unwrap()
        .outcome
}

#[tokio::test]
async fn generate_then_replan_through_files() {
    let dir = tempfile::tempdir().unwrap();
    let day_one = date(2026, 4, 1);
    let (store, scheduler) = file_scheduler(dir.path(), day_one);
    let alice = LearnerId::from("alice");

    store.ensure_outstanding(&alice).await.unwrap();
    let schedule = scheduler
        .generate_and_save(&alice, ProficiencyMap::new(), 60, date(2026, 4, 30))
        .await
        .unwrap();
    assert!(schedule.is_complete());
    assert!(scheduler.has_plan(&alice).await.unwrap());

    // Graphs has priority 2, so it leads day one.
    let first_day = store.read_plan(&alice).await.unwrap().unwrap();
    let first: Vec<_> = first_day
        .plan
        .day(day_one)
        .unwrap()
        .iter()
        .map(|p| p.item_id.to_string())
        .collect();
    assert_eq!(first, vec!["course-schedule", "two-sum"]);

    store
        .set_status(&alice, "course-schedule".into(), ItemStatus::Completed)
        .await
        .unwrap();
    store
        .set_status(&alice, "two-sum".into(), ItemStatus::Pending)
        .await
        .unwrap();

    let replanner = Replanner::new(scheduler.clone(), ReplannerConfig::default());
    let report = replanner.run_at(date(2026, 4, 2)).await.unwrap();
    assert_eq!(report.succeeded(), 1);
    assert_eq!(report.failed(), 0);

    let stored = store.read_plan(&alice).await.unwrap().unwrap();
    assert_eq!(stored.generated_on, date(2026, 4, 2));
    assert!(!stored.plan.contains(&"course-schedule".into()));
    assert!(stored.plan.contains(&"two-sum".into()));
    assert!(stored.plan.days().all(|(d, _)| d >= date(2026, 4, 2)));
    for (day, _) in stored.plan.days() {
        assert!(stored.plan.minutes_on(day) <= 60);
    }

    let report_path = dir.path().join("reports").join("replan.json");
    report.save_json(&report_path).unwrap();
    let loaded = ReplanReport::load_json(&report_path).unwrap();
    assert_eq!(loaded.id, report.id);
}

#[tokio::test]
async fn replan_waits_for_a_lock_held_by_another_store_handle() {
    let dir = tempfile::tempdir().unwrap();
    let (store, scheduler) = file_scheduler(dir.path(), date(2026, 4, 1));
    let alice = LearnerId::from("alice");
    store.ensure_outstanding(&alice).await.unwrap();
    scheduler
        .generate_and_save(&alice, ProficiencyMap::new(), 60, date(2026, 4, 30))
        .await
        .unwrap();

    // Another process sharing the data directory, e.g. `studyplan mark`.
    let other = JsonFileStore::new(dir.path().join("data"));
    let held = other.learner_lock(&alice).await.unwrap();

    let replanner = Replanner::new(scheduler.clone(), ReplannerConfig::default());
    let blocked = tokio::time::timeout(
        Duration::from_millis(100),
        replanner.run_at(date(2026, 4, 2)),
    )
    .await;
    assert!(blocked.is_err(), "re-plan should wait for the file lock");
    let blocked = tokio::time::timeout(
        Duration::from_millis(100),
        scheduler.generate_and_save(&alice, ProficiencyMap::new(), 30, date(2026, 4, 30)),
    )
    .await;
    assert!(blocked.is_err(), "save should wait for the file lock");
    let unchanged = store.read_plan(&alice).await.unwrap().unwrap();
    assert_eq!(unchanged.generated_on, date(2026, 4, 1));
    assert_eq!(unchanged.daily_budget_minutes, 60);

    drop(held);
    let report = tokio::time::timeout(Duration::from_secs(5), replanner.run_at(date(2026, 4, 2)))
        .await
        .expect("re-plan should finish once the lock is released")
        .unwrap();
    assert_eq!(report.succeeded(), 1);
    let stored = store.read_plan(&alice).await.unwrap().unwrap();
    assert_eq!(stored.generated_on, date(2026, 4, 2));
}

#[tokio::test]
async fn request_path_excludes_resolved_items() {
    let dir = tempfile::tempdir().unwrap();
    let (_store, scheduler) = file_scheduler(dir.path(), date(2026, 4, 1));

    let request = ScheduleRequest {
        proficiency: ProficiencyMap::new().with("Arrays", ProficiencyLevel::Expert),
        daily_budget_minutes: 120,
        horizon_end: date(2026, 4, 10),
        outstanding: OutstandingState::new().with("lca", ItemStatus::Skipped),
    };
    let schedule = scheduler.generate(&request).await.unwrap();

    // Expert drops the easy Arrays item; lca was skipped.
    assert!(!schedule.plan.contains(&"two-sum".into()));
    assert!(!schedule.plan.contains(&"lca".into()));
    assert!(schedule.plan.contains(&"3sum".into()));
    assert!(schedule.plan.contains(&"invert-tree".into()));
}

#[tokio::test]
async fn one_unavailable_learner_does_not_stop_the_batch() {
    let today = date(2026, 4, 1);
    let store = Arc::new(MemoryStore::new(backlog_items()));
    let scheduler = memory_scheduler(store.clone(), today);

    for learner in ["alice", "bob", "carol"] {
        store.set_outstanding(learner, OutstandingState::new());
        scheduler
            .generate_and_save(&learner.into(), ProficiencyMap::new(), 60, date(2026, 4, 30))
            .await
            .unwrap();
    }
    let bob_before = store.plan(&"bob".into()).unwrap();
    store.fail_outstanding_for("bob");

    let replanner = Replanner::new(
        scheduler,
        ReplannerConfig {
            parallelism: 2,
            ..Default::default()
        },
    );
    let report = replanner.run_at(date(2026, 4, 2)).await.unwrap();

    assert_eq!(report.succeeded(), 2);
    assert_eq!(report.failed(), 1);
    match outcome_for(&report, "bob") {
        Outcome::Failed { error } => assert!(error.contains("unavailable"), "{error}"),
        other => panic!("expected bob to fail, got {other:?}"),
    }
    // Bob's plan is untouched, the others were regenerated.
    assert_eq!(store.plan(&"bob".into()).unwrap(), bob_before);
    assert_eq!(
        store.plan(&"alice".into()).unwrap().generated_on,
        date(2026, 4, 2)
    );
}

#[tokio::test]
async fn backlog_outage_fails_every_learner_but_not_the_run() {
    let today = date(2026, 4, 1);
    let store = Arc::new(MemoryStore::new(backlog_items()));
    let scheduler = memory_scheduler(store.clone(), today);

    for learner in ["alice", "bob"] {
        store.set_outstanding(learner, OutstandingState::new());
        scheduler
            .generate_and_save(&learner.into(), ProficiencyMap::new(), 60, date(2026, 4, 30))
            .await
            .unwrap();
    }
    let saves_before = store.plan_saves();
    store.set_backlog_down(true);

    let report = Replanner::new(scheduler, ReplannerConfig::default())
        .run_at(today)
        .await
        .unwrap();

    assert_eq!(report.failed(), 2);
    assert_eq!(store.plan_saves(), saves_before);
}

#[tokio::test]
async fn many_learners_with_bounded_parallelism() {
    let today = date(2026, 4, 1);
    let store = Arc::new(MemoryStore::new(backlog_items()));
    let scheduler = memory_scheduler(store.clone(), today);

    let learners: Vec<String> = (0..12).map(|i| format!("learner-{i:02}")).collect();
    for learner in &learners {
        store.set_outstanding(learner.as_str(), OutstandingState::new());
        scheduler
            .generate_and_save(
                &learner.as_str().into(),
                ProficiencyMap::new(),
                45,
                date(2026, 4, 30),
            )
            .await
            .unwrap();
    }

    let replanner = Replanner::new(
        scheduler.clone(),
        ReplannerConfig {
            parallelism: 3,
            ..Default::default()
        },
    );
    let report = replanner.run_at(date(2026, 4, 3)).await.unwrap();

    assert_eq!(report.succeeded(), 12);
    let ids: Vec<_> = report
        .outcomes
        .iter()
        .map(|o| o.learner_id.to_string())
        .collect();
    assert_eq!(ids, learners);
    assert_eq!(scheduler.locks().active(), 0);
}
