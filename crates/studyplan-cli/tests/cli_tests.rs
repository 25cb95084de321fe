//! CLI integration tests using assert_cmd.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const CONFIG: &str = r#"
data_dir = "data"
backlog = "backlog.toml"
default_daily_minutes = 60
"#;

const BACKLOG: &str = r#"
[backlog]
id = "interview"
name = "Interview prep"

[[items]]
id = "a1"
topic = "Arrays"
difficulty = "Easy"
title = "Two Sum"

[[items]]
id = "a2"
topic = "Arrays"
difficulty = "Medium"

[[items]]
id = "t1"
topic = "Trees"
difficulty = "Easy"

[[items]]
id = "t2"
topic = "Trees"
difficulty = "Hard"

[[items]]
id = "g1"
topic = "Graphs"
difficulty = "Medium"
priority = 2
"#;

fn studyplan() -> Command {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("studyplan").unwrap();
    cmd.env_remove("STUDYPLAN_DATA_DIR")
        .env_remove("STUDYPLAN_DAILY_MINUTES")
        .env_remove("RUST_LOG");
    cmd
}

/// A directory with a config and backlog; commands run inside it.
fn workspace() -> TempDir {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("studyplan.toml"), CONFIG).unwrap();
    std::fs::write(dir.path().join("backlog.toml"), BACKLOG).unwrap();
    dir
}

fn in_workspace(dir: &TempDir) -> Command {
    let mut cmd = studyplan();
    cmd.current_dir(dir.path()).arg("--today").arg("2026-04-01");
    cmd
}

#[test]
fn init_creates_files() {
    let dir = TempDir::new().unwrap();

    studyplan()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Created studyplan.toml"))
        .stdout(predicate::str::contains("Created backlog.toml"));

    assert!(dir.path().join("studyplan.toml").exists());
    assert!(dir.path().join("backlog.toml").exists());

    // The starter backlog is valid as written.
    studyplan()
        .current_dir(dir.path())
        .arg("validate")
        .assert()
        .success()
        .stdout(predicate::str::contains("Example Backlog (6 items)"))
        .stdout(predicate::str::contains("All backlogs valid"));
}

#[test]
fn init_skips_existing() {
    let dir = TempDir::new().unwrap();

    studyplan()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success();

    studyplan()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));
}

#[test]
fn validate_flags_items_over_budget() {
    let dir = workspace();
    in_workspace(&dir)
        .args(["validate", "--backlog", "backlog.toml", "--daily-minutes", "40"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[t2] WARNING"))
        .stdout(predicate::str::contains("will stall"))
        .stdout(predicate::str::contains("1 warning(s) found"));
}

#[test]
fn validate_nonexistent_file() {
    let dir = workspace();
    in_workspace(&dir)
        .args(["validate", "--backlog", "nonexistent.toml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn topics_in_first_seen_order() {
    let dir = workspace();
    in_workspace(&dir)
        .arg("topics")
        .assert()
        .success()
        .stdout("Arrays\nTrees\nGraphs\n");
}

#[test]
fn generate_text_plan() {
    let dir = workspace();
    in_workspace(&dir)
        .args(["generate", "--learner", "alice", "--until", "2026-04-10"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Plan for alice: 3 day(s), 5 item(s), 60 min/day",
        ))
        .stdout(predicate::str::contains("2026-04-01"))
        .stdout(predicate::str::contains("Two Sum"));

    // Not saved without --save.
    assert!(!dir.path().join("data").join("plans").join("alice.json").exists());
}

#[test]
fn generate_json_plan() {
    let dir = workspace();
    let output = in_workspace(&dir)
        .args([
            "generate",
            "--learner",
            "alice",
            "--until",
            "2026-04-10",
            "--format",
            "json",
        ])
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let first_day = json["plan"]["2026-04-01"].as_array().unwrap();
    assert_eq!(first_day.len(), 2);
    assert_eq!(first_day[0]["item_id"], "g1");
    assert_eq!(first_day[0]["allocated_minutes"], 30);
    assert!(json["unscheduled"].as_array().unwrap().is_empty());
}

#[test]
fn generate_warns_about_stalled_topics() {
    let dir = workspace();
    in_workspace(&dir)
        .args([
            "generate",
            "--learner",
            "alice",
            "--until",
            "2026-04-10",
            "--daily-minutes",
            "40",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Warning: t2 (Trees) needs 45 min but the daily budget is 40",
        ))
        .stdout(predicate::str::contains("1 item(s) did not fit"));
}

#[test]
fn generate_applies_proficiency() {
    let dir = workspace();
    let output = in_workspace(&dir)
        .args([
            "generate",
            "--learner",
            "alice",
            "--until",
            "2026-04-10",
            "--proficiency",
            "Arrays=expert",
            "--format",
            "json",
        ])
        .output()
        .unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(!stdout.contains("\"a1\""));
    assert!(stdout.contains("\"a2\""));
}

#[test]
fn generate_rejects_bad_input() {
    let dir = workspace();
    in_workspace(&dir)
        .args(["generate", "--learner", "alice", "--until", "2026-03-01"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("horizon end 2026-03-01 is before today"));

    in_workspace(&dir)
        .args([
            "generate",
            "--learner",
            "alice",
            "--until",
            "2026-04-10",
            "--proficiency",
            "Arrays",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid proficiency entry"));

    in_workspace(&dir)
        .args([
            "generate",
            "--learner",
            "alice",
            "--until",
            "2026-04-10",
            "--daily-minutes",
            "0",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("daily budget must be positive"));
}

#[test]
fn show_unknown_learner() {
    let dir = workspace();
    in_workspace(&dir)
        .args(["show", "--learner", "nobody"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No plan stored for nobody"));
}

#[test]
fn save_mark_and_replan() {
    let dir = workspace();

    in_workspace(&dir)
        .args(["generate", "--learner", "alice", "--until", "2026-04-10", "--save"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Saved plan for alice"));

    in_workspace(&dir)
        .args(["show", "--learner", "alice"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "generated 2026-04-01, 60 min/day through 2026-04-10",
        ));

    for item in ["a1", "g1"] {
        in_workspace(&dir)
            .args(["mark", "--learner", "alice", "--item", item, "--status", "completed"])
            .assert()
            .success()
            .stdout(predicate::str::contains(format!("Marked {item} as completed")));
    }

    let report_path = dir.path().join("reports").join("run.json");
    studyplan()
        .current_dir(dir.path())
        .args(["--today", "2026-04-02", "replan", "--output"])
        .arg(&report_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("1 re-planned, 0 failed"));
    assert!(report_path.exists());

    let output = studyplan()
        .current_dir(dir.path())
        .args(["show", "--learner", "alice", "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let stored: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(stored["generated_on"], "2026-04-02");
    let plan = stored["plan"].to_string();
    assert!(!plan.contains("\"a1\""));
    assert!(!plan.contains("\"g1\""));
    assert!(plan.contains("\"t2\""));
}

#[test]
fn replan_with_no_plans() {
    let dir = workspace();
    in_workspace(&dir)
        .arg("replan")
        .assert()
        .success()
        .stdout(predicate::str::contains("0 re-planned, 0 failed"));
}

#[test]
fn mark_rejects_unknown_status() {
    let dir = workspace();
    in_workspace(&dir)
        .args(["mark", "--learner", "alice", "--item", "a1", "--status", "done"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown item status"));
}

#[test]
fn help_output() {
    studyplan()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Time-boxed study planner"));
}

#[test]
fn version_output() {
    studyplan()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("studyplan"));
}
