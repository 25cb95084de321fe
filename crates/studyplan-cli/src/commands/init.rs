//! The `studyplan init` command.

use anyhow::Result;

pub fn execute() -> Result<()> {
    if std::path::Path::new("studyplan.toml").exists() {
        println!("studyplan.toml already exists, skipping.");
    } else {
        std::fs::write("studyplan.toml", SAMPLE_CONFIG)?;
        println!("Created studyplan.toml");
    }

    let backlog_path = std::path::Path::new("backlog.toml");
    if backlog_path.exists() {
        println!("backlog.toml already exists, skipping.");
    } else {
        std::fs::write(backlog_path, EXAMPLE_BACKLOG)?;
        println!("Created backlog.toml");
    }

    println!("\nNext steps:");
    println!("  1. Run: studyplan validate");
    println!("  2. Run: studyplan generate --learner me --until <YYYY-MM-DD> --save");
    println!("  3. Run: studyplan mark --learner me --item two-sum --status completed");
    println!("  4. Run: studyplan replan");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# studyplan configuration

data_dir = "./studyplan-data"
backlog = "./backlog.toml"
default_daily_minutes = 120
default_horizon_days = 30
replan_interval_secs = 86400
parallelism = 4

[minutes]
easy = 20
medium = 30
hard = 45

[weights]
easy = 1
medium = 2
hard = 3
"#;

const EXAMPLE_BACKLOG: &str = r#"[backlog]
id = "example"
name = "Example Backlog"
description = "A small interview-prep backlog to get started"

[[items]]
id = "two-sum"
topic = "Arrays"
difficulty = "Easy"
title = "Two Sum"

[[items]]
id = "product-except-self"
topic = "Arrays"
difficulty = "Medium"
title = "Product of Array Except Self"

[[items]]
id = "trapping-rain-water"
topic = "Arrays"
difficulty = "Hard"
title = "Trapping Rain Water"

[[items]]
id = "max-depth"
topic = "Trees"
difficulty = "Easy"
title = "Maximum Depth of Binary Tree"

[[items]]
id = "validate-bst"
topic = "Trees"
difficulty = "Medium"
title = "Validate Binary Search Tree"

[[items]]
id = "course-schedule"
topic = "Graphs"
difficulty = "Medium"
priority = 2
title = "Course Schedule"
"#;
