//! studyplan CLI — the user-facing command-line interface.

use std::path::PathBuf;
use std::process;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

use studyplan_core::model::ItemStatus;

mod commands;

#[derive(Parser)]
#[command(name = "studyplan", version, about = "Time-boxed study planner")]
struct Cli {
    /// Config file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Plan as if today were this date (YYYY-MM-DD)
    #[arg(long, global = true)]
    today: Option<NaiveDate>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create starter config and example backlog
    Init,

    /// Validate backlog TOML files
    Validate {
        /// Backlog file or directory (default: from config)
        #[arg(long)]
        backlog: Option<PathBuf>,

        /// Also flag items that cannot fit in this daily budget
        #[arg(long)]
        daily_minutes: Option<u32>,
    },

    /// List backlog topics in first-seen order
    Topics {
        /// Backlog file or directory (default: from config)
        #[arg(long)]
        backlog: Option<PathBuf>,
    },

    /// Generate a plan from today through a horizon date
    Generate {
        /// Learner id
        #[arg(long)]
        learner: String,

        /// Last day of the plan (YYYY-MM-DD)
        #[arg(long)]
        until: NaiveDate,

        /// Minutes available per day (default: from config)
        #[arg(long)]
        daily_minutes: Option<u32>,

        /// Per-topic proficiency, e.g. "Arrays=expert,Trees=intermediate"
        #[arg(long)]
        proficiency: Option<String>,

        /// Store the plan for periodic re-planning
        #[arg(long)]
        save: bool,

        /// Output format: text, json
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Show a learner's stored plan
    Show {
        /// Learner id
        #[arg(long)]
        learner: String,

        /// Output format: text, json
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Record a learner's status on one item
    Mark {
        /// Learner id
        #[arg(long)]
        learner: String,

        /// Item id
        #[arg(long)]
        item: String,

        /// completed, skipped, attempted, or pending
        #[arg(long)]
        status: ItemStatus,
    },

    /// Re-plan every stored plan once
    Replan {
        /// Write the run report as JSON
        #[arg(long)]
        output: Option<PathBuf>,

        /// Output format: text, json, markdown
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Re-plan on a fixed interval until interrupted
    Watch {
        /// Seconds between runs (default: from config)
        #[arg(long)]
        interval_secs: Option<u64>,

        /// Directory to write each run report into
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("studyplan=info".parse().unwrap()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let global = commands::GlobalArgs {
        config: cli.config,
        today: cli.today,
    };

    let result = match cli.command {
        Commands::Init => commands::init::execute(),
        Commands::Validate {
            backlog,
            daily_minutes,
        } => commands::validate::execute(&global, backlog, daily_minutes),
        Commands::Topics { backlog } => commands::topics::execute(&global, backlog),
        Commands::Generate {
            learner,
            until,
            daily_minutes,
            proficiency,
            save,
            format,
        } => {
            commands::generate::execute(
                &global,
                learner,
                until,
                daily_minutes,
                proficiency,
                save,
                format,
            )
            .await
        }
        Commands::Show { learner, format } => {
            commands::show::execute(&global, learner, format).await
        }
        Commands::Mark {
            learner,
            item,
            status,
        } => commands::mark::execute(&global, learner, item, status).await,
        Commands::Replan { output, format } => {
            commands::replan::execute(&global, output, format).await
        }
        Commands::Watch {
            interval_secs,
            output_dir,
        } => commands::watch::execute(&global, interval_secs, output_dir).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
