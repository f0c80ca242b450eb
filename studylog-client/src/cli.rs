use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use studylog_shared::domain::StudyType;
use studylog_shared::stats::YearMonth;

const HELP_EPILOG: &str = r#"Server URL resolution order:
  1) --server URL
  2) server_url in the config file
  3) http://127.0.0.1:5151

Config resolution order:
  1) --config/-c PATH
  2) $STUDYLOG_CONFIG
  3) platform default, e.g. ~/.config/studylog/client.yaml

Months are written YYYY-MM and default to the current month.
"#;

#[derive(Debug, Parser)]
#[command(
    name = "studylog",
    version,
    about = "Command-line client for a StudyLog server",
    long_about = None,
    after_long_help = HELP_EPILOG,
)]
pub struct Cli {
    /// Path to YAML config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
    /// Server URL, overriding the config file
    #[arg(short, long, global = true)]
    pub server: Option<String>,
    /// Print raw JSON instead of text
    #[arg(long, global = true)]
    pub json: bool,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Log a study session
    Record {
        /// Subject studied
        subject: String,
        #[arg(long, default_value_t = 0)]
        hours: i64,
        #[arg(long, default_value_t = 0)]
        minutes: i64,
        /// "school" or "self"
        #[arg(long = "type", default_value = "self")]
        study_type: StudyType,
        /// Day of the session (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long)]
        comment: Option<String>,
    },
    /// List the sessions of a month
    Records {
        #[arg(long)]
        month: Option<YearMonth>,
    },
    /// Delete a session by id
    DeleteRecord { id: i32 },
    /// Manage subjects (lists them by default)
    Subjects {
        #[command(subcommand)]
        action: Option<SubjectsCommand>,
    },
    /// Set or show a monthly goal
    Goal {
        #[command(subcommand)]
        action: GoalCommand,
    },
    /// Study-time statistics
    Stats {
        #[arg(value_enum)]
        view: StatsView,
        #[arg(long)]
        month: Option<YearMonth>,
    },
    /// Progress towards the monthly goal
    Progress {
        #[arg(long)]
        month: Option<YearMonth>,
    },
    /// Ask the study assistant
    Chat {
        #[arg(required = true, num_args = 1..)]
        message: Vec<String>,
    },
    /// Recent assistant conversations
    History,
    /// Save the server URL to the config file
    SetServer { url: String },
}

#[derive(Debug, Subcommand)]
pub enum SubjectsCommand {
    List,
    Add {
        name: String,
        #[arg(long)]
        comment: Option<String>,
    },
    Delete {
        id: i32,
    },
}

#[derive(Debug, Subcommand)]
pub enum GoalCommand {
    Set {
        /// Target hours for the month
        hours: f64,
        #[arg(long)]
        month: Option<YearMonth>,
    },
    Show {
        #[arg(long)]
        month: Option<YearMonth>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StatsView {
    /// Hours per week of the month
    Weekly,
    /// Hours for the trailing twelve months
    Monthly,
    /// Hours per day of the week
    Weekday,
    /// Hours per subject
    Subjects,
}
