use clap::{Parser, Subcommand};
use std::path::PathBuf;

const HELP_EPILOG: &str = r#"Server options can also be provided via environment variables:
  CONFIG_PATH    (default: ./config.yaml, optional)
  DB_PATH        (default: data/studylog.db)
  PORT           (default: 5151 or config.listen_port)
  GEMINI_API_KEY (enables the study assistant when config has no key)
  RUST_LOG       (default: info)
"#;

#[derive(Debug, Parser)]
#[command(
    name = "studylog-server",
    version,
    about = "StudyLog server",
    long_about = None,
    after_long_help = HELP_EPILOG,
)]
pub struct Cli {
    /// Optional subcommand. Without one, runs the server.
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Parse and validate a config file, then exit
    CheckConfig {
        /// Config file to check (defaults to $CONFIG_PATH or ./config.yaml)
        #[arg(long)]
        path: Option<PathBuf>,
    },
}
