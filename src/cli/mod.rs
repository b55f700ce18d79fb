//! Command line interface.

pub mod config;
pub mod output;
pub mod progress;
pub mod run;
pub mod tools;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

pub use config::{cmd_config, ConfigArgs};
pub use output::OutputFormat;
pub use run::{cmd_run, RunArgs};
pub use tools::{cmd_tools, ToolsArgs};

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("GIT_HASH"),
    ", built ",
    env!("BUILD_DATE"),
    ")"
);

/// WebPilot - plan, act in a browser, adapt
#[derive(Parser, Debug)]
#[command(author, version, long_version = LONG_VERSION, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Log level
    #[arg(short, long, default_value = "info", global = true)]
    pub log_level: String,

    /// Enable debug mode
    #[arg(short, long, global = true)]
    pub debug: bool,

    /// Log line format
    #[arg(long, value_enum, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Output format
    #[arg(short, long, value_enum, default_value = "human", global = true)]
    pub output: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Execute a goal in a fresh browser session
    Run(RunArgs),
    /// List the browser tools available to the planner
    Tools(ToolsArgs),
    /// Inspect the effective configuration
    Config(ConfigArgs),
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn run_accepts_goal_and_ceiling() {
        let cli = Cli::parse_from([
            "webpilot",
            "run",
            "--goal",
            "open example.com",
            "--max-iterations",
            "4",
            "--output",
            "json",
        ]);
        assert_eq!(cli.output, OutputFormat::Json);
        match cli.command {
            Commands::Run(args) => {
                assert_eq!(args.goal, "open example.com");
                assert_eq!(args.max_iterations, Some(4));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }
}
