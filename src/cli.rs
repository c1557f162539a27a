// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Command-line arguments for `stepwise`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "stepwise",
    version,
    about = "Run a task and everything it requires, skipping what is already done.",
    long_about = None
)]
pub struct CliArgs {
    /// Task to run.
    #[arg(value_name = "TASK", required_unless_present = "show")]
    pub task: Option<String>,

    /// Task arguments. Each is parsed as JSON if possible, else taken as a
    /// string.
    #[arg(value_name = "ARGS", trailing_var_arg = true, allow_hyphen_values = true)]
    pub args: Vec<String>,

    /// Log what would run, but don't run any task bodies.
    #[arg(short, long)]
    pub dry_run: bool,

    /// Print the task graph in Graphviz DOT format after the run.
    #[arg(short, long)]
    pub graph: bool,

    /// List available tasks and exit.
    #[arg(short, long)]
    pub show: bool,

    /// Number of concurrent workers (default: 1, or `[run].workers`).
    #[arg(short, long, value_name = "N", value_parser = clap::value_parser!(u32).range(1..))]
    pub workers: Option<u32>,

    /// Verbose (debug) logging.
    #[arg(short, long)]
    pub verbose: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `-v`, `STEPWISE_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Path to a config file (TOML).
    ///
    /// Default: `stepwise.toml` in the current working directory, if present.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<CliArgs, clap::Error> {
        CliArgs::try_parse_from(std::iter::once("stepwise").chain(args.iter().copied()))
    }

    #[test]
    fn parses_task_with_arguments_and_flags() {
        let args = parse(&["-d", "-w", "4", "a_cup_of_tea", "/tmp/tea", "3"]).expect("valid");
        assert_eq!(args.task.as_deref(), Some("a_cup_of_tea"));
        assert_eq!(args.args, vec!["/tmp/tea", "3"]);
        assert!(args.dry_run);
        assert_eq!(args.workers, Some(4));
    }

    #[test]
    fn task_is_required_unless_showing() {
        assert!(parse(&[]).is_err());
        assert!(parse(&["--show"]).is_ok());
    }

    #[test]
    fn zero_workers_is_rejected() {
        assert!(parse(&["-w", "0", "t"]).is_err());
    }
}
