// src/logging.rs

//! Logging setup for `stepwise` using `tracing` + `tracing-subscriber`.
//!
//! Priority for determining the log level:
//! 1. `--log-level` CLI flag (if provided)
//! 2. `-v/--verbose` (debug)
//! 3. `STEPWISE_LOG` environment variable (e.g. "info", "debug")
//! 4. default to `info`
//!
//! Logs are sent to STDERR so that stdout stays free for `--graph` and
//! `--show` output.

use anyhow::{Result, anyhow};
use tracing_subscriber::fmt;

use crate::cli::LogLevel;

/// Environment variable consulted when no level is given on the command line.
pub const LOG_ENV: &str = "STEPWISE_LOG";

/// Initialise global logging subscriber.
///
/// Safe to call once at startup; a second call returns an error.
pub fn init_logging(cli_level: Option<LogLevel>, verbose: bool) -> Result<()> {
    let level = resolve_level(cli_level, verbose, std::env::var(LOG_ENV).ok().as_deref());

    fmt()
        .with_max_level(level)
        .with_target(verbose)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow!("failed to install log subscriber: {e}"))?;

    Ok(())
}

fn resolve_level(cli_level: Option<LogLevel>, verbose: bool, env: Option<&str>) -> tracing::Level {
    match (cli_level, verbose) {
        (Some(lvl), _) => level_from_log_level(lvl),
        (None, true) => tracing::Level::DEBUG,
        (None, false) => env
            .and_then(parse_level_str)
            .unwrap_or(tracing::Level::INFO),
    }
}

fn level_from_log_level(lvl: LogLevel) -> tracing::Level {
    match lvl {
        LogLevel::Error => tracing::Level::ERROR,
        LogLevel::Warn => tracing::Level::WARN,
        LogLevel::Info => tracing::Level::INFO,
        LogLevel::Debug => tracing::Level::DEBUG,
        LogLevel::Trace => tracing::Level::TRACE,
    }
}

fn parse_level_str(s: &str) -> Option<tracing::Level> {
    match s.trim().to_lowercase().as_str() {
        "error" => Some(tracing::Level::ERROR),
        "warn" | "warning" => Some(tracing::Level::WARN),
        "info" => Some(tracing::Level::INFO),
        "debug" => Some(tracing::Level::DEBUG),
        "trace" => Some(tracing::Level::TRACE),
        _ => None,
    }
}
