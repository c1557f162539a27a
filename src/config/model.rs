// src/config/model.rs

use std::time::Duration;

use serde::Deserialize;

/// Configuration as read from a TOML file, before validation.
///
/// ```toml
/// [run]
/// workers = 4
/// dry_run = false
/// task_timeout_secs = 30
/// ```
///
/// All sections are optional and have reasonable defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawConfigFile {
    #[serde(default)]
    pub run: RunSection,
}

/// `[run]` section: defaults for how tasks get executed.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunSection {
    /// Size of the worker pool. `1` evaluates nodes one by one in
    /// topological order.
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Log what would run instead of running it.
    #[serde(default)]
    pub dry_run: bool,

    /// Give up on a task body after this many seconds.
    #[serde(default)]
    pub task_timeout_secs: Option<u64>,
}

fn default_workers() -> usize {
    1
}

impl Default for RunSection {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            dry_run: false,
            task_timeout_secs: None,
        }
    }
}

impl RunSection {
    pub fn task_timeout(&self) -> Option<Duration> {
        self.task_timeout_secs.map(Duration::from_secs)
    }
}

/// Validated configuration. Only obtainable through
/// `ConfigFile::try_from(RawConfigFile)` or [`ConfigFile::default`].
#[derive(Debug, Clone, Default)]
pub struct ConfigFile {
    run: RunSection,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(run: RunSection) -> Self {
        Self { run }
    }

    pub fn run(&self) -> &RunSection {
        &self.run
    }
}
