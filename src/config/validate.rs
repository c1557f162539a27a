// src/config/validate.rs

use crate::config::model::{ConfigFile, RawConfigFile, RunSection};
use crate::errors::{Result, StepwiseError};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = StepwiseError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_run_section(&raw.run)?;
        Ok(ConfigFile::new_unchecked(raw.run))
    }
}

fn validate_run_section(run: &RunSection) -> Result<()> {
    if run.workers == 0 {
        return Err(StepwiseError::ConfigError(
            "[run].workers must be >= 1 (got 0)".to_string(),
        ));
    }

    if run.task_timeout_secs == Some(0) {
        return Err(StepwiseError::ConfigError(
            "[run].task_timeout_secs must be >= 1 (got 0); omit it to disable the timeout"
                .to_string(),
        ));
    }

    Ok(())
}
