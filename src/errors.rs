// src/errors.rs

//! Crate-wide error type and result alias.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StepwiseError {
    /// A task procedure did not reach one of its required suspension points,
    /// or declared something the protocol does not allow.
    #[error("{task}: {reason}")]
    Declaration { task: String, reason: String },

    #[error("Cycle detected in task graph: {0}")]
    Cycle(String),

    #[error("Task not found: {0}")]
    TaskNotFound(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl StepwiseError {
    pub(crate) fn declaration(task: impl Into<String>, reason: impl Into<String>) -> Self {
        StepwiseError::Declaration {
            task: task.into(),
            reason: reason.into(),
        }
    }

    /// Failure to reach the suspension point producing `what`.
    pub(crate) fn missing(task: impl Into<String>, what: &str) -> Self {
        Self::declaration(task, format!("Failed to get {what}: Check declaration"))
    }

    /// True for errors caused by how a task was declared, as opposed to
    /// configuration or IO problems.
    pub fn is_declaration(&self) -> bool {
        matches!(
            self,
            StepwiseError::Declaration { .. } | StepwiseError::Cycle(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, StepwiseError>;
