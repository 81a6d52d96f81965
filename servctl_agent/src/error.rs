//! Failure taxonomy. Every variant is turned into a structured result at the
//! boundary of the operation that produced it; none of them escape to callers.

use std::io;
use std::path::PathBuf;

use crate::types::SupervisorAction;

#[derive(Debug, thiserror::Error)]
pub enum ControlError {
    #[error("sampling failed: {0}")]
    Sampling(String),

    #[error("process scan failed: {0}")]
    Detection(String),

    #[error("failed to invoke {program}: {source}")]
    Invocation {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("Failed to {action} server: {stderr}")]
    Rejected {
        action: SupervisorAction,
        stderr: String,
    },

    #[error("Update script not found. Please create {}", .0.display())]
    UpdateScriptMissing(PathBuf),

    #[error("Update failed: {0}")]
    UpdateFailed(String),

    #[error("invalid log pattern {pattern}: {source}")]
    LogPattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    #[error("failed to read {}: {source}", .path.display())]
    LogRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("background task failed: {0}")]
    TaskFailed(String),
}

impl From<tokio::task::JoinError> for ControlError {
    fn from(e: tokio::task::JoinError) -> Self {
        ControlError::TaskFailed(e.to_string())
    }
}
