//! Error types for launching the child process.

use std::path::PathBuf;
use thiserror::Error;

/// Errors from spawning or waiting on the child.
#[derive(Debug, Error)]
pub enum LaunchError {
    /// The target file does not exist.
    #[error("File not found: {}", path.display())]
    TargetNotFound {
        /// The path that was looked up.
        path: PathBuf,
    },

    /// The interpreter could not be found on PATH.
    #[error("Interpreter '{program}' not found: {source}")]
    InterpreterNotFound {
        /// Program name as configured.
        program: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Spawning failed for another reason.
    #[error("Failed to start '{program}': {source}")]
    SpawnFailed {
        /// Program name as configured.
        program: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Waiting for the child failed.
    #[error("Failed to wait for child process: {0}")]
    WaitFailed(#[source] std::io::Error),
}

impl LaunchError {
    /// Whether the failure is a missing file (target or interpreter).
    pub fn is_missing_file(&self) -> bool {
        matches!(
            self,
            LaunchError::TargetNotFound { .. } | LaunchError::InterpreterNotFound { .. }
        )
    }
}
