//! Error types for the scheduler module.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur in the scheduler and its reload plumbing.
#[derive(Debug, Error)]
pub enum RunLoopError {
    /// A cron expression failed to parse.
    #[error("Invalid cron expression for job {id} ('{expression}'): {reason}")]
    InvalidCron {
        id: String,
        expression: String,
        reason: String,
    },

    /// The config path has no file name or parent directory to watch.
    #[error("Cannot watch config path: {0}")]
    ConfigPath(PathBuf),

    /// A debouncer was created outside a Tokio runtime.
    #[error("No Tokio runtime available")]
    NoRuntime,

    /// File watcher setup failed.
    #[error("File watcher error: {0}")]
    Watcher(#[from] notify::Error),
}

/// Result type for scheduler operations.
pub type RunLoopResult<T> = Result<T, RunLoopError>;
