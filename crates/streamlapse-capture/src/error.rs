//! Capture error types.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised inside a single capture attempt.
///
/// These never escape a capture sequence; they are folded into the attempt
/// outcome and, after the last attempt, into the status snapshot.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("Failed to create output directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to start {tool}: {source}")]
    Spawn {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Capture tool exited successfully but wrote no file at {0}")]
    MissingOutput(PathBuf),

    #[error("Failed to publish {path}: {source}")]
    Publish {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
