//! Housekeeping error types.

use std::path::PathBuf;

use thiserror::Error;

/// Errors from a single archive or prune step.
///
/// Each one is confined to the entry it concerns; the pipeline logs it and
/// moves on.
#[derive(Debug, Error)]
pub enum HousekeepingError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Zip error: {0}")]
    Zip(String),

    #[error("Directory walk error: {0}")]
    Walk(#[from] walkdir::Error),
}

impl HousekeepingError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<zip::result::ZipError> for HousekeepingError {
    fn from(err: zip::result::ZipError) -> Self {
        Self::Zip(err.to_string())
    }
}

pub type HousekeepingResult<T> = Result<T, HousekeepingError>;
