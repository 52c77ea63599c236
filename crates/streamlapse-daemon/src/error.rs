//! Daemon-related errors.

use thiserror::Error;

use streamlapse_config::ConfigError;
use streamlapse_runloop::RunLoopError;

/// Errors that can stop the daemon from starting.
///
/// Once running, job failures are logged and never surface here.
#[derive(Debug, Error)]
pub enum DaemonError {
    /// Failed to set up signal handlers.
    #[error("Failed to set up signal handlers: {0}")]
    SignalSetup(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Scheduler or reload plumbing error.
    #[error("Scheduler error: {0}")]
    RunLoop(#[from] RunLoopError),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
