//! # Streamlapse Daemon
//!
//! Wires the scheduler to the capture executor and housekeeping pipeline,
//! and owns the process lifecycle: config reload on file change or SIGHUP,
//! graceful shutdown on SIGTERM/SIGINT.
//!
//! Overlapping firings of the same job kind are governed by
//! `daemon.overlap`: `skip` (default) drops a firing while the previous run
//! of its kind is still going, `allow` runs them side by side.

mod daemon;
mod error;
mod orchestrator;
mod signal;

pub use daemon::Daemon;
pub use error::DaemonError;
pub use orchestrator::{load_config, log_validation, Orchestrator};
pub use signal::{DaemonSignal, SignalHandler};
