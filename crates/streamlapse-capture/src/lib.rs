//! # Streamlapse Capture
//!
//! Grabs one still frame from the configured stream per invocation.
//!
//! A sequence makes up to three attempts. Each attempt runs the capture tool
//! into a temporary file under a hard timeout and publishes it with a rename
//! only when the tool exits cleanly. The sequence writes exactly one status
//! snapshot, success or failure.

mod command;
mod disk;
mod error;
mod executor;

pub use command::capture_args;
pub use disk::free_space;
pub use error::CaptureError;
pub use executor::{
    AttemptOutcome, CaptureAttempt, CaptureExecutor, CaptureResult, DEFAULT_BACKOFF,
    DEFAULT_MAX_ATTEMPTS,
};
