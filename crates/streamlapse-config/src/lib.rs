//! # Streamlapse Config
//!
//! Configuration snapshot for the capture daemon: stream source, output
//! layout, capture schedules, housekeeping and daemon tunables.
//!
//! A [`Config`] is an immutable value. Reloading produces a new value which
//! replaces the old one wholesale; nothing mutates a loaded config in place.

mod error;
mod loader;
mod schema;
mod validator;

pub use error::ConfigError;
pub use loader::{normalize_cron, ConfigLoader};
pub use schema::*;
pub use validator::{ConfigValidator, ValidationError, ValidationResult, ValidationWarning};
