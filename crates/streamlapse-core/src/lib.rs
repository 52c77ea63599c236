//! # Streamlapse Core
//!
//! Pieces shared by the capture executor and the housekeeping pipeline.
//!
//! ## Components
//!
//! - [`OutputLayout`] - Where captures, archives, the log and the status file live
//! - [`StatusSnapshot`] / [`StatusWriter`] - Last capture result, rewritten wholesale
//! - [`KeepAwake`] - Best-effort OS idle/sleep prevention

pub mod keep_awake;
pub mod layout;
pub mod status;

pub use keep_awake::{KeepAwake, NoopKeepAwake, SystemKeepAwake};
pub use layout::{parse_dated_name, CapturePaths, OutputLayout, ARCHIVE_EXTENSION, DATE_FORMAT};
pub use status::{StatusSnapshot, StatusWriter};
