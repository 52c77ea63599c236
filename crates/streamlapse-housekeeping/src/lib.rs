//! # Streamlapse Housekeeping
//!
//! Keeps the output root bounded: zips the previous day's directory and
//! deletes dated artifacts past the retention window. Archive and prune have
//! separate failure domains and every failure is confined to one entry.

mod archive;
mod error;
mod housekeeper;
mod prune;

pub use archive::{archive_day, ArchiveOutcome};
pub use error::{HousekeepingError, HousekeepingResult};
pub use housekeeper::{Housekeeper, HousekeepingReport};
pub use prune::{cutoff_date, prune, PruneStats};
