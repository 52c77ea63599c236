//! Retention: delete dated artifacts older than the cutoff.

use std::fs::{self, DirEntry};
use std::path::Path;
use std::time::SystemTime;

use chrono::{Days, Local, NaiveDate, TimeZone};
use tracing::{debug, info, warn};

use streamlapse_core::{parse_dated_name, OutputLayout, ARCHIVE_EXTENSION};

use crate::error::{HousekeepingError, HousekeepingResult};

const CAPTURE_EXTENSION: &str = "jpg";

/// Pruning statistics.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PruneStats {
    pub removed: usize,
    pub failures: usize,
}

/// First date that is kept: `today - retention_days`.
pub fn cutoff_date(today: NaiveDate, retention_days: u32) -> Option<NaiveDate> {
    today.checked_sub_days(Days::new(u64::from(retention_days)))
}

/// Delete every immediate child of the output root dated strictly before the
/// cutoff.
///
/// Day directories (date subfolders only) and day archives are dated by name;
/// names that are not dates are never touched. In the flat layout captures
/// are dated by modification time. `retention_days == 0` disables pruning.
/// A failed deletion is logged and counted; it never stops the pass.
pub fn prune(layout: &OutputLayout, today: NaiveDate, retention_days: u32) -> PruneStats {
    let mut stats = PruneStats::default();
    if retention_days == 0 {
        debug!("Retention disabled, skipping prune");
        return stats;
    }
    let Some(cutoff) = cutoff_date(today, retention_days) else {
        return stats;
    };

    let entries = match fs::read_dir(layout.root()) {
        Ok(entries) => entries,
        Err(e) => {
            warn!("Prune error: cannot list {}: {}", layout.root().display(), e);
            return stats;
        }
    };

    let latest = layout.latest_path();
    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Prune error: {}", e);
                stats.failures += 1;
                continue;
            }
        };
        if entry.path() == latest {
            continue;
        }
        match prune_entry(layout, &entry, cutoff) {
            Ok(true) => stats.removed += 1,
            Ok(false) => {}
            Err(e) => {
                warn!("Prune error: {}", e);
                stats.failures += 1;
            }
        }
    }

    stats
}

fn prune_entry(layout: &OutputLayout, entry: &DirEntry, cutoff: NaiveDate) -> HousekeepingResult<bool> {
    let path = entry.path();
    let file_type = entry
        .file_type()
        .map_err(|e| HousekeepingError::io(&path, e))?;
    let name = entry.file_name().to_string_lossy().into_owned();

    if file_type.is_dir() {
        if !layout.date_subfolders() {
            return Ok(false);
        }
        return match parse_dated_name(&name) {
            Some(date) if date < cutoff => {
                fs::remove_dir_all(&path).map_err(|e| HousekeepingError::io(&path, e))?;
                info!("Pruned folder {}", path.display());
                Ok(true)
            }
            _ => Ok(false),
        };
    }

    if !file_type.is_file() {
        return Ok(false);
    }

    if let Some(date) = archive_date(&path) {
        if date < cutoff {
            fs::remove_file(&path).map_err(|e| HousekeepingError::io(&path, e))?;
            info!("Pruned archive {}", path.display());
            return Ok(true);
        }
        return Ok(false);
    }

    if !layout.date_subfolders() && has_extension(&path, CAPTURE_EXTENSION) {
        let modified = entry
            .metadata()
            .and_then(|m| m.modified())
            .map_err(|e| HousekeepingError::io(&path, e))?;
        if modified < start_of_day(cutoff) {
            fs::remove_file(&path).map_err(|e| HousekeepingError::io(&path, e))?;
            debug!("Pruned capture {}", path.display());
            return Ok(true);
        }
    }

    Ok(false)
}

/// Date of a `<YYYY-MM-DD>.zip` archive.
fn archive_date(path: &Path) -> Option<NaiveDate> {
    if !has_extension(path, ARCHIVE_EXTENSION) {
        return None;
    }
    parse_dated_name(&path.file_stem()?.to_string_lossy())
}

fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension()
        .is_some_and(|e| e.to_string_lossy().eq_ignore_ascii_case(ext))
}

/// Local midnight at the start of `date`.
fn start_of_day(date: NaiveDate) -> SystemTime {
    date.and_hms_opt(0, 0, 0)
        .and_then(|midnight| Local.from_local_datetime(&midnight).earliest())
        .map(SystemTime::from)
        .unwrap_or(SystemTime::UNIX_EPOCH)
}

#[cfg(test)]
#[path = "prune_tests.rs"]
mod tests;
