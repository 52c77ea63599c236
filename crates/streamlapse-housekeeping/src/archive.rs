//! Zip one elapsed day directory into `<root>/<date>.zip`.

use std::fs::{self, File};
use std::io;
use std::path::{Component, Path, PathBuf};

use chrono::NaiveDate;
use tracing::{info, warn};
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use streamlapse_core::OutputLayout;

use crate::error::{HousekeepingError, HousekeepingResult};

const PARTIAL_SUFFIX: &str = "part";

/// What the archive step did for one day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArchiveOutcome {
    /// Archival is off, or the layout has no day directories.
    Disabled,
    /// No directory for that day.
    Missing,
    /// The archive already exists. Nothing was touched.
    AlreadyArchived,
    /// The directory holds no bytes. No archive is left behind and the
    /// directory stays.
    Empty,
    Archived {
        files: usize,
        raw_bytes: u64,
        compressed_bytes: u64,
    },
    /// Aborted; the source directory is kept unless the archive was complete.
    Failed(String),
}

#[derive(Debug, Default)]
struct ArchiveStats {
    files: usize,
    raw_bytes: u64,
}

/// Archive the directory for `date` and delete it once the archive is complete.
///
/// Idempotent: an existing archive short-circuits the step.
pub fn archive_day(layout: &OutputLayout, date: NaiveDate) -> ArchiveOutcome {
    if !layout.date_subfolders() {
        return ArchiveOutcome::Disabled;
    }

    let dir = layout.dir_for(date);
    let archive = layout.archive_path(date);
    if !dir.is_dir() {
        return ArchiveOutcome::Missing;
    }
    if archive.exists() {
        return ArchiveOutcome::AlreadyArchived;
    }

    let partial = partial_path(&archive);
    let stats = match write_archive(&dir, &partial) {
        Ok(stats) => stats,
        Err(e) => {
            remove_partial(&partial);
            warn!("Zip error for {}: {}", dir.display(), e);
            return ArchiveOutcome::Failed(e.to_string());
        }
    };

    if stats.raw_bytes == 0 {
        remove_partial(&partial);
        info!("Skipped archive of {}: no data", dir.display());
        return ArchiveOutcome::Empty;
    }

    if let Err(e) = fs::rename(&partial, &archive) {
        remove_partial(&partial);
        warn!("Zip error for {}: {}", dir.display(), e);
        return ArchiveOutcome::Failed(HousekeepingError::io(&archive, e).to_string());
    }

    let compressed_bytes = fs::metadata(&archive).map(|m| m.len()).unwrap_or(0);
    info!(
        "Zipped {} -> {} ({} files, {} -> {} bytes, {:.1}%)",
        display_name(&dir),
        display_name(&archive),
        stats.files,
        stats.raw_bytes,
        compressed_bytes,
        compressed_bytes as f64 * 100.0 / stats.raw_bytes as f64
    );

    if let Err(e) = fs::remove_dir_all(&dir) {
        warn!("Archived {} but could not remove it: {}", dir.display(), e);
        return ArchiveOutcome::Failed(HousekeepingError::io(&dir, e).to_string());
    }

    ArchiveOutcome::Archived {
        files: stats.files,
        raw_bytes: stats.raw_bytes,
        compressed_bytes,
    }
}

fn write_archive(dir: &Path, target: &Path) -> HousekeepingResult<ArchiveStats> {
    let file = File::create(target).map_err(|e| HousekeepingError::io(target, e))?;
    let mut zip = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut stats = ArchiveStats::default();

    let mut entries: Vec<PathBuf> = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1) {
        let entry = entry?;
        if entry.file_type().is_file() {
            entries.push(entry.into_path());
        }
    }
    entries.sort();

    for path in entries {
        let Some(name) = entry_name(dir, &path) else {
            continue;
        };
        let mut source = File::open(&path).map_err(|e| HousekeepingError::io(&path, e))?;
        zip.start_file(name, options)?;
        let copied = io::copy(&mut source, &mut zip).map_err(|e| HousekeepingError::io(&path, e))?;
        stats.files += 1;
        stats.raw_bytes += copied;
    }

    zip.finish()?;
    Ok(stats)
}

/// Archive member name: path relative to `base`, `/`-separated.
fn entry_name(base: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(base).ok()?;
    let parts: Vec<String> = relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();
    (!parts.is_empty()).then(|| parts.join("/"))
}

fn partial_path(archive: &Path) -> PathBuf {
    let mut name = archive.as_os_str().to_os_string();
    name.push(".");
    name.push(PARTIAL_SUFFIX);
    PathBuf::from(name)
}

fn remove_partial(path: &Path) {
    if let Err(e) = fs::remove_file(path) {
        if e.kind() != io::ErrorKind::NotFound {
            warn!("Could not remove {}: {}", path.display(), e);
        }
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
#[path = "archive_tests.rs"]
mod tests;
