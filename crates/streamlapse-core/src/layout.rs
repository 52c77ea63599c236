//! Filesystem layout under the output root.
//!
//! ```text
//! <root>/[<YYYY-MM-DD>/]pl-<YYYY-MM-DD-HH-mm-ss>.jpg
//! <root>/latest.jpg
//! <root>/<YYYY-MM-DD>.zip
//! <root>/timelapse.log
//! <root>/status.json
//! ```

use std::path::{Path, PathBuf};

use chrono::{NaiveDate, NaiveDateTime};

use streamlapse_config::OutputConfig;

/// Calendar date format used for day directories and archives.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Extension of day archives.
pub const ARCHIVE_EXTENSION: &str = "zip";

const CAPTURE_PREFIX: &str = "pl-";
const CAPTURE_STAMP_FORMAT: &str = "%Y-%m-%d-%H-%M-%S";
const TEMP_SUFFIX: &str = ".part";

/// Paths for one capture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturePaths {
    /// Directory holding the capture (created lazily).
    pub dir: PathBuf,
    /// Published file name.
    pub final_path: PathBuf,
    /// Sibling the capture tool writes to before the rename.
    pub temp_path: PathBuf,
}

/// Output root and naming rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    root: PathBuf,
    date_subfolders: bool,
    latest_name: String,
    log_name: String,
    status_name: String,
}

impl OutputLayout {
    /// Layout with the default file names.
    pub fn new(root: impl Into<PathBuf>, date_subfolders: bool) -> Self {
        let defaults = OutputConfig::default();
        Self {
            root: root.into(),
            date_subfolders,
            latest_name: defaults.latest_name,
            log_name: defaults.log_name,
            status_name: defaults.status_name,
        }
    }

    pub fn from_config(config: &OutputConfig) -> Self {
        Self {
            root: config.root_path(),
            date_subfolders: config.date_subfolders,
            latest_name: config.latest_name.clone(),
            log_name: config.log_name.clone(),
            status_name: config.status_name.clone(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn date_subfolders(&self) -> bool {
        self.date_subfolders
    }

    /// Directory receiving captures taken on `date`.
    pub fn dir_for(&self, date: NaiveDate) -> PathBuf {
        if self.date_subfolders {
            self.root.join(date.format(DATE_FORMAT).to_string())
        } else {
            self.root.clone()
        }
    }

    /// Final and temporary paths for a capture taken at local time `at`.
    pub fn capture_paths(&self, at: NaiveDateTime) -> CapturePaths {
        let dir = self.dir_for(at.date());
        let name = format!("{}{}.jpg", CAPTURE_PREFIX, at.format(CAPTURE_STAMP_FORMAT));
        CapturePaths {
            final_path: dir.join(&name),
            temp_path: dir.join(format!("{}{}", name, TEMP_SUFFIX)),
            dir,
        }
    }

    pub fn latest_path(&self) -> PathBuf {
        self.root.join(&self.latest_name)
    }

    /// Archive for the day directory of `date`.
    pub fn archive_path(&self, date: NaiveDate) -> PathBuf {
        self.root
            .join(format!("{}.{}", date.format(DATE_FORMAT), ARCHIVE_EXTENSION))
    }

    pub fn log_path(&self) -> PathBuf {
        self.root.join(&self.log_name)
    }

    pub fn status_path(&self) -> PathBuf {
        self.root.join(&self.status_name)
    }
}

/// Parse a `YYYY-MM-DD` directory name or archive stem.
pub fn parse_dated_name(name: &str) -> Option<NaiveDate> {
    if name.len() != 10 {
        return None;
    }
    NaiveDate::parse_from_str(name, DATE_FORMAT).ok()
}
