//! Configuration schema definitions.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

mod schema_jobs;

pub use schema_jobs::*;

use crate::loader::ConfigLoader;

/// Shared default helper used by submodules.
pub(crate) fn default_true() -> bool {
    true
}

/// Root configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub stream: StreamConfig,

    #[serde(default)]
    pub output: OutputConfig,

    #[serde(default)]
    pub housekeeping: HousekeepingConfig,

    /// Capture schedules, in firing-tie order.
    #[serde(default = "default_schedules")]
    pub schedules: Vec<ScheduleEntry>,

    #[serde(default)]
    pub daemon: DaemonConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            stream: StreamConfig::default(),
            output: OutputConfig::default(),
            housekeeping: HousekeepingConfig::default(),
            schedules: default_schedules(),
            daemon: DaemonConfig::default(),
        }
    }
}

/// Stream source and capture tool settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamConfig {
    /// Live stream URL handed to the capture tool.
    #[serde(default)]
    pub url: String,

    /// Capture tool executable.
    #[serde(default = "default_tool")]
    pub tool: String,

    /// Flags placed before the input arguments.
    #[serde(default = "default_common_args")]
    pub common_args: Vec<String>,

    /// JPEG quality (`-q:v`), lower is better, 1-31.
    #[serde(default = "default_quality")]
    pub quality: String,

    /// Wall-clock limit for one capture attempt.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl StreamConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            tool: default_tool(),
            common_args: default_common_args(),
            quality: default_quality(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_tool() -> String {
    "ffmpeg".to_string()
}

fn default_common_args() -> Vec<String> {
    ["-hide_banner", "-loglevel", "error", "-y", "-rw_timeout", "15000000"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_quality() -> String {
    "2".to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

/// Output root and file naming.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Output root; `~` is expanded.
    #[serde(default = "default_root")]
    pub root: String,

    /// Partition captures into one directory per calendar day.
    #[serde(default = "default_true")]
    pub date_subfolders: bool,

    #[serde(default = "default_latest_name")]
    pub latest_name: String,

    #[serde(default = "default_log_name")]
    pub log_name: String,

    #[serde(default = "default_status_name")]
    pub status_name: String,
}

impl OutputConfig {
    /// Output root with `~` expanded.
    pub fn root_path(&self) -> PathBuf {
        PathBuf::from(ConfigLoader::expand_path(&self.root))
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            date_subfolders: default_true(),
            latest_name: default_latest_name(),
            log_name: default_log_name(),
            status_name: default_status_name(),
        }
    }
}

fn default_root() -> String {
    "~/streamlapse".to_string()
}

fn default_latest_name() -> String {
    "latest.jpg".to_string()
}

fn default_log_name() -> String {
    "timelapse.log".to_string()
}

fn default_status_name() -> String {
    "status.json".to_string()
}

#[cfg(test)]
#[path = "schema_tests.rs"]
mod tests;
