//! Schedule, housekeeping and daemon configuration types.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::default_true;

/// One capture schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    /// Job ID, used in logs.
    pub id: String,
    /// Cron expression (5 fields, or 6/7 with seconds).
    pub cron: String,
}

impl ScheduleEntry {
    pub fn new(id: impl Into<String>, cron: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            cron: cron.into(),
        }
    }
}

pub(crate) fn default_schedules() -> Vec<ScheduleEntry> {
    vec![
        ScheduleEntry::new("cap_evening", "0 18-23 * * *"),
        ScheduleEntry::new("cap_overnight", "0 0-6 * * *"),
        ScheduleEntry::new("cap_morning_rush", "0,10,20,30,40,50 7-8 * * *"),
        ScheduleEntry::new("cap_daytime", "0 9-15 * * *"),
        ScheduleEntry::new("cap_evening_rush", "0,10,20,30,40,50 16-17 * * *"),
    ]
}

/// Archival and retention.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HousekeepingConfig {
    /// When housekeeping runs.
    #[serde(default = "default_housekeeping_cron")]
    pub cron: String,

    /// Dated artifacts older than this many days are deleted. `0` disables pruning.
    #[serde(default = "default_retention_days")]
    pub retention_days: u32,

    /// Zip yesterday's directory and remove it (date subfolders only).
    #[serde(default)]
    pub archive_yesterday: bool,
}

impl Default for HousekeepingConfig {
    fn default() -> Self {
        Self {
            cron: default_housekeeping_cron(),
            retention_days: default_retention_days(),
            archive_yesterday: false,
        }
    }
}

fn default_housekeeping_cron() -> String {
    "10 3 * * *".to_string()
}

fn default_retention_days() -> u32 {
    30
}

/// What happens when a job fires while the previous run of its kind is still going.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverlapPolicy {
    /// Skip the new firing and log it.
    #[default]
    Skip,
    /// Start the new run alongside the old one.
    Allow,
}

/// Daemon behaviour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// Take one capture right after startup.
    #[serde(default = "default_true")]
    pub capture_on_startup: bool,

    /// Liveness heartbeat schedule. Empty disables the heartbeat.
    #[serde(default = "default_heartbeat_cron")]
    pub heartbeat_cron: String,

    /// Config file changes within this window coalesce into one reload.
    #[serde(default = "default_reload_debounce_ms")]
    pub reload_debounce_ms: u64,

    #[serde(default)]
    pub overlap: OverlapPolicy,

    /// Backward window used when deciding which jobs are due.
    #[serde(default = "default_grace_secs")]
    pub grace_secs: u64,
}

impl DaemonConfig {
    pub fn reload_debounce(&self) -> Duration {
        Duration::from_millis(self.reload_debounce_ms)
    }

    pub fn grace(&self) -> Duration {
        Duration::from_secs(self.grace_secs)
    }
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            capture_on_startup: default_true(),
            heartbeat_cron: default_heartbeat_cron(),
            reload_debounce_ms: default_reload_debounce_ms(),
            overlap: OverlapPolicy::default(),
            grace_secs: default_grace_secs(),
        }
    }
}

fn default_heartbeat_cron() -> String {
    "0 */5 * * * *".to_string()
}

fn default_reload_debounce_ms() -> u64 {
    500
}

fn default_grace_secs() -> u64 {
    5
}
