//! Status snapshot: the last capture outcome, persisted as one JSON object.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;
use serde::{Deserialize, Serialize};
use tracing::warn;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Result of the most recent capture sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    /// Local time the snapshot was produced.
    pub updated_at: String,
    pub ok: bool,
    pub last_capture: Option<String>,
    pub last_capture_time: Option<String>,
    /// Free space on the output volume, GB (10^9 bytes), two decimals.
    pub free_gb: Option<f64>,
    pub error: Option<String>,
}

impl StatusSnapshot {
    /// A published capture.
    pub fn success(path: &Path, free_bytes: Option<u64>) -> Self {
        let now = local_timestamp();
        Self {
            updated_at: now.clone(),
            ok: true,
            last_capture: Some(path.display().to_string()),
            last_capture_time: Some(now),
            free_gb: free_bytes.map(bytes_to_gb),
            error: None,
        }
    }

    /// A capture sequence that exhausted its attempts.
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            updated_at: local_timestamp(),
            ok: false,
            last_capture: None,
            last_capture_time: None,
            free_gb: None,
            error: Some(error.into()),
        }
    }
}

fn local_timestamp() -> String {
    Local::now().format(TIMESTAMP_FORMAT).to_string()
}

fn bytes_to_gb(bytes: u64) -> f64 {
    (bytes as f64 / 1e9 * 100.0).round() / 100.0
}

/// Writes [`StatusSnapshot`]s to a fixed path.
///
/// The file is replaced wholesale through a temporary sibling and a rename.
/// Write failures are logged and swallowed.
#[derive(Debug, Clone)]
pub struct StatusWriter {
    path: PathBuf,
}

impl StatusWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn write(&self, snapshot: &StatusSnapshot) {
        if let Err(e) = self.try_write(snapshot) {
            warn!("status write to {} failed: {}", self.path.display(), e);
        }
    }

    fn try_write(&self, snapshot: &StatusSnapshot) -> std::io::Result<()> {
        let body = serde_json::to_string_pretty(snapshot)?;
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, body)?;
        fs::rename(&tmp, &self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_success_snapshot() {
        let snapshot = StatusSnapshot::success(Path::new("/data/pl-x.jpg"), Some(123_456_789_012));
        assert!(snapshot.ok);
        assert_eq!(snapshot.last_capture.as_deref(), Some("/data/pl-x.jpg"));
        assert_eq!(snapshot.free_gb, Some(123.46));
        assert!(snapshot.error.is_none());
        assert!(snapshot.last_capture_time.is_some());
    }

    #[test]
    fn test_failure_snapshot() {
        let snapshot = StatusSnapshot::failure("capture failed after retries");
        assert!(!snapshot.ok);
        assert!(snapshot.last_capture.is_none());
        assert_eq!(snapshot.error.as_deref(), Some("capture failed after retries"));
    }

    #[test]
    fn test_bytes_to_gb_rounding() {
        assert_eq!(bytes_to_gb(0), 0.0);
        assert_eq!(bytes_to_gb(1_004_000_000), 1.0);
        assert_eq!(bytes_to_gb(2_499_000_000), 2.5);
    }

    #[test]
    fn test_write_replaces_file() {
        let dir = TempDir::new().unwrap();
        let writer = StatusWriter::new(dir.path().join("status.json"));

        writer.write(&StatusSnapshot::failure("first"));
        writer.write(&StatusSnapshot::success(Path::new("/x.jpg"), None));

        let body = fs::read_to_string(writer.path()).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(parsed["ok"], true);
        assert_eq!(parsed["error"], serde_json::Value::Null);
        assert_eq!(parsed["free_gb"], serde_json::Value::Null);
        assert!(parsed["updated_at"].is_string());
        assert!(!dir.path().join("status.json.tmp").exists());
    }

    #[test]
    fn test_write_failure_is_swallowed() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, b"file, not a directory").unwrap();

        let writer = StatusWriter::new(blocker.join("status.json"));
        writer.write(&StatusSnapshot::failure("unwritable"));
        assert!(!writer.path().exists());
    }
}
