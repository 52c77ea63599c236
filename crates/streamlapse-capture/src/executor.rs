//! Capture sequence: bounded attempts, hard timeout, atomic publish.

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use tokio::fs;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use streamlapse_config::Config;
use streamlapse_core::{
    CapturePaths, KeepAwake, OutputLayout, StatusSnapshot, StatusWriter, SystemKeepAwake,
};

use crate::command::capture_args;
use crate::disk::free_space;
use crate::error::CaptureError;

/// Default number of attempts per capture sequence.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default pause between attempts.
pub const DEFAULT_BACKOFF: Duration = Duration::from_secs(3);

/// Longest stderr excerpt carried into a log line.
const STDERR_TAIL: usize = 300;

/// How one attempt ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// The frame was published at the final path.
    Success,
    /// The tool exited non-zero. `code` is `None` when killed by a signal.
    ProcessFailure { code: Option<i32> },
    /// The tool ran past the timeout and was killed.
    Timeout,
    /// Path, launch or publish failure.
    IoError(String),
}

impl AttemptOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, AttemptOutcome::Success)
    }
}

impl fmt::Display for AttemptOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttemptOutcome::Success => write!(f, "success"),
            AttemptOutcome::ProcessFailure { code: Some(code) } => write!(f, "exit {}", code),
            AttemptOutcome::ProcessFailure { code: None } => write!(f, "killed by signal"),
            AttemptOutcome::Timeout => write!(f, "timeout"),
            AttemptOutcome::IoError(msg) => write!(f, "{}", msg),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CaptureAttempt {
    /// 1-based attempt number.
    pub attempt: u32,
    pub outcome: AttemptOutcome,
    /// Published file, set on success.
    pub published: Option<PathBuf>,
}

/// Outcome of a whole capture sequence.
#[derive(Debug, Clone)]
pub struct CaptureResult {
    pub attempts: Vec<CaptureAttempt>,
    /// The snapshot written for this sequence.
    pub status: StatusSnapshot,
}

impl CaptureResult {
    pub fn is_success(&self) -> bool {
        self.status.ok
    }

    pub fn published(&self) -> Option<&Path> {
        self.attempts.iter().find_map(|a| a.published.as_deref())
    }
}

/// Runs capture sequences.
///
/// Stateless between sequences; every call reads the config snapshot it is
/// given, so a reload never affects a sequence already running.
#[derive(Clone)]
pub struct CaptureExecutor {
    max_attempts: u32,
    backoff: Duration,
    keep_awake: Arc<dyn KeepAwake>,
}

impl Default for CaptureExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl CaptureExecutor {
    pub fn new() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff: DEFAULT_BACKOFF,
            keep_awake: Arc::new(SystemKeepAwake),
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn with_keep_awake(mut self, keep_awake: Arc<dyn KeepAwake>) -> Self {
        self.keep_awake = keep_awake;
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Run one capture sequence and write its status snapshot.
    ///
    /// Stops at the first successful attempt. Never fails: exhausting every
    /// attempt is recorded as a failed snapshot.
    pub async fn capture(&self, config: &Config) -> CaptureResult {
        let layout = OutputLayout::from_config(&config.output);
        let status = StatusWriter::new(layout.status_path());
        let paths = layout.capture_paths(Local::now().naive_local());
        let mut attempts = Vec::with_capacity(self.max_attempts as usize);

        for attempt in 1..=self.max_attempts {
            let result = self.run_attempt(config, &layout, &paths, attempt).await;

            if let Some(path) = result.published.clone() {
                let snapshot = StatusSnapshot::success(&path, free_space(layout.root()));
                status.write(&snapshot);
                info!("Saved {}", path.display());
                attempts.push(result);
                return CaptureResult {
                    attempts,
                    status: snapshot,
                };
            }

            attempts.push(result);
            if attempt < self.max_attempts {
                tokio::time::sleep(self.backoff).await;
            }
        }

        let last = attempts
            .last()
            .map(|a| a.outcome.to_string())
            .unwrap_or_default();
        let message = format!(
            "{} failed after retries ({} attempts, last: {})",
            config.stream.tool, self.max_attempts, last
        );
        error!("Capture failed after retries");
        let snapshot = StatusSnapshot::failure(message);
        status.write(&snapshot);
        CaptureResult {
            attempts,
            status: snapshot,
        }
    }

    /// A single attempt: run the tool into `paths.temp_path` and publish it.
    ///
    /// Retries of one capture share the same paths. The temporary file is
    /// removed whenever the attempt does not succeed.
    pub async fn run_attempt(
        &self,
        config: &Config,
        layout: &OutputLayout,
        paths: &CapturePaths,
        attempt: u32,
    ) -> CaptureAttempt {
        if let Err(e) = self.keep_awake.assert_awake() {
            debug!("Keep-awake request failed: {}", e);
        }

        let (outcome, stderr) = match self.execute(config, paths).await {
            Ok(result) => result,
            Err(e) => (AttemptOutcome::IoError(e.to_string()), String::new()),
        };

        let published = if outcome.is_success() {
            match self.publish(layout, paths).await {
                Ok(()) => Some(paths.final_path.clone()),
                Err(e) => {
                    error!("failed (attempt {}/{}): {}", attempt, self.max_attempts, e);
                    remove_quietly(&paths.temp_path).await;
                    return CaptureAttempt {
                        attempt,
                        outcome: AttemptOutcome::IoError(e.to_string()),
                        published: None,
                    };
                }
            }
        } else {
            self.log_failure(attempt, &outcome, &stderr);
            remove_quietly(&paths.temp_path).await;
            None
        };

        CaptureAttempt {
            attempt,
            outcome,
            published,
        }
    }

    /// Run the tool. Returns the outcome and, for failed runs, the stderr tail.
    async fn execute(
        &self,
        config: &Config,
        paths: &CapturePaths,
    ) -> Result<(AttemptOutcome, String), CaptureError> {
        fs::create_dir_all(&paths.dir)
            .await
            .map_err(|source| CaptureError::CreateDir {
                path: paths.dir.clone(),
                source,
            })?;

        let mut cmd = Command::new(&config.stream.tool);
        cmd.args(capture_args(config, &paths.temp_path))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let child = cmd.spawn().map_err(|source| CaptureError::Spawn {
            tool: config.stream.tool.clone(),
            source,
        })?;

        // Dropping the child on timeout kills it.
        let output = match timeout(config.stream.timeout(), child.wait_with_output()).await {
            Ok(output) => output?,
            Err(_) => return Ok((AttemptOutcome::Timeout, String::new())),
        };

        if !output.status.success() {
            let outcome = AttemptOutcome::ProcessFailure {
                code: output.status.code(),
            };
            return Ok((outcome, stderr_tail(&String::from_utf8_lossy(&output.stderr))));
        }

        if !fs::try_exists(&paths.temp_path).await.unwrap_or(false) {
            return Err(CaptureError::MissingOutput(paths.temp_path.clone()));
        }
        Ok((AttemptOutcome::Success, String::new()))
    }

    async fn publish(&self, layout: &OutputLayout, paths: &CapturePaths) -> Result<(), CaptureError> {
        if fs::try_exists(&paths.final_path).await.unwrap_or(false) {
            fs::remove_file(&paths.final_path)
                .await
                .map_err(|source| CaptureError::Publish {
                    path: paths.final_path.clone(),
                    source,
                })?;
        }
        fs::rename(&paths.temp_path, &paths.final_path)
            .await
            .map_err(|source| CaptureError::Publish {
                path: paths.final_path.clone(),
                source,
            })?;

        let latest = layout.latest_path();
        if let Err(e) = fs::copy(&paths.final_path, &latest).await {
            warn!("Could not update {}: {}", latest.display(), e);
        }
        Ok(())
    }

    fn log_failure(&self, attempt: u32, outcome: &AttemptOutcome, stderr: &str) {
        let max = self.max_attempts;
        match outcome {
            AttemptOutcome::Timeout => warn!("timeout (attempt {}/{})", attempt, max),
            AttemptOutcome::ProcessFailure { .. } if stderr.is_empty() => {
                warn!("failed (attempt {}/{}, {})", attempt, max, outcome)
            }
            AttemptOutcome::ProcessFailure { .. } => {
                warn!("failed (attempt {}/{}, {}): {}", attempt, max, outcome, stderr)
            }
            AttemptOutcome::IoError(msg) => error!("error (attempt {}/{}): {}", attempt, max, msg),
            AttemptOutcome::Success => {}
        }
    }
}

/// Last line-ish chunk of stderr, bounded in length.
fn stderr_tail(stderr: &str) -> String {
    let trimmed = stderr.trim();
    let start = trimmed
        .char_indices()
        .rev()
        .nth(STDERR_TAIL.saturating_sub(1))
        .map(|(i, _)| i)
        .unwrap_or(0);
    trimmed[start..].replace('\n', " | ")
}

async fn remove_quietly(path: &Path) {
    if let Err(e) = fs::remove_file(path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!("Could not remove {}: {}", path.display(), e);
        }
    }
}

#[cfg(test)]
#[path = "executor_tests.rs"]
mod tests;
