//! Job dispatch: capture, housekeeping and heartbeat behind overlap guards.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Local};
use tracing::{debug, error, info, warn};

use streamlapse_capture::{CaptureExecutor, CaptureResult};
use streamlapse_config::{Config, ConfigLoader, ConfigValidator, OverlapPolicy};
use streamlapse_core::{KeepAwake, SystemKeepAwake};
use streamlapse_housekeeping::{Housekeeper, HousekeepingReport};
use streamlapse_runloop::{CronJob, CronScheduler, JobHandler, JobKind};

/// Load the config at `path`, falling back to defaults, and log validation
/// findings.
pub fn load_config(path: &Path) -> Config {
    let config = ConfigLoader::load_or_default(path);
    log_validation(&config);
    config
}

/// Log validation errors and warnings. Returns whether the config is valid.
pub fn log_validation(config: &Config) -> bool {
    let validation = ConfigValidator::validate(config);
    for err in &validation.errors {
        error!("Config error at {}: {}", err.path, err.message);
    }
    for warning in &validation.warnings {
        warn!("Config warning at {}: {}", warning.path, warning.message);
    }
    validation.is_valid()
}

/// Single-slot "in progress" flag for one job kind.
#[derive(Debug, Default)]
struct InFlight(AtomicBool);

impl InFlight {
    fn try_enter(&self) -> Option<InFlightGuard<'_>> {
        self.0
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| InFlightGuard(&self.0))
    }

    fn is_busy(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Runs jobs for the scheduler.
pub struct Orchestrator {
    config_path: PathBuf,
    executor: CaptureExecutor,
    housekeeper: Housekeeper,
    keep_awake: Arc<dyn KeepAwake>,
    capture_slot: InFlight,
    housekeeping_slot: InFlight,
}

impl Orchestrator {
    pub fn new(config_path: impl Into<PathBuf>) -> Self {
        let keep_awake: Arc<dyn KeepAwake> = Arc::new(SystemKeepAwake);
        Self {
            config_path: config_path.into(),
            executor: CaptureExecutor::new().with_keep_awake(keep_awake.clone()),
            housekeeper: Housekeeper::new(),
            keep_awake,
            capture_slot: InFlight::default(),
            housekeeping_slot: InFlight::default(),
        }
    }

    pub fn with_executor(mut self, executor: CaptureExecutor) -> Self {
        self.executor = executor;
        self
    }

    pub fn with_keep_awake(mut self, keep_awake: Arc<dyn KeepAwake>) -> Self {
        self.keep_awake = keep_awake;
        self
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Re-read the config file and hand the new snapshot to `scheduler`.
    ///
    /// Jobs already running finish with the snapshot they started with.
    pub fn reload(&self, scheduler: &CronScheduler) -> Arc<Config> {
        info!("Reloading configuration from {}", self.config_path.display());
        let config = Arc::new(load_config(&self.config_path));
        scheduler.reload(config.clone());
        config
    }

    /// Run one capture sequence unless the overlap policy says to skip it.
    pub async fn capture(&self, config: &Config) -> Option<CaptureResult> {
        let _guard = match self.enter(&self.capture_slot, JobKind::Capture, config) {
            Ok(guard) => guard,
            Err(()) => return None,
        };
        Some(self.executor.capture(config).await)
    }

    /// Run one housekeeping pass on a blocking thread unless skipped.
    pub async fn housekeeping(&self, config: Arc<Config>) -> Option<HousekeepingReport> {
        let _guard = match self.enter(&self.housekeeping_slot, JobKind::Housekeeping, &config) {
            Ok(guard) => guard,
            Err(()) => return None,
        };
        let housekeeper = self.housekeeper;
        let today = Local::now().date_naive();
        match tokio::task::spawn_blocking(move || housekeeper.run(&config, today)).await {
            Ok(report) => Some(report),
            Err(e) => {
                error!("Housekeeping task failed: {}", e);
                None
            }
        }
    }

    /// Liveness log line plus a keep-awake reassertion.
    pub fn heartbeat(&self) {
        info!("heartbeat: scheduler alive");
        if let Err(e) = self.keep_awake.assert_awake() {
            debug!("Keep-awake request failed: {}", e);
        }
    }

    /// Whether a capture or housekeeping run is in progress.
    pub fn is_busy(&self, kind: JobKind) -> bool {
        match kind {
            JobKind::Capture => self.capture_slot.is_busy(),
            JobKind::Housekeeping => self.housekeeping_slot.is_busy(),
            JobKind::Heartbeat => false,
        }
    }

    /// `Ok(None)` means run without a guard, `Err` means skip.
    fn enter<'a>(
        &self,
        slot: &'a InFlight,
        kind: JobKind,
        config: &Config,
    ) -> Result<Option<InFlightGuard<'a>>, ()> {
        match config.daemon.overlap {
            OverlapPolicy::Allow => Ok(None),
            OverlapPolicy::Skip => match slot.try_enter() {
                Some(guard) => Ok(Some(guard)),
                None => {
                    warn!("Skipping {} run: previous run still in progress", kind);
                    Err(())
                }
            },
        }
    }
}

#[async_trait]
impl JobHandler for Orchestrator {
    async fn run_job(&self, job: CronJob, config: Arc<Config>, scheduled_for: DateTime<Local>) {
        debug!(
            "Job {} fired for {}",
            job.id(),
            scheduled_for.format("%Y-%m-%d %H:%M:%S")
        );
        match job.kind() {
            JobKind::Capture => {
                self.capture(&config).await;
            }
            JobKind::Housekeeping => {
                self.housekeeping(config).await;
            }
            JobKind::Heartbeat => self.heartbeat(),
        }
    }
}

#[cfg(test)]
#[path = "orchestrator_tests.rs"]
mod tests;
