//! Daemon lifecycle: scheduler, reload plumbing and signals.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

use streamlapse_config::Config;
use streamlapse_runloop::{CancellationToken, ConfigWatcher, CronScheduler, ReloadDebouncer};

use crate::error::DaemonError;
use crate::orchestrator::Orchestrator;
use crate::signal::{DaemonSignal, SignalHandler};

/// The long-running capture daemon.
pub struct Daemon {
    orchestrator: Arc<Orchestrator>,
    signals: SignalHandler,
    scheduler: Mutex<Option<Arc<CronScheduler>>>,
}

impl Daemon {
    pub fn new(orchestrator: Arc<Orchestrator>) -> Self {
        Self {
            orchestrator,
            signals: SignalHandler::new(),
            scheduler: Mutex::new(None),
        }
    }

    /// Handle for requesting shutdown or reload from outside.
    pub fn signals(&self) -> &SignalHandler {
        &self.signals
    }

    /// Scheduler of the current run, if [`Daemon::run`] is active.
    pub fn scheduler(&self) -> Option<Arc<CronScheduler>> {
        self.scheduler.lock().clone()
    }

    /// Run until a shutdown signal arrives.
    ///
    /// File changes and SIGHUP both go through the same debouncer, so a burst
    /// of either produces one reload.
    pub async fn run(&self, config: Config) -> Result<(), DaemonError> {
        let config = Arc::new(config);
        let scheduler = CronScheduler::new(config.clone(), self.orchestrator.clone());
        info!(
            "Scheduler started | TZ={} | jobs: {} | root: {}",
            chrono::Local::now().format("%:z"),
            scheduler.jobs().len(),
            config.output.root_path().display()
        );
        *self.scheduler.lock() = Some(scheduler.clone());

        let shutdown = CancellationToken::new();
        let mut signals = self.signals.subscribe();

        let debouncer = {
            let orchestrator = self.orchestrator.clone();
            let scheduler = scheduler.clone();
            ReloadDebouncer::new(config.daemon.reload_debounce(), move || {
                orchestrator.reload(&scheduler);
            })?
        };
        let _watcher = match ConfigWatcher::start(self.orchestrator.config_path(), debouncer.clone())
        {
            Ok(watcher) => Some(watcher),
            Err(e) => {
                warn!("Config file watching disabled: {}", e);
                None
            }
        };
        self.signals.setup_os_signals()?;

        if config.daemon.capture_on_startup {
            let orchestrator = self.orchestrator.clone();
            let snapshot = config.clone();
            tokio::spawn(async move {
                info!("Startup capture");
                orchestrator.capture(&snapshot).await;
            });
        }
        self.orchestrator.heartbeat();

        let run = tokio::spawn(scheduler.clone().run(shutdown.clone()));

        loop {
            match signals.recv().await {
                Ok(DaemonSignal::Shutdown) => break,
                Ok(DaemonSignal::Reload) => debouncer.notify(),
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Missed {} daemon signal(s)", skipped);
                }
                Err(RecvError::Closed) => break,
            }
        }

        info!("Shutting down");
        debouncer.cancel();
        shutdown.cancel();
        if let Err(e) = run.await {
            warn!("Scheduler task ended abnormally: {}", e);
        }
        self.scheduler.lock().take();
        Ok(())
    }
}
