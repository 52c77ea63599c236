//! Trailing-edge debouncer for config reloads.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::{RunLoopError, RunLoopResult};

/// Coalesces bursts of change notifications into a single action.
///
/// Every [`notify`](Self::notify) restarts the window; the action runs once
/// the window passes with no further notifications. Safe to call from
/// threads outside the runtime, such as the file watcher's.
pub struct ReloadDebouncer {
    window: Duration,
    action: Arc<dyn Fn() + Send + Sync>,
    runtime: Handle,
    pending: Mutex<Option<CancellationToken>>,
}

impl ReloadDebouncer {
    /// Must be called from inside a Tokio runtime.
    pub fn new<F>(window: Duration, action: F) -> RunLoopResult<Arc<Self>>
    where
        F: Fn() + Send + Sync + 'static,
    {
        let runtime = Handle::try_current().map_err(|_| RunLoopError::NoRuntime)?;
        Ok(Arc::new(Self {
            window,
            action: Arc::new(action),
            runtime,
            pending: Mutex::new(None),
        }))
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Record a change and restart the window.
    pub fn notify(&self) {
        let token = CancellationToken::new();
        if let Some(previous) = self.pending.lock().replace(token.clone()) {
            previous.cancel();
        }

        let window = self.window;
        let action = self.action.clone();
        self.runtime.spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                _ = tokio::time::sleep(window) => {
                    debug!("Debounce window elapsed, running action");
                    action();
                }
            }
        });
    }

    /// Drop any pending action.
    pub fn cancel(&self) {
        if let Some(pending) = self.pending.lock().take() {
            pending.cancel();
        }
    }
}
