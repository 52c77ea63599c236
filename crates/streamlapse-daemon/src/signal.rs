//! Signal handling for the daemon process.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::{debug, info};

use crate::error::DaemonError;

/// Signal type for daemon control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DaemonSignal {
    /// Graceful shutdown (SIGTERM, SIGINT).
    Shutdown,
    /// Reload configuration (SIGHUP).
    Reload,
}

impl std::fmt::Display for DaemonSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DaemonSignal::Shutdown => write!(f, "SHUTDOWN"),
            DaemonSignal::Reload => write!(f, "RELOAD"),
        }
    }
}

/// Fans OS signals and internal requests out to subscribers.
#[derive(Clone)]
pub struct SignalHandler {
    sender: broadcast::Sender<DaemonSignal>,
    shutdown_requested: Arc<AtomicBool>,
}

impl SignalHandler {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(16);
        Self {
            sender,
            shutdown_requested: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DaemonSignal> {
        self.sender.subscribe()
    }

    pub fn send(&self, signal: DaemonSignal) {
        debug!("Sending signal: {}", signal);
        if signal == DaemonSignal::Shutdown {
            self.shutdown_requested.store(true, Ordering::SeqCst);
        }
        let _ = self.sender.send(signal);
    }

    pub fn request_shutdown(&self) {
        self.send(DaemonSignal::Shutdown);
    }

    pub fn request_reload(&self) {
        self.send(DaemonSignal::Reload);
    }

    pub fn is_shutdown_requested(&self) -> bool {
        self.shutdown_requested.load(Ordering::SeqCst)
    }

    /// Set up OS signal handlers (Unix only).
    #[cfg(unix)]
    pub fn setup_os_signals(&self) -> Result<(), DaemonError> {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigterm =
            signal(SignalKind::terminate()).map_err(|e| DaemonError::SignalSetup(e.to_string()))?;
        let sigterm_handler = self.clone();
        tokio::spawn(async move {
            while sigterm.recv().await.is_some() {
                info!("Received SIGTERM");
                sigterm_handler.request_shutdown();
            }
        });

        let mut sigint =
            signal(SignalKind::interrupt()).map_err(|e| DaemonError::SignalSetup(e.to_string()))?;
        let sigint_handler = self.clone();
        tokio::spawn(async move {
            while sigint.recv().await.is_some() {
                info!("Received SIGINT");
                sigint_handler.request_shutdown();
            }
        });

        let mut sighup =
            signal(SignalKind::hangup()).map_err(|e| DaemonError::SignalSetup(e.to_string()))?;
        let sighup_handler = self.clone();
        tokio::spawn(async move {
            while sighup.recv().await.is_some() {
                info!("Received SIGHUP - requesting config reload");
                sighup_handler.request_reload();
            }
        });

        info!("OS signal handlers installed (SIGTERM, SIGINT, SIGHUP)");
        Ok(())
    }

    /// Set up OS signal handlers (non-Unix fallback).
    #[cfg(not(unix))]
    pub fn setup_os_signals(&self) -> Result<(), DaemonError> {
        let handler = self.clone();

        // Only Ctrl+C is available on non-Unix
        tokio::spawn(async move {
            if let Ok(()) = tokio::signal::ctrl_c().await {
                info!("Received Ctrl+C");
                handler.request_shutdown();
            }
        });

        info!("OS signal handlers installed (Ctrl+C only)");
        Ok(())
    }
}

impl Default for SignalHandler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_display() {
        assert_eq!(DaemonSignal::Shutdown.to_string(), "SHUTDOWN");
        assert_eq!(DaemonSignal::Reload.to_string(), "RELOAD");
    }

    #[test]
    fn test_request_shutdown() {
        let handler = SignalHandler::new();
        assert!(!handler.is_shutdown_requested());
        handler.request_shutdown();
        assert!(handler.is_shutdown_requested());
    }

    #[test]
    fn test_reload_does_not_request_shutdown() {
        let handler = SignalHandler::new();
        handler.request_reload();
        assert!(!handler.is_shutdown_requested());
    }

    #[tokio::test]
    async fn test_multiple_subscribers() {
        let handler = SignalHandler::new();
        let mut rx1 = handler.subscribe();
        let mut rx2 = handler.subscribe();

        handler.request_reload();

        assert_eq!(rx1.recv().await.unwrap(), DaemonSignal::Reload);
        assert_eq!(rx2.recv().await.unwrap(), DaemonSignal::Reload);
    }

    #[test]
    fn test_handler_clone_shares_state() {
        let handler = SignalHandler::new();
        let cloned = handler.clone();

        handler.request_shutdown();
        assert!(cloned.is_shutdown_requested());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_setup_os_signals() {
        let handler = SignalHandler::new();
        assert!(handler.setup_os_signals().is_ok());
    }
}
