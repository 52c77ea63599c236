//! Watches the config file and feeds changes into a [`ReloadDebouncer`].

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tracing::{info, warn};

use crate::debounce::ReloadDebouncer;
use crate::error::{RunLoopError, RunLoopResult};

/// Keeps a file system watch on the config file alive.
///
/// The parent directory is watched rather than the file itself, so editors
/// that save by replacing the file are still seen. Dropping the watcher stops
/// the watch.
pub struct ConfigWatcher {
    path: PathBuf,
    _watcher: RecommendedWatcher,
}

impl ConfigWatcher {
    pub fn start(path: &Path, debouncer: Arc<ReloadDebouncer>) -> RunLoopResult<Self> {
        let file_name = path
            .file_name()
            .map(OsStr::to_os_string)
            .ok_or_else(|| RunLoopError::ConfigPath(path.to_path_buf()))?;
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        if !dir.is_dir() {
            return Err(RunLoopError::ConfigPath(path.to_path_buf()));
        }

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) if is_relevant(&event, &file_name) => debouncer.notify(),
                Ok(_) => {}
                Err(e) => warn!("Config watch error: {}", e),
            },
            notify::Config::default(),
        )?;
        watcher.watch(&dir, RecursiveMode::NonRecursive)?;
        info!("Watching config file: {:?}", path);

        Ok(Self {
            path: path.to_path_buf(),
            _watcher: watcher,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// A change event touching a file named `file_name`.
pub(crate) fn is_relevant(event: &Event, file_name: &OsString) -> bool {
    if matches!(event.kind, EventKind::Access(_)) {
        return false;
    }
    event
        .paths
        .iter()
        .any(|p| p.file_name() == Some(file_name.as_os_str()))
}
