//! # Streamlapse RunLoop
//!
//! Cron-driven scheduling for the capture daemon.
//!
//! - [`JobSet`]: capture, housekeeping and heartbeat jobs built from a config
//! - [`CronScheduler`]: one deadline for the whole set, re-armed on reload
//! - [`ReloadDebouncer`] and [`ConfigWatcher`]: coalesced config reloads

mod config_watcher;
mod cron_scheduler;
mod debounce;
mod error;
mod job;

pub use config_watcher::ConfigWatcher;
pub use cron_scheduler::{CronScheduler, JobHandler};
pub use debounce::ReloadDebouncer;
pub use error::{RunLoopError, RunLoopResult};
pub use job::{CronJob, JobKind, JobSet, HEARTBEAT_JOB_ID, HOUSEKEEPING_JOB_ID};

pub use tokio_util::sync::CancellationToken;
