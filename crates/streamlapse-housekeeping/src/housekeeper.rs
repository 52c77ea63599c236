//! Archive-then-prune pass.

use chrono::NaiveDate;
use tracing::info;

use streamlapse_config::Config;
use streamlapse_core::OutputLayout;

use crate::archive::{archive_day, ArchiveOutcome};
use crate::prune::{prune, PruneStats};

/// What one housekeeping pass did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HousekeepingReport {
    pub archive: ArchiveOutcome,
    pub prune: PruneStats,
}

/// Runs housekeeping against a config snapshot.
///
/// Synchronous and blocking; async callers should run it on a blocking thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct Housekeeper;

impl Housekeeper {
    pub fn new() -> Self {
        Self
    }

    /// Archive yesterday's directory (if enabled), then prune by retention.
    ///
    /// The two steps fail independently: an archive failure never skips pruning.
    pub fn run(&self, config: &Config, today: NaiveDate) -> HousekeepingReport {
        info!("Starting housekeeping");
        let layout = OutputLayout::from_config(&config.output);

        let archive = match today.pred_opt() {
            Some(yesterday) if config.housekeeping.archive_yesterday => {
                archive_day(&layout, yesterday)
            }
            _ => ArchiveOutcome::Disabled,
        };
        let prune = prune(&layout, today, config.housekeeping.retention_days);

        info!(
            "Housekeeping complete (archive: {:?}, pruned: {}, failures: {})",
            archive, prune.removed, prune.failures
        );
        HousekeepingReport { archive, prune }
    }
}
