//! CLI definitions for streamlapse.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Scheduled still-frame capture from a live stream.
#[derive(Parser)]
#[command(name = "streamlapse")]
#[command(about = "Scheduled still-frame capture from a live stream")]
#[command(version)]
pub(crate) struct Cli {
    /// Configuration file path [default: <config dir>/streamlapse/streamlapse.toml]
    #[arg(short, long, env = "STREAMLAPSE_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Run the capture daemon in the foreground (default)
    Run,

    /// Take one capture now and print the resulting status
    Capture,

    /// Run one housekeeping pass now
    Housekeeping,

    /// Show upcoming fire times for every job
    Schedule {
        /// Occurrences to show per job
        #[arg(short = 'n', long, default_value_t = 5)]
        count: usize,
    },

    /// Validate the configuration file
    Check,
}

/// Config path from the flag, or the per-user default.
pub(crate) fn resolve_config_path(flag: Option<PathBuf>) -> PathBuf {
    flag.unwrap_or_else(|| {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("streamlapse")
            .join("streamlapse.toml")
    })
}
