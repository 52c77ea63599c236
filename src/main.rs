//! streamlapse - scheduled still-frame capture from a live stream.
//!
//! Main entry point for the daemon and its one-shot commands.

mod cli;
mod cmd_inspect;
mod cmd_once;
mod cmd_run;

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use clap::Parser;
use tracing::warn;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::time::ChronoLocal;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use streamlapse_config::{Config, ConfigError, ConfigLoader};
use streamlapse_core::OutputLayout;

use cli::{resolve_config_path, Cli, Commands};

const LOG_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

static GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// Console logging, plus the append-only log file under the output root
/// when `log_file` is set.
///
/// A log file that cannot be opened downgrades to console only.
fn init_tracing(log_file: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let mut file_error = None;
    let file_layer = log_file.and_then(|path| match file_appender(path) {
        Ok(appender) => {
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);
            let _ = GUARD.set(guard);
            Some(
                fmt::layer()
                    .with_writer(non_blocking)
                    .with_ansi(false)
                    .with_target(false)
                    .with_level(false)
                    .with_timer(ChronoLocal::new(LOG_TIME_FORMAT.to_string())),
            )
        }
        Err(e) => {
            file_error = Some(format!("{}: {}", path.display(), e));
            None
        }
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_timer(ChronoLocal::new(LOG_TIME_FORMAT.to_string())),
        )
        .with(file_layer)
        .try_init()?;

    if let Some(e) = file_error {
        warn!("Log file unavailable, logging to console only ({})", e);
    }
    Ok(())
}

fn file_appender(path: &Path) -> Result<RollingFileAppender, Box<dyn std::error::Error>> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or("log path has no file name")?;
    std::fs::create_dir_all(dir)?;
    let appender = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(name)
        .build(dir)?;
    Ok(appender)
}

/// Config at `path`, or defaults with the load error kept for logging once
/// tracing is up.
fn load_startup_config(path: &Path) -> (Config, Option<ConfigError>) {
    match ConfigLoader::load(path) {
        Ok(config) => (config, None),
        Err(e) => (Config::default(), Some(e)),
    }
}

fn log_path(config: &Config) -> PathBuf {
    OutputLayout::from_config(&config.output).log_path()
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config_path = resolve_config_path(cli.config);

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Check => cmd_inspect::check(&config_path),
        Commands::Schedule { count } => {
            init_tracing(None)?;
            let (config, load_error) = load_startup_config(&config_path);
            report_load_error(&config_path, load_error);
            cmd_inspect::schedule(&config, count);
            Ok(())
        }
        command => {
            let (config, load_error) = load_startup_config(&config_path);
            init_tracing(Some(&log_path(&config)))?;
            report_load_error(&config_path, load_error);
            match command {
                Commands::Capture => cmd_once::capture(&config).await,
                Commands::Housekeeping => cmd_once::housekeeping(config).await,
                _ => cmd_run::run(config_path, config).await,
            }
        }
    }
}

fn report_load_error(path: &Path, error: Option<ConfigError>) {
    match error {
        Some(ConfigError::NotFound(p)) => warn!("Config file {} not found, using defaults", p),
        Some(e) => warn!("Config file {} unusable ({}), using defaults", path.display(), e),
        None => {}
    }
}
