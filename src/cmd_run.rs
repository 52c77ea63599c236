//! `run`: the long-running daemon.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;

use streamlapse_config::Config;
use streamlapse_daemon::{log_validation, Daemon, Orchestrator};

pub(crate) async fn run(
    config_path: PathBuf,
    config: Config,
) -> Result<(), Box<dyn std::error::Error>> {
    info!(
        "streamlapse {} starting (config: {})",
        env!("CARGO_PKG_VERSION"),
        config_path.display()
    );
    log_validation(&config);

    let orchestrator = Arc::new(Orchestrator::new(config_path));
    let daemon = Daemon::new(orchestrator);
    daemon.run(config).await?;

    info!("streamlapse stopped");
    Ok(())
}
