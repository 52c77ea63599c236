//! One-shot `capture` and `housekeeping` commands.

use std::sync::Arc;

use chrono::Local;

use streamlapse_capture::CaptureExecutor;
use streamlapse_config::Config;
use streamlapse_daemon::log_validation;
use streamlapse_housekeeping::Housekeeper;

pub(crate) async fn capture(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    log_validation(config);
    let result = CaptureExecutor::new().capture(config).await;
    println!("{}", serde_json::to_string_pretty(&result.status)?);
    if !result.is_success() {
        std::process::exit(1);
    }
    Ok(())
}

pub(crate) async fn housekeeping(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let config = Arc::new(config);
    let today = Local::now().date_naive();
    let report =
        tokio::task::spawn_blocking(move || Housekeeper::new().run(&config, today)).await?;
    println!("Archive: {:?}", report.archive);
    println!(
        "Pruned: {} removed, {} failed",
        report.prune.removed, report.prune.failures
    );
    Ok(())
}
