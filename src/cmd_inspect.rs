//! `schedule` and `check`: read-only views of the configuration.

use std::path::Path;

use chrono::Local;

use streamlapse_config::{Config, ConfigLoader, ConfigValidator};
use streamlapse_runloop::JobSet;

/// Print the next `count` fire times of every job.
pub(crate) fn schedule(config: &Config, count: usize) {
    let jobs = JobSet::from_config(config);
    if jobs.is_empty() {
        println!("No jobs scheduled.");
        return;
    }

    let now = Local::now();
    for (job, times) in jobs.upcoming(&now, count) {
        println!("{} ({}) \"{}\"", job.id(), job.kind(), job.expression());
        for at in times {
            println!("  {}", at.format("%Y-%m-%d %H:%M:%S"));
        }
    }
    if let Some(next) = jobs.next_fire_after(&now) {
        println!();
        println!("Next fire: {}", next.format("%Y-%m-%d %H:%M:%S"));
    }
}

/// Validate the config file. Exits non-zero on load or validation errors.
pub(crate) fn check(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let config = match ConfigLoader::load(path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {}: {}", path.display(), e);
            std::process::exit(1);
        }
    };

    let result = ConfigValidator::validate(&config);
    for err in &result.errors {
        eprintln!("error: {}: {}", err.path, err.message);
    }
    for warning in &result.warnings {
        eprintln!("warning: {}: {}", warning.path, warning.message);
    }

    if !result.is_valid() {
        std::process::exit(1);
    }
    println!(
        "{}: OK ({} warning(s), {} capture schedule(s))",
        path.display(),
        result.warnings.len(),
        config.schedules.len()
    );
    Ok(())
}
