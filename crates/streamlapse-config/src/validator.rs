//! Configuration validation.

use std::collections::HashSet;

use crate::loader::normalize_cron;
use crate::schema::Config;

/// Validation result.
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, warning: ValidationWarning) {
        self.warnings.push(warning);
    }
}

/// A validation error.
#[derive(Debug)]
pub struct ValidationError {
    pub path: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// A validation warning.
#[derive(Debug)]
pub struct ValidationWarning {
    pub path: String,
    pub message: String,
}

impl ValidationWarning {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Configuration validator.
///
/// Cron problems are reported as warnings: a bad expression only drops its
/// own job when the job set is built.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the configuration.
    pub fn validate(config: &Config) -> ValidationResult {
        let mut result = ValidationResult::default();

        Self::validate_stream(config, &mut result);
        Self::validate_output(config, &mut result);
        Self::validate_schedules(config, &mut result);
        Self::validate_housekeeping(config, &mut result);
        Self::validate_daemon(config, &mut result);

        result
    }

    fn validate_stream(config: &Config, result: &mut ValidationResult) {
        let stream = &config.stream;

        if stream.url.trim().is_empty() {
            result.add_error(ValidationError::new("stream.url", "Stream URL cannot be empty"));
        }

        if stream.tool.trim().is_empty() {
            result.add_error(ValidationError::new(
                "stream.tool",
                "Capture tool cannot be empty",
            ));
        }

        match stream.quality.parse::<u8>() {
            Ok(q) if (1..=31).contains(&q) => {}
            _ => result.add_error(ValidationError::new(
                "stream.quality",
                format!("Quality must be between 1 and 31, got '{}'", stream.quality),
            )),
        }

        if stream.timeout_secs == 0 {
            result.add_error(ValidationError::new(
                "stream.timeout_secs",
                "Timeout must be greater than 0",
            ));
        } else if stream.timeout_secs > 600 {
            result.add_warning(ValidationWarning::new(
                "stream.timeout_secs",
                "Timeout over 10 minutes; a stalled capture will hold its slot that long",
            ));
        }
    }

    fn validate_output(config: &Config, result: &mut ValidationResult) {
        let output = &config.output;

        if output.root.trim().is_empty() {
            result.add_error(ValidationError::new("output.root", "Output root cannot be empty"));
        }

        for (path, name) in [
            ("output.latest_name", &output.latest_name),
            ("output.log_name", &output.log_name),
            ("output.status_name", &output.status_name),
        ] {
            if name.is_empty() || name.contains(['/', '\\']) {
                result.add_error(ValidationError::new(
                    path,
                    format!("'{}' must be a plain file name", name),
                ));
            }
        }
    }

    fn validate_schedules(config: &Config, result: &mut ValidationResult) {
        if config.schedules.is_empty() {
            result.add_warning(ValidationWarning::new(
                "schedules",
                "No capture schedules configured",
            ));
        }

        let mut seen = HashSet::new();
        for (i, entry) in config.schedules.iter().enumerate() {
            if !seen.insert(entry.id.as_str()) {
                result.add_warning(ValidationWarning::new(
                    format!("schedules[{}].id", i),
                    format!("Duplicate schedule id '{}'", entry.id),
                ));
            }
            Self::check_cron(&format!("schedules[{}].cron", i), &entry.cron, result);
        }
    }

    fn validate_housekeeping(config: &Config, result: &mut ValidationResult) {
        let hk = &config.housekeeping;

        Self::check_cron("housekeeping.cron", &hk.cron, result);

        if hk.archive_yesterday && !config.output.date_subfolders {
            result.add_warning(ValidationWarning::new(
                "housekeeping.archive_yesterday",
                "Archiving needs output.date_subfolders; it will be skipped",
            ));
        }

        if hk.retention_days == 0 {
            result.add_warning(ValidationWarning::new(
                "housekeeping.retention_days",
                "Retention is 0; pruning is disabled",
            ));
        }
    }

    fn validate_daemon(config: &Config, result: &mut ValidationResult) {
        let daemon = &config.daemon;

        if !daemon.heartbeat_cron.trim().is_empty() {
            Self::check_cron("daemon.heartbeat_cron", &daemon.heartbeat_cron, result);
        }

        if daemon.reload_debounce_ms == 0 {
            result.add_warning(ValidationWarning::new(
                "daemon.reload_debounce_ms",
                "Debounce of 0 reloads on every file event",
            ));
        }
    }

    fn check_cron(path: &str, expr: &str, result: &mut ValidationResult) {
        if let Err(e) = normalize_cron(expr).parse::<cron::Schedule>() {
            result.add_warning(ValidationWarning::new(
                path,
                format!("Invalid cron expression '{}' ({}); entry will be ignored", expr, e),
            ));
        }
    }
}

#[cfg(test)]
#[path = "validator_tests.rs"]
mod tests;
