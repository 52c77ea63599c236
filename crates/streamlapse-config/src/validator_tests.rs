use super::*;
use crate::schema::ScheduleEntry;

fn valid_config() -> Config {
    let mut config = Config::default();
    config.stream.url = "https://example.com/live/playlist.m3u8".to_string();
    config
}

#[test]
fn test_validate_valid_config() {
    let result = ConfigValidator::validate(&valid_config());
    assert!(result.is_valid());
    assert!(result.warnings.is_empty());
}

#[test]
fn test_validate_default_config_needs_url() {
    let result = ConfigValidator::validate(&Config::default());
    assert!(!result.is_valid());
    assert!(result.errors.iter().any(|e| e.path == "stream.url"));
}

#[test]
fn test_validate_quality_out_of_range() {
    let mut config = valid_config();
    config.stream.quality = "32".to_string();

    let result = ConfigValidator::validate(&config);
    assert!(result.errors.iter().any(|e| e.path == "stream.quality"));
}

#[test]
fn test_validate_quality_not_a_number() {
    let mut config = valid_config();
    config.stream.quality = "high".to_string();

    let result = ConfigValidator::validate(&config);
    assert!(!result.is_valid());
}

#[test]
fn test_validate_zero_timeout() {
    let mut config = valid_config();
    config.stream.timeout_secs = 0;

    let result = ConfigValidator::validate(&config);
    assert!(result.errors.iter().any(|e| e.path == "stream.timeout_secs"));
}

#[test]
fn test_validate_long_timeout_warning() {
    let mut config = valid_config();
    config.stream.timeout_secs = 3600;

    let result = ConfigValidator::validate(&config);
    assert!(result.is_valid());
    assert!(result.warnings.iter().any(|w| w.path == "stream.timeout_secs"));
}

#[test]
fn test_validate_file_name_with_separator() {
    let mut config = valid_config();
    config.output.status_name = "sub/status.json".to_string();

    let result = ConfigValidator::validate(&config);
    assert!(result.errors.iter().any(|e| e.path == "output.status_name"));
}

#[test]
fn test_invalid_cron_is_warning_not_error() {
    let mut config = valid_config();
    config.schedules.push(ScheduleEntry::new("broken", "not a cron"));

    let result = ConfigValidator::validate(&config);
    assert!(result.is_valid());
    assert!(result.warnings.iter().any(|w| w.path == "schedules[5].cron"));
}

#[test]
fn test_duplicate_schedule_id_warning() {
    let mut config = valid_config();
    config.schedules = vec![
        ScheduleEntry::new("a", "0 * * * *"),
        ScheduleEntry::new("a", "30 * * * *"),
    ];

    let result = ConfigValidator::validate(&config);
    assert!(result.warnings.iter().any(|w| w.path == "schedules[1].id"));
}

#[test]
fn test_empty_schedules_warning() {
    let mut config = valid_config();
    config.schedules.clear();

    let result = ConfigValidator::validate(&config);
    assert!(result.is_valid());
    assert!(result.warnings.iter().any(|w| w.path == "schedules"));
}

#[test]
fn test_archive_without_subfolders_warning() {
    let mut config = valid_config();
    config.housekeeping.archive_yesterday = true;
    config.output.date_subfolders = false;

    let result = ConfigValidator::validate(&config);
    assert!(
        result
            .warnings
            .iter()
            .any(|w| w.path == "housekeeping.archive_yesterday")
    );
}

#[test]
fn test_empty_heartbeat_is_allowed() {
    let mut config = valid_config();
    config.daemon.heartbeat_cron = String::new();

    let result = ConfigValidator::validate(&config);
    assert!(result.warnings.is_empty());
}
