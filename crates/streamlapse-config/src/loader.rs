//! Configuration loader.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{info, warn};

use crate::error::ConfigError;
use crate::schema::Config;

static ENV_VAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").expect("valid env var pattern"));

/// Configuration loader with environment variable substitution.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Config, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => ConfigError::NotFound(path.display().to_string()),
            _ => ConfigError::Io(e),
        })?;
        Self::load_str(&content)
    }

    /// Load configuration from a string.
    pub fn load_str(content: &str) -> Result<Config, ConfigError> {
        let expanded = Self::expand_env_vars(content)?;
        let config: Config = toml::from_str(&expanded)?;
        Ok(config)
    }

    /// Load configuration, falling back to built-in defaults on any error.
    pub fn load_or_default(path: &Path) -> Config {
        match Self::load(path) {
            Ok(config) => {
                info!("Loaded configuration from {}", path.display());
                config
            }
            Err(ConfigError::NotFound(p)) => {
                warn!("Config file {} not found, using defaults", p);
                Config::default()
            }
            Err(e) => {
                warn!("Config file {} unusable ({}), using defaults", path.display(), e);
                Config::default()
            }
        }
    }

    /// Expand environment variables in the format `${VAR}`.
    fn expand_env_vars(content: &str) -> Result<String, ConfigError> {
        let mut result = content.to_string();

        for cap in ENV_VAR_RE.captures_iter(content) {
            let var_name = &cap[1];
            let var_value = std::env::var(var_name)
                .map_err(|_| ConfigError::EnvVarNotSet(var_name.to_string()))?;
            result = result.replace(&cap[0], &var_value);
        }

        Ok(result)
    }

    /// Expand shell-style paths (e.g., `~/streamlapse`).
    pub fn expand_path(path: &str) -> String {
        shellexpand::tilde(path).to_string()
    }
}

/// Bring a cron expression into the seconds-first form the scheduler parses.
///
/// Classic 5-field expressions get a `0` seconds field prepended; 6 and 7
/// field expressions are returned trimmed.
pub fn normalize_cron(expr: &str) -> String {
    let fields: Vec<&str> = expr.split_whitespace().collect();
    if fields.len() == 5 {
        format!("0 {}", fields.join(" "))
    } else {
        fields.join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_empty_config() {
        let config = ConfigLoader::load_str("").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_basic_config() {
        let content = r#"
            [stream]
            url = "https://example.com/live/playlist.m3u8"
            quality = "4"
            timeout_secs = 30

            [output]
            root = "/srv/captures"
            date_subfolders = false
        "#;
        let config = ConfigLoader::load_str(content).unwrap();
        assert_eq!(config.stream.url, "https://example.com/live/playlist.m3u8");
        assert_eq!(config.stream.quality, "4");
        assert_eq!(config.stream.timeout_secs, 30);
        assert_eq!(config.stream.tool, "ffmpeg");
        assert_eq!(config.output.root, "/srv/captures");
        assert!(!config.output.date_subfolders);
    }

    #[test]
    fn test_load_schedules_replace_defaults() {
        let content = r#"
            [[schedules]]
            id = "evening"
            cron = "0 18-23 * * *"

            [housekeeping]
            cron = "10 3 * * *"
            retention_days = 7
            archive_yesterday = true
        "#;
        let config = ConfigLoader::load_str(content).unwrap();
        assert_eq!(config.schedules.len(), 1);
        assert_eq!(config.schedules[0].id, "evening");
        assert_eq!(config.housekeeping.retention_days, 7);
        assert!(config.housekeeping.archive_yesterday);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[stream]").unwrap();
        writeln!(file, "timeout_secs = 5").unwrap();

        let config = ConfigLoader::load(file.path()).unwrap();
        assert_eq!(config.stream.timeout_secs, 5);
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = ConfigLoader::load(Path::new("/nonexistent/path/streamlapse.toml"));
        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn test_load_invalid_toml() {
        let result = ConfigLoader::load_str("invalid = [unclosed");
        assert!(matches!(result, Err(ConfigError::TomlParse(_))));
    }

    #[test]
    fn test_load_or_default_on_malformed_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[stream").unwrap();

        let config = ConfigLoader::load_or_default(file.path());
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_or_default_on_missing_file() {
        let config = ConfigLoader::load_or_default(Path::new("/nonexistent/streamlapse.toml"));
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_expand_env_vars() {
        // SAFETY: This test runs in isolation and sets a unique test-only env var
        unsafe {
            std::env::set_var("STREAMLAPSE_TEST_URL", "rtsp://camera.local/stream");
        }
        let content = "[stream]\nurl = \"${STREAMLAPSE_TEST_URL}\"";
        let config = ConfigLoader::load_str(content).unwrap();
        assert_eq!(config.stream.url, "rtsp://camera.local/stream");
        unsafe {
            std::env::remove_var("STREAMLAPSE_TEST_URL");
        }
    }

    #[test]
    fn test_expand_env_vars_not_set() {
        let content = "value = \"${NONEXISTENT_STREAMLAPSE_VAR_12345}\"";
        let result = ConfigLoader::expand_env_vars(content);
        assert!(matches!(result, Err(ConfigError::EnvVarNotSet(_))));
    }

    #[test]
    fn test_expand_path_with_tilde() {
        let expanded = ConfigLoader::expand_path("~/captures");
        assert!(!expanded.starts_with('~'));
        assert!(expanded.ends_with("/captures"));
    }

    #[test]
    fn test_expand_path_no_tilde() {
        assert_eq!(ConfigLoader::expand_path("/srv/captures"), "/srv/captures");
    }

    #[test]
    fn test_normalize_cron_five_fields() {
        assert_eq!(normalize_cron("0 18-23 * * *"), "0 0 18-23 * * *");
    }

    #[test]
    fn test_normalize_cron_six_fields_unchanged() {
        assert_eq!(normalize_cron("0 */5 * * * *"), "0 */5 * * * *");
    }

    #[test]
    fn test_normalize_cron_collapses_whitespace() {
        assert_eq!(normalize_cron("  10   3 * * * "), "0 10 3 * * *");
    }
}
