//! Configuration file support for vncreport.
//!
//! Loads `vncreport.toml` from an explicit path, the working directory, or
//! the user's config directory, in that order.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use vncreport_logging::LogFormat;
use vncreport_sessions::DEFAULT_HOST_PATTERN;

/// The config file name
pub const CONFIG_FILE_NAME: &str = "vncreport.toml";

/// Log level used when neither the config nor the CLI names one
pub const DEFAULT_LOG_LEVEL: &str = "warn";

/// Settings loaded from `vncreport.toml`. Every key is optional.
#[derive(Debug, Deserialize, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ReportConfig {
    /// Regex fragment matching the host field of a log line
    pub host_pattern: Option<String>,
    /// Year assumed for timestamps, which the log format omits
    pub year: Option<i32>,
    pub log_level: Option<String>,
    pub log_format: Option<LogFormat>,
    /// Write logs here instead of stderr
    pub log_file: Option<PathBuf>,
}

impl ReportConfig {
    /// Load configuration.
    ///
    /// Returns:
    /// - `Ok(Some(config))` if a file was found and parses successfully
    /// - `Ok(None)` if no file exists in any searched location
    /// - `Err(...)` if `explicit` is missing, or a file fails to parse
    pub fn load(explicit: Option<&Path>, working_dir: &Path) -> Result<Option<Self>> {
        if let Some(path) = explicit {
            return Self::load_from(path).map(Some);
        }

        let user_config =
            dirs::config_dir().map(|dir| dir.join("vncreport").join(CONFIG_FILE_NAME));
        let candidates = std::iter::once(working_dir.join(CONFIG_FILE_NAME)).chain(user_config);

        for path in candidates {
            if path.exists() {
                return Self::load_from(&path).map(Some);
            }
        }

        Ok(None)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        let config: ReportConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;

        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Replace each setting that `overrides` provides.
    pub fn merge(&mut self, overrides: ReportConfig) {
        if overrides.host_pattern.is_some() {
            self.host_pattern = overrides.host_pattern;
        }
        if overrides.year.is_some() {
            self.year = overrides.year;
        }
        if overrides.log_level.is_some() {
            self.log_level = overrides.log_level;
        }
        if overrides.log_format.is_some() {
            self.log_format = overrides.log_format;
        }
        if overrides.log_file.is_some() {
            self.log_file = overrides.log_file;
        }
    }

    /// Get the effective host pattern.
    pub fn host_pattern(&self) -> &str {
        self.host_pattern.as_deref().unwrap_or(DEFAULT_HOST_PATTERN)
    }

    /// Get the effective year, defaulting to the current local year.
    pub fn year(&self) -> i32 {
        use chrono::Datelike;
        self.year.unwrap_or_else(|| chrono::Local::now().year())
    }

    pub fn log_level(&self) -> &str {
        self.log_level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL)
    }

    pub fn log_format(&self) -> LogFormat {
        self.log_format.unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_is_error() {
        let dir = TempDir::new().unwrap();
        let config = ReportConfig::load_from(&dir.path().join(CONFIG_FILE_NAME));
        assert!(config.is_err());

        let explicit = dir.path().join("nope.toml");
        assert!(ReportConfig::load(Some(&explicit), dir.path()).is_err());
    }

    #[test]
    fn test_load_from_working_dir() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            "host_pattern = 'vnc\\d+\\.example\\.org'\nyear = 2013\nlog_format = 'json'\n",
        )
        .unwrap();

        let config = ReportConfig::load(None, dir.path()).unwrap().unwrap();
        assert_eq!(config.host_pattern(), r"vnc\d+\.example\.org");
        assert_eq!(config.year(), 2013);
        assert_eq!(config.log_format(), LogFormat::Json);
        assert_eq!(config.log_level(), DEFAULT_LOG_LEVEL);
    }

    #[test]
    fn test_explicit_path_wins() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE_NAME), "year = 2001\n").unwrap();
        let explicit = dir.path().join("other.toml");
        std::fs::write(&explicit, "year = 2002\n").unwrap();

        let config = ReportConfig::load(Some(&explicit), dir.path()).unwrap().unwrap();
        assert_eq!(config.year(), 2002);
    }

    #[test]
    fn test_unknown_key_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "hostname = 'x'\n").unwrap();

        let err = ReportConfig::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse"));
    }

    #[test]
    fn test_defaults() {
        let config = ReportConfig::default();
        assert_eq!(config.host_pattern(), DEFAULT_HOST_PATTERN);
        assert_eq!(config.log_format(), LogFormat::Pretty);
        assert_eq!(config.log_level(), "warn");
    }

    #[test]
    fn test_merge_prefers_overrides() {
        let mut config = ReportConfig {
            host_pattern: Some("a".to_string()),
            year: Some(2001),
            log_level: Some("info".to_string()),
            ..Default::default()
        };
        config.merge(ReportConfig {
            year: Some(2013),
            log_format: Some(LogFormat::Compact),
            ..Default::default()
        });

        assert_eq!(config.host_pattern(), "a");
        assert_eq!(config.year(), 2013);
        assert_eq!(config.log_level(), "info");
        assert_eq!(config.log_format(), LogFormat::Compact);
    }
}
