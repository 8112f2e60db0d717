//! Configuration for the sync core and its host process.
//!
//! Loaded from TOML; every field has a default so an empty file (or no file
//! at all) is valid.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

use crate::logging::LogFormat;

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Config validation failed: {message}")]
    Validation { message: String },
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SyncConfig {
    pub dispatch: DispatchConfig,
    pub logging: LoggingConfig,
}

/// Dispatch loop settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DispatchConfig {
    /// Inbox bound; `None` for an unbounded queue
    pub inbox_capacity: Option<usize>,

    /// Log every published snapshot at trace level
    pub trace_snapshots: bool,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            inbox_capacity: Some(256),
            trace_snapshots: false,
        }
    }
}

/// Logging settings. `RUST_LOG` takes precedence over `level`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Text,
        }
    }
}

impl SyncConfig {
    /// Parse configuration from TOML text.
    pub fn from_toml(content: &str, path: &Path) -> Result<Self, ConfigError> {
        let config: SyncConfig = toml::from_str(content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Load and validate configuration from a file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;

        Self::from_toml(&content, path)
    }

    /// Load from `path` if given, otherwise use the defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// Validates the configuration.
    ///
    /// Checks:
    /// - A bounded inbox has room for at least one event
    /// - The log level parses as a filter directive
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.dispatch.inbox_capacity == Some(0) {
            return Err(ConfigError::Validation {
                message: "dispatch.inbox_capacity must be greater than 0".to_string(),
            });
        }

        if let Err(e) = EnvFilter::try_new(&self.logging.level) {
            return Err(ConfigError::Validation {
                message: format!("logging.level '{}' is invalid: {}", self.logging.level, e),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = SyncConfig::from_toml("", Path::new("empty.toml")).unwrap();
        assert_eq!(config, SyncConfig::default());
        assert_eq!(config.dispatch.inbox_capacity, Some(256));
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, LogFormat::Text);
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
            [dispatch]
            inbox_capacity = 16
            trace_snapshots = true

            [logging]
            level = "connectn_sync=debug"
            format = "json"
        "#;
        let config = SyncConfig::from_toml(toml, Path::new("full.toml")).unwrap();
        assert_eq!(config.dispatch.inbox_capacity, Some(16));
        assert!(config.dispatch.trace_snapshots);
        assert_eq!(config.logging.level, "connectn_sync=debug");
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let err = SyncConfig::from_toml("[dispatch]\ninbox_capacity = 0\n", Path::new("c.toml"))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Validation { .. }));
    }

    #[test]
    fn test_unknown_field_rejected() {
        let err = SyncConfig::from_toml("[dispatch]\nqueue = 3\n", Path::new("c.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_bad_format_rejected() {
        let err = SyncConfig::from_toml("[logging]\nformat = \"xml\"\n", Path::new("c.toml"))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[logging]\nformat = \"pretty\"").unwrap();

        let config = SyncConfig::load(file.path()).unwrap();
        assert_eq!(config.logging.format, LogFormat::Pretty);
        assert_eq!(config.dispatch, DispatchConfig::default());
    }

    #[test]
    fn test_load_missing_file() {
        let err = SyncConfig::load(Path::new("/nonexistent/connectn.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
        assert_eq!(
            SyncConfig::load_or_default(None).unwrap(),
            SyncConfig::default()
        );
    }
}
