//! FDB cache configuration.
//!
//! Loaded from a TOML file; missing keys take their defaults and a missing
//! file yields the default configuration.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {message}")]
    Parse { path: String, message: String },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FdbCacheConfig {
    /// Maximum notifications handed to the subscriber in one call.
    #[serde(default = "default_notification_batch_size")]
    pub notification_batch_size: usize,

    /// Period of the notification pump's fallback wakeup.
    #[serde(default = "default_pump_interval_ms")]
    pub pump_interval_ms: u64,

    /// Reject entries whose VLAN the switch does not know.
    #[serde(default = "default_validate_vlan_membership")]
    pub validate_vlan_membership: bool,
}

fn default_notification_batch_size() -> usize {
    128
}

fn default_pump_interval_ms() -> u64 {
    100
}

fn default_validate_vlan_membership() -> bool {
    true
}

impl Default for FdbCacheConfig {
    fn default() -> Self {
        Self {
            notification_batch_size: default_notification_batch_size(),
            pump_interval_ms: default_pump_interval_ms(),
            validate_vlan_membership: default_validate_vlan_membership(),
        }
    }
}

impl FdbCacheConfig {
    /// Loads and validates `path`, falling back to defaults if it does not exist.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let config = match fs::read_to_string(path) {
            Ok(content) => Self::from_toml_str(&content).map_err(|e| match e {
                ConfigError::Parse { message, .. } => ConfigError::Parse {
                    path: path.display().to_string(),
                    message,
                },
                other => other,
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!("Config file {} not found, using defaults", path.display());
                Self::default()
            }
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.display().to_string(),
                    source,
                })
            }
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse {
            path: "<string>".to_string(),
            message: e.to_string(),
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.notification_batch_size == 0 {
            return Err(ConfigError::Invalid(
                "notification_batch_size must be > 0".to_string(),
            ));
        }
        if self.pump_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "pump_interval_ms must be > 0".to_string(),
            ));
        }
        Ok(())
    }

    pub fn pump_interval(&self) -> Duration {
        Duration::from_millis(self.pump_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = FdbCacheConfig::default();
        assert_eq!(config.notification_batch_size, 128);
        assert_eq!(config.pump_interval(), Duration::from_millis(100));
        assert!(config.validate_vlan_membership);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = FdbCacheConfig::from_toml_str("notification_batch_size = 4\n").unwrap();
        assert_eq!(config.notification_batch_size, 4);
        assert_eq!(config.pump_interval_ms, 100);
        assert!(config.validate_vlan_membership);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "pump_interval_ms = 5").unwrap();
        writeln!(file, "validate_vlan_membership = false").unwrap();

        let config = FdbCacheConfig::load_or_default(file.path()).unwrap();
        assert_eq!(config.pump_interval_ms, 5);
        assert!(!config.validate_vlan_membership);
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = FdbCacheConfig::load_or_default(dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, FdbCacheConfig::default());
    }

    #[test]
    fn test_invalid_values_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "notification_batch_size = 0").unwrap();
        let err = FdbCacheConfig::load_or_default(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        let err = FdbCacheConfig::from_toml_str("pump_interval_ms = \"fast\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
