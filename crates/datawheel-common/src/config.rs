//! Configuration types for Datawheel
//!
//! The CLI reads these from a TOML file; every field has a default so a
//! missing or partial file still yields a usable configuration.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Root configuration for Datawheel
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Group store configuration
    #[serde(default)]
    pub storage: StorageConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Wheel allocation configuration
    #[serde(default)]
    pub wheel: WheelConfig,
    /// Team code prefixes: first character of a name -> team label
    #[serde(default)]
    pub teams: BTreeMap<String, String>,
}

/// Where group membership is persisted
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Path of the JSON group file
    #[serde(default = "default_groups_file")]
    pub groups_file: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            groups_file: default_groups_file(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WheelConfig {
    /// Repeat each member `weight` times before moving to the next member
    /// instead of cycling through the whole group
    #[serde(default)]
    pub per_member: bool,
}

fn default_groups_file() -> PathBuf {
    PathBuf::from("groups.json")
}

fn default_log_level() -> String {
    "warn".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.storage.groups_file, PathBuf::from("groups.json"));
        assert_eq!(config.logging.level, "warn");
        assert!(!config.wheel.per_member);
        assert!(config.teams.is_empty());
    }

    #[test]
    fn test_partial_toml() {
        let config: Config = toml::from_str(
            r#"
            [logging]
            level = "debug"

            [teams]
            "1" = "1Hưng"
            "2" = "2Kiệt"
            "#,
        )
        .unwrap();
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.storage, StorageConfig::default());
        assert_eq!(config.teams.get("2").map(String::as_str), Some("2Kiệt"));
    }

    #[test]
    fn test_empty_toml_is_default() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config, Config::default());
    }
}
