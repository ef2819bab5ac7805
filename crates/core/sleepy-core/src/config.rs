//! Device configuration.
//!
//! A [`DeviceConfig`] is usually read from a small TOML file:
//!
//! ```toml
//! name = "sleepy"
//! policy = "exclusive"
//! ```
//!
//! Every field is optional and falls back to [`DeviceConfig::default`].

use serde::Deserialize;

use crate::sync::ConsumePolicy;

/// Default device name, as it would appear under `/dev`.
pub const DEFAULT_NAME: &str = "sleepy";

/// Settings for a [`SleepyDevice`](crate::SleepyDevice).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DeviceConfig {
    /// Device name used in log output.
    pub name: String,
    /// How many woken readers one write can satisfy.
    pub policy: ConsumePolicy,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_NAME.to_owned(),
            policy: ConsumePolicy::default(),
        }
    }
}

/// Error returned when a configuration file cannot be parsed.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The text is not valid TOML or does not match the expected schema.
    #[error("invalid device config: {0}")]
    Parse(#[from] toml::de::Error),
    /// The device name is empty.
    #[error("device name must not be empty")]
    EmptyName,
}

impl DeviceConfig {
    /// Parses a configuration from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        if config.name.trim().is_empty() {
            return Err(ConfigError::EmptyName);
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config = DeviceConfig::from_toml_str("").unwrap();
        assert_eq!(config, DeviceConfig::default());
        assert_eq!(config.name, "sleepy");
        assert_eq!(config.policy, ConsumePolicy::Broadcast);
    }

    #[test]
    fn parses_all_fields() {
        let config = DeviceConfig::from_toml_str("name = \"nap\"\npolicy = \"exclusive\"\n").unwrap();
        assert_eq!(config.name, "nap");
        assert_eq!(config.policy, ConsumePolicy::Exclusive);
    }

    #[test]
    fn rejects_unknown_policy() {
        let err = DeviceConfig::from_toml_str("policy = \"fifo\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn rejects_unknown_field() {
        assert!(DeviceConfig::from_toml_str("major = 42").is_err());
    }

    #[test]
    fn rejects_empty_name() {
        let err = DeviceConfig::from_toml_str("name = \"  \"").unwrap_err();
        assert!(matches!(err, ConfigError::EmptyName));
    }
}
