//! Sharing configuration.
//!
//! Configuration is loaded from environment variables with defaults that
//! reproduce the observed sharing behaviour (new members get write access,
//! batch level updates skip unknown users).

use serde::{Deserialize, Serialize};
use share_access::Level;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Invalid configuration value.
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue {
        /// Configuration key.
        key: String,
        /// Error message.
        message: String,
    },
}

/// Configuration of the sharing service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SharingConfig {
    /// Level stored on a membership created by sharing.
    pub default_level: Level,

    /// Apply batch level updates all-or-nothing.
    ///
    /// When off, absent users are skipped and the rest is applied.
    pub atomic_batch_updates: bool,

    /// Capacity of the in-memory event channels.
    pub event_channel_capacity: usize,

    /// Whether committed changes are published on the event bus.
    pub publish_events: bool,
}

impl Default for SharingConfig {
    fn default() -> Self {
        Self {
            default_level: Level::Write,
            atomic_batch_updates: false,
            event_channel_capacity: 1024,
            publish_events: true,
        }
    }
}

impl SharingConfig {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `SHARING_DEFAULT_LEVEL`: `read` or `write` (default: write)
    /// - `SHARING_ATOMIC_BATCH`: all-or-nothing batch updates (default: false)
    /// - `SHARING_EVENT_CAPACITY`: event channel capacity (default: 1024)
    /// - `SHARING_PUBLISH_EVENTS`: publish sharing events (default: true)
    ///
    /// Unparseable values fall back to the defaults.
    pub fn from_env() -> Self {
        let default = Self::default();

        Self {
            default_level: std::env::var("SHARING_DEFAULT_LEVEL")
                .ok()
                .and_then(|s| Level::parse(&s))
                .unwrap_or(default.default_level),
            atomic_batch_updates: std::env::var("SHARING_ATOMIC_BATCH")
                .map(|s| parse_flag(&s))
                .unwrap_or(default.atomic_batch_updates),
            event_channel_capacity: std::env::var("SHARING_EVENT_CAPACITY")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(default.event_channel_capacity),
            publish_events: std::env::var("SHARING_PUBLISH_EVENTS")
                .map(|s| s != "false" && s != "0")
                .unwrap_or(default.publish_events),
        }
    }

    /// Like [`from_env`](Self::from_env), but an unknown default level is an error.
    pub fn try_from_env() -> Result<Self, ConfigError> {
        if let Ok(raw) = std::env::var("SHARING_DEFAULT_LEVEL") {
            if Level::parse(&raw).is_none() {
                return Err(ConfigError::InvalidValue {
                    key: "SHARING_DEFAULT_LEVEL".to_string(),
                    message: format!("expected read or write, got {:?}", raw),
                });
            }
        }
        let config = Self::from_env();
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.event_channel_capacity == 0 {
            return Err(ConfigError::InvalidValue {
                key: "event_channel_capacity".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

fn parse_flag(s: &str) -> bool {
    matches!(s.to_lowercase().as_str(), "true" | "1" | "yes" | "on")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SharingConfig::default();
        assert_eq!(config.default_level, Level::Write);
        assert!(!config.atomic_batch_updates);
        assert_eq!(config.event_channel_capacity, 1024);
        assert!(config.publish_events);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_capacity() {
        let config = SharingConfig {
            event_channel_capacity: 0,
            ..SharingConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { ref key, .. }) if key == "event_channel_capacity"
        ));
    }

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("true"));
        assert!(parse_flag("1"));
        assert!(parse_flag("ON"));
        assert!(!parse_flag("false"));
        assert!(!parse_flag("nope"));
    }

    #[test]
    fn test_config_serde() {
        let json = serde_json::to_value(SharingConfig::default()).unwrap();
        assert_eq!(json["default_level"], "write");
    }
}
