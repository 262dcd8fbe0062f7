//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.

use serde::de::Error;
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::error::Result;
use crate::protocol::fields::{PF_NUM_CHANNELS, PF_TIMEOUT_DEFAULT_MS};

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub decoder: DecoderConfig,

    #[serde(default)]
    pub receiver: ReceiverConfig,
}

/// Decoder configuration: which channels to listen on and how quickly each
/// output goes stale
#[derive(Debug, Deserialize, Clone)]
pub struct DecoderConfig {
    /// Logical channels (0–3) to instantiate a decoder for
    #[serde(default = "default_listen_channels")]
    pub listen_channels: Vec<u8>,

    /// Staleness threshold for the RED output in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_red_ms: u64,

    /// Staleness threshold for the BLUE output in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_blue_ms: u64,
}

/// Receiver loop configuration (demo packet feed)
#[derive(Debug, Deserialize, Clone)]
pub struct ReceiverConfig {
    /// Interval between replayed packet words in milliseconds
    #[serde(default = "default_feed_interval_ms")]
    pub feed_interval_ms: u64,

    /// Number of processed words between status log messages
    #[serde(default = "default_status_interval_words")]
    pub status_interval_words: u64,
}

// Default value functions
fn default_listen_channels() -> Vec<u8> {
    vec![0]
}
fn default_timeout_ms() -> u64 {
    PF_TIMEOUT_DEFAULT_MS
}

fn default_feed_interval_ms() -> u64 {
    100
}
fn default_status_interval_words() -> u64 {
    50
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            listen_channels: default_listen_channels(),
            timeout_red_ms: default_timeout_ms(),
            timeout_blue_ms: default_timeout_ms(),
        }
    }
}

impl Default for ReceiverConfig {
    fn default() -> Self {
        Self {
            feed_interval_ms: default_feed_interval_ms(),
            status_interval_words: default_status_interval_words(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            decoder: DecoderConfig::default(),
            receiver: ReceiverConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns error if any configuration value is out of valid range
    fn validate(&self) -> Result<()> {
        if self.decoder.listen_channels.is_empty() {
            return Err(crate::error::PfReceiverError::Config(
                toml::de::Error::custom("decoder listen_channels cannot be empty"),
            ));
        }

        for &channel in &self.decoder.listen_channels {
            if channel >= PF_NUM_CHANNELS {
                return Err(crate::error::PfReceiverError::Config(toml::de::Error::custom(
                    format!("decoder channel {} out of range (valid: 0-3)", channel),
                )));
            }
        }

        if self.decoder.timeout_red_ms == 0 || self.decoder.timeout_blue_ms == 0 {
            return Err(crate::error::PfReceiverError::Config(
                toml::de::Error::custom("decoder timeouts must be non-zero"),
            ));
        }

        if self.receiver.feed_interval_ms == 0 {
            return Err(crate::error::PfReceiverError::Config(
                toml::de::Error::custom("receiver feed_interval_ms must be non-zero"),
            ));
        }

        // The receive loop takes words_fed modulo this value
        if self.receiver.status_interval_words == 0 {
            return Err(crate::error::PfReceiverError::Config(
                toml::de::Error::custom("receiver status_interval_words must be non-zero"),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.decoder.listen_channels, vec![0]);
        assert_eq!(config.decoder.timeout_red_ms, 750);
        assert_eq!(config.decoder.timeout_blue_ms, 750);
    }

    #[test]
    fn test_parse_empty_toml_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.decoder.listen_channels, vec![0]);
        assert_eq!(config.receiver.feed_interval_ms, 100);
    }

    #[test]
    fn test_parse_partial_toml() {
        let toml_str = r#"
            [decoder]
            listen_channels = [1, 2]
            timeout_red_ms = 100
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.decoder.listen_channels, vec![1, 2]);
        assert_eq!(config.decoder.timeout_red_ms, 100);
        // Unspecified fields keep their defaults
        assert_eq!(config.decoder.timeout_blue_ms, 750);
    }

    #[test]
    fn test_validate_rejects_empty_channels() {
        let mut config = Config::default();
        config.decoder.listen_channels.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_out_of_range_channel() {
        let mut config = Config::default();
        config.decoder.listen_channels = vec![0, 4];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let mut config = Config::default();
        config.decoder.timeout_blue_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_status_interval() {
        let config: Config = toml::from_str("[receiver]\nstatus_interval_words = 0").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
            [decoder]
            listen_channels = [2]
            timeout_red_ms = 250
            timeout_blue_ms = 500

            [receiver]
            feed_interval_ms = 20
            "#
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.decoder.listen_channels, vec![2]);
        assert_eq!(config.decoder.timeout_red_ms, 250);
        assert_eq!(config.decoder.timeout_blue_ms, 500);
        assert_eq!(config.receiver.feed_interval_ms, 20);
    }

    #[test]
    fn test_load_from_invalid_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[decoder]\nlisten_channels = [9]").unwrap();

        assert!(Config::load(file.path()).is_err());
    }

    #[test]
    fn test_load_missing_file() {
        assert!(Config::load("/nonexistent/pf-receiver.toml").is_err());
    }
}
