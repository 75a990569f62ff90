//! Client configuration.
//!
//! Three sources, in the order an application usually layers them:
//! [`ClientConfig::default`], a TOML file ([`ClientConfig::load`]) and
//! environment variables ([`ClientConfig::from_env`]).
//!
//! # Config File Format
//!
//! ```toml
//! address = "127.0.0.1:2206"      # or "unix:///run/channel.sock"
//! ping_interval_secs = 25
//! reconnect_delay_secs = 1
//! connect_timeout_secs = 5
//! codec = "bincode"               # or "json"
//! max_frame_len = 16777216
//! ```

use serde::Deserialize;
use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::codec::{CodecKind, DEFAULT_MAX_FRAME_LEN};
use crate::domain::RemoteAddress;

/// Seconds between keepalive probes.
pub const DEFAULT_PING_INTERVAL: Duration = Duration::from_secs(25);

/// Delay before a reconnect attempt. Fixed: no backoff, no jitter.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(1);

/// Connect timeout for blocking and async connects.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Runtime configuration of a client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Broker endpoint
    pub address: RemoteAddress,
    /// Keepalive period
    pub ping_interval: Duration,
    /// Delay between a close and the next connect attempt
    pub reconnect_delay: Duration,
    /// Upper bound on establishing a connection
    pub connect_timeout: Duration,
    /// Message encoding shared with the broker
    pub codec: CodecKind,
    /// Largest inbound frame accepted, header included
    pub max_frame_len: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            address: RemoteAddress::default(),
            ping_interval: DEFAULT_PING_INTERVAL,
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            codec: CodecKind::default(),
            max_frame_len: DEFAULT_MAX_FRAME_LEN,
        }
    }
}

/// Configuration file structure.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    address: Option<String>,
    ping_interval_secs: Option<u64>,
    reconnect_delay_secs: Option<u64>,
    connect_timeout_secs: Option<u64>,
    codec: Option<CodecKind>,
    max_frame_len: Option<usize>,
}

impl ClientConfig {
    /// Configuration targeting `address` with every other knob at its default.
    pub fn with_address(address: RemoteAddress) -> Self {
        Self {
            address,
            ..Self::default()
        }
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read, parsed or validated.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Io {
            path: path.as_ref().display().to_string(),
            error: e.to_string(),
        })?;

        Self::parse(&content)
    }

    /// Parse configuration from a TOML string. Missing keys take defaults.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile =
            toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;

        let defaults = Self::default();
        let address = match file.address {
            Some(raw) => raw
                .parse()
                .map_err(|e: crate::domain::AddressError| ConfigError::Invalid(e.to_string()))?,
            None => defaults.address,
        };

        let config = Self {
            address,
            ping_interval: file
                .ping_interval_secs
                .map_or(defaults.ping_interval, Duration::from_secs),
            reconnect_delay: file
                .reconnect_delay_secs
                .map_or(defaults.reconnect_delay, Duration::from_secs),
            connect_timeout: file
                .connect_timeout_secs
                .map_or(defaults.connect_timeout, Duration::from_secs),
            codec: file.codec.unwrap_or(defaults.codec),
            max_frame_len: file.max_frame_len.unwrap_or(defaults.max_frame_len),
        };
        config.validate()?;
        Ok(config)
    }

    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `CHANNEL_ADDRESS`: broker address (default: 127.0.0.1:2206)
    /// - `CHANNEL_PING_INTERVAL`: keepalive seconds (default: 25)
    /// - `CHANNEL_RECONNECT_DELAY`: reconnect delay seconds (default: 1)
    /// - `CHANNEL_CONNECT_TIMEOUT`: connect timeout seconds (default: 5)
    /// - `CHANNEL_CODEC`: `bincode` or `json` (default: bincode)
    ///
    /// Unset variables keep the values already in `self`.
    pub fn merge_env(mut self) -> Result<Self, ConfigError> {
        if let Ok(raw) = env::var("CHANNEL_ADDRESS") {
            self.address = raw
                .parse()
                .map_err(|e: crate::domain::AddressError| ConfigError::Invalid(e.to_string()))?;
        }
        if let Some(secs) = env_secs("CHANNEL_PING_INTERVAL")? {
            self.ping_interval = secs;
        }
        if let Some(secs) = env_secs("CHANNEL_RECONNECT_DELAY")? {
            self.reconnect_delay = secs;
        }
        if let Some(secs) = env_secs("CHANNEL_CONNECT_TIMEOUT")? {
            self.connect_timeout = secs;
        }
        if let Ok(raw) = env::var("CHANNEL_CODEC") {
            self.codec = raw.parse().map_err(ConfigError::Invalid)?;
        }
        self.validate()?;
        Ok(self)
    }

    /// Defaults overlaid with environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().merge_env()
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.ping_interval.is_zero() {
            return Err(ConfigError::Invalid("ping interval must be positive".into()));
        }
        if self.reconnect_delay.is_zero() {
            return Err(ConfigError::Invalid("reconnect delay must be positive".into()));
        }
        if self.connect_timeout.is_zero() {
            return Err(ConfigError::Invalid("connect timeout must be positive".into()));
        }
        if self.max_frame_len <= crate::codec::FRAME_HEADER_LEN {
            return Err(ConfigError::Invalid(
                "max frame length must exceed the frame header".into(),
            ));
        }
        Ok(())
    }
}

fn env_secs(name: &str) -> Result<Option<Duration>, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(|secs| Some(Duration::from_secs(secs)))
            .map_err(|_| ConfigError::Invalid(format!("{name} must be whole seconds, got `{raw}`"))),
        Err(_) => Ok(None),
    }
}

/// Errors that can occur during config loading.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// File I/O error.
    #[error("Failed to read {path}: {error}")]
    Io {
        /// Path of the file that failed to load.
        path: String,
        /// Error message from the I/O operation.
        error: String,
    },
    /// TOML parsing error.
    #[error("Failed to parse config: {0}")]
    Parse(String),
    /// A value parsed but is not usable.
    #[error("Invalid config: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.address.to_string(), "127.0.0.1:2206");
        assert_eq!(config.ping_interval, Duration::from_secs(25));
        assert_eq!(config.reconnect_delay, Duration::from_secs(1));
        assert_eq!(config.connect_timeout, Duration::from_secs(5));
        assert_eq!(config.codec, CodecKind::Bincode);
    }

    #[test]
    fn test_parse_partial_file() {
        let config = ClientConfig::parse(
            r#"
            address = "unix:///run/channel.sock"
            ping_interval_secs = 10
            codec = "json"
            "#,
        )
        .unwrap();
        assert_eq!(config.address, RemoteAddress::unix("/run/channel.sock"));
        assert_eq!(config.ping_interval, Duration::from_secs(10));
        assert_eq!(config.reconnect_delay, DEFAULT_RECONNECT_DELAY);
        assert_eq!(config.codec, CodecKind::Json);
    }

    #[test]
    fn test_parse_empty_file_is_default() {
        assert_eq!(ClientConfig::parse("").unwrap(), ClientConfig::default());
    }

    #[test]
    fn test_parse_rejects_bad_values() {
        assert!(matches!(
            ClientConfig::parse("address = \"nowhere\""),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            ClientConfig::parse("ping_interval_secs = 0"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            ClientConfig::parse("reconnect_delay_secs = 0"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            ClientConfig::parse("codec = \"xml\""),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            ClientConfig::parse("unknown_key = 1"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "address = \"10.0.0.5:7000\"").unwrap();
        writeln!(file, "connect_timeout_secs = 2").unwrap();

        let config = ClientConfig::load(file.path()).unwrap();
        assert_eq!(config.address, RemoteAddress::tcp("10.0.0.5", 7000));
        assert_eq!(config.connect_timeout, Duration::from_secs(2));
    }

    #[test]
    fn test_load_missing_file() {
        let result = ClientConfig::load("/definitely/not/here.toml");
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }
}
