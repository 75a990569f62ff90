//! Broker addressing: `host:port` or `unix://<path>`.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Marker prefix for unix-domain socket addresses.
pub const UNIX_SCHEME: &str = "unix://";

/// Default broker host.
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default broker port.
pub const DEFAULT_PORT: u16 = 2206;

/// Where the broker listens.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RemoteAddress {
    /// TCP endpoint. `host` may be a name, an IPv4 literal or an IPv6 literal
    /// without brackets.
    Tcp {
        /// Host name or IP literal
        host: String,
        /// TCP port
        port: u16,
    },
    /// Unix-domain stream socket.
    Unix(PathBuf),
}

impl RemoteAddress {
    /// TCP address.
    pub fn tcp(host: impl Into<String>, port: u16) -> Self {
        Self::Tcp {
            host: host.into(),
            port,
        }
    }

    /// Unix-domain socket address.
    pub fn unix(path: impl Into<PathBuf>) -> Self {
        Self::Unix(path.into())
    }

    pub fn is_unix(&self) -> bool {
        matches!(self, Self::Unix(_))
    }
}

impl Default for RemoteAddress {
    fn default() -> Self {
        Self::tcp(DEFAULT_HOST, DEFAULT_PORT)
    }
}

impl fmt::Display for RemoteAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tcp { host, port } if host.contains(':') => write!(f, "[{host}]:{port}"),
            Self::Tcp { host, port } => write!(f, "{host}:{port}"),
            Self::Unix(path) => write!(f, "{UNIX_SCHEME}{}", path.display()),
        }
    }
}

/// Address string that could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid broker address `{input}`: {reason}")]
pub struct AddressError {
    /// The rejected input
    pub input: String,
    /// Why it was rejected
    pub reason: &'static str,
}

impl FromStr for RemoteAddress {
    type Err = AddressError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let invalid = |reason| AddressError {
            input: input.to_string(),
            reason,
        };

        if let Some(path) = input.strip_prefix(UNIX_SCHEME) {
            if path.is_empty() {
                return Err(invalid("unix socket path is empty"));
            }
            return Ok(Self::unix(path));
        }

        let (host, port) = input
            .rsplit_once(':')
            .ok_or_else(|| invalid("expected host:port"))?;
        let host = host
            .strip_prefix('[')
            .and_then(|h| h.strip_suffix(']'))
            .unwrap_or(host);
        if host.is_empty() {
            return Err(invalid("host is empty"));
        }
        if host.contains(':') && !input.starts_with('[') {
            return Err(invalid("IPv6 hosts must be bracketed"));
        }
        let port = port.parse().map_err(|_| invalid("port is not a number"))?;
        Ok(Self::tcp(host, port))
    }
}

impl Serialize for RemoteAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for RemoteAddress {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
