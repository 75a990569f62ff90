//! # Wire Codec
//!
//! Converts [`WireMessage`]s to and from bytes. The format is process-wide
//! and must match the broker; it is injected into the client as a `Codec`.
//!
//! - [`BincodeCodec`] - compact binary encoding (default)
//! - [`JsonCodec`] - JSON, for brokers or tooling that speak text

pub mod frame;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::domain::WireMessage;

pub use frame::{encode_frame, parse_header, read_frame, DEFAULT_MAX_FRAME_LEN, FRAME_HEADER_LEN};

/// Errors from encoding, decoding or framing.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("failed to encode message: {0}")]
    Encode(String),

    #[error("failed to decode message: {0}")]
    Decode(String),

    #[error("frame of {len} bytes exceeds limit of {max}")]
    FrameTooLarge { len: usize, max: usize },

    #[error("frame length {len} is shorter than its header")]
    FrameTooShort { len: usize },
}

/// Encode/decode pair for protocol messages.
pub trait Codec: Send + Sync {
    fn encode(&self, message: &WireMessage) -> Result<Vec<u8>, CodecError>;

    fn decode(&self, bytes: &[u8]) -> Result<WireMessage, CodecError>;

    /// Name used in logs.
    fn name(&self) -> &'static str;
}

/// `bincode` encoding.
#[derive(Debug, Clone, Copy, Default)]
pub struct BincodeCodec;

impl Codec for BincodeCodec {
    fn encode(&self, message: &WireMessage) -> Result<Vec<u8>, CodecError> {
        bincode::serialize(message).map_err(|e| CodecError::Encode(e.to_string()))
    }

    fn decode(&self, bytes: &[u8]) -> Result<WireMessage, CodecError> {
        bincode::deserialize(bytes).map_err(|e| CodecError::Decode(e.to_string()))
    }

    fn name(&self) -> &'static str {
        "bincode"
    }
}

/// `serde_json` encoding.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn encode(&self, message: &WireMessage) -> Result<Vec<u8>, CodecError> {
        serde_json::to_vec(message).map_err(|e| CodecError::Encode(e.to_string()))
    }

    fn decode(&self, bytes: &[u8]) -> Result<WireMessage, CodecError> {
        serde_json::from_slice(bytes).map_err(|e| CodecError::Decode(e.to_string()))
    }

    fn name(&self) -> &'static str {
        "json"
    }
}

/// Codec selection in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CodecKind {
    #[default]
    Bincode,
    Json,
}

impl CodecKind {
    pub fn build(self) -> Box<dyn Codec> {
        match self {
            Self::Bincode => Box::new(BincodeCodec),
            Self::Json => Box::new(JsonCodec),
        }
    }
}

impl fmt::Display for CodecKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bincode => write!(f, "bincode"),
            Self::Json => write!(f, "json"),
        }
    }
}

impl FromStr for CodecKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "bincode" => Ok(Self::Bincode),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown codec `{other}` (expected bincode or json)")),
        }
    }
}
