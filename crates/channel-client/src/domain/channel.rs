//! Channel names, channel lists and opaque payloads.

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

use super::errors::ClientError;

/// Opaque channel identifier shared by the event and queue namespaces.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChannelName(String);

impl ChannelName {
    /// Create a channel name. Emptiness is checked when the name is used.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Borrow the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub(crate) fn validate(&self) -> Result<(), ClientError> {
        if self.0.trim().is_empty() {
            return Err(ClientError::InvalidChannel(
                "channel name must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

impl fmt::Display for ChannelName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for ChannelName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ChannelName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for ChannelName {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl From<&String> for ChannelName {
    fn from(name: &String) -> Self {
        Self(name.clone())
    }
}

/// One or more channel names, as accepted by every request operation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Channels(Vec<ChannelName>);

impl Channels {
    /// Borrow the names in order.
    pub fn as_slice(&self) -> &[ChannelName] {
        &self.0
    }

    /// Consume into the ordered name list.
    pub fn into_vec(self) -> Vec<ChannelName> {
        self.0
    }

    /// Number of names.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when no names are present.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Reject empty lists and empty names before anything is mutated.
    pub(crate) fn validate(&self) -> Result<(), ClientError> {
        if self.0.is_empty() {
            return Err(ClientError::InvalidChannel(
                "at least one channel is required".to_string(),
            ));
        }
        self.0.iter().try_for_each(ChannelName::validate)
    }
}

impl From<ChannelName> for Channels {
    fn from(name: ChannelName) -> Self {
        Self(vec![name])
    }
}

impl From<&str> for Channels {
    fn from(name: &str) -> Self {
        Self(vec![name.into()])
    }
}

impl From<String> for Channels {
    fn from(name: String) -> Self {
        Self(vec![name.into()])
    }
}

impl From<Vec<ChannelName>> for Channels {
    fn from(names: Vec<ChannelName>) -> Self {
        Self(names)
    }
}

impl From<Vec<String>> for Channels {
    fn from(names: Vec<String>) -> Self {
        Self(names.into_iter().map(ChannelName::from).collect())
    }
}

impl From<Vec<&str>> for Channels {
    fn from(names: Vec<&str>) -> Self {
        Self(names.into_iter().map(ChannelName::from).collect())
    }
}

impl From<&[&str]> for Channels {
    fn from(names: &[&str]) -> Self {
        Self(names.iter().copied().map(ChannelName::from).collect())
    }
}

impl<const N: usize> From<[&str; N]> for Channels {
    fn from(names: [&str; N]) -> Self {
        Self(names.into_iter().map(ChannelName::from).collect())
    }
}

impl FromIterator<ChannelName> for Channels {
    fn from_iter<I: IntoIterator<Item = ChannelName>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Opaque message body carried by publish, enqueue and deliveries.
///
/// The client never inspects it; JSON helpers are provided for convenience.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Payload(Vec<u8>);

impl Payload {
    /// Wrap raw bytes.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// Serialize a value as JSON.
    pub fn json<T: Serialize>(value: &T) -> Result<Self, serde_json::Error> {
        serde_json::to_vec(value).map(Self)
    }

    /// Parse the payload as JSON.
    pub fn parse_json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.0)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<u8>> for Payload {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl From<&[u8]> for Payload {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }
}

impl From<&str> for Payload {
    fn from(text: &str) -> Self {
        Self(text.as_bytes().to_vec())
    }
}

impl From<String> for Payload {
    fn from(text: String) -> Self {
        Self(text.into_bytes())
    }
}
