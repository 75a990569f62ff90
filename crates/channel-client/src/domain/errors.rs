//! Client error taxonomy.
//!
//! Two separate channels with different recovery policies:
//! - [`ClientError`] is returned synchronously from requests and `connect`.
//!   Fail fast, never retried.
//! - [`DispatchFault`] is produced on the inbound path when a delivery cannot
//!   be routed. It signals registry/broker desynchronization and is reported,
//!   never retried.

use thiserror::Error;

use super::channel::ChannelName;
use super::message::MessageKind;
use crate::codec::CodecError;
use crate::ports::TransportError;

/// Errors surfaced to the caller of a request operation.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The supplied handler cannot be invoked.
    #[error("handler for `{channel}` is not invocable")]
    InvalidCallback { channel: ChannelName },

    /// Empty channel list or empty channel name.
    #[error("invalid channel: {0}")]
    InvalidChannel(String),

    /// A managed-only operation on a manual transport.
    #[error("`{operation}` requires a managed transport")]
    UnsupportedMode { operation: MessageKind },

    /// The manual transport could not open the connection.
    #[error("connection failed: {0}")]
    Connection(#[source] TransportError),

    /// The transport rejected a write.
    #[error("transport error: {0}")]
    Transport(#[source] TransportError),

    #[error(transparent)]
    Codec(#[from] CodecError),

    /// The runtime task driving the client has stopped.
    #[error("client runtime is not running")]
    RuntimeClosed,

    #[error("process-wide client is already initialized")]
    AlreadyInitialized,
}

/// Inbound deliveries that could not be dispatched.
#[derive(Debug, Error)]
pub enum DispatchFault {
    /// Event on a channel with no handler and no global message handler.
    #[error("event `{channel}` has no handler")]
    UnhandledEvent { channel: ChannelName },

    /// Queue item on a channel that is not watched.
    #[error("queue `{channel}` has no handler")]
    UnhandledQueue { channel: ChannelName },

    /// Queue item for a watch whose handler can no longer be invoked. The
    /// queue is unwatched and no reserve is issued.
    #[error("queue `{channel}` handler is closed, unwatched")]
    HandlerClosed { channel: ChannelName },

    /// A client-to-broker message kind arrived from the broker.
    #[error("unexpected `{kind}` message from broker")]
    UnexpectedMessage { kind: MessageKind },

    /// Inbound bytes were not a valid message.
    #[error("undecodable message: {0}")]
    Decode(#[from] CodecError),

    /// The registered handler returned an error.
    #[error("handler for `{channel}` failed: {source}")]
    Handler {
        channel: ChannelName,
        #[source]
        source: anyhow::Error,
    },
}

impl DispatchFault {
    /// Short label for logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            Self::UnhandledEvent { .. } => "unhandled_event",
            Self::UnhandledQueue { .. } => "unhandled_queue",
            Self::HandlerClosed { .. } => "handler_closed",
            Self::UnexpectedMessage { .. } => "unexpected_message",
            Self::Decode(_) => "decode",
            Self::Handler { .. } => "handler",
        }
    }

    /// Channel the fault concerns, if any.
    pub fn channel(&self) -> Option<&ChannelName> {
        match self {
            Self::UnhandledEvent { channel }
            | Self::UnhandledQueue { channel }
            | Self::HandlerClosed { channel }
            | Self::Handler { channel, .. } => Some(channel),
            Self::UnexpectedMessage { .. } | Self::Decode(_) => None,
        }
    }
}
