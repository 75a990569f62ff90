//! # Driven Ports (Outbound SPI)
//!
//! What the client core requires from its host: a byte transport and a timer
//! facility. Transport events (ready, closed, bytes received) flow back into
//! the core through `ChannelClient::on_remote_*`; timer fires flow back
//! through `ChannelClient::on_timer`.

use std::fmt;
use std::io;
use std::time::Duration;
use thiserror::Error;

use crate::domain::RemoteAddress;

/// Identifies one transport connection. A fresh id is issued per attempt so
/// late events from a previous connection can be told apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl ConnectionId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// How the transport delivers whole messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportMode {
    /// Host event loop with its own message framing. Connects are
    /// fire-and-forget; readiness and failure arrive as events.
    Managed,
    /// Blocking stream socket. The core frames outbound payloads itself and
    /// connects synchronously.
    Manual,
}

/// Abstract interface for the broker connection.
///
/// # Example Implementation
///
/// ```rust,ignore
/// struct LoopbackTransport { sent: Vec<Vec<u8>> }
///
/// impl Transport for LoopbackTransport {
///     fn mode(&self) -> TransportMode { TransportMode::Managed }
///     fn connect(&mut self, _: &RemoteAddress) -> Result<ConnectionId, TransportError> {
///         Ok(ConnectionId::new(1))
///     }
///     fn send(&mut self, _: ConnectionId, bytes: Vec<u8>) -> Result<(), TransportError> {
///         self.sent.push(bytes);
///         Ok(())
///     }
/// }
/// ```
pub trait Transport: Send {
    /// Fixed for the lifetime of the transport.
    fn mode(&self) -> TransportMode;

    /// Open a connection to `address`.
    ///
    /// Managed transports return immediately and report the outcome later.
    /// Manual transports block up to their connect timeout.
    fn connect(&mut self, address: &RemoteAddress) -> Result<ConnectionId, TransportError>;

    /// Write one logical message (managed) or pre-framed bytes (manual).
    fn send(&mut self, connection: ConnectionId, bytes: Vec<u8>) -> Result<(), TransportError>;

    /// Drop any resources still held for `connection`.
    fn release(&mut self, _connection: ConnectionId) {}
}

/// Errors from transport operations.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The connection could not be opened.
    #[error("failed to connect to {address}: {source}")]
    Connect {
        address: RemoteAddress,
        #[source]
        source: io::Error,
    },

    /// No open connection with that id.
    #[error("{0} is not open")]
    NotConnected(ConnectionId),

    /// Writing to the socket failed.
    #[error("write failed: {0}")]
    Io(#[from] io::Error),
}

/// Identifies a scheduled timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle(u64);

impl TimerHandle {
    pub fn new(id: u64) -> Self {
        Self(id)
    }
}

/// What a timer fire means to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    /// Keepalive tick.
    Ping,
    /// Reconnect delay elapsed.
    Reconnect,
}

/// Abstract interface for timers.
///
/// Fires are delivered back to the owner of the client as [`TimerEvent`]s;
/// the scheduler never calls into the client itself.
pub trait Scheduler: Send {
    /// Fire `event` every `interval`, first after one interval.
    fn schedule(&mut self, interval: Duration, event: TimerEvent) -> TimerHandle;

    /// Fire `event` once after `delay`.
    fn once_after(&mut self, delay: Duration, event: TimerEvent) -> TimerHandle;

    /// Cancel a timer. Unknown or already fired handles are ignored.
    fn cancel(&mut self, handle: TimerHandle);
}
