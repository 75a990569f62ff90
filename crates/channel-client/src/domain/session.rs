//! Session record for the single upstream connection.

use std::fmt;

use super::address::RemoteAddress;
use crate::ports::{ConnectionId, TimerHandle};

/// Connection lifecycle state.
///
/// `Disconnected -> Connecting -> Connected -> Disconnected -> Connecting ...`
/// with no terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => write!(f, "disconnected"),
            Self::Connecting => write!(f, "connecting"),
            Self::Connected => write!(f, "connected"),
        }
    }
}

/// Transport-level state of the client.
///
/// Invariant: `reconnect_timer` is only set while `connection` is `None`.
#[derive(Debug, Default)]
pub struct Session {
    pub(crate) state: SessionState,
    pub(crate) address: RemoteAddress,
    pub(crate) connection: Option<ConnectionId>,
    pub(crate) reconnect_timer: Option<TimerHandle>,
    pub(crate) ping_timer: Option<TimerHandle>,
}

impl Session {
    pub fn new(address: RemoteAddress) -> Self {
        Self {
            address,
            ..Self::default()
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn address(&self) -> &RemoteAddress {
        &self.address
    }

    pub fn connection(&self) -> Option<ConnectionId> {
        self.connection
    }

    pub fn is_live(&self, connection: ConnectionId) -> bool {
        self.connection == Some(connection)
    }

    /// Record a transport handle. Pending handles are `Connecting`; manual
    /// handles are usable immediately.
    pub(crate) fn attach(&mut self, connection: ConnectionId, ready: bool) {
        self.connection = Some(connection);
        self.state = if ready {
            SessionState::Connected
        } else {
            SessionState::Connecting
        };
    }

    pub(crate) fn mark_ready(&mut self) {
        self.state = SessionState::Connected;
    }

    /// Forget the live connection, returning it.
    pub(crate) fn detach(&mut self) -> Option<ConnectionId> {
        self.state = SessionState::Disconnected;
        self.connection.take()
    }
}
