//! Test utilities for the channel client.
//!
//! In-memory implementations of the outbound ports for deterministic tests.
//! Enable with the `test-utils` feature flag.
//!
//! # Example
//!
//! ```rust,ignore
//! use channel_client::test_utils::{ManualScheduler, RecordingTransport};
//! use channel_client::{ClientBuilder, TimerEvent};
//!
//! let mut client = ClientBuilder::default().build(RecordingTransport::managed(), ManualScheduler::new());
//! client.subscribe("news").unwrap();
//!
//! assert_eq!(client.transport().sent().len(), 1);
//! assert_eq!(client.scheduler().active(TimerEvent::Ping).len(), 1);
//! ```

use std::io;
use std::time::Duration;

use crate::codec::{parse_header, Codec, FRAME_HEADER_LEN};
use crate::domain::{RemoteAddress, WireMessage};
use crate::ports::{
    ConnectionId, Scheduler, TimerEvent, TimerHandle, Transport, TransportError, TransportMode,
};

/// Transport that records every call instead of touching a socket.
#[derive(Debug)]
pub struct RecordingTransport {
    mode: TransportMode,
    next_id: u64,
    fail_connect: bool,
    fail_send: bool,
    connects: Vec<(ConnectionId, RemoteAddress)>,
    sent: Vec<(ConnectionId, Vec<u8>)>,
    released: Vec<ConnectionId>,
}

impl RecordingTransport {
    pub fn new(mode: TransportMode) -> Self {
        Self {
            mode,
            next_id: 1,
            fail_connect: false,
            fail_send: false,
            connects: Vec::new(),
            sent: Vec::new(),
            released: Vec::new(),
        }
    }

    pub fn managed() -> Self {
        Self::new(TransportMode::Managed)
    }

    pub fn manual() -> Self {
        Self::new(TransportMode::Manual)
    }

    /// Make subsequent connects fail with `ConnectionRefused`.
    pub fn fail_connects(&mut self, fail: bool) {
        self.fail_connect = fail;
    }

    /// Make subsequent sends fail with `BrokenPipe`.
    pub fn fail_sends(&mut self, fail: bool) {
        self.fail_send = fail;
    }

    pub fn connects(&self) -> &[(ConnectionId, RemoteAddress)] {
        &self.connects
    }

    pub fn sent(&self) -> &[(ConnectionId, Vec<u8>)] {
        &self.sent
    }

    pub fn released(&self) -> &[ConnectionId] {
        &self.released
    }

    /// Id handed out by the most recent connect.
    pub fn last_connection(&self) -> Option<ConnectionId> {
        self.connects.last().map(|(id, _)| *id)
    }

    /// Decode every recorded send, skipping keepalives. Manual-mode frames
    /// are unwrapped first.
    pub fn sent_messages(&self, codec: &dyn Codec) -> Vec<WireMessage> {
        self.sent
            .iter()
            .filter_map(|(_, bytes)| {
                let body = self.unframe(bytes)?;
                if body.is_empty() {
                    return None;
                }
                codec.decode(body).ok()
            })
            .collect()
    }

    /// Number of zero-length sends.
    pub fn keepalives(&self) -> usize {
        self.sent
            .iter()
            .filter(|(_, bytes)| matches!(self.unframe(bytes), Some(body) if body.is_empty()))
            .count()
    }

    pub fn clear_sent(&mut self) {
        self.sent.clear();
    }

    fn unframe<'a>(&self, bytes: &'a [u8]) -> Option<&'a [u8]> {
        match self.mode {
            TransportMode::Managed => Some(bytes),
            TransportMode::Manual => {
                let header: [u8; FRAME_HEADER_LEN] = bytes.get(..FRAME_HEADER_LEN)?.try_into().ok()?;
                let len = parse_header(header, usize::MAX).ok()?;
                bytes.get(FRAME_HEADER_LEN..FRAME_HEADER_LEN + len)
            }
        }
    }
}

impl Transport for RecordingTransport {
    fn mode(&self) -> TransportMode {
        self.mode
    }

    fn connect(&mut self, address: &RemoteAddress) -> Result<ConnectionId, TransportError> {
        if self.fail_connect {
            return Err(TransportError::Connect {
                address: address.clone(),
                source: io::Error::from(io::ErrorKind::ConnectionRefused),
            });
        }
        let id = ConnectionId::new(self.next_id);
        self.next_id += 1;
        self.connects.push((id, address.clone()));
        Ok(id)
    }

    fn send(&mut self, connection: ConnectionId, bytes: Vec<u8>) -> Result<(), TransportError> {
        if self.fail_send {
            return Err(TransportError::Io(io::Error::from(io::ErrorKind::BrokenPipe)));
        }
        self.sent.push((connection, bytes));
        Ok(())
    }

    fn release(&mut self, connection: ConnectionId) {
        self.released.push(connection);
    }
}

/// One timer registered with a [`ManualScheduler`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledTimer {
    pub handle: TimerHandle,
    pub event: TimerEvent,
    pub period: Duration,
    pub repeating: bool,
    pub cancelled: bool,
}

/// Scheduler that only records timers. Tests fire them by calling
/// `ChannelClient::on_timer` themselves.
#[derive(Debug, Default)]
pub struct ManualScheduler {
    next_id: u64,
    timers: Vec<ScheduledTimer>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn timers(&self) -> &[ScheduledTimer] {
        &self.timers
    }

    /// Handles of the timers for `event` that have not been cancelled.
    pub fn active(&self, event: TimerEvent) -> Vec<TimerHandle> {
        self.timers
            .iter()
            .filter(|timer| timer.event == event && !timer.cancelled)
            .map(|timer| timer.handle)
            .collect()
    }

    pub fn is_active(&self, handle: TimerHandle) -> bool {
        self.timers
            .iter()
            .any(|timer| timer.handle == handle && !timer.cancelled)
    }

    fn push(&mut self, period: Duration, event: TimerEvent, repeating: bool) -> TimerHandle {
        self.next_id += 1;
        let handle = TimerHandle::new(self.next_id);
        self.timers.push(ScheduledTimer {
            handle,
            event,
            period,
            repeating,
            cancelled: false,
        });
        handle
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(&mut self, interval: Duration, event: TimerEvent) -> TimerHandle {
        self.push(interval, event, true)
    }

    fn once_after(&mut self, delay: Duration, event: TimerEvent) -> TimerHandle {
        self.push(delay, event, false)
    }

    fn cancel(&mut self, handle: TimerHandle) {
        if let Some(timer) = self.timers.iter_mut().find(|timer| timer.handle == handle) {
            timer.cancelled = true;
        }
    }
}
