use channel_telemetry::{metric_inc, CONNECT_ATTEMPTS, MESSAGES_SENT};
use tracing::{debug, trace};

use crate::codec::{encode_frame, Codec, CodecError};
use crate::config::ClientConfig;
use crate::domain::{
    ChannelName, ChannelRegistry, ClientError, LifecycleCallback, MessageHandler, MessageKind,
    RemoteAddress, Session, SessionState, WireMessage,
};
use crate::ports::{ConnectionId, Scheduler, TimerEvent, Transport, TransportMode};

/// Application hooks invoked by the session state machine.
#[derive(Default)]
pub(crate) struct Callbacks {
    pub(crate) on_connect: Option<LifecycleCallback>,
    pub(crate) on_close: Option<LifecycleCallback>,
    pub(crate) on_message: Option<Box<dyn MessageHandler>>,
}

/// Broker client: one session, one registry, one transport.
///
/// All state is mutated through `&mut self` by a single owner. Under a host
/// event loop that owner is the loop itself (see [`crate::runtime`]); in
/// manual mode it is the calling thread.
///
/// # Example
///
/// ```rust,ignore
/// use channel_client::{ClientBuilder, ClientConfig, ManualTransport, NoopScheduler, Payload};
///
/// let config = ClientConfig::default();
/// let transport = ManualTransport::new(config.connect_timeout);
/// let mut client = ClientBuilder::new(config).build(transport, NoopScheduler::new());
///
/// client.enqueue("jobs", Payload::from("{\"task\":1}"))?;
/// ```
pub struct ChannelClient<T, S> {
    pub(crate) config: ClientConfig,
    pub(crate) registry: ChannelRegistry,
    pub(crate) session: Session,
    pub(crate) transport: T,
    pub(crate) scheduler: S,
    pub(crate) codec: Box<dyn Codec>,
    pub(crate) callbacks: Callbacks,
}

impl<T: Transport, S: Scheduler> ChannelClient<T, S> {
    pub(crate) fn new(
        config: ClientConfig,
        transport: T,
        scheduler: S,
        codec: Box<dyn Codec>,
        callbacks: Callbacks,
    ) -> Self {
        Self {
            session: Session::new(config.address.clone()),
            registry: ChannelRegistry::new(),
            config,
            transport,
            scheduler,
            codec,
            callbacks,
        }
    }

    /// Connect to `address` unless a connection handle already exists.
    ///
    /// Managed transports return as soon as the attempt is under way; the
    /// outcome arrives through `on_remote_connect` / `on_remote_close`.
    /// Manual transports connect synchronously and fail with
    /// `ClientError::Connection`.
    pub fn connect(&mut self, address: RemoteAddress) -> Result<ConnectionId, ClientError> {
        if let Some(connection) = self.session.connection {
            trace!(connection = %connection, "Connect ignored, connection exists");
            return Ok(connection);
        }
        self.session.address = address;
        self.open()
    }

    /// Live connection, opening one to the configured address if needed.
    pub(crate) fn ensure_connected(&mut self) -> Result<ConnectionId, ClientError> {
        match self.session.connection {
            Some(connection) => Ok(connection),
            None => self.open(),
        }
    }

    fn open(&mut self) -> Result<ConnectionId, ClientError> {
        let mode = self.transport.mode();
        CONNECT_ATTEMPTS.inc();

        let connection = self
            .transport
            .connect(&self.session.address)
            .map_err(ClientError::Connection)?;
        self.session.attach(connection, mode == TransportMode::Manual);

        debug!(
            address = %self.session.address,
            connection = %connection,
            mode = ?mode,
            "Opening broker connection"
        );

        if mode == TransportMode::Managed && self.session.ping_timer.is_none() {
            let handle = self
                .scheduler
                .schedule(self.config.ping_interval, TimerEvent::Ping);
            self.session.ping_timer = Some(handle);
        }

        Ok(connection)
    }

    pub(crate) fn ensure_managed(&self, operation: MessageKind) -> Result<(), ClientError> {
        if operation.requires_managed() && self.transport.mode() == TransportMode::Manual {
            return Err(ClientError::UnsupportedMode { operation });
        }
        Ok(())
    }

    /// Managed-only send path.
    pub(crate) fn send(&mut self, message: WireMessage) -> Result<(), ClientError> {
        self.ensure_managed(message.kind())?;
        self.send_anyway(message)
    }

    /// Send path available on both transports.
    pub(crate) fn send_anyway(&mut self, message: WireMessage) -> Result<(), ClientError> {
        let kind = message.kind();
        let connection = self.ensure_connected()?;
        let body = self.codec.encode(&message)?;
        let bytes = self.outbound(body)?;

        if let Err(error) = self.transport.send(connection, bytes) {
            if self.transport.mode() == TransportMode::Manual {
                // The socket is unusable; the next send reconnects.
                self.session.detach();
                self.transport.release(connection);
            }
            return Err(ClientError::Transport(error));
        }

        metric_inc!(MESSAGES_SENT, &[kind.as_str()]);
        trace!(
            connection = %connection,
            kind = %kind,
            channels = message.channels().len(),
            "Sent message"
        );
        Ok(())
    }

    /// Apply the manual-mode length prefix. Managed transports frame
    /// transparently.
    pub(crate) fn outbound(&self, body: Vec<u8>) -> Result<Vec<u8>, CodecError> {
        match self.transport.mode() {
            TransportMode::Managed => Ok(body),
            TransportMode::Manual => encode_frame(&body),
        }
    }

    /// Cancel both timers and release the connection.
    pub fn shutdown(&mut self) {
        if let Some(handle) = self.session.ping_timer.take() {
            self.scheduler.cancel(handle);
        }
        self.clear_reconnect_timer();
        if let Some(connection) = self.session.detach() {
            self.transport.release(connection);
        }
        debug!("Client shut down");
    }

    pub(crate) fn clear_reconnect_timer(&mut self) {
        if let Some(handle) = self.session.reconnect_timer.take() {
            self.scheduler.cancel(handle);
        }
    }

    // -------------------------------------------------------------------------
    // Introspection
    // -------------------------------------------------------------------------

    pub fn state(&self) -> SessionState {
        self.session.state()
    }

    /// True once the transport reported readiness (always true after a
    /// successful manual connect).
    pub fn is_connected(&self) -> bool {
        self.session.state() == SessionState::Connected
    }

    pub fn remote_address(&self) -> &RemoteAddress {
        self.session.address()
    }

    pub fn mode(&self) -> TransportMode {
        self.transport.mode()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn event_names(&self) -> Vec<ChannelName> {
        self.registry.all_event_names()
    }

    pub fn queue_names(&self) -> Vec<ChannelName> {
        self.registry.all_queue_names()
    }

    pub fn registry(&self) -> &ChannelRegistry {
        &self.registry
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }
}
