//! # Client Runtime
//!
//! Drives a managed [`ChannelClient`] from one tokio task.
//!
//! The task is the single owner of the client. Transport notifications,
//! timer fires and application requests all arrive over channels and are
//! applied one at a time, so the client needs no locking.
//!
//! ```text
//! ClientHandle ──commands──▶ ┌────────────────┐ ──frames──▶ broker
//! TokioScheduler ──timers──▶ │ ClientRuntime  │
//! ManagedTransport ─events─▶ └────────────────┘ ──faults──▶ application
//! ```

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::{debug, error, info};

use crate::adapters::{ManagedTransport, TokioScheduler, TransportEvent};
use crate::domain::{
    ChannelName, Channels, ClientError, DeliveryHandler, DispatchFault, ForwardingHandler,
    Payload, RemoteAddress, SessionState, SharedHandler,
};
use crate::ports::{ConnectionId, TimerEvent};
use crate::service::{ChannelClient, ClientBuilder};

/// Client type driven by the runtime.
pub type ManagedClient = ChannelClient<ManagedTransport, TokioScheduler>;

/// Stream of payloads delivered to a forwarding handler.
pub type PayloadStream = UnboundedReceiverStream<Payload>;

type Call = Box<dyn FnOnce(&mut ManagedClient) + Send>;

enum Command {
    Call(Call),
    Shutdown(oneshot::Sender<()>),
}

/// Pending result of a request sent to the runtime.
///
/// Requests are queued as soon as the handle method returns; awaiting the
/// reply is optional. Resolves to `ClientError::RuntimeClosed` if the
/// runtime stopped before answering.
#[must_use = "dropping a Reply discards the outcome, not the request"]
pub struct Reply<T> {
    receiver: oneshot::Receiver<Result<T, ClientError>>,
}

impl<T> Future for Reply<T> {
    type Output = Result<T, ClientError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.receiver)
            .poll(cx)
            .map(|result| result.unwrap_or(Err(ClientError::RuntimeClosed)))
    }
}

/// Cloneable handle to a running [`ClientRuntime`].
#[derive(Clone)]
pub struct ClientHandle {
    commands: mpsc::UnboundedSender<Command>,
}

impl std::fmt::Debug for ClientHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientHandle")
            .field("closed", &self.commands.is_closed())
            .finish()
    }
}

impl ClientHandle {
    /// Run `f` against the client inside the runtime task.
    pub fn call<T, F>(&self, f: F) -> Reply<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut ManagedClient) -> Result<T, ClientError> + Send + 'static,
    {
        let (reply, receiver) = oneshot::channel();
        let call: Call = Box::new(move |client| {
            let _ = reply.send(f(client));
        });
        // On failure the call is dropped with its sender and the reply
        // resolves to RuntimeClosed.
        let _ = self.commands.send(Command::Call(call));
        Reply { receiver }
    }

    pub fn is_closed(&self) -> bool {
        self.commands.is_closed()
    }

    pub fn connect(&self, address: RemoteAddress) -> Reply<ConnectionId> {
        self.call(move |client| client.connect(address))
    }

    pub fn on(
        &self,
        event: impl Into<ChannelName>,
        handler: impl DeliveryHandler + 'static,
    ) -> Reply<()> {
        let event = event.into();
        let handler = SharedHandler::new(handler);
        self.call(move |client| client.on_shared(event, handler))
    }

    pub fn subscribe(&self, events: impl Into<Channels>) -> Reply<()> {
        let events = events.into();
        self.call(move |client| client.subscribe(events))
    }

    pub fn unsubscribe(&self, events: impl Into<Channels>) -> Reply<()> {
        let events = events.into();
        self.call(move |client| client.unsubscribe(events))
    }

    pub fn publish(&self, events: impl Into<Channels>, data: impl Into<Payload>) -> Reply<()> {
        let events = events.into();
        let data = data.into();
        self.call(move |client| client.publish(events, data))
    }

    pub fn watch(
        &self,
        channels: impl Into<Channels>,
        handler: impl DeliveryHandler + 'static,
        auto_reserve: bool,
    ) -> Reply<()> {
        let channels = channels.into();
        let handler = SharedHandler::new(handler);
        self.call(move |client| client.watch_shared(channels, handler, auto_reserve))
    }

    pub fn unwatch(&self, channels: impl Into<Channels>) -> Reply<()> {
        let channels = channels.into();
        self.call(move |client| client.unwatch(channels))
    }

    pub fn enqueue(&self, channels: impl Into<Channels>, data: impl Into<Payload>) -> Reply<()> {
        let channels = channels.into();
        let data = data.into();
        self.call(move |client| client.enqueue(channels, data))
    }

    pub fn reserve(&self) -> Reply<()> {
        self.call(|client| client.reserve())
    }

    /// Subscribe to `event` and receive its payloads as a stream.
    ///
    /// Dropping the stream makes the handler non-invocable; the event stays
    /// subscribed until `unsubscribe`.
    pub fn subscribe_stream(&self, event: impl Into<ChannelName>) -> Reply<PayloadStream> {
        let event = event.into();
        let (handler, receiver) = ForwardingHandler::channel();
        self.call(move |client| {
            client
                .on_shared(event, SharedHandler::new(handler))
                .map(|()| UnboundedReceiverStream::new(receiver))
        })
    }

    /// Watch `channels` and receive queue items as a stream.
    pub fn watch_stream(
        &self,
        channels: impl Into<Channels>,
        auto_reserve: bool,
    ) -> Reply<PayloadStream> {
        let channels = channels.into();
        let (handler, receiver) = ForwardingHandler::channel();
        self.call(move |client| {
            client
                .watch_shared(channels, SharedHandler::new(handler), auto_reserve)
                .map(|()| UnboundedReceiverStream::new(receiver))
        })
    }

    pub fn state(&self) -> Reply<SessionState> {
        self.call(|client| Ok(client.state()))
    }

    pub fn is_connected(&self) -> Reply<bool> {
        self.call(|client| Ok(client.is_connected()))
    }

    pub fn event_names(&self) -> Reply<Vec<ChannelName>> {
        self.call(|client| Ok(client.event_names()))
    }

    pub fn queue_names(&self) -> Reply<Vec<ChannelName>> {
        self.call(|client| Ok(client.queue_names()))
    }

    pub fn remote_address(&self) -> Reply<RemoteAddress> {
        self.call(|client| Ok(client.remote_address().clone()))
    }

    /// Stop the runtime: cancel timers, release the connection and end the
    /// task.
    pub async fn shutdown(&self) -> Result<(), ClientError> {
        let (done, receiver) = oneshot::channel();
        self.commands
            .send(Command::Shutdown(done))
            .map_err(|_| ClientError::RuntimeClosed)?;
        receiver.await.map_err(|_| ClientError::RuntimeClosed)
    }
}

/// The task that owns a managed client.
pub struct ClientRuntime {
    client: ManagedClient,
    commands: mpsc::UnboundedReceiver<Command>,
    transport_events: mpsc::UnboundedReceiver<TransportEvent>,
    timer_events: mpsc::UnboundedReceiver<TimerEvent>,
    faults: mpsc::UnboundedSender<DispatchFault>,
}

impl ClientRuntime {
    /// Build the runtime without starting it.
    ///
    /// Returns the runtime, a handle to it and the receiver for dispatch
    /// faults. Faults are also logged; the receiver may be dropped.
    pub fn new(
        builder: ClientBuilder,
    ) -> (Self, ClientHandle, mpsc::UnboundedReceiver<DispatchFault>) {
        let (transport, transport_events) =
            ManagedTransport::new(builder.config.connect_timeout, builder.config.max_frame_len);
        let (scheduler, timer_events) = TokioScheduler::new();
        let (commands_tx, commands) = mpsc::unbounded_channel();
        let (faults, faults_rx) = mpsc::unbounded_channel();

        let runtime = Self {
            client: builder.build(transport, scheduler),
            commands,
            transport_events,
            timer_events,
            faults,
        };
        let handle = ClientHandle {
            commands: commands_tx,
        };
        (runtime, handle, faults_rx)
    }

    /// Build the runtime and spawn it on the current tokio runtime.
    pub fn spawn(
        builder: ClientBuilder,
    ) -> (ClientHandle, mpsc::UnboundedReceiver<DispatchFault>, JoinHandle<()>) {
        let (runtime, handle, faults) = Self::new(builder);
        let task = tokio::spawn(runtime.run());
        (handle, faults, task)
    }

    /// Process events until shut down or until every handle is dropped.
    pub async fn run(mut self) {
        info!(address = %self.client.remote_address(), "Client runtime started");

        loop {
            tokio::select! {
                Some(event) = self.transport_events.recv() => self.on_transport_event(event),
                Some(event) = self.timer_events.recv() => {
                    debug!(timer = ?event, "Timer fired");
                    self.client.on_timer(event);
                }
                command = self.commands.recv() => match command {
                    Some(Command::Call(call)) => call(&mut self.client),
                    Some(Command::Shutdown(done)) => {
                        self.client.shutdown();
                        let _ = done.send(());
                        break;
                    }
                    None => {
                        self.client.shutdown();
                        break;
                    }
                },
            }
        }

        info!("Client runtime stopped");
    }

    fn on_transport_event(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::Connected(id) => self.client.on_remote_connect(id),
            TransportEvent::Closed(id) => self.client.on_remote_close(id),
            TransportEvent::Message(id, bytes) => {
                if let Err(fault) = self.client.on_remote_message(id, &bytes) {
                    error!(
                        fault = fault.label(),
                        channel = fault.channel().map(ChannelName::as_str),
                        error = %fault,
                        "Dispatch fault"
                    );
                    let _ = self.faults.send(fault);
                }
            }
        }
    }
}

impl ClientBuilder {
    /// Spawn a [`ClientRuntime`] for this configuration.
    pub fn spawn(self) -> (ClientHandle, mpsc::UnboundedReceiver<DispatchFault>, JoinHandle<()>) {
        ClientRuntime::spawn(self)
    }
}
