//! Transport notifications: readiness, close and inbound messages.
//!
//! Events carry the [`ConnectionId`] they belong to. Anything reported for a
//! connection other than the live one is stale and ignored.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use anyhow::anyhow;

use channel_telemetry::{metric_inc, CONNECTED, DISPATCH_FAULTS, MESSAGES_RECEIVED, RECONNECTS};
use tracing::{debug, error, info, trace, warn};

use super::core::ChannelClient;
use crate::domain::{
    ChannelName, DispatchFault, HandlerResult, LifecycleCallback, Payload, WireMessage,
};
use crate::ports::{ConnectionId, Scheduler, TimerEvent, Transport};

impl<T: Transport, S: Scheduler> ChannelClient<T, S> {
    /// The transport finished connecting.
    ///
    /// Replays every registered event in one subscribe message, clears a
    /// pending reconnect and runs the `on_connect` callback. Queues are not
    /// replayed.
    pub fn on_remote_connect(&mut self, connection: ConnectionId) {
        if !self.session.is_live(connection) {
            debug!(connection = %connection, "Ignoring ready event for stale connection");
            return;
        }

        self.session.mark_ready();
        CONNECTED.set(1.0);
        info!(
            address = %self.session.address(),
            connection = %connection,
            "Connected to broker"
        );

        let events = self.registry.all_event_names();
        if !events.is_empty() {
            let count = events.len();
            match self.send(WireMessage::Subscribe { channels: events }) {
                Ok(()) => debug!(events = count, "Replayed subscriptions"),
                Err(e) => warn!(error = %e, "Failed to replay subscriptions"),
            }
        }

        self.clear_reconnect_timer();

        if let Some(callback) = self.callbacks.on_connect.as_mut() {
            run_lifecycle("on_connect", callback);
        }
    }

    /// The transport closed or failed to connect.
    ///
    /// Drops the connection handle and schedules a single reconnect after
    /// the configured delay. There is no attempt limit.
    pub fn on_remote_close(&mut self, connection: ConnectionId) {
        if !self.session.is_live(connection) {
            debug!(connection = %connection, "Ignoring close event for stale connection");
            self.transport.release(connection);
            return;
        }

        warn!(
            address = %self.session.address(),
            connection = %connection,
            delay = ?self.config.reconnect_delay,
            "Connection closed, reconnecting"
        );

        self.session.detach();
        self.transport.release(connection);
        CONNECTED.set(0.0);

        self.clear_reconnect_timer();
        let handle = self
            .scheduler
            .once_after(self.config.reconnect_delay, TimerEvent::Reconnect);
        self.session.reconnect_timer = Some(handle);
        RECONNECTS.inc();

        if let Some(callback) = self.callbacks.on_close.as_mut() {
            run_lifecycle("on_close", callback);
        }
    }

    /// One whole inbound message, already unframed by the transport.
    ///
    /// Faults are returned to the caller; the client itself stays usable.
    pub fn on_remote_message(
        &mut self,
        connection: ConnectionId,
        bytes: &[u8],
    ) -> Result<(), DispatchFault> {
        if !self.session.is_live(connection) {
            debug!(connection = %connection, "Dropping message from stale connection");
            return Ok(());
        }

        let result = self.dispatch(bytes);
        if let Err(fault) = &result {
            metric_inc!(DISPATCH_FAULTS, &[fault.label()]);
        }
        result
    }

    fn dispatch(&mut self, bytes: &[u8]) -> Result<(), DispatchFault> {
        let message = self.codec.decode(bytes)?;
        let kind = message.kind();
        metric_inc!(MESSAGES_RECEIVED, &[kind.as_str()]);
        trace!(kind = %kind, len = bytes.len(), "Received message");

        match message {
            WireMessage::Event { channel, data } => self.dispatch_event(channel, data),
            WireMessage::QueueItem { channel, data } => self.dispatch_queue(channel, data),
            _ => Err(DispatchFault::UnexpectedMessage { kind }),
        }
    }

    fn dispatch_event(&mut self, channel: ChannelName, data: Payload) -> Result<(), DispatchFault> {
        let handler = self
            .registry
            .event(channel.as_str())
            .and_then(|registration| registration.handler.clone());

        let outcome = match handler {
            Some(handler) => guarded(|| handler.handle(data)),
            None => match self.callbacks.on_message.as_mut() {
                Some(fallback) => guarded(|| fallback.handle(&channel, data)),
                None => return Err(DispatchFault::UnhandledEvent { channel }),
            },
        };

        outcome.map_err(|source| DispatchFault::Handler { channel, source })
    }

    fn dispatch_queue(&mut self, channel: ChannelName, data: Payload) -> Result<(), DispatchFault> {
        let Some(registration) = self.registry.queue(channel.as_str()).cloned() else {
            return Err(DispatchFault::UnhandledQueue { channel });
        };

        // A closed handler is unwatched and gets no reserve.
        if !registration.handler.is_invocable() {
            self.drop_closed_watch(&channel);
            return Err(DispatchFault::HandlerClosed { channel });
        }

        let outcome = guarded(|| registration.handler.handle(data));

        // The reserve goes out however the handler finished.
        if registration.auto_reserve {
            self.reserve_after_delivery(&channel);
        }

        outcome.map_err(|source| DispatchFault::Handler { channel, source })
    }

    fn drop_closed_watch(&mut self, channel: &ChannelName) {
        self.registry.unregister_queue(channel.as_str());
        warn!(queue = %channel, "Queue handler closed, unwatching");
        let unwatch = WireMessage::Unwatch {
            channels: vec![channel.clone()],
        };
        if let Err(e) = self.send(unwatch) {
            warn!(queue = %channel, error = %e, "Failed to unwatch closed queue");
        }
    }
}

/// Run a user handler, turning a panic into a handler error.
fn guarded(handler: impl FnOnce() -> HandlerResult) -> HandlerResult {
    panic::catch_unwind(AssertUnwindSafe(handler)).unwrap_or_else(|panic| {
        Err(anyhow!("handler panicked: {}", panic_message(&*panic)))
    })
}

fn run_lifecycle(name: &'static str, callback: &mut LifecycleCallback) {
    if let Err(panic) = panic::catch_unwind(AssertUnwindSafe(|| callback())) {
        error!(callback = name, panic = panic_message(&*panic), "Connection callback panicked");
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message
    } else {
        "non-string panic payload"
    }
}
