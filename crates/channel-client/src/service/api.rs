//! Request API: the operations an application calls.
//!
//! Every operation validates its arguments before touching the registry or
//! the wire. Managed-only operations also check the transport mode first, so
//! a rejected call leaves no trace.

use tracing::{debug, warn};

use super::core::ChannelClient;
use crate::domain::{
    ChannelName, Channels, ClientError, DeliveryHandler, MessageKind, Payload, SharedHandler,
    WireMessage,
};
use crate::ports::{Scheduler, Transport};

impl<T: Transport, S: Scheduler> ChannelClient<T, S> {
    /// Subscribe to `event` and route its deliveries to `handler`.
    ///
    /// Re-registering an event replaces its handler.
    pub fn on(
        &mut self,
        event: impl Into<ChannelName>,
        handler: impl DeliveryHandler + 'static,
    ) -> Result<(), ClientError> {
        self.on_shared(event.into(), SharedHandler::new(handler))
    }

    /// [`on`](Self::on) with a handler that may also be registered elsewhere.
    pub fn on_shared(&mut self, event: ChannelName, handler: SharedHandler) -> Result<(), ClientError> {
        event.validate()?;
        if !handler.is_invocable() {
            return Err(ClientError::InvalidCallback { channel: event });
        }
        self.ensure_managed(MessageKind::Subscribe)?;

        self.registry.register_event(event.clone(), Some(handler));
        debug!(event = %event, "Registered event handler");
        self.send(WireMessage::Subscribe {
            channels: vec![event],
        })
    }

    /// Subscribe without a dedicated handler.
    ///
    /// Deliveries go to the global message handler. Existing handlers for
    /// these events are kept.
    pub fn subscribe(&mut self, events: impl Into<Channels>) -> Result<(), ClientError> {
        let events = events.into();
        events.validate()?;
        self.ensure_managed(MessageKind::Subscribe)?;

        for event in events.as_slice() {
            self.registry.register_event(event.clone(), None);
        }
        self.send(WireMessage::Subscribe {
            channels: events.into_vec(),
        })
    }

    /// Drop interest in `events`. Unknown names are not an error.
    pub fn unsubscribe(&mut self, events: impl Into<Channels>) -> Result<(), ClientError> {
        let events = events.into();
        events.validate()?;
        self.ensure_managed(MessageKind::Unsubscribe)?;

        for event in events.as_slice() {
            self.registry.unregister_event(event.as_str());
        }
        self.send(WireMessage::Unsubscribe {
            channels: events.into_vec(),
        })
    }

    /// Broadcast `data` to every subscriber of `events`. Works on both
    /// transports.
    pub fn publish(
        &mut self,
        events: impl Into<Channels>,
        data: impl Into<Payload>,
    ) -> Result<(), ClientError> {
        let events = events.into();
        events.validate()?;
        self.send_anyway(WireMessage::Publish {
            channels: events.into_vec(),
            data: data.into(),
        })
    }

    /// Become a competing consumer of `channels`.
    ///
    /// With `auto_reserve`, one `reserve` is sent right away and another
    /// after every delivered item, whether or not the handler succeeded.
    pub fn watch(
        &mut self,
        channels: impl Into<Channels>,
        handler: impl DeliveryHandler + 'static,
        auto_reserve: bool,
    ) -> Result<(), ClientError> {
        self.watch_shared(channels.into(), SharedHandler::new(handler), auto_reserve)
    }

    /// [`watch`](Self::watch) with a handler that may also be registered
    /// elsewhere.
    pub fn watch_shared(
        &mut self,
        channels: Channels,
        handler: SharedHandler,
        auto_reserve: bool,
    ) -> Result<(), ClientError> {
        channels.validate()?;
        if !handler.is_invocable() {
            return Err(ClientError::InvalidCallback {
                channel: channels.as_slice()[0].clone(),
            });
        }
        self.ensure_managed(MessageKind::Watch)?;

        for channel in channels.as_slice() {
            self.registry
                .register_queue(channel.clone(), handler.clone(), auto_reserve);
        }
        debug!(queues = channels.len(), auto_reserve, "Watching queues");
        self.send(WireMessage::Watch {
            channels: channels.into_vec(),
        })?;

        if auto_reserve {
            self.reserve()?;
        }
        Ok(())
    }

    /// Stop consuming `channels`. Unknown names are not an error.
    pub fn unwatch(&mut self, channels: impl Into<Channels>) -> Result<(), ClientError> {
        let channels = channels.into();
        channels.validate()?;
        self.ensure_managed(MessageKind::Unwatch)?;

        for channel in channels.as_slice() {
            self.registry.unregister_queue(channel.as_str());
        }
        self.send(WireMessage::Unwatch {
            channels: channels.into_vec(),
        })
    }

    /// Push `data` onto each of `channels`. Works on both transports.
    pub fn enqueue(
        &mut self,
        channels: impl Into<Channels>,
        data: impl Into<Payload>,
    ) -> Result<(), ClientError> {
        let channels = channels.into();
        channels.validate()?;
        self.send_anyway(WireMessage::Enqueue {
            channels: channels.into_vec(),
            data: data.into(),
        })
    }

    /// Ask the broker for one more queue item on this connection.
    pub fn reserve(&mut self) -> Result<(), ClientError> {
        self.send(WireMessage::Reserve)
    }

    /// Reserve after a delivery; failures are logged, not returned.
    pub(crate) fn reserve_after_delivery(&mut self, channel: &ChannelName) {
        if let Err(error) = self.reserve() {
            warn!(queue = %channel, error = %error, "Automatic reserve failed");
        }
    }
}
