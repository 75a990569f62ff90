//! Handler capabilities bound to registrations.

use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc;

use super::channel::{ChannelName, Payload};

/// Outcome of a handler invocation.
pub type HandlerResult = anyhow::Result<()>;

/// Receives deliveries for one registration.
///
/// Implemented for every `FnMut(Payload) -> HandlerResult + Send` closure.
pub trait DeliveryHandler: Send {
    /// Handle one delivery.
    fn handle(&mut self, payload: Payload) -> HandlerResult;

    /// Whether the handler can still be invoked. Checked at registration.
    fn is_invocable(&self) -> bool {
        true
    }
}

impl<F> DeliveryHandler for F
where
    F: FnMut(Payload) -> HandlerResult + Send,
{
    fn handle(&mut self, payload: Payload) -> HandlerResult {
        self(payload)
    }
}

/// Fallback for events whose registration carries no handler.
pub trait MessageHandler: Send {
    /// Handle one event delivery on `channel`.
    fn handle(&mut self, channel: &ChannelName, payload: Payload) -> HandlerResult;
}

impl<F> MessageHandler for F
where
    F: FnMut(&ChannelName, Payload) -> HandlerResult + Send,
{
    fn handle(&mut self, channel: &ChannelName, payload: Payload) -> HandlerResult {
        self(channel, payload)
    }
}

/// Connection lifecycle hook (`on_connect` / `on_close`).
pub type LifecycleCallback = Box<dyn FnMut() + Send>;

/// Handler shared by every channel it was registered for.
#[derive(Clone)]
pub struct SharedHandler(Arc<Mutex<Box<dyn DeliveryHandler>>>);

impl SharedHandler {
    pub fn new(handler: impl DeliveryHandler + 'static) -> Self {
        Self::from_boxed(Box::new(handler))
    }

    pub fn from_boxed(handler: Box<dyn DeliveryHandler>) -> Self {
        Self(Arc::new(Mutex::new(handler)))
    }

    pub fn handle(&self, payload: Payload) -> HandlerResult {
        self.0.lock().handle(payload)
    }

    pub fn is_invocable(&self) -> bool {
        self.0.lock().is_invocable()
    }
}

impl fmt::Debug for SharedHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedHandler").finish_non_exhaustive()
    }
}

/// Forwards deliveries into a tokio channel.
///
/// Stops being invocable once the receiving side is dropped.
#[derive(Debug, Clone)]
pub struct ForwardingHandler {
    sender: mpsc::UnboundedSender<Payload>,
}

impl ForwardingHandler {
    pub fn new(sender: mpsc::UnboundedSender<Payload>) -> Self {
        Self { sender }
    }

    /// Create a handler together with the receiver it feeds.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Payload>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self::new(sender), receiver)
    }
}

impl DeliveryHandler for ForwardingHandler {
    fn handle(&mut self, payload: Payload) -> HandlerResult {
        self.sender
            .send(payload)
            .map_err(|_| anyhow::anyhow!("delivery receiver dropped"))
    }

    fn is_invocable(&self) -> bool {
        !self.sender.is_closed()
    }
}
