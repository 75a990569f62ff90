//! Channel registry: which events and queues the client cares about.
//!
//! Pure in-memory bookkeeping, no I/O. The two namespaces are independent:
//! a name may be both an event and a queue, and operations on one never read
//! the other.

use std::collections::BTreeMap;

use super::channel::ChannelName;
use super::handler::SharedHandler;

/// Interest in a broadcast event.
///
/// `handler == None` means "subscribed, dispatch to the global message
/// handler".
#[derive(Debug, Clone, Default)]
pub struct EventRegistration {
    pub handler: Option<SharedHandler>,
}

/// Competing-consumer registration for a queue.
#[derive(Debug, Clone)]
pub struct QueueRegistration {
    pub handler: SharedHandler,
    /// Issue a `reserve` after every delivery.
    pub auto_reserve: bool,
}

/// Client-local desired state, replayed to the broker after reconnects.
#[derive(Debug, Default)]
pub struct ChannelRegistry {
    events: BTreeMap<ChannelName, EventRegistration>,
    queues: BTreeMap<ChannelName, QueueRegistration>,
}

impl ChannelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Upsert an event registration.
    ///
    /// An existing handler is only replaced by a present one; a registration
    /// is never downgraded to handler-less.
    pub fn register_event(&mut self, name: ChannelName, handler: Option<SharedHandler>) {
        let registration = self.events.entry(name).or_default();
        if handler.is_some() {
            registration.handler = handler;
        }
    }

    /// Upsert a queue registration.
    pub fn register_queue(&mut self, name: ChannelName, handler: SharedHandler, auto_reserve: bool) {
        self.queues.insert(
            name,
            QueueRegistration {
                handler,
                auto_reserve,
            },
        );
    }

    /// Remove an event registration. Absent names are ignored.
    pub fn unregister_event(&mut self, name: &str) -> bool {
        self.events.remove(name).is_some()
    }

    /// Remove a queue registration. Absent names are ignored.
    pub fn unregister_queue(&mut self, name: &str) -> bool {
        self.queues.remove(name).is_some()
    }

    pub fn event(&self, name: &str) -> Option<&EventRegistration> {
        self.events.get(name)
    }

    pub fn queue(&self, name: &str) -> Option<&QueueRegistration> {
        self.queues.get(name)
    }

    /// Snapshot of every registered event name, in name order.
    pub fn all_event_names(&self) -> Vec<ChannelName> {
        self.events.keys().cloned().collect()
    }

    /// Snapshot of every watched queue name, in name order.
    pub fn all_queue_names(&self) -> Vec<ChannelName> {
        self.queues.keys().cloned().collect()
    }

    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    pub fn queue_count(&self) -> usize {
        self.queues.len()
    }
}
