//! Protocol messages exchanged with the broker.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::channel::{ChannelName, Payload};

/// Structured protocol message.
///
/// Client-to-broker kinds carry a channel list; broker-to-client deliveries
/// (`Event`, `QueueItem`) name exactly one channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WireMessage {
    /// Register interest in broadcast events.
    Subscribe { channels: Vec<ChannelName> },
    /// Drop interest in broadcast events.
    Unsubscribe { channels: Vec<ChannelName> },
    /// Fan a payload out to every subscriber of the channels.
    Publish {
        channels: Vec<ChannelName>,
        data: Payload,
    },
    /// Become a competing consumer of the queues.
    Watch { channels: Vec<ChannelName> },
    /// Stop consuming the queues.
    Unwatch { channels: Vec<ChannelName> },
    /// Place one work item on each queue.
    Enqueue {
        channels: Vec<ChannelName>,
        data: Payload,
    },
    /// Connection-wide credit for one more queue delivery.
    Reserve,
    /// Broadcast delivery.
    Event { channel: ChannelName, data: Payload },
    /// Queue delivery.
    QueueItem { channel: ChannelName, data: Payload },
}

impl WireMessage {
    /// Discriminant of this message.
    pub fn kind(&self) -> MessageKind {
        match self {
            Self::Subscribe { .. } => MessageKind::Subscribe,
            Self::Unsubscribe { .. } => MessageKind::Unsubscribe,
            Self::Publish { .. } => MessageKind::Publish,
            Self::Watch { .. } => MessageKind::Watch,
            Self::Unwatch { .. } => MessageKind::Unwatch,
            Self::Enqueue { .. } => MessageKind::Enqueue,
            Self::Reserve => MessageKind::Reserve,
            Self::Event { .. } => MessageKind::Event,
            Self::QueueItem { .. } => MessageKind::QueueItem,
        }
    }

    /// Channels named by the message, in order.
    pub fn channels(&self) -> &[ChannelName] {
        match self {
            Self::Subscribe { channels }
            | Self::Unsubscribe { channels }
            | Self::Publish { channels, .. }
            | Self::Watch { channels }
            | Self::Unwatch { channels }
            | Self::Enqueue { channels, .. } => channels,
            Self::Event { channel, .. } | Self::QueueItem { channel, .. } => {
                std::slice::from_ref(channel)
            }
            Self::Reserve => &[],
        }
    }
}

/// Wire message discriminant, used for mode checks, logs and metric labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    Subscribe,
    Unsubscribe,
    Publish,
    Watch,
    Unwatch,
    Enqueue,
    Reserve,
    Event,
    QueueItem,
}

impl MessageKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Subscribe => "subscribe",
            Self::Unsubscribe => "unsubscribe",
            Self::Publish => "publish",
            Self::Watch => "watch",
            Self::Unwatch => "unwatch",
            Self::Enqueue => "enqueue",
            Self::Reserve => "reserve",
            Self::Event => "event",
            Self::QueueItem => "queue_item",
        }
    }

    /// Whether the kind may only be sent over a managed transport.
    ///
    /// `publish` and `enqueue` go out on either transport; everything else
    /// the client sends needs the host event loop.
    pub fn requires_managed(self) -> bool {
        !matches!(self, Self::Publish | Self::Enqueue)
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
