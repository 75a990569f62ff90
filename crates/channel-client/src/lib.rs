//! # Channel Client
//!
//! Client for a channel broker speaking a small length-prefixed protocol.
//! Two messaging patterns share one connection:
//!
//! - **Events** (pub/sub): `subscribe`, `on`, `publish`. Every subscriber
//!   receives every published payload.
//! - **Queues** (competing consumers): `watch`, `enqueue`, `reserve`. Each
//!   item goes to one watcher, and only after it signalled readiness with
//!   `reserve`.
//!
//! The client keeps a local registry of its interest and replays every
//! event subscription after a reconnect.
//!
//! ## Architecture
//!
//! The crate follows Hexagonal Architecture with:
//! - **Domain Layer:** names, payloads, wire messages, registry, session state
//! - **Codec:** message encoding and frame layout
//! - **Ports Layer:** `Transport` and `Scheduler` traits
//! - **Service Layer:** `ChannelClient`, the session state machine and request API
//! - **Adapters Layer:** tokio (managed) and blocking (manual) transports
//! - **Runtime:** the tokio task that owns a managed client
//!
//! ## Example
//!
//! ```rust,ignore
//! use channel_client::{ClientBuilder, ClientConfig, HandlerResult, Payload};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let (client, _faults, _task) = ClientBuilder::new(ClientConfig::from_env()?).spawn();
//!
//!     client
//!         .on("prices", |payload: Payload| -> HandlerResult {
//!             println!("price update: {} bytes", payload.len());
//!             Ok(())
//!         })
//!         .await?;
//!
//!     client.publish("prices", "42.0").await?;
//!     Ok(())
//! }
//! ```

// =============================================================================
// CORE MODULES
// =============================================================================

pub mod codec;
pub mod config;
pub mod domain;
pub mod ports;
pub mod service;

// =============================================================================
// TRANSPORT INTEGRATION
// =============================================================================

pub mod adapters;
pub mod global;
pub mod runtime;

/// Test doubles (RecordingTransport, ManualScheduler).
/// Requires feature: `test-utils`
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

// =============================================================================
// RE-EXPORTS
// =============================================================================

pub use codec::{BincodeCodec, Codec, CodecError, CodecKind, JsonCodec};
pub use config::{ClientConfig, ConfigError};
pub use domain::{
    ChannelName, ChannelRegistry, Channels, ClientError, DeliveryHandler, DispatchFault,
    ForwardingHandler, HandlerResult, MessageHandler, MessageKind, Payload, RemoteAddress,
    SessionState, SharedHandler, WireMessage,
};
pub use ports::{
    ConnectionId, Scheduler, TimerEvent, TimerHandle, Transport, TransportError, TransportMode,
};
pub use service::{ChannelClient, ClientBuilder};

pub use adapters::{ManagedTransport, ManualTransport, NoopScheduler, TokioScheduler, TransportEvent};
pub use runtime::{ClientHandle, ClientRuntime, ManagedClient, PayloadStream, Reply};
