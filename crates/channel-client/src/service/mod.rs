//! # Channel Client Service
//!
//! The session state machine and request API.
//!
//! `ChannelClient` owns the channel registry, the session record and both
//! outbound ports. It never blocks on the network itself: a managed host
//! feeds transport notifications in through `on_remote_connect`,
//! `on_remote_close` and `on_remote_message`, and timer fires through
//! `on_timer`.
//!
//! ## Reconnect Model
//!
//! After a close, one reconnect is scheduled after the configured delay.
//! When the new connection reports ready, every registered event is
//! re-subscribed in a single message. Queue registrations stay local and are
//! not replayed.

// Semantic submodules
mod api;
mod builder;
mod core;
mod events;
mod keepalive;

// Re-export public API
pub use builder::ClientBuilder;
pub use core::ChannelClient;
