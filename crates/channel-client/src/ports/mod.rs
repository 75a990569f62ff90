//! # Ports Layer - Hexagonal Architecture Boundaries
//!
//! The client core is driven by its public request API and drives two
//! outbound ports: the broker [`Transport`] and the timer [`Scheduler`].
//! Selecting a `Managed` or `Manual` transport at construction decides which
//! send paths are available.

pub mod outbound;

pub use outbound::{
    ConnectionId, Scheduler, TimerEvent, TimerHandle, Transport, TransportError, TransportMode,
};
