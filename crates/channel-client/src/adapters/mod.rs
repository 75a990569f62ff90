//! # Adapters Layer
//!
//! Concrete implementations of the outbound ports.
//!
//! | Transport | Scheduler | Mode |
//! |-----------|-----------|------|
//! | [`ManagedTransport`] | [`TokioScheduler`] | `Managed`, driven by [`crate::runtime::ClientRuntime`] |
//! | [`ManualTransport`] | [`NoopScheduler`] | `Manual`, blocking calls on the caller's thread |

pub mod managed;
pub mod manual;
pub mod scheduler;

pub use managed::{ManagedTransport, TransportEvent};
pub use manual::ManualTransport;
pub use scheduler::{NoopScheduler, TokioScheduler};
