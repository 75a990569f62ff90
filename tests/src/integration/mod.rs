//! # Integration Flows
//!
//! Client flows run end to end: `ClientRuntime` + `ManagedTransport` (or the
//! blocking `ManualTransport`) against a [`crate::broker::FakeBroker`].

pub mod manual;
pub mod pubsub;
pub mod queues;
