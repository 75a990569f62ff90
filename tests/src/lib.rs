//! # Channel Client Test Suite
//!
//! End-to-end tests driving the real tokio runtime and transports against
//! an in-process broker on loopback.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! ├── broker.rs         # Fake broker speaking the framed protocol
//! └── integration/      # Client flows
//!     ├── pubsub.rs     # Subscribe, replay after disconnect, publish fan-out
//!     ├── queues.rs     # Watch, reserve and backpressure
//!     └── manual.rs     # Blocking transport
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p channel-tests
//! cargo bench -p channel-tests
//! ```

pub mod broker;
pub mod integration;
