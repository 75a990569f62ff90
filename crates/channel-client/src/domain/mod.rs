//! # Domain Layer
//!
//! Pure client state with no I/O: names and payloads, protocol messages,
//! handler capabilities, the channel registry, the session record and the
//! error taxonomy.

pub mod address;
pub mod channel;
pub mod errors;
pub mod handler;
pub mod message;
pub mod registry;
pub mod session;

pub use address::{AddressError, RemoteAddress, DEFAULT_HOST, DEFAULT_PORT, UNIX_SCHEME};
pub use channel::{ChannelName, Channels, Payload};
pub use errors::{ClientError, DispatchFault};
pub use handler::{
    DeliveryHandler, ForwardingHandler, HandlerResult, LifecycleCallback, MessageHandler,
    SharedHandler,
};
pub use message::{MessageKind, WireMessage};
pub use registry::{ChannelRegistry, EventRegistration, QueueRegistration};
pub use session::{Session, SessionState};
