//! Process-wide client.
//!
//! For applications that want one broker connection reachable from
//! anywhere. The explicit [`ClientRuntime`] API remains the primary one; this
//! module only stores a [`ClientHandle`] to a runtime spawned by [`init`].
//!
//! The stored handle keeps the runtime alive for the life of the process.
//! Stop it with `handle().shutdown()`.

use std::sync::OnceLock;

use tokio::sync::mpsc;
use tracing::info;

use crate::domain::{ClientError, DispatchFault};
use crate::runtime::{ClientHandle, ClientRuntime};
use crate::service::ClientBuilder;

static CLIENT: OnceLock<ClientHandle> = OnceLock::new();

/// Spawn the process-wide client on the current tokio runtime.
///
/// # Errors
///
/// `ClientError::AlreadyInitialized` if a previous call succeeded.
pub fn init(
    builder: ClientBuilder,
) -> Result<(ClientHandle, mpsc::UnboundedReceiver<DispatchFault>), ClientError> {
    if CLIENT.get().is_some() {
        return Err(ClientError::AlreadyInitialized);
    }

    let address = builder.config().address.clone();
    let (runtime, handle, faults) = ClientRuntime::new(builder);
    CLIENT
        .set(handle.clone())
        .map_err(|_| ClientError::AlreadyInitialized)?;

    tokio::spawn(runtime.run());
    info!(address = %address, "Process-wide client initialized");
    Ok((handle, faults))
}

/// Handle to the process-wide client, if [`init`] has run.
pub fn handle() -> Option<ClientHandle> {
    CLIENT.get().cloned()
}
