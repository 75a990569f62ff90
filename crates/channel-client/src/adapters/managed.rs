//! Tokio-driven transport.
//!
//! Each connection runs in its own task: connect under a timeout, then a
//! read loop and a write loop over the split stream. Outcomes flow back to
//! the owner of the client as [`TransportEvent`]s.

use std::collections::HashMap;
use std::io;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tracing::{debug, trace, warn};

use crate::codec::{encode_frame, read_frame};
use crate::domain::RemoteAddress;
use crate::ports::{ConnectionId, Transport, TransportError, TransportMode};

/// Notification from a connection task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// The socket is open.
    Connected(ConnectionId),
    /// The connection failed, was closed by the peer or was released.
    Closed(ConnectionId),
    /// One whole non-empty inbound message.
    Message(ConnectionId, Vec<u8>),
}

/// [`Transport`] backed by tokio sockets.
///
/// `connect` and `send` never block: they hand work to the connection task.
/// Must be used from within a tokio runtime.
#[derive(Debug)]
pub struct ManagedTransport {
    events: mpsc::UnboundedSender<TransportEvent>,
    writers: HashMap<ConnectionId, mpsc::UnboundedSender<Vec<u8>>>,
    next_id: u64,
    connect_timeout: Duration,
    max_frame_len: usize,
}

impl ManagedTransport {
    /// Create the transport and the receiver its connection tasks report to.
    pub fn new(
        connect_timeout: Duration,
        max_frame_len: usize,
    ) -> (Self, mpsc::UnboundedReceiver<TransportEvent>) {
        let (events, receiver) = mpsc::unbounded_channel();
        let transport = Self {
            events,
            writers: HashMap::new(),
            next_id: 0,
            connect_timeout,
            max_frame_len,
        };
        (transport, receiver)
    }

    /// Number of connections whose writer is still held.
    pub fn open_connections(&self) -> usize {
        self.writers.len()
    }
}

impl Transport for ManagedTransport {
    fn mode(&self) -> TransportMode {
        TransportMode::Managed
    }

    fn connect(&mut self, address: &RemoteAddress) -> Result<ConnectionId, TransportError> {
        self.next_id += 1;
        let id = ConnectionId::new(self.next_id);
        let (writer, outbound) = mpsc::unbounded_channel();
        self.writers.insert(id, writer);

        tokio::spawn(run_connection(
            id,
            address.clone(),
            self.connect_timeout,
            self.max_frame_len,
            outbound,
            self.events.clone(),
        ));

        Ok(id)
    }

    fn send(&mut self, connection: ConnectionId, bytes: Vec<u8>) -> Result<(), TransportError> {
        self.writers
            .get(&connection)
            .ok_or(TransportError::NotConnected(connection))?
            .send(bytes)
            .map_err(|_| TransportError::NotConnected(connection))
    }

    fn release(&mut self, connection: ConnectionId) {
        // Dropping the writer ends the write loop, which closes the socket.
        if self.writers.remove(&connection).is_some() {
            trace!(connection = %connection, "Released connection");
        }
    }
}

enum Stream {
    Tcp(TcpStream),
    #[cfg(unix)]
    Unix(tokio::net::UnixStream),
}

async fn open(address: &RemoteAddress, timeout: Duration) -> io::Result<Stream> {
    tokio::time::timeout(timeout, connect_stream(address))
        .await
        .map_err(|_| io::Error::new(io::ErrorKind::TimedOut, "connect timed out"))?
}

async fn connect_stream(address: &RemoteAddress) -> io::Result<Stream> {
    match address {
        RemoteAddress::Tcp { host, port } => {
            let stream = TcpStream::connect((host.as_str(), *port)).await?;
            stream.set_nodelay(true)?;
            Ok(Stream::Tcp(stream))
        }
        #[cfg(unix)]
        RemoteAddress::Unix(path) => tokio::net::UnixStream::connect(path).await.map(Stream::Unix),
        #[cfg(not(unix))]
        RemoteAddress::Unix(_) => Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "unix sockets are not available on this platform",
        )),
    }
}

async fn run_connection(
    id: ConnectionId,
    address: RemoteAddress,
    connect_timeout: Duration,
    max_frame_len: usize,
    outbound: mpsc::UnboundedReceiver<Vec<u8>>,
    events: mpsc::UnboundedSender<TransportEvent>,
) {
    match open(&address, connect_timeout).await {
        Ok(stream) => {
            debug!(connection = %id, address = %address, "Socket open");
            let _ = events.send(TransportEvent::Connected(id));

            let result = match stream {
                Stream::Tcp(stream) => {
                    let (reader, writer) = stream.into_split();
                    pump(id, reader, writer, outbound, &events, max_frame_len).await
                }
                #[cfg(unix)]
                Stream::Unix(stream) => {
                    let (reader, writer) = stream.into_split();
                    pump(id, reader, writer, outbound, &events, max_frame_len).await
                }
            };

            match result {
                Ok(()) => debug!(connection = %id, "Connection ended"),
                Err(e) => warn!(connection = %id, error = %e, "Connection failed"),
            }
        }
        Err(e) => warn!(connection = %id, address = %address, error = %e, "Connect failed"),
    }

    let _ = events.send(TransportEvent::Closed(id));
}

/// Run both directions until either ends.
async fn pump<R, W>(
    id: ConnectionId,
    reader: R,
    writer: W,
    outbound: mpsc::UnboundedReceiver<Vec<u8>>,
    events: &mpsc::UnboundedSender<TransportEvent>,
    max_frame_len: usize,
) -> io::Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    tokio::select! {
        result = read_loop(id, reader, events, max_frame_len) => result,
        result = write_loop(writer, outbound) => result,
    }
}

async fn read_loop<R>(
    id: ConnectionId,
    mut reader: R,
    events: &mpsc::UnboundedSender<TransportEvent>,
    max_frame_len: usize,
) -> io::Result<()>
where
    R: AsyncRead + Unpin,
{
    while let Some(payload) = read_frame(&mut reader, max_frame_len).await? {
        if payload.is_empty() {
            // Broker keepalive.
            continue;
        }
        if events.send(TransportEvent::Message(id, payload)).is_err() {
            break;
        }
    }
    Ok(())
}

async fn write_loop<W>(mut writer: W, mut outbound: mpsc::UnboundedReceiver<Vec<u8>>) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    while let Some(body) = outbound.recv().await {
        let frame =
            encode_frame(&body).map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
        writer.write_all(&frame).await?;
    }
    writer.shutdown().await
}
