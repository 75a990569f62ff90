//! Blocking transport for processes without an event loop.
//!
//! Connects with a timeout and writes pre-framed bytes. There is no read
//! side and no read timeout: manual mode only supports the fire-and-forget
//! operations.
//!
//! `UnixStream` has no connect timeout; a local socket connect returns
//! immediately. Unix writes are bounded by the connect timeout instead.

use std::io::{self, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use tracing::{debug, trace};

use crate::domain::RemoteAddress;
use crate::ports::{ConnectionId, Transport, TransportError, TransportMode};

enum BlockingStream {
    Tcp(TcpStream),
    #[cfg(unix)]
    Unix(std::os::unix::net::UnixStream),
}

impl Write for BlockingStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Self::Tcp(stream) => stream.write(buf),
            #[cfg(unix)]
            Self::Unix(stream) => stream.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Self::Tcp(stream) => stream.flush(),
            #[cfg(unix)]
            Self::Unix(stream) => stream.flush(),
        }
    }
}

/// [`Transport`] over a blocking stream socket. Holds at most one
/// connection.
pub struct ManualTransport {
    connect_timeout: Duration,
    next_id: u64,
    stream: Option<(ConnectionId, BlockingStream)>,
}

impl ManualTransport {
    pub fn new(connect_timeout: Duration) -> Self {
        Self {
            connect_timeout,
            next_id: 0,
            stream: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.stream.is_some()
    }

    fn open(&self, address: &RemoteAddress) -> io::Result<BlockingStream> {
        match address {
            RemoteAddress::Tcp { host, port } => {
                let mut last_error = None;
                for candidate in (host.as_str(), *port).to_socket_addrs()? {
                    match TcpStream::connect_timeout(&candidate, self.connect_timeout) {
                        Ok(stream) => {
                            stream.set_nodelay(true)?;
                            return Ok(BlockingStream::Tcp(stream));
                        }
                        Err(e) => last_error = Some(e),
                    }
                }
                Err(last_error.unwrap_or_else(|| {
                    io::Error::new(io::ErrorKind::NotFound, "host resolved to no addresses")
                }))
            }
            #[cfg(unix)]
            RemoteAddress::Unix(path) => {
                let stream = std::os::unix::net::UnixStream::connect(path)?;
                stream.set_write_timeout(Some(self.connect_timeout))?;
                Ok(BlockingStream::Unix(stream))
            }
            #[cfg(not(unix))]
            RemoteAddress::Unix(_) => Err(io::Error::new(
                io::ErrorKind::Unsupported,
                "unix sockets are not available on this platform",
            )),
        }
    }
}

impl std::fmt::Debug for ManualTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManualTransport")
            .field("connect_timeout", &self.connect_timeout)
            .field("connection", &self.stream.as_ref().map(|(id, _)| *id))
            .finish()
    }
}

impl Transport for ManualTransport {
    fn mode(&self) -> TransportMode {
        TransportMode::Manual
    }

    fn connect(&mut self, address: &RemoteAddress) -> Result<ConnectionId, TransportError> {
        let stream = self.open(address).map_err(|source| TransportError::Connect {
            address: address.clone(),
            source,
        })?;

        self.next_id += 1;
        let id = ConnectionId::new(self.next_id);
        debug!(connection = %id, address = %address, "Blocking connection open");
        self.stream = Some((id, stream));
        Ok(id)
    }

    fn send(&mut self, connection: ConnectionId, bytes: Vec<u8>) -> Result<(), TransportError> {
        match self.stream.as_mut() {
            Some((id, stream)) if *id == connection => {
                stream.write_all(&bytes)?;
                stream.flush()?;
                trace!(connection = %connection, len = bytes.len(), "Wrote frame");
                Ok(())
            }
            _ => Err(TransportError::NotConnected(connection)),
        }
    }

    fn release(&mut self, connection: ConnectionId) {
        if matches!(self.stream, Some((id, _)) if id == connection) {
            self.stream = None;
        }
    }
}
