//! Fake broker for end-to-end tests.
//!
//! Accepts connections on an ephemeral loopback port and lets a test read
//! and write wire messages on each accepted connection. It holds no routing
//! state of its own; tests decide what the broker does.

use std::time::Duration;

use channel_client::codec::{encode_frame, read_frame, DEFAULT_MAX_FRAME_LEN};
use channel_client::{BincodeCodec, ClientConfig, Codec, RemoteAddress, WireMessage};
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;

/// How long a test waits for any single network step.
pub const STEP_TIMEOUT: Duration = Duration::from_secs(5);

/// Listener side of the fake broker.
pub struct FakeBroker {
    listener: TcpListener,
    address: RemoteAddress,
}

impl FakeBroker {
    pub async fn bind() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind fake broker");
        let port = listener.local_addr().expect("local addr").port();
        Self {
            listener,
            address: RemoteAddress::tcp("127.0.0.1", port),
        }
    }

    pub fn address(&self) -> RemoteAddress {
        self.address.clone()
    }

    /// Client configuration pointing at this broker with test-friendly
    /// timings.
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            reconnect_delay: Duration::from_millis(50),
            connect_timeout: Duration::from_secs(2),
            ..ClientConfig::with_address(self.address())
        }
    }

    /// Wait for the next client connection.
    pub async fn accept(&self) -> BrokerConnection {
        let (stream, _) = timeout(STEP_TIMEOUT, self.listener.accept())
            .await
            .expect("timed out waiting for client connection")
            .expect("accept");
        BrokerConnection { stream }
    }
}

/// One accepted client connection.
pub struct BrokerConnection {
    stream: TcpStream,
}

impl BrokerConnection {
    /// Next raw frame payload, keepalives included. `None` on EOF.
    pub async fn recv_raw(&mut self) -> Option<Vec<u8>> {
        timeout(STEP_TIMEOUT, read_frame(&mut self.stream, DEFAULT_MAX_FRAME_LEN))
            .await
            .expect("timed out waiting for frame")
            .expect("read frame")
    }

    /// Next protocol message, skipping keepalives.
    pub async fn recv(&mut self) -> WireMessage {
        loop {
            let payload = self.recv_raw().await.expect("client closed connection");
            if !payload.is_empty() {
                return BincodeCodec.decode(&payload).expect("decode client message");
            }
        }
    }

    /// Assert nothing but keepalives arrives within `window`.
    pub async fn expect_silence(&mut self, window: Duration) {
        let deadline = tokio::time::Instant::now() + window;
        loop {
            let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
            match timeout(remaining, read_frame(&mut self.stream, DEFAULT_MAX_FRAME_LEN)).await {
                Err(_) => return,
                Ok(Ok(Some(payload))) if payload.is_empty() => continue,
                Ok(Ok(Some(payload))) => panic!(
                    "unexpected message {:?}",
                    BincodeCodec.decode(&payload)
                ),
                Ok(Ok(None)) => panic!("client closed connection"),
                Ok(Err(e)) => panic!("read failed: {e}"),
            }
        }
    }

    pub async fn send(&mut self, message: &WireMessage) {
        let body = BincodeCodec.encode(message).expect("encode broker message");
        let frame = encode_frame(&body).expect("frame broker message");
        self.stream.write_all(&frame).await.expect("write frame");
    }

    pub async fn send_event(&mut self, channel: &str, data: &str) {
        self.send(&WireMessage::Event {
            channel: channel.into(),
            data: data.into(),
        })
        .await;
    }

    pub async fn send_queue_item(&mut self, channel: &str, data: &str) {
        self.send(&WireMessage::QueueItem {
            channel: channel.into(),
            data: data.into(),
        })
        .await;
    }

    /// Drop the connection from the broker side.
    pub fn close(self) {
        drop(self.stream);
    }
}
