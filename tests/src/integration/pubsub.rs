//! # Pub/Sub Flows
//!
//! 1. **Subscribe**: `on` and `subscribe` reach the broker; events reach the
//!    registered handler or the global handler.
//! 2. **Replay**: after the broker drops the connection the client
//!    reconnects and re-subscribes every event in one message.
//! 3. **Fan-out**: a publish from one client is relayed to another client's
//!    subscription.

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use channel_client::{
        ChannelName, ClientBuilder, DispatchFault, HandlerResult, Payload, SessionState,
        WireMessage,
    };
    use parking_lot::Mutex;
    use std::sync::Arc;
    use tokio::sync::mpsc;
    use tokio::time::timeout;
    use tokio_stream::StreamExt;

    use crate::broker::{FakeBroker, STEP_TIMEOUT};

    fn names(list: &[&str]) -> Vec<ChannelName> {
        list.iter().map(|name| ChannelName::new(*name)).collect()
    }

    async fn next<T>(rx: &mut mpsc::UnboundedReceiver<T>) -> T {
        timeout(STEP_TIMEOUT, rx.recv())
            .await
            .expect("timed out")
            .expect("channel closed")
    }

    /// Poll the runtime until the session reaches `state`.
    async fn wait_for_state(handle: &channel_client::ClientHandle, state: SessionState) {
        timeout(STEP_TIMEOUT, async {
            while handle.state().await.unwrap() != state {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("session never reached expected state");
    }

    // =========================================================================
    // SUBSCRIBE AND DELIVERY
    // =========================================================================

    #[tokio::test]
    async fn test_event_reaches_stream_subscriber() {
        let broker = FakeBroker::bind().await;
        let (client, _faults, _task) = ClientBuilder::new(broker.client_config()).spawn();

        let mut stream = client.subscribe_stream("news").await.unwrap();
        let mut conn = broker.accept().await;
        assert_eq!(
            conn.recv().await,
            WireMessage::Subscribe {
                channels: names(&["news"])
            }
        );

        conn.send_event("news", "headline").await;
        let payload = timeout(STEP_TIMEOUT, stream.next()).await.unwrap().unwrap();
        assert_eq!(payload, Payload::from("headline"));

        client.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_handlerless_event_goes_to_global_handler() {
        let broker = FakeBroker::bind().await;
        let (tx, mut rx) = mpsc::unbounded_channel();
        let builder = ClientBuilder::new(broker.client_config()).on_message(
            move |channel: &ChannelName, payload: Payload| -> HandlerResult {
                tx.send((channel.clone(), payload))?;
                Ok(())
            },
        );
        let (client, _faults, _task) = builder.spawn();

        client.subscribe(["a", "b"]).await.unwrap();
        let mut conn = broker.accept().await;
        conn.recv().await;

        conn.send_event("b", "payload").await;
        assert_eq!(
            next(&mut rx).await,
            (ChannelName::new("b"), Payload::from("payload"))
        );

        client.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_unhandled_event_surfaces_as_fault() {
        let broker = FakeBroker::bind().await;
        let (client, mut faults, _task) = ClientBuilder::new(broker.client_config()).spawn();

        client.subscribe("orphan").await.unwrap();
        let mut conn = broker.accept().await;
        conn.recv().await;
        conn.send_event("orphan", "lost").await;

        match next(&mut faults).await {
            DispatchFault::UnhandledEvent { channel } => assert_eq!(channel.as_str(), "orphan"),
            other => panic!("unexpected fault: {other}"),
        }
        // Still usable afterwards.
        client.publish("orphan", "again").await.unwrap();
        while !matches!(conn.recv().await, WireMessage::Publish { .. }) {}

        client.shutdown().await.unwrap();
    }

    // =========================================================================
    // RECONNECT AND REPLAY
    // =========================================================================

    #[tokio::test]
    async fn test_subscriptions_replayed_after_broker_disconnect() {
        let broker = FakeBroker::bind().await;
        let connects = Arc::new(Mutex::new(0usize));
        let counter = Arc::clone(&connects);
        let builder = ClientBuilder::new(broker.client_config()).on_connect(move || {
            *counter.lock() += 1;
        });
        let (client, _faults, _task) = builder.spawn();

        let mut stream = client.subscribe_stream("beta").await.unwrap();
        client.subscribe("alpha").await.unwrap();
        // The first connection sees the direct subscribes and a replay, in
        // an order that depends on when the socket opened.
        let first = broker.accept().await;
        wait_for_state(&client, SessionState::Connected).await;

        first.close();

        let mut second = broker.accept().await;
        assert_eq!(
            second.recv().await,
            WireMessage::Subscribe {
                channels: names(&["alpha", "beta"])
            }
        );
        wait_for_state(&client, SessionState::Connected).await;
        assert!(*connects.lock() >= 2);

        second.send_event("beta", "after-reconnect").await;
        let payload = timeout(STEP_TIMEOUT, stream.next()).await.unwrap().unwrap();
        assert_eq!(payload, Payload::from("after-reconnect"));

        client.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_client_retries_until_broker_appears() {
        let broker = FakeBroker::bind().await;
        let config = broker.client_config();
        drop(broker);

        let (client, _faults, _task) = ClientBuilder::new(config.clone()).spawn();
        client.subscribe("late").await.unwrap();
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_ne!(client.state().await.unwrap(), SessionState::Connected);

        // Rebind the same port and wait for a retry to land.
        let port = match &config.address {
            channel_client::RemoteAddress::Tcp { port, .. } => *port,
            other => panic!("unexpected address {other}"),
        };
        let listener = match tokio::net::TcpListener::bind(("127.0.0.1", port)).await {
            Ok(listener) => listener,
            // The ephemeral port was taken by someone else; nothing to test.
            Err(_) => return,
        };
        let (stream, _) = timeout(STEP_TIMEOUT, listener.accept()).await.unwrap().unwrap();
        let mut reader = stream;
        let frame = timeout(
            STEP_TIMEOUT,
            channel_client::codec::read_frame(&mut reader, 1024),
        )
        .await
        .unwrap()
        .unwrap()
        .unwrap();
        let message = channel_client::Codec::decode(&channel_client::BincodeCodec, &frame).unwrap();
        assert_eq!(
            message,
            WireMessage::Subscribe {
                channels: names(&["late"])
            }
        );

        client.shutdown().await.unwrap();
    }

    // =========================================================================
    // PUBLISH FAN-OUT
    // =========================================================================

    #[tokio::test]
    async fn test_publish_relayed_to_other_subscriber() {
        let broker = FakeBroker::bind().await;
        let (subscriber, _f1, _t1) = ClientBuilder::new(broker.client_config()).spawn();
        let mut stream = subscriber.subscribe_stream("chat").await.unwrap();
        let mut sub_conn = broker.accept().await;
        sub_conn.recv().await;

        let (publisher, _f2, _t2) = ClientBuilder::new(broker.client_config()).spawn();
        publisher.publish(["chat", "audit"], "hello").await.unwrap();
        let mut pub_conn = broker.accept().await;

        let WireMessage::Publish { channels, data } = pub_conn.recv().await else {
            panic!("expected publish");
        };
        assert_eq!(channels, names(&["chat", "audit"]));
        for channel in &channels {
            if channel.as_str() == "chat" {
                sub_conn
                    .send(&WireMessage::Event {
                        channel: channel.clone(),
                        data: data.clone(),
                    })
                    .await;
            }
        }

        let payload = timeout(STEP_TIMEOUT, stream.next()).await.unwrap().unwrap();
        assert_eq!(payload, Payload::from("hello"));

        publisher.shutdown().await.unwrap();
        subscriber.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_unsubscribe_is_not_replayed() {
        let broker = FakeBroker::bind().await;
        let (client, _faults, _task) = ClientBuilder::new(broker.client_config()).spawn();

        client.subscribe(["keep", "drop"]).await.unwrap();
        client.unsubscribe("drop").await.unwrap();
        let first = broker.accept().await;
        wait_for_state(&client, SessionState::Connected).await;
        first.close();

        let mut second = broker.accept().await;
        assert_eq!(
            second.recv().await,
            WireMessage::Subscribe {
                channels: names(&["keep"])
            }
        );

        client.shutdown().await.unwrap();
    }
}
