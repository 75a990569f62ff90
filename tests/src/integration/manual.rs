//! # Manual Transport
//!
//! A blocking client for producers that only publish and enqueue. It frames
//! its own messages, never subscribes and never reconnects.

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use channel_client::{
        ChannelName, ClientBuilder, ClientError, HandlerResult, ManualTransport, MessageKind,
        NoopScheduler, Payload, SessionState, TransportMode, WireMessage,
    };

    use crate::broker::FakeBroker;

    #[tokio::test]
    async fn test_manual_producer_reaches_broker() {
        let broker = FakeBroker::bind().await;
        let config = broker.client_config();

        let producer = tokio::task::spawn_blocking(move || {
            let transport = ManualTransport::new(Duration::from_secs(2));
            let mut client = ClientBuilder::new(config).build(transport, NoopScheduler::new());
            assert_eq!(client.mode(), TransportMode::Manual);

            client.publish("metrics", "cpu=3")?;
            assert_eq!(client.state(), SessionState::Connected);
            client.enqueue(["jobs", "audit"], "task-1")?;
            client.shutdown();
            Ok::<_, ClientError>(())
        });

        let mut conn = broker.accept().await;
        assert_eq!(
            conn.recv().await,
            WireMessage::Publish {
                channels: vec![ChannelName::new("metrics")],
                data: Payload::from("cpu=3"),
            }
        );
        assert_eq!(
            conn.recv().await,
            WireMessage::Enqueue {
                channels: vec![ChannelName::new("jobs"), ChannelName::new("audit")],
                data: Payload::from("task-1"),
            }
        );
        producer.await.unwrap().unwrap();
        assert_eq!(conn.recv_raw().await, None);
    }

    #[tokio::test]
    async fn test_manual_client_rejects_subscriptions() {
        let broker = FakeBroker::bind().await;
        let config = broker.client_config();

        let result = tokio::task::spawn_blocking(move || {
            let transport = ManualTransport::new(Duration::from_secs(2));
            let mut client = ClientBuilder::new(config).build(transport, NoopScheduler::new());
            let subscribe = client.subscribe("news");
            let watch = client.watch("jobs", |_payload: Payload| -> HandlerResult { Ok(()) }, true);
            (subscribe, watch, client.event_names(), client.queue_names())
        })
        .await
        .unwrap();

        let (subscribe, watch, events, queues) = result;
        assert!(matches!(
            subscribe,
            Err(ClientError::UnsupportedMode {
                operation: MessageKind::Subscribe
            })
        ));
        assert!(matches!(
            watch,
            Err(ClientError::UnsupportedMode {
                operation: MessageKind::Watch
            })
        ));
        assert!(events.is_empty());
        assert!(queues.is_empty());
    }

    #[tokio::test]
    async fn test_manual_connect_failure_is_reported() {
        let broker = FakeBroker::bind().await;
        let config = broker.client_config();
        drop(broker);

        let result = tokio::task::spawn_blocking(move || {
            let transport = ManualTransport::new(Duration::from_secs(2));
            let mut client = ClientBuilder::new(config).build(transport, NoopScheduler::new());
            let sent = client.publish("metrics", "lost");
            (sent, client.state())
        })
        .await
        .unwrap();

        assert!(matches!(result.0, Err(ClientError::Connection(_))));
        assert_ne!(result.1, SessionState::Connected);
    }
}
