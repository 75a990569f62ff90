//! # Queue Flows
//!
//! 1. **Auto reserve**: `watch` sends one `reserve` up front and one after
//!    every delivered item.
//! 2. **Manual reserve**: with auto reserve off, the application decides
//!    when the next item may come.
//! 3. **Handler failure**: a failing handler still releases the next item.
//! 4. **Enqueue**: work pushed by a producer reaches the broker.
//! 5. **Dropped stream**: the queue is unwatched instead of draining it.

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use channel_client::{
        ChannelName, ClientBuilder, DispatchFault, HandlerResult, Payload, WireMessage,
    };
    use tokio::sync::mpsc;
    use tokio::time::timeout;
    use tokio_stream::StreamExt;

    use crate::broker::{BrokerConnection, FakeBroker, STEP_TIMEOUT};

    fn names(list: &[&str]) -> Vec<ChannelName> {
        list.iter().map(|name| ChannelName::new(*name)).collect()
    }

    /// Skip messages until a `reserve` arrives.
    async fn expect_reserve(conn: &mut BrokerConnection) {
        loop {
            match conn.recv().await {
                WireMessage::Reserve => return,
                WireMessage::Subscribe { .. } => continue,
                other => panic!("expected reserve, got {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn test_watch_with_auto_reserve() {
        let broker = FakeBroker::bind().await;
        let (client, _faults, _task) = ClientBuilder::new(broker.client_config()).spawn();

        let mut items = client.watch_stream(["jobs", "mail"], true).await.unwrap();
        let mut conn = broker.accept().await;
        assert_eq!(
            conn.recv().await,
            WireMessage::Watch {
                channels: names(&["jobs", "mail"])
            }
        );
        expect_reserve(&mut conn).await;

        for n in 0..3 {
            let body = format!("job-{n}");
            conn.send_queue_item("jobs", &body).await;
            let item = timeout(STEP_TIMEOUT, items.next()).await.unwrap().unwrap();
            assert_eq!(item, Payload::from(body));
            expect_reserve(&mut conn).await;
        }

        client.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_watch_without_auto_reserve() {
        let broker = FakeBroker::bind().await;
        let (tx, mut rx) = mpsc::unbounded_channel();
        let (client, _faults, _task) = ClientBuilder::new(broker.client_config()).spawn();

        client
            .watch(
                "jobs",
                move |payload: Payload| -> HandlerResult {
                    tx.send(payload)?;
                    Ok(())
                },
                false,
            )
            .await
            .unwrap();
        let mut conn = broker.accept().await;
        assert!(matches!(conn.recv().await, WireMessage::Watch { .. }));

        conn.send_queue_item("jobs", "one").await;
        let item = timeout(STEP_TIMEOUT, rx.recv()).await.unwrap().unwrap();
        assert_eq!(item, Payload::from("one"));
        conn.expect_silence(Duration::from_millis(200)).await;

        client.reserve().await.unwrap();
        expect_reserve(&mut conn).await;

        client.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_failing_handler_still_reserves() {
        let broker = FakeBroker::bind().await;
        let (client, mut faults, _task) = ClientBuilder::new(broker.client_config()).spawn();

        client
            .watch(
                "jobs",
                |_payload: Payload| -> HandlerResult { anyhow::bail!("cannot process") },
                true,
            )
            .await
            .unwrap();
        let mut conn = broker.accept().await;
        conn.recv().await;
        expect_reserve(&mut conn).await;

        conn.send_queue_item("jobs", "poison").await;
        expect_reserve(&mut conn).await;

        let fault = timeout(STEP_TIMEOUT, faults.recv()).await.unwrap().unwrap();
        assert!(matches!(fault, DispatchFault::Handler { .. }));
        assert!(fault.to_string().contains("cannot process"));

        client.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_dropped_watch_stream_unwatches_queue() {
        let broker = FakeBroker::bind().await;
        let (client, mut faults, _task) = ClientBuilder::new(broker.client_config()).spawn();

        let items = client.watch_stream("jobs", true).await.unwrap();
        let mut conn = broker.accept().await;
        assert!(matches!(conn.recv().await, WireMessage::Watch { .. }));
        expect_reserve(&mut conn).await;
        drop(items);

        conn.send_queue_item("jobs", "orphaned").await;
        assert_eq!(
            conn.recv().await,
            WireMessage::Unwatch {
                channels: names(&["jobs"])
            }
        );
        let fault = timeout(STEP_TIMEOUT, faults.recv()).await.unwrap().unwrap();
        assert!(matches!(fault, DispatchFault::HandlerClosed { .. }));
        conn.expect_silence(Duration::from_millis(200)).await;
        assert!(client.queue_names().await.unwrap().is_empty());

        client.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_enqueue_reaches_broker() {
        let broker = FakeBroker::bind().await;
        let (producer, _faults, _task) = ClientBuilder::new(broker.client_config()).spawn();

        producer.enqueue(["jobs", "audit"], "{\"task\":7}").await.unwrap();
        let mut conn = broker.accept().await;
        assert_eq!(
            conn.recv().await,
            WireMessage::Enqueue {
                channels: names(&["jobs", "audit"]),
                data: Payload::from("{\"task\":7}"),
            }
        );

        producer.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_unwatched_queue_item_is_fault() {
        let broker = FakeBroker::bind().await;
        let (client, mut faults, _task) = ClientBuilder::new(broker.client_config()).spawn();

        let _items = client.watch_stream("jobs", false).await.unwrap();
        client.unwatch("jobs").await.unwrap();
        let mut conn = broker.accept().await;
        conn.recv().await;
        conn.recv().await;

        conn.send_queue_item("jobs", "late").await;
        let fault = timeout(STEP_TIMEOUT, faults.recv()).await.unwrap().unwrap();
        assert!(matches!(fault, DispatchFault::UnhandledQueue { .. }));

        client.shutdown().await.unwrap();
    }
}
