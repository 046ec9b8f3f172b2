//! # Delivery Guarantees
//!
//! Fan-out, type and predicate isolation, disposal, derivation correlation
//! and copy independence, checked against randomized publish sequences.

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use pubsub_bus::{
        BinaryMessage, Bus, BusConfig, BusError, CancellationToken, DeliveryPolicy, EventMessage,
        Message, TextMessage, Variant,
    };
    use rand::Rng;

    use crate::support::{join, settle_and_cancel, spawn_receiver, SETTLE};

    fn random_message(rng: &mut impl Rng, i: usize) -> Message {
        match rng.gen_range(0..3) {
            0 => TextMessage::new(format!("text-{i}")).into(),
            1 => BinaryMessage::new(i.to_le_bytes()).into(),
            _ => EventMessage::with_data("tick", i.to_string()).into(),
        }
    }

    #[tokio::test]
    async fn test_fan_out_reaches_every_matching_subscriber() {
        let bus = Bus::new();
        let subscribers: Vec<_> = (0..3)
            .map(|_| Arc::new(bus.create_subscriber::<TextMessage>()))
            .collect();

        let published: Vec<String> = (0..50).map(|i| format!("m{i}")).collect();
        for value in &published {
            bus.publish(TextMessage::new(value.as_str())).await.unwrap();
        }

        let cancel = CancellationToken::new();
        let loops: Vec<_> = subscribers
            .into_iter()
            .map(|s| spawn_receiver(s, cancel.clone()))
            .collect();
        tokio::time::sleep(SETTLE).await;
        cancel.cancel();

        for handle in loops {
            let drained = join(handle).await;
            let received: Vec<String> = drained
                .items
                .into_iter()
                .map(TextMessage::into_value)
                .collect();
            assert_eq!(received, published);
        }
        assert_eq!(bus.stats().delivered, 150);
    }

    #[tokio::test]
    async fn test_type_isolation_under_random_interleaving() {
        let bus = Bus::new();
        let texts = Arc::new(bus.create_subscriber::<TextMessage>());
        let binaries = Arc::new(bus.create_subscriber::<BinaryMessage>());
        let events = Arc::new(bus.create_subscriber::<EventMessage>());

        let mut rng = rand::thread_rng();
        let mut expected = [0usize; 3];
        for i in 0..200 {
            let message = random_message(&mut rng, i);
            match message {
                Message::Text(_) => expected[0] += 1,
                Message::Binary(_) => expected[1] += 1,
                Message::Event(_) => expected[2] += 1,
            }
            bus.publish(message).await.unwrap();
        }

        let cancel = CancellationToken::new();
        let text_loop = spawn_receiver(texts, cancel.clone());
        let binary_loop = spawn_receiver(binaries, cancel.clone());
        let event_drained = settle_and_cancel(&cancel, spawn_receiver(events, cancel.clone())).await;
        let text_drained = join(text_loop).await;
        let binary_drained = join(binary_loop).await;

        assert_eq!(text_drained.items.len(), expected[0]);
        assert_eq!(binary_drained.items.len(), expected[1]);
        assert_eq!(event_drained.items.len(), expected[2]);
        assert!(text_drained.items.iter().all(|m| m.value().starts_with("text-")));
        assert!(event_drained.items.iter().all(|m| m.event_id() == "tick"));
    }

    #[tokio::test]
    async fn test_predicate_isolation() {
        let bus = Bus::new();
        let even = Arc::new(bus.create_subscriber_with(|m: &BinaryMessage| {
            m.value().first().is_some_and(|b| b % 2 == 0)
        }));

        let mut rng = rand::thread_rng();
        let bytes: Vec<u8> = (0..100).map(|_| rng.gen()).collect();
        for byte in &bytes {
            bus.publish(BinaryMessage::new([*byte])).await.unwrap();
        }

        let cancel = CancellationToken::new();
        let drained = settle_and_cancel(&cancel, spawn_receiver(even, cancel.clone())).await;

        let received: Vec<u8> = drained.items.iter().map(|m| m.value()[0]).collect();
        let expected: Vec<u8> = bytes.into_iter().filter(|b| b % 2 == 0).collect();
        assert_eq!(received, expected);
    }

    #[tokio::test]
    async fn test_nothing_published_after_dispose_is_observed() {
        let bus = Arc::new(Bus::new());
        let subscriber = Arc::new(bus.create_subscriber::<TextMessage>());
        let returned = Arc::new(AtomicUsize::new(0));
        let stop = CancellationToken::new();

        let producer = {
            let bus = Arc::clone(&bus);
            let returned = Arc::clone(&returned);
            let stop = stop.clone();
            tokio::spawn(async move {
                let mut i = 0usize;
                while !stop.is_cancelled() {
                    bus.publish(TextMessage::new(i.to_string())).await.unwrap();
                    returned.store(i + 1, Ordering::SeqCst);
                    i += 1;
                    tokio::task::yield_now().await;
                }
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        subscriber.dispose();
        let last_in_flight = returned.load(Ordering::SeqCst);

        tokio::time::sleep(Duration::from_millis(20)).await;
        stop.cancel();
        producer.await.unwrap();

        let drained = join(spawn_receiver(Arc::clone(&subscriber), CancellationToken::new())).await;
        assert!(matches!(drained.end, BusError::Disposed { .. }));
        for message in drained.items {
            let index: usize = message.value().parse().unwrap();
            assert!(
                index <= last_in_flight,
                "message {index} published after dispose (last in flight {last_in_flight})"
            );
        }
    }

    #[tokio::test]
    async fn test_derived_messages_keep_root_correlation_across_delivery() {
        let bus = Bus::new();
        let subscriber = bus.create_subscriber::<TextMessage>();

        let root = TextMessage::with_topic("payload", "Ingest");
        let first = root.derive_with_topic("Transform");
        let second = first.derive_with_topic("Store");
        for message in [root.clone(), first, second] {
            bus.publish(message).await.unwrap();
        }

        let cancel = CancellationToken::new();
        let mut topics = Vec::new();
        for _ in 0..3 {
            let received = tokio::time::timeout(SETTLE * 5, subscriber.receive(&cancel))
                .await
                .expect("timeout")
                .unwrap();
            assert_eq!(received.correlation_id(), root.id());
            assert_eq!(received.value(), "payload");
            topics.push(received.topic().to_string());
        }
        assert_eq!(topics, vec!["Ingest", "Transform", "Store"]);
    }

    #[tokio::test]
    async fn test_delivered_copies_are_independent() {
        let bus = Bus::new();
        let first = bus.create_subscriber::<BinaryMessage>();
        let second = bus.create_subscriber::<BinaryMessage>();

        let original = BinaryMessage::new(b"abc");
        bus.publish(original.clone()).await.unwrap();

        let cancel = CancellationToken::new();
        let mut mine = first.receive(&cancel).await.unwrap();
        mine.value_mut()[0] = b'z';
        let theirs = second.receive(&cancel).await.unwrap();

        assert_eq!(mine.value(), b"zbc");
        assert_eq!(theirs.value(), b"abc");
        assert_eq!(original.value(), b"abc");

        let mut derived = original.derive();
        derived.value_mut().push(b'!');
        assert_eq!(original.value(), b"abc");
    }

    #[tokio::test]
    async fn test_latest_only_slow_subscriber_sees_most_recent() {
        let bus =
            Bus::with_config(BusConfig::default().with_delivery(DeliveryPolicy::LatestOnly)).unwrap();
        let slow = bus.create_subscriber::<TextMessage>();

        for i in 0..20 {
            bus.publish(TextMessage::new(i.to_string())).await.unwrap();
        }
        tokio::time::sleep(SETTLE).await;

        let latest = slow.try_recv().unwrap().expect("one pending message");
        assert_eq!(latest.value(), "19");
        assert!(slow.try_recv().unwrap().is_none());

        let stats = bus.stats();
        assert_eq!(stats.delivered, 20);
        assert_eq!(stats.replaced, 19);
    }
}
