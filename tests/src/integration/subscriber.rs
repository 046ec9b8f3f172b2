//! # Subscriber Integration Tests
//!
//! A subscriber linked straight to a broadcaster, without the `Bus` wrapper.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use pubsub_bus::{
        BinaryMessage, Broadcaster, BusConfig, CancellationToken, Filter, Subscriber,
        TextMessage,
    };

    use crate::support::{settle_and_cancel, spawn_receiver};

    fn text_subscriber() -> (Broadcaster, pubsub_bus::Publisher, Arc<Subscriber<TextMessage>>) {
        let (broadcaster, publisher) = Broadcaster::spawn(&BusConfig::default()).unwrap();
        let subscriber = Arc::new(Subscriber::new(&broadcaster, Filter::any()));
        (broadcaster, publisher, subscriber)
    }

    #[tokio::test]
    async fn test_receives_same_type() {
        let (_broadcaster, publisher, subscriber) = text_subscriber();

        publisher.publish(TextMessage::new("Hello")).await.unwrap();

        let cancel = CancellationToken::new();
        let drained = settle_and_cancel(&cancel, spawn_receiver(subscriber, cancel.clone())).await;

        assert_eq!(drained.items.len(), 1);
        assert_eq!(drained.items[0].value(), "Hello");
    }

    #[tokio::test]
    async fn test_other_type_only_ends_by_cancellation() {
        let (_broadcaster, publisher, subscriber) = text_subscriber();

        publisher.publish(BinaryMessage::new(b"Hello")).await.unwrap();

        let cancel = CancellationToken::new();
        let drained = settle_and_cancel(&cancel, spawn_receiver(subscriber, cancel.clone())).await;

        assert!(drained.items.is_empty());
        assert!(drained.cancelled());
    }

    #[tokio::test]
    async fn test_interleaved_variants_keep_order() {
        let (broadcaster, publisher, subscriber) = text_subscriber();

        for i in 0..10 {
            publisher.publish(BinaryMessage::new(b"NotThis")).await.unwrap();
            publisher
                .publish(TextMessage::new(format!("Hello{i}")))
                .await
                .unwrap();
        }

        let cancel = CancellationToken::new();
        let drained = settle_and_cancel(&cancel, spawn_receiver(subscriber, cancel.clone())).await;

        assert_eq!(drained.items.len(), 10);
        assert_eq!(drained.items.last().map(TextMessage::value), Some("Hello9"));
        let expected: Vec<String> = (0..10).map(|i| format!("Hello{i}")).collect();
        let received: Vec<String> = drained
            .items
            .into_iter()
            .map(TextMessage::into_value)
            .collect();
        assert_eq!(received, expected);

        let stats = broadcaster.stats();
        assert_eq!(stats.published, 20);
        assert_eq!(stats.delivered, 10);
    }

    #[tokio::test]
    async fn test_stream_adapter() {
        use futures::StreamExt;

        let (_broadcaster, publisher, subscriber) = text_subscriber();
        let subscriber = Arc::try_unwrap(subscriber).unwrap();

        for word in ["a", "b", "c"] {
            publisher.publish(TextMessage::new(word)).await.unwrap();
        }
        drop(publisher);

        let words: Vec<String> = subscriber
            .into_stream()
            .map(TextMessage::into_value)
            .collect()
            .await;
        assert_eq!(words, vec!["a", "b", "c"]);
    }
}
