//! # Request/Response Choreography
//!
//! The runtime's responder and collector driven over a shared bus.

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use pubsub_bus::{Bus, BusConfig, CancellationToken, DeliveryPolicy, Variant};
    use pubsub_runtime::handlers::{question, RequestResponder, ResponseCollector};
    use pubsub_runtime::{PubSubRuntime, RuntimeConfig};

    #[tokio::test]
    async fn test_five_requests_five_correlated_answers() {
        let bus = Bus::new();
        let cancel = CancellationToken::new();
        let responder = tokio::spawn(RequestResponder::new(&bus).run(cancel.clone()));
        let collector = tokio::spawn(ResponseCollector::new(&bus).run(cancel.clone()));

        let mut ids = Vec::new();
        for _ in 0..5 {
            let request = question("Time");
            ids.push(request.correlation_id());
            bus.publish(request).await.unwrap();
        }

        tokio::time::sleep(Duration::from_millis(200)).await;
        cancel.cancel();

        assert_eq!(responder.await.unwrap(), 5);
        let summary = collector.await.unwrap();
        assert_eq!(summary.total, 5);
        assert_eq!(summary.unexpected, 0);
        assert!(ids.iter().all(|id| summary.answers_for(*id) == 1));
    }

    #[tokio::test]
    async fn test_runtime_scenario_with_bounded_ingress() {
        let config = RuntimeConfig {
            bus: BusConfig::default().with_ingress_capacity(2),
            requests: 8,
            settle_ms: 300,
        };
        let runtime = PubSubRuntime::new(config).unwrap();

        let report = runtime.run().await.unwrap();

        assert_eq!(report.answered, 8);
        assert!(report.unanswered().is_empty());
        assert_eq!(report.stats.published, 16);
        assert_eq!(report.stats.predicate_failures, 0);
    }

    #[tokio::test]
    async fn test_runtime_scenario_latest_only() {
        let config = RuntimeConfig {
            bus: BusConfig::default().with_delivery(DeliveryPolicy::LatestOnly),
            requests: 3,
            settle_ms: 300,
        };
        let runtime = PubSubRuntime::new(config).unwrap();

        let report = runtime.run().await.unwrap();

        assert_eq!(report.requests.len(), 3);
        assert!((1..=3).contains(&report.answered));
        assert!(report.responses.total <= report.answered);
    }
}
