//! # Request/Response Handlers
//!
//! ## Flow
//!
//! 1. A producer publishes `Question` on topic `Request`
//! 2. [`RequestResponder`] receives it and publishes `Answer` on topic
//!    `Response`, correlated to the request
//! 3. [`ResponseCollector`] receives the answer and tallies it by correlation id
//!
//! Both handlers run until their cancellation token fires or the bus goes away.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{SecondsFormat, Utc};
use pubsub_bus::{
    Bus, BusError, CancellationToken, EventMessage, Filter, MessageId, MessagePublisher,
    Subscriber, Variant,
};
use pubsub_telemetry::log_event;
use serde::Serialize;

/// Topic requests are published on.
pub const REQUEST_TOPIC: &str = "Request";

/// Topic answers are published on.
pub const RESPONSE_TOPIC: &str = "Response";

/// Event id of a request.
pub const QUESTION_EVENT: &str = "Question";

/// Event id of an answer.
pub const ANSWER_EVENT: &str = "Answer";

/// Build a `Question` request carrying `data`.
#[must_use]
pub fn question(data: impl Into<String>) -> EventMessage {
    EventMessage::on_topic(QUESTION_EVENT, Some(data.into()), REQUEST_TOPIC)
}

const RESPONDER: &str = "responder";
const COLLECTOR: &str = "collector";

/// Answers every request with the current time.
pub struct RequestResponder {
    subscriber: Subscriber<EventMessage>,
    publisher: Arc<dyn MessagePublisher>,
}

impl RequestResponder {
    /// Subscribe to requests on `bus` and answer through its publisher.
    ///
    /// The responder holds its own [`pubsub_bus::Publisher`] clone, so the
    /// bus's broadcaster keeps running while the responder does, even after
    /// the `Bus` itself is dropped.
    #[must_use]
    pub fn new(bus: &Bus) -> Self {
        Self::with_parts(
            bus.subscribe(Filter::topic(REQUEST_TOPIC)),
            Arc::new(bus.publisher()),
        )
    }

    /// Build from an existing subscription and publisher.
    #[must_use]
    pub fn with_parts(
        subscriber: Subscriber<EventMessage>,
        publisher: Arc<dyn MessagePublisher>,
    ) -> Self {
        Self {
            subscriber,
            publisher,
        }
    }

    /// The answer to `request`: an `Answer` on topic `Response` sharing the
    /// request's correlation id.
    #[must_use]
    pub fn answer(request: &EventMessage) -> EventMessage {
        let now = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
        EventMessage::on_topic(ANSWER_EVENT, Some(now), RESPONSE_TOPIC)
            .correlated_with(request.header())
    }

    /// Run until cancelled. Returns the number of requests answered.
    ///
    /// A responder built with [`RequestResponder::new`] keeps the ingress open
    /// through its own publisher, so dropping the `Bus` does not end this
    /// loop. Cancel `cancel` to stop it.
    pub async fn run(self, cancel: CancellationToken) -> usize {
        log_event!(info, RESPONDER, "Request responder started");
        let mut answered = 0;

        loop {
            let request = match self.subscriber.receive(&cancel).await {
                Ok(request) => request,
                Err(BusError::Cancelled) => {
                    log_event!(info, RESPONDER, "Request responder cancelled", answered);
                    break;
                }
                Err(e) => {
                    log_event!(info, RESPONDER, "Request stream ended", answered, reason = %e);
                    break;
                }
            };

            let answer = Self::answer(&request);
            let answer_id = answer.id();
            if let Err(e) = self.publisher.publish_message(answer.into()).await {
                log_event!(
                    warn,
                    RESPONDER,
                    "Failed to publish answer, stopping responder",
                    error = %e
                );
                break;
            }

            answered += 1;
            log_event!(
                debug,
                RESPONDER,
                "Request answered",
                request_id = %request.id(),
                answer_id = %answer_id,
                correlation_id = %request.correlation_id()
            );
        }

        answered
    }
}

/// Tally of answers seen by a [`ResponseCollector`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResponseSummary {
    /// Answers received.
    pub total: usize,
    /// Messages on the response topic that were not answers.
    pub unexpected: usize,
    /// Answers per correlation id.
    pub by_correlation: HashMap<MessageId, usize>,
}

impl ResponseSummary {
    /// Answers received for the request chain rooted at `correlation_id`.
    #[must_use]
    pub fn answers_for(&self, correlation_id: MessageId) -> usize {
        self.by_correlation
            .get(&correlation_id)
            .copied()
            .unwrap_or(0)
    }

    fn record(&mut self, response: &EventMessage) {
        if response.event_id() == ANSWER_EVENT {
            self.total += 1;
            *self
                .by_correlation
                .entry(response.correlation_id())
                .or_default() += 1;
        } else {
            self.unexpected += 1;
            log_event!(
                warn,
                COLLECTOR,
                "Unexpected event on response topic",
                event_id = response.event_id(),
                message_id = %response.id()
            );
        }
    }
}

/// Collects answers published on the response topic.
pub struct ResponseCollector {
    subscriber: Subscriber<EventMessage>,
}

impl ResponseCollector {
    /// Subscribe to answers on `bus`.
    #[must_use]
    pub fn new(bus: &Bus) -> Self {
        Self {
            subscriber: bus.subscribe(Filter::topic(RESPONSE_TOPIC)),
        }
    }

    /// Run until cancelled. Returns what was collected.
    pub async fn run(self, cancel: CancellationToken) -> ResponseSummary {
        log_event!(info, COLLECTOR, "Response collector started");
        let mut summary = ResponseSummary::default();

        loop {
            match self.subscriber.receive(&cancel).await {
                Ok(response) => summary.record(&response),
                Err(BusError::Cancelled) => {
                    log_event!(
                        info,
                        COLLECTOR,
                        "Response collector cancelled",
                        total = summary.total
                    );
                    break;
                }
                Err(e) => {
                    log_event!(
                        info,
                        COLLECTOR,
                        "Response stream ended",
                        total = summary.total,
                        reason = %e
                    );
                    break;
                }
            }
        }

        summary
    }
}
