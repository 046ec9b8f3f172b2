//! The choreography host: one bus, one responder, one collector.

use anyhow::{Context, Result};
use pubsub_bus::{Bus, BusStats, CancellationToken, MessageId, Variant};
use serde::Serialize;
use tracing::{info, warn};

use crate::config::RuntimeConfig;
use crate::handlers::{question, RequestResponder, ResponseCollector, ResponseSummary};

/// Outcome of one request/response run.
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioReport {
    /// Correlation ids of the published requests, in publish order.
    pub requests: Vec<MessageId>,
    /// Requests the responder answered.
    pub answered: usize,
    /// What the collector saw.
    pub responses: ResponseSummary,
    /// Bus counters after the run.
    pub stats: BusStats,
}

impl ScenarioReport {
    /// Requests that received no answer.
    #[must_use]
    pub fn unanswered(&self) -> Vec<MessageId> {
        self.requests
            .iter()
            .copied()
            .filter(|id| self.responses.answers_for(*id) == 0)
            .collect()
    }
}

/// Owns the bus and drives the request/response scenario.
pub struct PubSubRuntime {
    bus: Bus,
    config: RuntimeConfig,
    shutdown: CancellationToken,
}

impl PubSubRuntime {
    /// Build the bus described by `config`.
    ///
    /// Must be called inside a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Fails if the bus configuration is invalid.
    pub fn new(config: RuntimeConfig) -> Result<Self> {
        let bus = Bus::with_config(config.bus.clone()).context("Failed to build message bus")?;
        info!(
            requests = config.requests,
            settle_ms = config.settle_ms,
            delivery = %config.bus.delivery,
            "Pub/sub runtime created"
        );

        Ok(Self {
            bus,
            config,
            shutdown: CancellationToken::new(),
        })
    }

    /// The bus this runtime drives.
    #[must_use]
    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    /// Token that stops the handlers when cancelled.
    #[must_use]
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Publish the configured requests, let answers settle, then stop the
    /// handlers and report.
    ///
    /// # Errors
    ///
    /// Fails if a request cannot be published or a handler task panics.
    pub async fn run(&self) -> Result<ScenarioReport> {
        let responder = tokio::spawn(RequestResponder::new(&self.bus).run(self.shutdown.clone()));
        let collector = tokio::spawn(ResponseCollector::new(&self.bus).run(self.shutdown.clone()));

        let mut requests = Vec::with_capacity(self.config.requests);
        for i in 0..self.config.requests {
            let request = question("Time");
            requests.push(request.correlation_id());
            self.bus
                .publish(request)
                .await
                .with_context(|| format!("Failed to publish request {i}"))?;
        }
        info!(count = requests.len(), "Requests published");

        tokio::select! {
            () = tokio::time::sleep(self.config.settle()) => {}
            () = self.shutdown.cancelled() => {
                warn!("Shutdown requested before responses settled");
            }
        }
        self.shutdown.cancel();

        let answered = responder.await.context("Responder task failed")?;
        let responses = collector.await.context("Collector task failed")?;

        Ok(ScenarioReport {
            requests,
            answered,
            responses,
            stats: self.bus.stats(),
        })
    }
}
