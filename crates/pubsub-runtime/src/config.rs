//! Runtime configuration from environment variables.

use std::env;
use std::time::Duration;

use pubsub_bus::BusConfig;
use pubsub_telemetry::TelemetryConfig;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Requests published when `PUBSUB_REQUESTS` is unset.
pub const DEFAULT_REQUESTS: usize = 5;

/// Settle time when `PUBSUB_SETTLE_MS` is unset.
pub const DEFAULT_SETTLE_MS: u64 = 1_000;

/// Service name reported when `PUBSUB_SERVICE_NAME` is unset.
pub const SERVICE_NAME: &str = "pubsub-runtime";

/// Telemetry settings for the host, named [`SERVICE_NAME`] unless the
/// environment overrides it.
#[must_use]
pub fn telemetry_from_vars(lookup: impl Fn(&str) -> Option<String>) -> TelemetryConfig {
    let config = TelemetryConfig::from_vars(&lookup);
    if lookup("PUBSUB_SERVICE_NAME").is_some() {
        config
    } else {
        config.for_service(SERVICE_NAME)
    }
}

/// Configuration for the choreography host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Bus settings.
    pub bus: BusConfig,
    /// Number of `Question` requests to publish.
    pub requests: usize,
    /// How long to let responses settle before cancelling the handlers.
    pub settle_ms: u64,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            bus: BusConfig::default(),
            requests: DEFAULT_REQUESTS,
            settle_ms: DEFAULT_SETTLE_MS,
        }
    }
}

impl RuntimeConfig {
    /// Load from the process environment.
    ///
    /// # Environment Variables
    ///
    /// - `PUBSUB_INGRESS_CAPACITY`, `PUBSUB_DELIVERY_POLICY`: see [`BusConfig`]
    /// - `PUBSUB_REQUESTS`: Number of requests (default: 5)
    /// - `PUBSUB_SETTLE_MS`: Settle time in milliseconds (default: 1000)
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Load from an arbitrary variable lookup.
    #[must_use]
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            bus: BusConfig::from_vars(&lookup),
            requests: parse_or("PUBSUB_REQUESTS", &lookup, DEFAULT_REQUESTS),
            settle_ms: parse_or("PUBSUB_SETTLE_MS", &lookup, DEFAULT_SETTLE_MS),
        }
    }

    /// Settle time as a `Duration`.
    #[must_use]
    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }
}

fn parse_or<T>(key: &str, lookup: &impl Fn(&str) -> Option<String>, default: T) -> T
where
    T: std::str::FromStr + Copy + std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!(key, value = %raw, default = %default, "Invalid value, using default");
            default
        }),
        None => default,
    }
}
