//! Bus configuration, from code or from environment variables.

use std::env;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::BusError;
use crate::{ENV_DELIVERY_POLICY, ENV_INGRESS_CAPACITY};

/// What a subscriber's inbox does with a match while an earlier one is unconsumed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeliveryPolicy {
    /// Unbounded inbox: every matching message is kept, in order.
    #[default]
    Queued,
    /// One-slot inbox: a newer match replaces the pending one.
    ///
    /// A slow subscriber is only guaranteed the most recent unconsumed match.
    LatestOnly,
}

impl fmt::Display for DeliveryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Queued => f.write_str("queued"),
            Self::LatestOnly => f.write_str("latest-only"),
        }
    }
}

impl FromStr for DeliveryPolicy {
    type Err = BusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "queued" | "queue" => Ok(Self::Queued),
            "latest-only" | "latest_only" | "latest" => Ok(Self::LatestOnly),
            other => Err(BusError::InvalidConfig(format!(
                "unknown delivery policy '{other}'"
            ))),
        }
    }
}

/// Configuration for a [`Bus`](crate::Bus).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusConfig {
    /// Ingress queue capacity. `None` means unbounded, so `publish` never suspends.
    pub ingress_capacity: Option<usize>,

    /// Per-subscriber delivery policy.
    pub delivery: DeliveryPolicy,
}

impl BusConfig {
    /// Bound the ingress queue.
    #[must_use]
    pub fn with_ingress_capacity(mut self, capacity: usize) -> Self {
        self.ingress_capacity = Some(capacity);
        self
    }

    /// Select the delivery policy.
    #[must_use]
    pub fn with_delivery(mut self, delivery: DeliveryPolicy) -> Self {
        self.delivery = delivery;
        self
    }

    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `PUBSUB_INGRESS_CAPACITY`: ingress capacity, `0` for unbounded (default: unbounded)
    /// - `PUBSUB_DELIVERY_POLICY`: `queued` or `latest-only` (default: queued)
    ///
    /// Unparseable values fall back to the default and are logged.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an explicit variable lookup.
    #[must_use]
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let ingress_capacity = lookup(ENV_INGRESS_CAPACITY).and_then(|raw| {
            match raw.trim().parse::<usize>() {
                Ok(0) => None,
                Ok(capacity) => Some(capacity),
                Err(e) => {
                    warn!(value = %raw, error = %e, "Ignoring invalid {ENV_INGRESS_CAPACITY}");
                    None
                }
            }
        });

        let delivery = lookup(ENV_DELIVERY_POLICY)
            .and_then(|raw| match raw.parse::<DeliveryPolicy>() {
                Ok(policy) => Some(policy),
                Err(e) => {
                    warn!(value = %raw, error = %e, "Ignoring invalid {ENV_DELIVERY_POLICY}");
                    None
                }
            })
            .unwrap_or_default();

        Self {
            ingress_capacity,
            delivery,
        }
    }

    /// Check the configuration before building a bus.
    ///
    /// # Errors
    ///
    /// `BusError::InvalidConfig` if the ingress capacity is zero.
    pub fn validate(&self) -> Result<(), BusError> {
        if self.ingress_capacity == Some(0) {
            return Err(BusError::InvalidConfig(
                "ingress capacity must be at least 1 (use None for unbounded)".to_string(),
            ));
        }
        Ok(())
    }
}
