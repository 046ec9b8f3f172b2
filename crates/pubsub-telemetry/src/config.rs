//! Telemetry configuration from environment variables.

use std::env;

use serde::{Deserialize, Serialize};

/// Service name used when none is configured.
pub const DEFAULT_SERVICE_NAME: &str = "pubsub";

/// Configuration for log output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Service name attached to the startup event
    pub service_name: String,

    /// Log filter directive (trace, debug, info, warn, error, or per-target)
    pub log_level: String,

    /// Whether to write log lines to stdout
    pub console_output: bool,

    /// Whether log lines are JSON instead of pretty text
    pub json_logs: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: DEFAULT_SERVICE_NAME.to_string(),
            log_level: "info".to_string(),
            console_output: true,
            json_logs: false,
        }
    }
}

impl TelemetryConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `PUBSUB_SERVICE_NAME`: Service name (default: pubsub)
    /// - `PUBSUB_LOG_LEVEL` or `RUST_LOG`: Filter directive (default: info)
    /// - `PUBSUB_CONSOLE_OUTPUT`: Enable console output (default: true)
    /// - `PUBSUB_JSON_LOGS`: Enable JSON logs (default: false)
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Create configuration from an arbitrary variable lookup.
    #[must_use]
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        Self {
            service_name: lookup("PUBSUB_SERVICE_NAME").unwrap_or(defaults.service_name),

            log_level: lookup("PUBSUB_LOG_LEVEL")
                .or_else(|| lookup("RUST_LOG"))
                .unwrap_or(defaults.log_level),

            console_output: lookup("PUBSUB_CONSOLE_OUTPUT")
                .map(|v| v.to_lowercase() != "false" && v != "0")
                .unwrap_or(defaults.console_output),

            json_logs: lookup("PUBSUB_JSON_LOGS")
                .map(|v| v.to_lowercase() == "true" || v == "1")
                .unwrap_or(defaults.json_logs),
        }
    }

    /// Same configuration with a different service name.
    #[must_use]
    pub fn for_service(mut self, service_name: impl Into<String>) -> Self {
        self.service_name = service_name.into();
        self
    }
}
