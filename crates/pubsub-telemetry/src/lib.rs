//! # Pub/Sub Telemetry
//!
//! Structured logging for binaries and test harnesses built on the bus.
//! Library crates only emit `tracing` events; this crate decides where they go.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use pubsub_telemetry::{init_telemetry, TelemetryConfig};
//!
//! let config = TelemetryConfig::from_env();
//! let _guard = init_telemetry(&config)?;
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `PUBSUB_SERVICE_NAME` | `pubsub` | Service name in the startup event |
//! | `PUBSUB_LOG_LEVEL` / `RUST_LOG` | `info` | Filter directive |
//! | `PUBSUB_CONSOLE_OUTPUT` | `true` | Write log lines to stdout |
//! | `PUBSUB_JSON_LOGS` | `false` | JSON instead of pretty output |

mod config;
mod tracing_setup;

pub use config::{TelemetryConfig, DEFAULT_SERVICE_NAME};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TelemetryError {
    #[error("Failed to install tracing subscriber: {0}")]
    SubscriberInit(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Install the global subscriber described by `config`.
///
/// Returns a guard to hold for the lifetime of the application.
///
/// # Errors
///
/// - `TelemetryError::Config` if the filter directive does not parse
/// - `TelemetryError::SubscriberInit` if a global subscriber is already set
pub fn init_telemetry(config: &TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    tracing_setup::init_tracing(config)?;

    tracing::info!(
        service = %config.service_name,
        log_level = %config.log_level,
        json_logs = config.json_logs,
        "Telemetry initialized"
    );

    Ok(TelemetryGuard {
        service_name: config.service_name.clone(),
    })
}

/// Guard that marks telemetry as active. Logs shutdown on drop.
#[derive(Debug)]
pub struct TelemetryGuard {
    service_name: String,
}

impl TelemetryGuard {
    /// Service name the subscriber was installed for.
    #[must_use]
    pub fn service_name(&self) -> &str {
        &self.service_name
    }
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::info!(service = %self.service_name, "Shutting down telemetry");
    }
}

/// Emit an event tagged with the emitting component.
///
/// ```rust,ignore
/// use pubsub_telemetry::log_event;
///
/// log_event!(info, "responder", "Request answered", correlation_id = %id);
/// ```
#[macro_export]
macro_rules! log_event {
    (info, $component:expr, $msg:expr $(, $($field:tt)*)?) => {
        tracing::info!(component = $component, $($($field)*,)? $msg)
    };

    (warn, $component:expr, $msg:expr $(, $($field:tt)*)?) => {
        tracing::warn!(component = $component, $($($field)*,)? $msg)
    };

    (error, $component:expr, $msg:expr $(, $($field:tt)*)?) => {
        tracing::error!(component = $component, $($($field)*,)? $msg)
    };

    (debug, $component:expr, $msg:expr $(, $($field:tt)*)?) => {
        tracing::debug!(component = $component, $($($field)*,)? $msg)
    };
}
