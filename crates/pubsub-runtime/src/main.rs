//! # Pub/Sub Runtime
//!
//! Runs the request/response choreography once and logs the outcome.

use anyhow::{Context, Result};
use pubsub_runtime::config::telemetry_from_vars;
use pubsub_runtime::{PubSubRuntime, RuntimeConfig};
use pubsub_telemetry::init_telemetry;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let telemetry = telemetry_from_vars(|key| std::env::var(key).ok());
    let _guard = init_telemetry(&telemetry).context("Failed to initialize telemetry")?;

    let config = RuntimeConfig::from_env();
    let runtime = PubSubRuntime::new(config)?;

    let shutdown = runtime.shutdown_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Ctrl+C received");
            shutdown.cancel();
        }
    });

    let report = runtime.run().await?;

    info!(
        "SCENARIO_REPORT_JSON {}",
        serde_json::to_string(&report).context("Failed to encode report")?
    );

    let unanswered = report.unanswered();
    if unanswered.is_empty() {
        info!(
            requests = report.requests.len(),
            answered = report.answered,
            "All requests answered"
        );
    } else {
        warn!(
            unanswered = unanswered.len(),
            requests = report.requests.len(),
            "Some requests were not answered"
        );
    }

    Ok(())
}
