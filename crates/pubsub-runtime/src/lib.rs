//! # Pub/Sub Runtime
//!
//! Host for a request/response choreography over one in-process bus.
//!
//! ```text
//!  main ──Question/Request──→ Bus ──→ RequestResponder
//!                              ↑              │
//!                              └─Answer/Response─┘
//!                              │
//!                              └──→ ResponseCollector (tally by correlation id)
//! ```
//!
//! ## Startup Sequence
//!
//! 1. Initialize telemetry
//! 2. Load [`RuntimeConfig`] from environment
//! 3. Build the bus and spawn the handlers
//! 4. Publish requests, wait for answers to settle
//! 5. Cancel the handlers and log the report

pub mod config;
pub mod handlers;
pub mod runtime;

pub use config::RuntimeConfig;
pub use handlers::{RequestResponder, ResponseCollector, ResponseSummary};
pub use runtime::{PubSubRuntime, ScenarioReport};
