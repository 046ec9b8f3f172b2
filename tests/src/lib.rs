//! # Pub/Sub Test Suite
//!
//! ## Structure
//!
//! ```text
//! tests/
//! ├── src/
//! │   ├── support.rs            # Receive loops and timing helpers
//! │   └── integration/
//! │       ├── message_bus.rs    # Bus-level delivery and disposal
//! │       ├── subscriber.rs     # Variant filtering through a raw broadcaster
//! │       ├── properties.rs     # Ordering, isolation and derivation guarantees
//! │       └── choreography.rs   # Request/response over the runtime handlers
//! └── benches/
//!     └── fanout_benchmarks.rs
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p pubsub-tests
//! cargo test -p pubsub-tests integration::properties
//! cargo bench -p pubsub-tests
//! ```

pub mod integration;
pub mod support;
