//! # Choreography Handlers
//!
//! Long-running tasks that react to bus traffic.

pub mod request_response;

pub use request_response::*;
