//! # Integration Suites
//!
//! End-to-end behaviour of the bus as seen by producers and consumers.

pub mod choreography;
pub mod properties;
pub mod subscriber;
