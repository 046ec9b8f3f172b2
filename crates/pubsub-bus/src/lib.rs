//! # Pub/Sub Bus - In-Process Message Fan-Out
//!
//! A single ingress queue feeds one broadcaster task, which offers every
//! message, in arrival order, to each linked subscriber whose filter matches.
//!
//! ```text
//! ┌──────────┐  publish()  ┌─────────┐        ┌─────────────┐  filter  ┌──────────────┐
//! │ Producer │ ──────────→ │ Ingress │ ─────→ │ Broadcaster │ ───┬───→ │ Subscriber A │ ← receive()
//! └──────────┘             └─────────┘        └─────────────┘    │     └──────────────┘
//!                                                                └───→ ┌──────────────┐
//!                                                                      │ Subscriber B │ ← receive()
//!                                                                      └──────────────┘
//! ```
//!
//! ## Guarantees
//!
//! - **Ordering:** one worker drains the ingress, so dispatch order is publish
//!   order and each subscriber observes a subsequence of it.
//! - **Isolation:** a subscriber for variant `T` only sees `T` values that pass
//!   its predicate, each one an independent copy.
//! - **Disposal:** once `dispose()` returns, nothing published afterwards
//!   reaches that subscriber.
//! - **No head-of-line blocking:** offers never wait on a slow subscriber.
//!
//! ## Example
//!
//! ```rust,ignore
//! use pubsub_bus::{Bus, TextMessage};
//! use tokio_util::sync::CancellationToken;
//!
//! let bus = Bus::new();
//! let subscriber = bus.create_subscriber::<TextMessage>();
//! bus.publish(TextMessage::new("test")).await?;
//!
//! let message = subscriber.receive(&CancellationToken::new()).await?;
//! assert_eq!(message.value(), "test");
//! ```

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod broadcaster;
pub mod bus;
pub mod config;
pub mod error;
pub mod filter;
pub mod inbox;
pub mod publisher;
pub mod stats;
pub mod subscriber;

// Re-export main types
pub use broadcaster::{Broadcaster, LinkHandle, LinkId, Offer};
pub use bus::Bus;
pub use config::{BusConfig, DeliveryPolicy};
pub use error::BusError;
pub use filter::Filter;
pub use inbox::Inbox;
pub use publisher::{MessagePublisher, Publisher};
pub use stats::BusStats;
pub use subscriber::{Subscriber, SubscriberState};

pub use pubsub_types::{
    BinaryMessage, EventMessage, Header, InvalidVariantCast, Message, MessageId, MessageKind,
    TextMessage, Variant, DEFAULT_TOPIC,
};
pub use tokio_util::sync::CancellationToken;

/// Environment variable selecting the ingress capacity (`0` or unset = unbounded).
pub const ENV_INGRESS_CAPACITY: &str = "PUBSUB_INGRESS_CAPACITY";

/// Environment variable selecting the delivery policy (`queued` or `latest-only`).
pub const ENV_DELIVERY_POLICY: &str = "PUBSUB_DELIVERY_POLICY";
