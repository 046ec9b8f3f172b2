//! # Bus
//!
//! Composition root: owns the broadcaster handle and the ingress publisher,
//! and creates subscribers.

use async_trait::async_trait;
use pubsub_types::{Message, Variant};
use tracing::debug;

use crate::broadcaster::Broadcaster;
use crate::config::BusConfig;
use crate::error::BusError;
use crate::filter::Filter;
use crate::publisher::{MessagePublisher, Publisher};
use crate::stats::BusStats;
use crate::subscriber::Subscriber;

/// An in-process publish/subscribe bus.
///
/// Dropping the bus (together with every [`Publisher`] clone handed out)
/// stops the broadcaster; live subscribers then drain and report
/// `BusError::Closed`.
///
/// Must be created inside a Tokio runtime.
#[derive(Debug)]
pub struct Bus {
    broadcaster: Broadcaster,
    publisher: Publisher,
    config: BusConfig,
}

impl Bus {
    /// Create a bus with the default configuration.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    #[must_use]
    pub fn new() -> Self {
        let config = BusConfig::default();
        let (broadcaster, publisher) = match Broadcaster::spawn(&config) {
            Ok(parts) => parts,
            Err(e) => unreachable!("default bus config is valid: {e}"),
        };
        Self {
            broadcaster,
            publisher,
            config,
        }
    }

    /// Create a bus with explicit configuration.
    ///
    /// # Errors
    ///
    /// `BusError::InvalidConfig` if `config` fails validation.
    pub fn with_config(config: BusConfig) -> Result<Self, BusError> {
        let (broadcaster, publisher) = Broadcaster::spawn(&config)?;
        Ok(Self {
            broadcaster,
            publisher,
            config,
        })
    }

    /// A cloneable ingress handle for producers that outlive a borrow of the bus.
    #[must_use]
    pub fn publisher(&self) -> Publisher {
        self.publisher.clone()
    }

    /// Enqueue a message for broadcast.
    ///
    /// # Errors
    ///
    /// `BusError::Closed` if the broadcaster is gone.
    pub async fn publish<M>(&self, message: M) -> Result<(), BusError>
    where
        M: Into<Message>,
    {
        self.publisher.publish(message).await
    }

    /// Enqueue a message without waiting.
    ///
    /// # Errors
    ///
    /// `BusError::IngressFull` on a full bounded ingress, `BusError::Closed`
    /// if the broadcaster is gone.
    pub fn try_publish<M>(&self, message: M) -> Result<(), BusError>
    where
        M: Into<Message>,
    {
        self.publisher.try_publish(message)
    }

    /// Subscribe to every message of variant `T`.
    #[must_use]
    pub fn create_subscriber<T: Variant>(&self) -> Subscriber<T> {
        self.subscribe(Filter::any())
    }

    /// Subscribe to messages of variant `T` for which `predicate` holds.
    #[must_use]
    pub fn create_subscriber_with<T, F>(&self, predicate: F) -> Subscriber<T>
    where
        T: Variant,
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.subscribe(Filter::with_predicate(predicate))
    }

    /// Subscribe through a prepared filter.
    #[must_use]
    pub fn subscribe<T: Variant>(&self, filter: Filter<T>) -> Subscriber<T> {
        let subscriber = Subscriber::new(&self.broadcaster, filter);
        debug!(
            link = subscriber.id(),
            active = self.broadcaster.link_count(),
            "Subscriber created"
        );
        subscriber
    }

    /// Number of live subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.broadcaster.link_count()
    }

    /// Activity counters.
    #[must_use]
    pub fn stats(&self) -> BusStats {
        self.broadcaster.stats()
    }

    /// The configuration this bus was built with.
    #[must_use]
    pub fn config(&self) -> &BusConfig {
        &self.config
    }

    /// The underlying broadcaster handle.
    #[must_use]
    pub fn broadcaster(&self) -> &Broadcaster {
        &self.broadcaster
    }
}

impl Default for Bus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MessagePublisher for Bus {
    async fn publish_message(&self, message: Message) -> Result<(), BusError> {
        self.publisher.publish(message).await
    }

    fn messages_published(&self) -> u64 {
        self.publisher.messages_published()
    }
}
