//! # Message Header
//!
//! Identity and correlation metadata carried by every message.
//!
//! ## Correlation
//!
//! - A freshly constructed message is the root of its own chain:
//!   `correlation_id == id`.
//! - A message derived from another adopts the original's `correlation_id`,
//!   so every link of a chain points at the same root.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Topic assigned when a producer does not supply one.
pub const DEFAULT_TOPIC: &str = "Default";

/// Globally unique message identifier.
pub type MessageId = Uuid;

/// Identity, timing and routing metadata of a message.
///
/// Fields are read-only from outside the crate. The only mutations are the
/// identity refresh and topic override performed during derivation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    id: MessageId,
    created_at: DateTime<Utc>,
    correlation_id: MessageId,
    topic: String,
}

impl Header {
    /// Create a root header on the given topic.
    #[must_use]
    pub fn new(topic: impl Into<String>) -> Self {
        let id = Uuid::new_v4();
        Self {
            id,
            created_at: Utc::now(),
            correlation_id: id,
            topic: topic.into(),
        }
    }

    /// Create a root header, falling back to [`DEFAULT_TOPIC`].
    #[must_use]
    pub fn with_optional_topic(topic: Option<String>) -> Self {
        Self::new(topic.unwrap_or_else(|| DEFAULT_TOPIC.to_string()))
    }

    /// Unique identifier of this message instance.
    #[must_use]
    pub fn id(&self) -> MessageId {
        self.id
    }

    /// When this message instance was created.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Identifier of the root message of this derivation chain.
    #[must_use]
    pub fn correlation_id(&self) -> MessageId {
        self.correlation_id
    }

    /// Routing topic.
    #[must_use]
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// True if this message starts its own correlation chain.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.id == self.correlation_id
    }

    /// Link this header into the chain of `original`.
    ///
    /// A header that still shares `original`'s identity (a plain copy) gets a
    /// fresh `id` and `created_at` first, so no two live messages carry the
    /// same identity.
    pub fn derive_from(&mut self, original: &Header) {
        if self.id == original.id {
            self.id = Uuid::new_v4();
            self.created_at = Utc::now();
        }
        self.correlation_id = original.correlation_id;
    }

    pub(crate) fn set_topic(&mut self, topic: impl Into<String>) {
        self.topic = topic.into();
    }
}

impl Default for Header {
    fn default() -> Self {
        Self::new(DEFAULT_TOPIC)
    }
}
