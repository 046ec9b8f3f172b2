//! # Message
//!
//! The closed sum type that flows through the bus, its explicit kind tag, and
//! the [`Variant`] trait every payload kind implements once.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::InvalidVariantCast;
use crate::header::{Header, MessageId};
use crate::variants::{BinaryMessage, EventMessage, TextMessage};

/// Explicit tag of a message variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    /// A string payload.
    Text,
    /// A byte payload.
    Binary,
    /// An event id with optional data.
    Event,
}

impl MessageKind {
    /// Stable lowercase name, used in logs.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Binary => "binary",
            Self::Event => "event",
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A concrete payload kind that can travel through the bus.
///
/// Each variant supplies its tag, access to its header, and the conversions
/// to and from [`Message`]. Copying and derivation are provided on top of
/// `Clone`, which for every variant is a value copy of owned storage.
pub trait Variant: Clone + Send + Sync + 'static {
    /// The tag this variant is stored under in [`Message`].
    const KIND: MessageKind;

    /// Identity and routing metadata.
    fn header(&self) -> &Header;

    /// Mutable header, used by derivation.
    fn header_mut(&mut self) -> &mut Header;

    /// Borrow `message` as this variant if its tag matches.
    fn from_message(message: &Message) -> Option<&Self>;

    /// Take `message` as this variant.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidVariantCast`] if the message carries another variant.
    fn try_from_message(message: Message) -> Result<Self, InvalidVariantCast>;

    /// Wrap this variant into the bus-level sum type.
    fn into_message(self) -> Message;

    /// Independent copy that keeps the original's identity.
    #[must_use]
    fn deep_copy(&self) -> Self {
        self.clone()
    }

    /// Derive a new link of this message's correlation chain.
    ///
    /// The result owns a copy of the payload, has a fresh `id` and
    /// `created_at`, and carries the original's `correlation_id`.
    #[must_use]
    fn derive(&self) -> Self {
        let mut copy = self.deep_copy();
        copy.header_mut().derive_from(self.header());
        copy
    }

    /// Derive a new link of the chain and route it to `topic`.
    #[must_use]
    fn derive_with_topic(&self, topic: impl Into<String>) -> Self {
        let mut copy = self.derive();
        copy.header_mut().set_topic(topic);
        copy
    }

    /// Attach this independently built message to `original`'s chain.
    ///
    /// Used for responses: the response keeps its own identity and adopts the
    /// request's `correlation_id`.
    #[must_use]
    fn correlated_with(mut self, original: &Header) -> Self {
        self.header_mut().derive_from(original);
        self
    }

    /// Unique identifier.
    fn id(&self) -> MessageId {
        self.header().id()
    }

    /// Root identifier of the chain.
    fn correlation_id(&self) -> MessageId {
        self.header().correlation_id()
    }

    /// Routing topic.
    fn topic(&self) -> &str {
        self.header().topic()
    }
}

/// Any message accepted by the bus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Message {
    /// See [`TextMessage`].
    Text(TextMessage),
    /// See [`BinaryMessage`].
    Binary(BinaryMessage),
    /// See [`EventMessage`].
    Event(EventMessage),
}

impl Message {
    /// The explicit variant tag.
    #[must_use]
    pub fn kind(&self) -> MessageKind {
        match self {
            Self::Text(_) => MessageKind::Text,
            Self::Binary(_) => MessageKind::Binary,
            Self::Event(_) => MessageKind::Event,
        }
    }

    /// Identity and routing metadata.
    #[must_use]
    pub fn header(&self) -> &Header {
        match self {
            Self::Text(m) => m.header(),
            Self::Binary(m) => m.header(),
            Self::Event(m) => m.header(),
        }
    }

    fn header_mut(&mut self) -> &mut Header {
        match self {
            Self::Text(m) => m.header_mut(),
            Self::Binary(m) => m.header_mut(),
            Self::Event(m) => m.header_mut(),
        }
    }

    /// Unique identifier.
    #[must_use]
    pub fn id(&self) -> MessageId {
        self.header().id()
    }

    /// Creation timestamp.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.header().created_at()
    }

    /// Root identifier of the chain.
    #[must_use]
    pub fn correlation_id(&self) -> MessageId {
        self.header().correlation_id()
    }

    /// Routing topic.
    #[must_use]
    pub fn topic(&self) -> &str {
        self.header().topic()
    }

    /// Independent copy that keeps the original's identity.
    #[must_use]
    pub fn deep_copy(&self) -> Self {
        self.clone()
    }

    /// Derive a new link of the chain, optionally on another topic.
    #[must_use]
    pub fn derive(&self, topic: Option<&str>) -> Self {
        let mut copy = self.deep_copy();
        let header = copy.header_mut();
        header.derive_from(self.header());
        if let Some(topic) = topic {
            header.set_topic(topic);
        }
        copy
    }

    /// Borrow as variant `T` if the tag matches.
    #[must_use]
    pub fn downcast_ref<T: Variant>(&self) -> Option<&T> {
        T::from_message(self)
    }

    /// Take as variant `T`.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidVariantCast`] if the tag does not match.
    pub fn downcast<T: Variant>(self) -> Result<T, InvalidVariantCast> {
        T::try_from_message(self)
    }

    /// True if this message carries variant `T`.
    #[must_use]
    pub fn is<T: Variant>(&self) -> bool {
        self.kind() == T::KIND
    }
}
