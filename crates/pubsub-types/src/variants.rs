//! # Payload Variants
//!
//! The concrete message kinds. Each one owns a [`Header`] and its payload.

use serde::{Deserialize, Serialize};

use crate::errors::InvalidVariantCast;
use crate::header::Header;
use crate::message::{Message, MessageKind, Variant};

/// A message holding a string value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextMessage {
    header: Header,
    value: String,
}

impl TextMessage {
    /// Create a root message on the default topic.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            header: Header::default(),
            value: value.into(),
        }
    }

    /// Create a root message on `topic`.
    #[must_use]
    pub fn with_topic(value: impl Into<String>, topic: impl Into<String>) -> Self {
        Self {
            header: Header::new(topic),
            value: value.into(),
        }
    }

    /// The string payload.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Consume the message, keeping the payload.
    #[must_use]
    pub fn into_value(self) -> String {
        self.value
    }
}

/// A message holding a byte buffer.
///
/// The constructor copies the caller's bytes, so the message never aliases
/// storage the producer keeps mutating.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BinaryMessage {
    header: Header,
    value: Vec<u8>,
}

impl BinaryMessage {
    /// Create a root message on the default topic.
    #[must_use]
    pub fn new(value: impl AsRef<[u8]>) -> Self {
        Self {
            header: Header::default(),
            value: value.as_ref().to_vec(),
        }
    }

    /// Create a root message on `topic`.
    #[must_use]
    pub fn with_topic(value: impl AsRef<[u8]>, topic: impl Into<String>) -> Self {
        Self {
            header: Header::new(topic),
            value: value.as_ref().to_vec(),
        }
    }

    /// The byte payload.
    #[must_use]
    pub fn value(&self) -> &[u8] {
        &self.value
    }

    /// Mutable access to this instance's own buffer.
    pub fn value_mut(&mut self) -> &mut Vec<u8> {
        &mut self.value
    }

    /// Consume the message, keeping the payload.
    #[must_use]
    pub fn into_value(self) -> Vec<u8> {
        self.value
    }
}

/// A message describing an event: an id plus optional data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventMessage {
    header: Header,
    event_id: String,
    data: Option<String>,
}

impl EventMessage {
    /// Create a data-less event on the default topic.
    #[must_use]
    pub fn new(event_id: impl Into<String>) -> Self {
        Self {
            header: Header::default(),
            event_id: event_id.into(),
            data: None,
        }
    }

    /// Create an event with data on the default topic.
    #[must_use]
    pub fn with_data(event_id: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            header: Header::default(),
            event_id: event_id.into(),
            data: Some(data.into()),
        }
    }

    /// Create an event with optional data on `topic`.
    #[must_use]
    pub fn on_topic(
        event_id: impl Into<String>,
        data: Option<String>,
        topic: impl Into<String>,
    ) -> Self {
        Self {
            header: Header::new(topic),
            event_id: event_id.into(),
            data,
        }
    }

    /// The event identifier.
    #[must_use]
    pub fn event_id(&self) -> &str {
        &self.event_id
    }

    /// The event data, if any.
    #[must_use]
    pub fn data(&self) -> Option<&str> {
        self.data.as_deref()
    }
}

macro_rules! impl_variant {
    ($ty:ident, $arm:ident) => {
        impl Variant for $ty {
            const KIND: MessageKind = MessageKind::$arm;

            fn header(&self) -> &Header {
                &self.header
            }

            fn header_mut(&mut self) -> &mut Header {
                &mut self.header
            }

            fn from_message(message: &Message) -> Option<&Self> {
                match message {
                    Message::$arm(inner) => Some(inner),
                    _ => None,
                }
            }

            fn try_from_message(message: Message) -> Result<Self, InvalidVariantCast> {
                match message {
                    Message::$arm(inner) => Ok(inner),
                    other => Err(InvalidVariantCast {
                        expected: Self::KIND,
                        actual: other.kind(),
                    }),
                }
            }

            fn into_message(self) -> Message {
                Message::$arm(self)
            }
        }

        impl From<$ty> for Message {
            fn from(value: $ty) -> Self {
                value.into_message()
            }
        }
    };
}

impl_variant!(TextMessage, Text);
impl_variant!(BinaryMessage, Binary);
impl_variant!(EventMessage, Event);
