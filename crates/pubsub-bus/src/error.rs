//! # Bus Errors
//!
//! Producer-side errors surface from `publish`, consumer-side errors from
//! `receive`. No error raised for one subscriber reaches another.

use pubsub_types::InvalidVariantCast;
use thiserror::Error;

use crate::broadcaster::LinkId;

/// Errors from bus operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BusError {
    /// A receive was interrupted by its cancellation token.
    #[error("Receive cancelled")]
    Cancelled,

    /// The subscriber was disposed and its inbox is drained.
    #[error("Subscriber {link} disposed")]
    Disposed { link: LinkId },

    /// The broadcaster is gone (publish) or the bus was dropped (receive).
    #[error("Message bus closed")]
    Closed,

    /// A non-blocking publish hit a full bounded ingress.
    #[error("Ingress queue full (capacity {capacity})")]
    IngressFull { capacity: usize },

    /// A subscriber's predicate panicked while being evaluated.
    ///
    /// Only that link's delivery attempt for that message is abandoned.
    #[error("Filter predicate failed on link {link}: {reason}")]
    FilterPredicateFailure { link: LinkId, reason: String },

    /// A message was treated as a variant it is not.
    #[error(transparent)]
    InvalidVariantCast(#[from] InvalidVariantCast),

    /// Configuration rejected by validation.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl BusError {
    /// True for conditions the caller may retry or simply stop on.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Cancelled | Self::IngressFull { .. } | Self::Disposed { .. }
        )
    }
}
