//! # Error Types
//!
//! Errors raised by the message model itself.

use crate::message::MessageKind;
use thiserror::Error;

/// A message was treated as a variant it is not.
///
/// The bus only hands a subscriber messages whose tag passed its filter, so
/// observing this error means a filter or dispatch bug, not a runtime
/// condition a caller should retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Invalid variant cast: expected {expected}, found {actual}")]
pub struct InvalidVariantCast {
    /// The variant the caller asked for.
    pub expected: MessageKind,
    /// The variant the message actually carries.
    pub actual: MessageKind,
}
