//! # Pub/Sub Types Crate
//!
//! The message model that flows through the bus.
//!
//! ## Design Principles
//!
//! - **Closed variant set**: `Message` is a sum type with one arm per payload
//!   kind. The `MessageKind` tag is checked explicitly, there is no runtime
//!   type inspection.
//! - **Value semantics**: every variant owns its payload storage. Copies made
//!   by the bus or by derivation never alias the original.
//! - **Correlation chains**: `Header::correlation_id` always points at the root
//!   message of a derivation chain, never at an intermediate link.
//!
//! ## Adding a variant
//!
//! Add a struct holding a `Header` plus its payload, implement `Variant` for it
//! and add an arm to `Message`. Nothing in the bus engine changes.

pub mod errors;
pub mod header;
pub mod message;
pub mod variants;

pub use errors::InvalidVariantCast;
pub use header::{Header, MessageId, DEFAULT_TOPIC};
pub use message::{Message, MessageKind, Variant};
pub use variants::{BinaryMessage, EventMessage, TextMessage};
