//! # Shared Types Crate
//!
//! Domain records and the wire envelope exchanged between the light client
//! and the full node it follows.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: every record the inbound pipeline decodes is
//!   defined here, so producers and consumers of the output channels agree on
//!   one shape.
//! - **Opaque Bodies**: the envelope carries a command tag and raw body bytes;
//!   the body is only interpreted by the handler selected by the command.
//! - **Big-Endian Amounts**: balances and amounts travel as big-endian byte
//!   strings of arbitrary length (empty means zero) and are rendered as
//!   [`U256`] for display.

pub mod entities;
pub mod envelope;

pub use entities::*;
pub use envelope::{Message, MessageHeader};
