//! # Message Codec
//!
//! Encoding of the message envelope and of the records carried in its body.
//!
//! Everything is bincode with fixed-width little-endian integers. Decoding
//! is capped at [`MAX_FRAME_LEN`] so a forged length inside a body can
//! never allocate more than a frame could carry.

use bincode::Options;
use serde::de::DeserializeOwned;
use serde::Serialize;
use shared_types::Message;

use crate::domain::{InboundError, MAX_FRAME_LEN};

fn wire_options() -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .allow_trailing_bytes()
        .with_limit(MAX_FRAME_LEN)
}

/// Encode a message envelope (without the length prefix).
pub fn encode_message(message: &Message) -> Result<Vec<u8>, InboundError> {
    wire_options()
        .serialize(message)
        .map_err(|e| InboundError::Encode(e.to_string()))
}

/// Decode a frame payload into a message envelope.
pub fn decode_message(frame: &[u8]) -> Result<Message, InboundError> {
    wire_options()
        .deserialize(frame)
        .map_err(|e| InboundError::Decode(e.to_string()))
}

/// Encode a record for use as a message body.
pub fn encode_body<T: Serialize>(record: &T) -> Result<Vec<u8>, InboundError> {
    wire_options()
        .serialize(record)
        .map_err(|e| InboundError::Encode(e.to_string()))
}

/// Decode a message body into a record.
///
/// An empty body decodes to the record's default value: the node omits
/// bodies whose fields are all unset.
pub fn decode_body<T: DeserializeOwned + Default>(body: &[u8]) -> Result<T, InboundError> {
    if body.is_empty() {
        return Ok(T::default());
    }
    wire_options()
        .deserialize(body)
        .map_err(|e| InboundError::Decode(e.to_string()))
}
