//! # Algorithms Module
//!
//! Wire framing and message encoding for the inbound pipeline.

pub mod codec;
pub mod framing;

pub use codec::{decode_body, decode_message, encode_body, encode_message};
pub use framing::{read_frame, write_frame, write_message};
