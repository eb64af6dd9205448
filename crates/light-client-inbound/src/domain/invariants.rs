//! # Domain Invariants
//!
//! Limits that every frame must respect.

use super::errors::InboundError;

/// Width of the little-endian length prefix.
pub const LENGTH_PREFIX_LEN: usize = 8;

/// Largest payload accepted from a peer (1 GiB).
pub const MAX_FRAME_LEN: u64 = 1 << 30;

/// Default capacity of each output queue.
pub const DEFAULT_OUTPUT_CAPACITY: usize = 64;

/// Invariant: a frame never exceeds the configured limit.
///
/// Checked right after the prefix is read, before any payload byte is
/// consumed.
pub fn invariant_frame_len(len: u64, max: u64) -> Result<(), InboundError> {
    if len > max {
        return Err(InboundError::FrameTooLarge { len, max });
    }
    Ok(())
}
