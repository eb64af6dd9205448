//! # Frame Reader / Writer
//!
//! Length-prefixed framing over an ordered byte stream.
//!
//! ```text
//! +----------------------+---------------------------+
//! | length (8, LE u64)   | payload (length bytes)    |
//! +----------------------+---------------------------+
//! ```

use std::io;

use shared_types::Message;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use super::codec::encode_message;
use crate::domain::{invariant_frame_len, InboundError, LENGTH_PREFIX_LEN};

/// Upper bound on the buffer reserved before any payload byte arrives.
const INITIAL_PAYLOAD_CAPACITY: u64 = 64 * 1024;

/// Read one frame.
///
/// Returns:
/// - `Ok(Some(payload))` - a complete frame of exactly the announced length
/// - `Ok(None)` - the stream ended while reading the prefix
/// - `Err(FrameTooLarge)` - the prefix exceeds `max_len`; no payload was read
/// - `Err(TruncatedFrame)` - the stream ended inside the payload
/// - `Err(Io)` - any other transport failure
///
/// The payload buffer grows as bytes arrive, so a peer announcing a large
/// frame and then stalling cannot force a large allocation.
pub async fn read_frame<R>(reader: &mut R, max_len: u64) -> Result<Option<Vec<u8>>, InboundError>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let mut prefix = [0u8; LENGTH_PREFIX_LEN];
    match reader.read_exact(&mut prefix).await {
        Ok(_) => {}
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e.into()),
    }

    let len = u64::from_le_bytes(prefix);
    invariant_frame_len(len, max_len)?;

    let mut payload = Vec::with_capacity(len.min(INITIAL_PAYLOAD_CAPACITY) as usize);
    let read = (&mut *reader).take(len).read_to_end(&mut payload).await? as u64;
    if read != len {
        return Err(InboundError::TruncatedFrame {
            expected: len,
            got: read,
        });
    }

    Ok(Some(payload))
}

/// Write one frame and flush.
pub async fn write_frame<W>(writer: &mut W, payload: &[u8]) -> Result<(), InboundError>
where
    W: AsyncWrite + Unpin + ?Sized,
{
    writer.write_all(&(payload.len() as u64).to_le_bytes()).await?;
    writer.write_all(payload).await?;
    writer.flush().await?;
    Ok(())
}

/// Encode a message and write it as one frame.
pub async fn write_message<W>(writer: &mut W, message: &Message) -> Result<(), InboundError>
where
    W: AsyncWrite + Unpin + ?Sized,
{
    let payload = encode_message(message)?;
    write_frame(writer, &payload).await
}
