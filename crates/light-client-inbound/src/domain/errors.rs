//! # Domain Errors
//!
//! Error types for the inbound pipeline.
//!
//! None of these escape a connection loop: the loop turns each one into a
//! log line and either drops the message or ends the connection.

use thiserror::Error;

/// Inbound pipeline error types.
#[derive(Debug, Error)]
pub enum InboundError {
    /// Length prefix above the configured maximum.
    #[error("Frame too large: {len} > {max}")]
    FrameTooLarge {
        /// Length announced by the prefix
        len: u64,
        /// Configured maximum
        max: u64,
    },

    /// Stream ended before the announced payload was read.
    #[error("Truncated frame: read {got} of {expected} bytes")]
    TruncatedFrame {
        /// Length announced by the prefix
        expected: u64,
        /// Bytes actually read
        got: u64,
    },

    /// Transport failure while reading or writing.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Frame or body could not be decoded.
    #[error("Decode error: {0}")]
    Decode(String),

    /// Record could not be encoded.
    #[error("Encode error: {0}")]
    Encode(String),

    /// Tag is not one of the accepted commands.
    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    /// `host:port` string could not be parsed.
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// Outbound connection could not be established.
    #[error("Connection to {endpoint} failed: {reason}")]
    ConnectFailed {
        /// Target endpoint
        endpoint: String,
        /// Underlying failure
        reason: String,
    },

    /// Transaction store failure.
    #[error("Transaction store error: {0}")]
    Store(#[from] StoreError),
}

/// Errors reported by a transaction store.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// Nothing is waiting for confirmation.
    #[error("No pending transaction")]
    NoPendingTransaction,

    /// The store could not persist the transaction.
    #[error("Persist failed: {0}")]
    Persist(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_too_large_error() {
        let err = InboundError::FrameTooLarge {
            len: 2_000_000_000,
            max: 1_073_741_824,
        };
        assert!(err.to_string().contains("2000000000 > 1073741824"));
    }

    #[test]
    fn test_truncated_frame_error() {
        let err = InboundError::TruncatedFrame {
            expected: 10,
            got: 4,
        };
        assert!(err.to_string().contains("4 of 10"));
    }

    #[test]
    fn test_store_error_converts() {
        let err: InboundError = StoreError::NoPendingTransaction.into();
        assert!(matches!(err, InboundError::Store(StoreError::NoPendingTransaction)));
    }

    #[test]
    fn test_io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset");
        let err: InboundError = io.into();
        assert!(err.to_string().contains("reset"));
    }
}
