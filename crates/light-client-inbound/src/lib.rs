//! # Light Client Inbound Pipeline
//!
//! Turns the byte stream from a full node into typed protocol events and
//! routes each one to its handler.
//!
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Purpose
//!
//! - Split a connection into length-prefixed frames (8-byte LE prefix,
//!   1 GiB cap)
//! - Decode each frame into a `Message` and dispatch on its command
//! - Publish decoded records to consumers without ever blocking the loop
//! - Fetch contract state from the storage host an account points to
//!
//! ## Failure Policy
//!
//! | Failure | Effect |
//! |---------|--------|
//! | EOF, I/O error, oversize or truncated frame | connection closed |
//! | Undecodable envelope or body | message dropped, loop continues |
//! | Unknown command | warning, no state change |
//! | Full or closed output | record dropped, counter bumped |
//! | Storage host unreachable | warning, fetch abandoned |
//!
//! ## Module Structure
//!
//! ```text
//! light-client-inbound/
//! ├── domain/          # Command, Endpoint, PeerInfo, errors, frame limits
//! ├── algorithms/      # Framing and bincode codec
//! ├── ports/           # Connector + TransactionStore traits, mocks
//! ├── application/     # Dispatcher, handlers, connection loop, outputs
//! ├── adapters/        # TCP connector/listener, in-memory store
//! ├── metrics.rs       # InboundMetrics
//! └── config.rs        # InboundConfig
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod algorithms;
pub mod application;
pub mod config;
pub mod domain;
pub mod metrics;
pub mod ports;

// Re-exports
pub use adapters::{listen, serve, InMemoryTransactionStore, TcpConnector};
pub use algorithms::{
    decode_body, decode_message, encode_body, encode_message, read_frame, write_frame,
    write_message,
};
pub use application::{
    connect_and_run, fetch_smart_contract_state, run_connection, spawn_connection,
    BestEffortSender, Connection, DropPolicy, FanOut, Flow, MessageDispatcher, OutputChannels,
    OutputReceivers,
};
pub use config::{ConfigError, InboundConfig};
pub use domain::{
    Command, ConnectionRole, Endpoint, InboundError, OutboundCommand, PeerInfo, StoreError,
    LENGTH_PREFIX_LEN, MAX_FRAME_LEN,
};
pub use metrics::{InboundMetrics, InboundMetricsSnapshot};
pub use ports::{AsyncStream, BoxedStream, Connector, MockConnector, TransactionStore};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    #[test]
    fn test_version() {
        assert!(!super::VERSION.is_empty());
    }
}
