//! # Adapters Layer (Hexagonal Architecture)
//!
//! Implements the outbound port traits over TCP and in memory.

mod memory_store;
mod tcp;

pub use memory_store::InMemoryTransactionStore;
pub use tcp::{listen, serve, TcpConnector};
