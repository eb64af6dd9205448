//! # Outbound Ports
//!
//! Traits for the collaborators the pipeline drives: the byte-stream
//! connection factory and the store that tracks the pending transaction.

use async_trait::async_trait;
use parking_lot::Mutex;
use shared_types::Hash;
use tokio::io::{AsyncRead, AsyncWrite, DuplexStream};
use tokio::sync::mpsc;

use crate::domain::{Endpoint, InboundError, StoreError};

/// An ordered, bidirectional byte stream.
pub trait AsyncStream: AsyncRead + AsyncWrite + Unpin + Send {}

impl<T> AsyncStream for T where T: AsyncRead + AsyncWrite + Unpin + Send {}

/// Type-erased connection handed to a connection loop.
pub type BoxedStream = Box<dyn AsyncStream>;

/// Connection factory - outbound port.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Open a connection to `endpoint`.
    async fn connect(&self, endpoint: &Endpoint) -> Result<BoxedStream, InboundError>;
}

/// Pending-transaction store - outbound port.
///
/// Implementations synchronize internally; the pipeline calls them from
/// any connection task.
pub trait TransactionStore: Send + Sync {
    /// Hash of the most recently submitted, unconfirmed transaction.
    fn pending_transaction_hash(&self) -> Option<Hash>;

    /// Persist the pending transaction as confirmed.
    fn save_pending_transaction(&self) -> Result<(), StoreError>;
}

// =============================================================================
// Mock Implementations for Testing
// =============================================================================

/// Buffer size of each in-memory connection.
const MOCK_STREAM_BUFFER: usize = 64 * 1024;

/// Mock connector backed by in-memory duplex streams.
///
/// Each successful `connect` hands the remote half of a fresh duplex pair
/// to the receiver returned by [`MockConnector::new`], so a test can play
/// the storage host.
pub struct MockConnector {
    /// Remote halves for the test to drive.
    remotes: Option<mpsc::UnboundedSender<(Endpoint, DuplexStream)>>,
    /// Every endpoint passed to `connect`, in call order.
    attempts: Mutex<Vec<Endpoint>>,
}

impl MockConnector {
    /// Connector whose connections always succeed.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<(Endpoint, DuplexStream)>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let connector = Self {
            remotes: Some(tx),
            attempts: Mutex::new(Vec::new()),
        };
        (connector, rx)
    }

    /// Connector whose connections always fail.
    pub fn failing() -> Self {
        Self {
            remotes: None,
            attempts: Mutex::new(Vec::new()),
        }
    }

    /// Endpoints passed to `connect` so far.
    pub fn attempts(&self) -> Vec<Endpoint> {
        self.attempts.lock().clone()
    }
}

#[async_trait]
impl Connector for MockConnector {
    async fn connect(&self, endpoint: &Endpoint) -> Result<BoxedStream, InboundError> {
        self.attempts.lock().push(endpoint.clone());

        let refused = || InboundError::ConnectFailed {
            endpoint: endpoint.to_string(),
            reason: "Mock failure".to_string(),
        };
        let remotes = self.remotes.as_ref().ok_or_else(refused)?;

        let (local, remote) = tokio::io::duplex(MOCK_STREAM_BUFFER);
        remotes
            .send((endpoint.clone(), remote))
            .map_err(|_| refused())?;
        Ok(Box::new(local))
    }
}
