//! # In-Memory Transaction Store
//!
//! Tracks the single pending transaction and the ones confirmed so far.
//! Nothing survives a restart.

use parking_lot::RwLock;
use shared_types::{Hash, Transaction};

use crate::domain::StoreError;
use crate::ports::TransactionStore;

/// In-memory [`TransactionStore`].
#[derive(Debug, Default)]
pub struct InMemoryTransactionStore {
    pending: RwLock<Option<Transaction>>,
    saved: RwLock<Vec<Transaction>>,
}

impl InMemoryTransactionStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Track `transaction` as pending, replacing any earlier one.
    pub fn submit(&self, transaction: Transaction) {
        *self.pending.write() = Some(transaction);
    }

    /// Currently pending transaction.
    pub fn pending(&self) -> Option<Transaction> {
        self.pending.read().clone()
    }

    /// Confirmed transactions, oldest first.
    pub fn saved(&self) -> Vec<Transaction> {
        self.saved.read().clone()
    }

    /// Remove and return the confirmed transactions.
    pub fn take_saved(&self) -> Vec<Transaction> {
        std::mem::take(&mut *self.saved.write())
    }
}

impl TransactionStore for InMemoryTransactionStore {
    fn pending_transaction_hash(&self) -> Option<Hash> {
        self.pending.read().as_ref().map(|tx| tx.hash)
    }

    fn save_pending_transaction(&self) -> Result<(), StoreError> {
        let transaction = self
            .pending
            .write()
            .take()
            .ok_or(StoreError::NoPendingTransaction)?;
        self.saved.write().push(transaction);
        Ok(())
    }
}
