//! # Core Domain Entities
//!
//! Records carried in message bodies between the full node and the light
//! client.
//!
//! ## Clusters
//!
//! - **Accounts**: `AccountState`, `SmartContractInfo`
//! - **Transactions**: `Transaction`, `Receipt`, `TransactionErrorRecord`
//! - **Events**: `Logs`, `LogEntry`
//! - **Contract Storage**: `SmartContractState`, `SmartContractStateResult`
//! - **Session**: `InitConnection`

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};

// Re-export U256 from primitive-types for rendering balances and amounts
pub use primitive_types::U256;

/// A 32-byte hash (Keccak-256).
pub type Hash = [u8; 32];

/// A 20-byte Ethereum-style address.
pub type Address = [u8; 20];

/// Node type announced by the light client during the handshake.
pub const CLIENT_NODE_TYPE: &str = "Client";

/// Hash of the empty transaction.
///
/// Used as `last_hash` for accounts that have no transaction history.
/// Defined as Keccak-256 of the empty byte string.
pub fn empty_transaction_hash() -> Hash {
    Keccak256::digest(b"").into()
}

/// Interpret a big-endian byte string as a 256-bit unsigned integer.
///
/// An empty slice is zero. Values wider than 32 bytes saturate to
/// `U256::MAX` instead of panicking.
pub fn amount_from_bytes(bytes: &[u8]) -> U256 {
    if bytes.len() > 32 {
        return U256::MAX;
    }
    U256::from_big_endian(bytes)
}

// =============================================================================
// CLUSTER A: ACCOUNTS
// =============================================================================

/// Pointer to the storage host that keeps a contract's state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SmartContractInfo {
    /// `host:port` of the storage node holding the contract state.
    pub storage_host: String,
}

/// State of a single account as reported by the full node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct AccountState {
    /// Account address.
    pub address: Address,
    /// Confirmed balance (big-endian, empty means zero).
    pub balance: Vec<u8>,
    /// Balance still waiting on confirmation (big-endian).
    pub pending_balance: Vec<u8>,
    /// Hash of the last transaction sent from this account.
    pub last_hash: Hash,
    /// Present when the account is a smart contract.
    pub smart_contract_info: Option<SmartContractInfo>,
}

impl AccountState {
    /// Placeholder state for an account the node has no data about.
    ///
    /// Balances are zero-length and `last_hash` is the empty transaction hash.
    pub fn empty() -> Self {
        Self {
            address: [0u8; 20],
            balance: Vec::new(),
            pending_balance: Vec::new(),
            last_hash: empty_transaction_hash(),
            smart_contract_info: None,
        }
    }

    /// Confirmed balance as a number.
    pub fn balance_value(&self) -> U256 {
        amount_from_bytes(&self.balance)
    }

    /// Pending balance as a number.
    pub fn pending_balance_value(&self) -> U256 {
        amount_from_bytes(&self.pending_balance)
    }
}

// =============================================================================
// CLUSTER B: TRANSACTIONS
// =============================================================================

/// A transaction as echoed back by the full node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Transaction {
    /// Transaction hash.
    pub hash: Hash,
    /// Sender address.
    pub from_address: Address,
    /// Recipient address.
    pub to_address: Address,
    /// Transferred amount (big-endian).
    pub amount: Vec<u8>,
    /// Fee paid (big-endian).
    pub fee: Vec<u8>,
    /// Hash of the sender's previous transaction.
    pub last_hash: Hash,
    /// Call data.
    pub data: Vec<u8>,
}

impl Transaction {
    /// The empty transaction, whose hash is [`empty_transaction_hash`].
    pub fn empty() -> Self {
        Self {
            hash: empty_transaction_hash(),
            ..Self::default()
        }
    }

    /// Amount as a number.
    pub fn amount_value(&self) -> U256 {
        amount_from_bytes(&self.amount)
    }
}

/// Execution outcome recorded in a receipt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ReceiptStatus {
    /// Status not reported.
    #[default]
    Unknown,
    /// Transaction executed successfully.
    Success,
    /// Contract execution reverted.
    Reverted,
    /// Transaction failed before execution.
    Failed,
}

/// Execution receipt for a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Receipt {
    /// Hash of the transaction this receipt belongs to.
    pub transaction_hash: Hash,
    /// Sender address.
    pub from_address: Address,
    /// Recipient address.
    pub to_address: Address,
    /// Transferred amount (big-endian).
    pub amount: Vec<u8>,
    /// Execution status.
    pub status: ReceiptStatus,
    /// Raw return value of a contract call.
    pub return_value: Vec<u8>,
}

impl Receipt {
    /// Amount as a number.
    pub fn amount_value(&self) -> U256 {
        amount_from_bytes(&self.amount)
    }
}

/// Error reported by the full node for a submitted transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct TransactionErrorRecord {
    /// Node-defined error code.
    pub code: i64,
    /// Human readable description.
    pub description: String,
}

// =============================================================================
// CLUSTER C: EVENTS
// =============================================================================

/// A single event log emitted by a contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct LogEntry {
    /// Emitting contract.
    pub address: Address,
    /// Unindexed payload.
    pub data: Vec<u8>,
    /// Indexed topics, in emission order.
    pub topics: Vec<Vec<u8>>,
}

/// Ordered batch of event logs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Logs {
    /// Entries in emission order.
    pub logs: Vec<LogEntry>,
}

// =============================================================================
// CLUSTER D: CONTRACT STORAGE
// =============================================================================

/// Code and storage slots of a smart contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SmartContractState {
    /// Deployed bytecode.
    pub code: Vec<u8>,
    /// Storage slot to value.
    pub storage: BTreeMap<String, Vec<u8>>,
}

/// Reply of a storage host to a smart-contract state request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SmartContractStateResult {
    /// Contract the state belongs to.
    pub address: Address,
    /// The contract state.
    pub smart_contract_state: SmartContractState,
}

// =============================================================================
// CLUSTER E: SESSION
// =============================================================================

/// Handshake announcing the local identity right after connecting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct InitConnection {
    /// Wallet address of the local node.
    pub address: Address,
    /// Node type, `"Client"` for the light client.
    pub node_type: String,
}

impl InitConnection {
    /// Handshake for a light client owning `address`.
    pub fn client(address: Address) -> Self {
        Self {
            address,
            node_type: CLIENT_NODE_TYPE.to_string(),
        }
    }
}
