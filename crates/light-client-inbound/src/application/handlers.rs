//! # Command Handlers
//!
//! One handler per accepted command. Each decodes its body, logs, and
//! optionally publishes the record or opens a storage host connection.
//!
//! | Command | Effect |
//! |---------|--------|
//! | `InitConnection` | log |
//! | `ConfirmedTransaction` | confirm the pending transaction on hash match |
//! | `AccountState` | general + dedicated output, storage host fetch |
//! | `MinerGetSmartContractStateResult` | log code and storage, close a storage host connection |
//! | `TransactionError` | log |
//! | `Receipt` | receipt output |
//! | `NewLogs` / `QueryLogsResult` | log every entry |
//! | `GetTransactionResult` | transaction output |

use std::sync::Arc;

use serde::de::DeserializeOwned;
use shared_types::{
    AccountState, Logs, Receipt, SmartContractStateResult, Transaction, TransactionErrorRecord,
};
use tracing::{debug, info, warn};

use super::dispatcher::{Flow, MessageDispatcher};
use super::secondary::fetch_smart_contract_state;
use crate::algorithms::decode_body;
use crate::domain::{Command, ConnectionRole, Endpoint, PeerInfo};

impl MessageDispatcher {
    /// Decode a body, or count and log the failure.
    fn decode_or_drop<T>(&self, command: Command, body: &[u8]) -> Option<T>
    where
        T: DeserializeOwned + Default,
    {
        match decode_body(body) {
            Ok(record) => Some(record),
            Err(e) => {
                self.metrics.record_decode_failure();
                warn!(
                    command = %command,
                    error = %e,
                    "[lc-inbound] Body decode failed, message dropped"
                );
                None
            }
        }
    }

    pub(super) fn on_init_connection(&self, peer: &PeerInfo, _body: &[u8]) -> Flow {
        info!(peer = %peer.endpoint, "[lc-inbound] Received InitConnection");
        Flow::Continue
    }

    pub(super) fn on_confirmed_transaction(&self, body: &[u8]) -> Flow {
        let Some(transaction) =
            self.decode_or_drop::<Transaction>(Command::ConfirmedTransaction, body)
        else {
            return Flow::Continue;
        };

        info!(
            hash = %hex::encode(transaction.hash),
            from = %hex::encode(transaction.from_address),
            to = %hex::encode(transaction.to_address),
            amount = %transaction.amount_value(),
            "[lc-inbound] Received ConfirmedTransaction"
        );

        match self.store.pending_transaction_hash() {
            Some(pending) if pending == transaction.hash => {
                match self.store.save_pending_transaction() {
                    Ok(()) => info!(
                        hash = %hex::encode(pending),
                        "[lc-inbound] Pending transaction confirmed"
                    ),
                    Err(e) => warn!(error = %e, "[lc-inbound] Failed to save pending transaction"),
                }
            }
            Some(pending) => warn!(
                pending = %hex::encode(pending),
                confirmed = %hex::encode(transaction.hash),
                "[lc-inbound] Pending transaction does not match"
            ),
            None => warn!("[lc-inbound] Confirmed transaction received with nothing pending"),
        }
        Flow::Continue
    }

    pub(super) fn on_account_state(self: &Arc<Self>, body: &[u8]) -> Flow {
        if body.is_empty() {
            info!("[lc-inbound] Account has no data");
            let account = AccountState::empty();
            self.outputs.general.publish(&account);
            self.outputs.account_state.publish(account);
            return Flow::Continue;
        }

        let Some(account) = self.decode_or_drop::<AccountState>(Command::AccountState, body) else {
            return Flow::Continue;
        };

        let accepted = self.outputs.general.publish(&account) > 0;

        info!(
            address = %hex::encode(account.address),
            last_hash = %hex::encode(account.last_hash),
            balance = %account.balance_value(),
            pending_balance = %account.pending_balance_value(),
            storage_host = ?account.smart_contract_info.as_ref().map(|info| &info.storage_host),
            "[lc-inbound] Account data"
        );

        let address = account.address;
        let storage_host = account
            .smart_contract_info
            .as_ref()
            .map(|info| info.storage_host.clone());

        if accepted {
            debug!("[lc-inbound] Account state taken by general output");
        } else {
            self.outputs.account_state.publish(account);
        }

        if let Some(host) = storage_host {
            match Endpoint::parse(&host) {
                Ok(endpoint) => {
                    fetch_smart_contract_state(Arc::clone(self), endpoint, address);
                }
                Err(e) => warn!(error = %e, "[lc-inbound] Bad storage host, fetch skipped"),
            }
        }
        Flow::Continue
    }

    /// Only a storage host connection is closed by its reply; the same
    /// reply on the parent or an accepted peer is logged and kept open.
    pub(super) fn on_smart_contract_state(&self, peer: &PeerInfo, body: &[u8]) -> Flow {
        if body.is_empty() {
            info!("[lc-inbound] Smart contract state: account has no data");
            return Flow::Continue;
        }

        let Some(result) = self.decode_or_drop::<SmartContractStateResult>(
            Command::MinerGetSmartContractStateResult,
            body,
        ) else {
            return Flow::Continue;
        };

        let state = &result.smart_contract_state;
        info!(
            address = %hex::encode(result.address),
            code = %hex::encode(&state.code),
            slots = state.storage.len(),
            "[lc-inbound] Smart contract state"
        );
        for (slot, value) in &state.storage {
            info!(slot = %slot, value = %hex::encode(value), "[lc-inbound] Storage");
        }

        match peer.role {
            ConnectionRole::Secondary => Flow::Close,
            ConnectionRole::Parent | ConnectionRole::Accepted => {
                debug!(
                    peer = %peer.endpoint,
                    "[lc-inbound] Contract state outside a storage host connection"
                );
                Flow::Continue
            }
        }
    }

    pub(super) fn on_transaction_error(&self, body: &[u8]) -> Flow {
        let error = self.decode_or_drop::<TransactionErrorRecord>(Command::TransactionError, body);
        if let Some(error) = error {
            warn!(
                code = error.code,
                description = %error.description,
                "[lc-inbound] Transaction error"
            );
        }
        Flow::Continue
    }

    pub(super) fn on_receipt(&self, body: &[u8]) -> Flow {
        let Some(receipt) = self.decode_or_drop::<Receipt>(Command::Receipt, body) else {
            return Flow::Continue;
        };

        info!(
            transaction_hash = %hex::encode(receipt.transaction_hash),
            from = %hex::encode(receipt.from_address),
            to = %hex::encode(receipt.to_address),
            amount = %receipt.amount_value(),
            status = ?receipt.status,
            return_value = %hex::encode(&receipt.return_value),
            "[lc-inbound] Receipt"
        );
        self.outputs.receipt.publish(receipt);
        Flow::Continue
    }

    pub(super) fn on_logs(&self, command: Command, heading: &str, body: &[u8]) -> Flow {
        let Some(logs) = self.decode_or_drop::<Logs>(command, body) else {
            return Flow::Continue;
        };

        info!(count = logs.logs.len(), "[lc-inbound] ===== {heading} =====");
        for entry in &logs.logs {
            info!(
                address = %hex::encode(entry.address),
                data = %hex::encode(&entry.data),
                "[lc-inbound] Log"
            );
            for (index, topic) in entry.topics.iter().enumerate() {
                info!(index, topic = %hex::encode(topic), "[lc-inbound] Topic");
            }
        }
        Flow::Continue
    }

    pub(super) fn on_get_transaction_result(&self, body: &[u8]) -> Flow {
        let Some(transaction) =
            self.decode_or_drop::<Transaction>(Command::GetTransactionResult, body)
        else {
            return Flow::Continue;
        };

        info!(
            from = %hex::encode(transaction.from_address),
            to = %hex::encode(transaction.to_address),
            amount = %transaction.amount_value(),
            hash = %hex::encode(transaction.hash),
            "[lc-inbound] ===== Get transaction result ====="
        );
        self.outputs.transaction.publish(transaction);
        Flow::Continue
    }
}
