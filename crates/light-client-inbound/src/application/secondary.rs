//! # Storage Host Connector
//!
//! One-shot fetch of a contract's state from the storage host named in an
//! account state.
//!
//! The fetch runs on its own task with no link to the connection that
//! triggered it. A failed connect is logged once and abandoned. On success
//! the request is sent and the usual connection loop takes over until the
//! `MinerGetSmartContractStateResult` handler closes it.

use std::sync::Arc;

use shared_types::{Address, Message};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use super::dispatcher::MessageDispatcher;
use super::pipeline::{run_connection, Connection};
use crate::algorithms::write_message;
use crate::domain::{Endpoint, OutboundCommand, PeerInfo};

/// Spawn a fetch of the contract state of `address` from `storage_host`.
pub fn fetch_smart_contract_state(
    dispatcher: Arc<MessageDispatcher>,
    storage_host: Endpoint,
    address: Address,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let metrics = Arc::clone(dispatcher.metrics());

        let mut stream = match dispatcher.connector().connect(&storage_host).await {
            Ok(stream) => stream,
            Err(e) => {
                metrics.record_secondary(false);
                warn!(
                    storage_host = %storage_host,
                    error = %e,
                    "[lc-inbound] Storage host unreachable"
                );
                return;
            }
        };
        metrics.record_secondary(true);

        let peer = PeerInfo::secondary(storage_host);
        let request = Message::new(
            OutboundCommand::MinerGetSmartContractState.as_str(),
            address.to_vec(),
        );
        if let Err(e) = write_message(&mut stream, &request).await {
            warn!(
                storage_host = %peer.endpoint,
                error = %e,
                "[lc-inbound] Storage host request failed"
            );
            return;
        }
        info!(
            storage_host = %peer.endpoint,
            address = %hex::encode(address),
            "[lc-inbound] Requested smart contract state"
        );

        run_connection(dispatcher, Connection::new(stream, peer)).await;
    })
}
