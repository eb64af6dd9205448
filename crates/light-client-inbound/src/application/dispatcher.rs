//! # Message Dispatcher
//!
//! Maps a decoded message to exactly one handler.
//!
//! The dispatcher is shared by every connection loop (primary, accepted
//! and secondary) and holds everything a handler may touch: the outputs,
//! the transaction store, the connector for storage hosts and the
//! pipeline counters.

use std::sync::Arc;

use shared_types::Message;
use tracing::warn;

use super::outputs::OutputChannels;
use crate::config::InboundConfig;
use crate::domain::{Command, PeerInfo};
use crate::metrics::InboundMetrics;
use crate::ports::{Connector, TransactionStore};

/// What the connection loop does after a message was handled.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flow {
    /// Keep reading frames.
    Continue,
    /// Close the connection.
    Close,
}

/// Command dispatcher shared by all connection loops.
pub struct MessageDispatcher {
    pub(crate) config: InboundConfig,
    pub(crate) outputs: OutputChannels,
    pub(crate) store: Arc<dyn TransactionStore>,
    pub(crate) connector: Arc<dyn Connector>,
    pub(crate) metrics: Arc<InboundMetrics>,
}

impl MessageDispatcher {
    /// Create a dispatcher.
    pub fn new(
        config: InboundConfig,
        outputs: OutputChannels,
        store: Arc<dyn TransactionStore>,
        connector: Arc<dyn Connector>,
    ) -> Self {
        Self {
            config,
            outputs,
            store,
            connector,
            metrics: Arc::new(InboundMetrics::new()),
        }
    }

    /// Pipeline configuration.
    pub fn config(&self) -> &InboundConfig {
        &self.config
    }

    /// Output channels.
    pub fn outputs(&self) -> &OutputChannels {
        &self.outputs
    }

    /// Connector used for storage hosts and outbound connections.
    pub fn connector(&self) -> &Arc<dyn Connector> {
        &self.connector
    }

    /// Pipeline counters.
    pub fn metrics(&self) -> &Arc<InboundMetrics> {
        &self.metrics
    }

    /// Route one message to its handler.
    ///
    /// Runs inline on the calling connection's task. Unknown commands are
    /// logged and dropped without touching any output.
    pub fn dispatch(self: &Arc<Self>, peer: &PeerInfo, message: Message) -> Flow {
        let Some(command) = Command::parse(message.command()) else {
            self.metrics.record_unknown_command();
            warn!(
                peer = %peer.endpoint,
                command = message.command(),
                "[lc-inbound] Unknown command, message dropped"
            );
            return Flow::Continue;
        };

        let body = message.body;
        match command {
            Command::InitConnection => self.on_init_connection(peer, &body),
            Command::ConfirmedTransaction => self.on_confirmed_transaction(&body),
            Command::AccountState => self.on_account_state(&body),
            Command::MinerGetSmartContractStateResult => self.on_smart_contract_state(peer, &body),
            Command::TransactionError => self.on_transaction_error(&body),
            Command::Receipt => self.on_receipt(&body),
            Command::NewLogs => self.on_logs(command, "New logs", &body),
            Command::QueryLogsResult => self.on_logs(command, "Query logs result", &body),
            Command::GetTransactionResult => self.on_get_transaction_result(&body),
        }
    }
}
