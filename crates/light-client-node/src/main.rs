//! # Light Client Node
//!
//! Entry point of the light client.
//!
//! ## Startup Sequence
//!
//! 1. Load configuration from `LC_*` environment variables
//! 2. Initialize logging
//! 3. Build the output channels, transaction store and dispatcher
//! 4. Start the output consumers
//! 5. Connect to the parent full node (handshake, receive loop)
//! 6. Optionally accept peers on `LC_LISTEN_ADDR`
//! 7. Run until Ctrl+C

mod config;

use std::sync::Arc;

use anyhow::{Context, Result};
use light_client_inbound::{
    connect_and_run, listen, InMemoryTransactionStore, MessageDispatcher, OutputChannels,
    OutputReceivers, TcpConnector,
};
use tokio::task::JoinHandle;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::config::NodeConfig;

fn init_logging(config: &NodeConfig) -> Result<()> {
    let filter = EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    if config.json_logs {
        let subscriber = FmtSubscriber::builder()
            .with_env_filter(filter)
            .with_target(true)
            .json()
            .finish();
        tracing::subscriber::set_global_default(subscriber)?;
    } else {
        let subscriber = FmtSubscriber::builder()
            .with_env_filter(filter)
            .with_target(true)
            .with_thread_ids(true)
            .finish();
        tracing::subscriber::set_global_default(subscriber)?;
    }
    Ok(())
}

/// Drain every output, logging what arrives.
fn spawn_consumers(receivers: OutputReceivers) -> Vec<JoinHandle<()>> {
    let OutputReceivers {
        mut account_state,
        mut receipt,
        mut transaction,
        mut general,
    } = receivers;

    vec![
        tokio::spawn(async move {
            while let Some(account) = account_state.recv().await {
                info!(
                    address = %hex::encode(account.address),
                    balance = %account.balance_value(),
                    pending_balance = %account.pending_balance_value(),
                    "Account state"
                );
            }
        }),
        tokio::spawn(async move {
            while let Some(receipt) = receipt.recv().await {
                info!(
                    transaction_hash = %hex::encode(receipt.transaction_hash),
                    status = ?receipt.status,
                    "Receipt"
                );
            }
        }),
        tokio::spawn(async move {
            while let Some(tx) = transaction.recv().await {
                info!(hash = %hex::encode(tx.hash), amount = %tx.amount_value(), "Transaction");
            }
        }),
        tokio::spawn(async move {
            while let Some(account) = general.recv().await {
                info!(
                    address = %hex::encode(account.address),
                    last_hash = %hex::encode(account.last_hash),
                    "Account update"
                );
            }
        }),
    ]
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = NodeConfig::from_env()?;
    init_logging(&config)?;

    info!("===========================================");
    info!("  Light Client Node v{}", light_client_inbound::VERSION);
    info!("  Parent: {}", config.parent_endpoint);
    info!("===========================================");

    let (outputs, receivers) = OutputChannels::bounded(&config.inbound);
    let store = Arc::new(InMemoryTransactionStore::new());
    let dispatcher = Arc::new(MessageDispatcher::new(
        config.inbound.clone(),
        outputs,
        store,
        Arc::new(TcpConnector::new()),
    ));

    let consumers = spawn_consumers(receivers);

    let parent = connect_and_run(Arc::clone(&dispatcher), config.parent_endpoint.clone())
        .await
        .with_context(|| format!("connecting to parent {}", config.parent_endpoint))?;

    let listener = match config.listen_addr {
        Some(addr) => {
            let (bound, handle) = listen(addr, Arc::clone(&dispatcher))
                .await
                .with_context(|| format!("binding {addr}"))?;
            info!(addr = %bound, "Accepting peers");
            Some(handle)
        }
        None => None,
    };

    info!("Light client is running. Press Ctrl+C to stop.");
    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            result?;
            info!("Shutdown requested");
        }
        result = parent => {
            if let Err(e) = result {
                error!(error = %e, "Parent connection task failed");
            }
            info!("Parent connection closed");
        }
    }

    if let Some(listener) = listener {
        listener.abort();
    }
    for consumer in consumers {
        consumer.abort();
    }

    let stats = dispatcher.metrics().snapshot();
    info!(
        frames = stats.frames_read,
        decoded = stats.messages_decoded,
        decode_failures = stats.decode_failures,
        unknown = stats.unknown_commands,
        "Pipeline stats"
    );
    Ok(())
}
