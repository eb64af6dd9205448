//! # Output Channels
//!
//! Best-effort publication of decoded records to externally owned
//! consumers.
//!
//! Every publish is a `try_send` on a bounded queue: a full or closed
//! queue drops the record and bumps a counter. Publishing never awaits,
//! so a slow consumer can never stall a connection loop.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use shared_types::{AccountState, Receipt, Transaction};
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::debug;

use crate::config::InboundConfig;

/// What happens to a record the queue cannot take.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DropPolicy {
    /// Discard the record being published; queued records are kept.
    #[default]
    DropNewest,
}

/// Bounded, non-blocking sender with drop accounting.
pub struct BestEffortSender<T> {
    name: &'static str,
    sender: mpsc::Sender<T>,
    policy: DropPolicy,
    delivered: Arc<AtomicU64>,
    dropped: Arc<AtomicU64>,
}

impl<T> Clone for BestEffortSender<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            sender: self.sender.clone(),
            policy: self.policy,
            delivered: Arc::clone(&self.delivered),
            dropped: Arc::clone(&self.dropped),
        }
    }
}

impl<T> BestEffortSender<T> {
    /// Create a bounded queue. A capacity of zero is raised to one.
    pub fn bounded(name: &'static str, capacity: usize) -> (Self, mpsc::Receiver<T>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (Self::from_sender(name, sender), receiver)
    }

    /// Wrap an existing sender.
    pub fn from_sender(name: &'static str, sender: mpsc::Sender<T>) -> Self {
        Self {
            name,
            sender,
            policy: DropPolicy::DropNewest,
            delivered: Arc::new(AtomicU64::new(0)),
            dropped: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Offer a record without waiting.
    ///
    /// Returns `true` if the consumer's queue took it.
    pub fn publish(&self, record: T) -> bool {
        match self.sender.try_send(record) {
            Ok(()) => {
                self.delivered.fetch_add(1, Ordering::Relaxed);
                true
            }
            Err(TrySendError::Full(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                debug!(
                    output = self.name,
                    policy = ?self.policy,
                    "[lc-inbound] Output full, record dropped"
                );
                false
            }
            Err(TrySendError::Closed(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                debug!(output = self.name, "[lc-inbound] Output closed, record dropped");
                false
            }
        }
    }

    /// Name used in log lines.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Drop policy in force.
    pub fn policy(&self) -> DropPolicy {
        self.policy
    }

    /// Whether the consumer dropped its receiving end.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    /// Records the consumer accepted.
    pub fn delivered(&self) -> u64 {
        self.delivered.load(Ordering::Relaxed)
    }

    /// Records discarded because the queue was full or closed.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

/// Publication to zero or more independent consumers.
///
/// Each subscriber gets its own clone of the record and its own queue, so
/// one full consumer does not affect the others. Subscribers whose
/// receiver was dropped are removed on the next subscribe or publish.
pub struct FanOut<T> {
    subscribers: RwLock<Vec<BestEffortSender<T>>>,
    /// Drops recorded by subscribers that have since been removed.
    retired_dropped: AtomicU64,
}

impl<T> Default for FanOut<T> {
    fn default() -> Self {
        Self {
            subscribers: RwLock::new(Vec::new()),
            retired_dropped: AtomicU64::new(0),
        }
    }
}

impl<T: Clone> FanOut<T> {
    /// A distributor with no consumers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new consumer and return its receiving end.
    pub fn subscribe(&self, name: &'static str, capacity: usize) -> mpsc::Receiver<T> {
        let (sender, receiver) = BestEffortSender::bounded(name, capacity);
        self.add_subscriber(sender);
        receiver
    }

    /// Register an existing sender as a consumer.
    pub fn add_subscriber(&self, sender: BestEffortSender<T>) {
        let mut subscribers = self.subscribers.write();
        self.retire_closed(&mut subscribers);
        subscribers.push(sender);
    }

    /// Remove subscribers whose receiver is gone.
    fn prune_closed(&self) {
        if !self.subscribers.read().iter().any(|s| s.is_closed()) {
            return;
        }
        let mut subscribers = self.subscribers.write();
        let before = subscribers.len();
        self.retire_closed(&mut subscribers);
        debug!(
            removed = before - subscribers.len(),
            remaining = subscribers.len(),
            "[lc-inbound] Closed subscribers removed"
        );
    }

    fn retire_closed(&self, subscribers: &mut Vec<BestEffortSender<T>>) {
        subscribers.retain(|subscriber| {
            if subscriber.is_closed() {
                self.retired_dropped
                    .fetch_add(subscriber.dropped(), Ordering::Relaxed);
                false
            } else {
                true
            }
        });
    }

    /// Offer a record to every consumer.
    ///
    /// Returns how many consumers accepted it; the record counts as
    /// accepted when this is non-zero.
    pub fn publish(&self, record: &T) -> usize {
        self.prune_closed();
        self.subscribers
            .read()
            .iter()
            .filter(|subscriber| subscriber.publish(record.clone()))
            .count()
    }

    /// Number of registered consumers. Closed ones linger until the next
    /// subscribe or publish.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }

    /// Total records dropped across all consumers.
    pub fn dropped(&self) -> u64 {
        let live: u64 = self.subscribers.read().iter().map(|s| s.dropped()).sum();
        live + self.retired_dropped.load(Ordering::Relaxed)
    }
}

/// Outputs handed to the dispatcher at construction.
pub struct OutputChannels {
    /// Dedicated account-state output.
    pub account_state: BestEffortSender<AccountState>,
    /// Dedicated receipt output.
    pub receipt: BestEffortSender<Receipt>,
    /// Dedicated transaction output.
    pub transaction: BestEffortSender<Transaction>,
    /// General-purpose output; lives as long as the dispatcher.
    pub general: FanOut<AccountState>,
}

/// Receiving ends matching [`OutputChannels::bounded`].
pub struct OutputReceivers {
    /// Dedicated account-state output.
    pub account_state: mpsc::Receiver<AccountState>,
    /// Dedicated receipt output.
    pub receipt: mpsc::Receiver<Receipt>,
    /// Dedicated transaction output.
    pub transaction: mpsc::Receiver<Transaction>,
    /// First general-purpose subscriber.
    pub general: mpsc::Receiver<AccountState>,
}

impl OutputChannels {
    /// Create all outputs with the capacities from `config`, plus one
    /// general-purpose subscriber.
    pub fn bounded(config: &InboundConfig) -> (Self, OutputReceivers) {
        let (account_state, account_state_rx) =
            BestEffortSender::bounded("account_state", config.account_state_capacity);
        let (receipt, receipt_rx) = BestEffortSender::bounded("receipt", config.receipt_capacity);
        let (transaction, transaction_rx) =
            BestEffortSender::bounded("transaction", config.transaction_capacity);

        let general = FanOut::new();
        let general_rx = general.subscribe("general", config.general_capacity);

        let channels = Self {
            account_state,
            receipt,
            transaction,
            general,
        };
        let receivers = OutputReceivers {
            account_state: account_state_rx,
            receipt: receipt_rx,
            transaction: transaction_rx,
            general: general_rx,
        };
        (channels, receivers)
    }
}
