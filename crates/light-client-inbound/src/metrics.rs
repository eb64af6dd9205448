//! Counters for the inbound pipeline
//!
//! Shared by every connection loop spawned from one dispatcher.
//!
//! ## Usage
//!
//! ```ignore
//! let metrics = dispatcher.metrics();
//! let snapshot = metrics.snapshot();
//! tracing::info!(frames = snapshot.frames_read, "[lc-inbound] stats");
//! ```

use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe pipeline counters
#[derive(Default, Debug)]
pub struct InboundMetrics {
    /// Complete frames read from any connection
    pub frames_read: AtomicU64,
    /// Frames that decoded into a message envelope
    pub messages_decoded: AtomicU64,
    /// Envelopes or bodies that failed to decode
    pub decode_failures: AtomicU64,
    /// Messages whose command is outside the accepted set
    pub unknown_commands: AtomicU64,
    /// Frames rejected because of their length prefix
    pub oversize_frames: AtomicU64,
    /// Connection loops started
    pub connections_opened: AtomicU64,
    /// Connection loops finished
    pub connections_closed: AtomicU64,
    /// Storage host connections attempted
    pub secondary_attempted: AtomicU64,
    /// Storage host connections that could not be established
    pub secondary_failed: AtomicU64,
}

impl InboundMetrics {
    /// Create a zeroed collector
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a complete frame
    pub fn record_frame(&self) {
        self.frames_read.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a decoded envelope
    pub fn record_decoded(&self) {
        self.messages_decoded.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a dropped undecodable envelope or body
    pub fn record_decode_failure(&self) {
        self.decode_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a message with an unknown command
    pub fn record_unknown_command(&self) {
        self.unknown_commands.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a rejected length prefix
    pub fn record_oversize_frame(&self) {
        self.oversize_frames.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a connection loop start
    pub fn record_connection_opened(&self) {
        self.connections_opened.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a connection loop end
    pub fn record_connection_closed(&self) {
        self.connections_closed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a storage host connection attempt
    ///
    /// # Arguments
    /// * `connected` - Whether the connection was established
    pub fn record_secondary(&self, connected: bool) {
        self.secondary_attempted.fetch_add(1, Ordering::Relaxed);
        if !connected {
            self.secondary_failed.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Number of connection loops still running
    pub fn active_connections(&self) -> u64 {
        let opened = self.connections_opened.load(Ordering::Relaxed);
        let closed = self.connections_closed.load(Ordering::Relaxed);
        opened.saturating_sub(closed)
    }

    /// Get current metrics snapshot
    pub fn snapshot(&self) -> InboundMetricsSnapshot {
        InboundMetricsSnapshot {
            frames_read: self.frames_read.load(Ordering::Relaxed),
            messages_decoded: self.messages_decoded.load(Ordering::Relaxed),
            decode_failures: self.decode_failures.load(Ordering::Relaxed),
            unknown_commands: self.unknown_commands.load(Ordering::Relaxed),
            oversize_frames: self.oversize_frames.load(Ordering::Relaxed),
            connections_opened: self.connections_opened.load(Ordering::Relaxed),
            connections_closed: self.connections_closed.load(Ordering::Relaxed),
            secondary_attempted: self.secondary_attempted.load(Ordering::Relaxed),
            secondary_failed: self.secondary_failed.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time metrics snapshot
#[allow(missing_docs)]
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InboundMetricsSnapshot {
    pub frames_read: u64,
    pub messages_decoded: u64,
    pub decode_failures: u64,
    pub unknown_commands: u64,
    pub oversize_frames: u64,
    pub connections_opened: u64,
    pub connections_closed: u64,
    pub secondary_attempted: u64,
    pub secondary_failed: u64,
}
