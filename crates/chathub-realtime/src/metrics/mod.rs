//! Hub metrics.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Hub-level counters, shared between the actor and the components that
/// call into it.
#[derive(Debug, Default)]
pub struct HubMetrics {
    /// Connections ever registered.
    pub connections_total: AtomicU64,
    /// Connections evicted (supersession, deletion, shutdown).
    pub connections_evicted: AtomicU64,
    /// Chat messages accepted by the relay.
    pub messages_relayed: AtomicU64,
    /// Chat messages rejected by validation or throttling.
    pub messages_rejected: AtomicU64,
    /// Frames queued to a peer.
    pub frames_queued: AtomicU64,
    /// Frames dropped because a peer queue was full or closed.
    pub frames_dropped: AtomicU64,
    /// Attachments stored.
    pub attachments_completed: AtomicU64,
    /// Attachment uploads that ended in error.
    pub attachments_failed: AtomicU64,
    /// User deletions processed for the first time.
    pub deletions_processed: AtomicU64,
    /// Re-delivered deletions suppressed by the tombstone cache.
    pub deletions_deduplicated: AtomicU64,
}

impl HubMetrics {
    /// Create new zeroed metrics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment a counter by one.
    pub fn inc(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Add `n` to a counter.
    pub fn add(counter: &AtomicU64, n: u64) {
        counter.fetch_add(n, Ordering::Relaxed);
    }

    /// Get a snapshot of all metrics.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            connections_total: self.connections_total.load(Ordering::Relaxed),
            connections_evicted: self.connections_evicted.load(Ordering::Relaxed),
            messages_relayed: self.messages_relayed.load(Ordering::Relaxed),
            messages_rejected: self.messages_rejected.load(Ordering::Relaxed),
            frames_queued: self.frames_queued.load(Ordering::Relaxed),
            frames_dropped: self.frames_dropped.load(Ordering::Relaxed),
            attachments_completed: self.attachments_completed.load(Ordering::Relaxed),
            attachments_failed: self.attachments_failed.load(Ordering::Relaxed),
            deletions_processed: self.deletions_processed.load(Ordering::Relaxed),
            deletions_deduplicated: self.deletions_deduplicated.load(Ordering::Relaxed),
        }
    }
}

/// Serializable metrics snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    /// Connections ever registered.
    pub connections_total: u64,
    /// Connections evicted.
    pub connections_evicted: u64,
    /// Chat messages accepted.
    pub messages_relayed: u64,
    /// Chat messages rejected.
    pub messages_rejected: u64,
    /// Frames queued to peers.
    pub frames_queued: u64,
    /// Frames dropped.
    pub frames_dropped: u64,
    /// Attachments stored.
    pub attachments_completed: u64,
    /// Attachment uploads failed.
    pub attachments_failed: u64,
    /// Deletions processed.
    pub deletions_processed: u64,
    /// Deletions suppressed as re-deliveries.
    pub deletions_deduplicated: u64,
}
