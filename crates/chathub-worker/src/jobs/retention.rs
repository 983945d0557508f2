//! Expiry of old chat messages.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing;

use chathub_core::config::retention::RetentionConfig;
use chathub_core::result::AppResult;
use chathub_core::traits::ChatStore;
use chathub_realtime::DeletionCoordinator;

/// Outcome of one sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RetentionSummary {
    /// Messages older than the cutoff.
    pub expired: usize,
    /// Messages actually removed by this sweep.
    pub removed: usize,
    /// Messages whose removal failed and will be retried next sweep.
    pub failed: usize,
}

/// Removes messages older than the configured TTL and tells their rooms.
#[derive(Debug)]
pub struct RetentionSweep {
    store: Arc<dyn ChatStore>,
    deletions: DeletionCoordinator,
    ttl: Duration,
}

impl RetentionSweep {
    /// Create a sweep with an explicit TTL
    pub fn new(store: Arc<dyn ChatStore>, deletions: DeletionCoordinator, ttl: Duration) -> Self {
        Self {
            store,
            deletions,
            ttl,
        }
    }

    /// Create a sweep from configuration, rejecting an unusable TTL
    pub fn from_config(
        store: Arc<dyn ChatStore>,
        deletions: DeletionCoordinator,
        config: &RetentionConfig,
    ) -> AppResult<Self> {
        Ok(Self::new(store, deletions, config.message_ttl()?))
    }

    /// Sweep relative to the current time
    pub async fn run(&self) -> AppResult<RetentionSummary> {
        self.run_once(Utc::now()).await
    }

    /// Sweep everything older than `now - ttl`
    pub async fn run_once(&self, now: DateTime<Utc>) -> AppResult<RetentionSummary> {
        let cutoff = now - self.ttl;
        let expired = self.store.expired_messages(cutoff).await?;

        let mut summary = RetentionSummary {
            expired: expired.len(),
            ..RetentionSummary::default()
        };

        for (room_id, message_id) in expired {
            match self.deletions.delete_expired_message(room_id, message_id).await {
                Ok(true) => summary.removed += 1,
                Ok(false) => {}
                Err(e) => {
                    summary.failed += 1;
                    tracing::warn!("Failed to expire message {} in room {}: {}", message_id, room_id, e);
                }
            }
        }

        if summary.expired > 0 {
            tracing::info!(
                "Retention sweep removed {} of {} expired messages",
                summary.removed,
                summary.expired
            );
        }
        Ok(summary)
    }
}
