//! Deletion coordinator.
//!
//! A user deletion may arrive more than once (explicit request and change
//! feed, or feed re-delivery). The live-side effects, the `user_delete`
//! broadcast and the eviction, run only on the first delivery within the
//! tombstone window. Persisted cleanup and resource release run every
//! time; they are naturally idempotent, so a re-delivery retries whatever
//! failed before.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use serde::Serialize;
use tracing::{debug, info, warn};

use chathub_core::result::AppResult;
use chathub_core::traits::{ChatStore, UserResourceRelease};
use chathub_core::types::{MessageId, RoomId, UserId};

use crate::hub::handle::HubHandle;
use crate::message::types::HubEvent;
use crate::metrics::HubMetrics;

/// Summary of one deletion pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DeletionReport {
    /// Whether this was the first delivery for the user.
    pub first_delivery: bool,
    /// Whether a live connection was evicted.
    pub evicted: bool,
    /// Rooms authored by the user that were removed.
    pub rooms_deleted: usize,
    /// Messages by the user removed from other rooms.
    pub messages_stripped: usize,
    /// Attachments removed.
    pub attachments_deleted: usize,
}

/// Runs the deletion cascade for removed users and expired messages.
#[derive(Clone)]
pub struct DeletionCoordinator {
    hub: HubHandle,
    store: Arc<dyn ChatStore>,
    releases: Vec<Arc<dyn UserResourceRelease>>,
    tombstones: Cache<UserId, ()>,
    metrics: Arc<HubMetrics>,
}

impl std::fmt::Debug for DeletionCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeletionCoordinator")
            .field("releases", &self.releases.len())
            .field("tombstones", &self.tombstones.entry_count())
            .finish()
    }
}

impl DeletionCoordinator {
    /// Create a coordinator remembering processed users for `tombstone_ttl`.
    pub fn new(
        hub: HubHandle,
        store: Arc<dyn ChatStore>,
        tombstone_ttl: Duration,
        metrics: Arc<HubMetrics>,
    ) -> Self {
        Self {
            hub,
            store,
            releases: Vec::new(),
            tombstones: Cache::builder()
                .max_capacity(100_000)
                .time_to_live(tombstone_ttl)
                .build(),
            metrics,
        }
    }

    /// Register a hook released on every user deletion.
    pub fn with_release(mut self, release: Arc<dyn UserResourceRelease>) -> Self {
        self.releases.push(release);
        self
    }

    /// Delete a user: announce, evict, clean up persisted content and
    /// release per-user resources.
    ///
    /// Persistence errors are returned; the tombstone stays, so a retry
    /// repeats only the cleanup.
    pub async fn delete_user(&self, user_id: UserId) -> AppResult<DeletionReport> {
        let first_delivery = self
            .tombstones
            .entry(user_id)
            .or_insert(())
            .await
            .is_fresh();

        let mut report = DeletionReport {
            first_delivery,
            ..DeletionReport::default()
        };

        if first_delivery {
            let announced = self
                .hub
                .broadcast_all(HubEvent::UserDelete { id: user_id }, Some(user_id))
                .await?;
            report.evicted = self.hub.evict(user_id).await?;
            HubMetrics::inc(&self.metrics.deletions_processed);
            info!(
                user_id = %user_id,
                notified = announced.delivered,
                evicted = report.evicted,
                "User deleted"
            );
        } else {
            HubMetrics::inc(&self.metrics.deletions_deduplicated);
            debug!(user_id = %user_id, "Repeated deletion; skipping broadcast");
        }

        let rooms = self.store.delete_rooms_by_author(user_id).await?;
        for room in &rooms {
            self.store.delete_room_image(room.id).await?;
            for message in &room.messages {
                if self.store.delete_attachment(message.id).await? {
                    report.attachments_deleted += 1;
                }
            }
            self.hub.drop_room(room.id).await?;
        }
        report.rooms_deleted = rooms.len();

        let stripped = self.store.strip_user_messages(user_id).await?;
        for message in &stripped {
            if self.store.delete_attachment(message.id).await? {
                report.attachments_deleted += 1;
            }
        }
        report.messages_stripped = stripped.len();

        for release in &self.releases {
            release.release(user_id).await?;
        }

        debug!(
            user_id = %user_id,
            rooms_deleted = report.rooms_deleted,
            messages_stripped = report.messages_stripped,
            attachments_deleted = report.attachments_deleted,
            "User content removed"
        );
        Ok(report)
    }

    /// Remove an expired message and its attachment and tell the room.
    /// Returns `false` if the message was already gone.
    pub async fn delete_expired_message(
        &self,
        room_id: RoomId,
        message_id: MessageId,
    ) -> AppResult<bool> {
        if self.store.remove_message(room_id, message_id).await?.is_none() {
            return Ok(false);
        }

        if let Err(e) = self.store.delete_attachment(message_id).await {
            warn!(message_id = %message_id, error = %e, "Failed to delete attachment of expired message");
        }

        self.hub
            .broadcast_room(room_id, HubEvent::MessageDelete { id: message_id }, None)
            .await?;
        debug!(room_id = %room_id, message_id = %message_id, "Expired message removed");
        Ok(true)
    }
}
