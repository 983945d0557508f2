//! Change-feed consumer.

use std::sync::Arc;

use futures::StreamExt;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use chathub_core::events::UserEvent;
use chathub_core::result::AppResult;
use chathub_core::traits::{ChangeFeed, UserEventStream};

use super::coordinator::DeletionCoordinator;
use crate::bridge::event_bridge::EventBridge;

/// Applies externally originated user events to the hub.
#[derive(Debug, Clone)]
pub struct ChangeFeedListener {
    feed: Arc<dyn ChangeFeed>,
    coordinator: DeletionCoordinator,
    bridge: EventBridge,
}

impl ChangeFeedListener {
    /// Create a listener.
    pub fn new(
        feed: Arc<dyn ChangeFeed>,
        coordinator: DeletionCoordinator,
        bridge: EventBridge,
    ) -> Self {
        Self {
            feed,
            coordinator,
            bridge,
        }
    }

    /// Subscribe, then consume on a spawned task. Events emitted after
    /// this returns are never missed.
    pub async fn spawn(self, shutdown: CancellationToken) -> AppResult<JoinHandle<()>> {
        let events = self.feed.subscribe().await?;
        Ok(tokio::spawn(async move {
            self.consume(events, shutdown).await;
        }))
    }

    /// Consume events until the feed ends or `shutdown` is cancelled.
    async fn consume(&self, mut events: UserEventStream, shutdown: CancellationToken) {
        info!("Change feed listener started");

        loop {
            let event = tokio::select! {
                _ = shutdown.cancelled() => break,
                next = events.next() => match next {
                    Some(event) => event,
                    None => break,
                },
            };
            self.apply(event).await;
        }

        info!("Change feed listener stopped");
    }

    /// Apply a single event. Failures are logged; the feed will re-deliver.
    pub async fn apply(&self, event: UserEvent) {
        match event {
            UserEvent::Deleted { user_id } => {
                if let Err(e) = self.coordinator.delete_user(user_id).await {
                    warn!(user_id = %user_id, error = %e, "User deletion from change feed failed");
                }
            }
            UserEvent::PictureUpdated { user_id, base64pfp } => {
                if let Err(e) = self.bridge.on_picture_updated(user_id, &base64pfp).await {
                    warn!(user_id = %user_id, error = %e, "Profile picture broadcast failed");
                }
            }
        }
    }
}
