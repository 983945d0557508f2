//! Top-level real-time engine that ties together all hub components.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;

use chathub_core::config::AppConfig;
use chathub_core::config::realtime::RealtimeConfig;
use chathub_core::result::AppResult;
use chathub_core::traits::{ChangeFeed, ChatStore, MediaTranscoder};

use crate::attachment::tracker::AttachmentTracker;
use crate::bridge::event_bridge::EventBridge;
use crate::deletion::coordinator::DeletionCoordinator;
use crate::deletion::listener::ChangeFeedListener;
use crate::hub::actor::HubActor;
use crate::hub::handle::HubHandle;
use crate::message::validator::MessageValidator;
use crate::metrics::HubMetrics;
use crate::relay::MessageRelay;
use crate::throttle::UserThrottle;

/// Central real-time engine that wires the hub actor to its collaborators.
#[derive(Clone)]
pub struct RealtimeEngine {
    /// Hub actor handle.
    pub hub: HubHandle,
    /// Inbound message relay.
    pub relay: MessageRelay,
    /// Attachment lifecycle tracker.
    pub attachments: AttachmentTracker,
    /// Deletion coordinator.
    pub deletions: DeletionCoordinator,
    /// Room/profile event bridge.
    pub events: EventBridge,
    /// Per-user throttle shared by sends and uploads.
    pub throttle: Arc<UserThrottle>,
    /// Metrics collector.
    pub metrics: Arc<HubMetrics>,
    /// Real-time settings.
    pub config: RealtimeConfig,
    /// Cancelled on shutdown.
    shutdown: CancellationToken,
}

impl std::fmt::Debug for RealtimeEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealtimeEngine").finish()
    }
}

impl RealtimeEngine {
    /// Creates the engine and spawns the hub actor.
    pub fn new(
        config: &AppConfig,
        store: Arc<dyn ChatStore>,
        transcoder: Arc<dyn MediaTranscoder>,
    ) -> Self {
        let metrics = Arc::new(HubMetrics::new());
        let (hub, _task) = HubActor::spawn(&config.realtime, metrics.clone());
        let throttle = Arc::new(UserThrottle::from_config(&config.rate_limit));

        let relay = MessageRelay::new(
            hub.clone(),
            store.clone(),
            MessageValidator::new(config.realtime.max_message_length),
            metrics.clone(),
        )
        .with_throttle(throttle.clone());

        let attachments = AttachmentTracker::new(
            hub.clone(),
            store.clone(),
            transcoder,
            config.attachments.max_bytes,
            metrics.clone(),
        );

        let deletions = DeletionCoordinator::new(
            hub.clone(),
            store,
            Duration::from_secs(config.realtime.deletion_tombstone_ttl_seconds),
            metrics.clone(),
        )
        .with_release(throttle.clone());

        let events = EventBridge::new(hub.clone());

        info!("Real-time engine initialized");

        Self {
            hub,
            relay,
            attachments,
            deletions,
            events,
            throttle,
            metrics,
            config: config.realtime.clone(),
            shutdown: CancellationToken::new(),
        }
    }

    /// Subscribe to a change feed and start consuming it.
    pub async fn listen(&self, feed: Arc<dyn ChangeFeed>) -> AppResult<JoinHandle<()>> {
        ChangeFeedListener::new(feed, self.deletions.clone(), self.events.clone())
            .spawn(self.shutdown.child_token())
            .await
    }

    /// A token cancelled when the engine shuts down.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.child_token()
    }

    /// Initiates a graceful shutdown of the real-time engine.
    pub async fn shutdown(&self) -> AppResult<()> {
        info!("Shutting down real-time engine");

        self.shutdown.cancel();
        let closed = self.hub.shutdown().await?;

        info!(closed, "Real-time engine shut down");
        Ok(())
    }
}
