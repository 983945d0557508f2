//! In-process change feed over a tokio broadcast channel.

use async_trait::async_trait;
use futures::stream;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};

use chathub_core::events::UserEvent;
use chathub_core::result::AppResult;
use chathub_core::traits::{ChangeFeed, UserEventStream};

/// A [`ChangeFeed`] fed by [`MemoryChangeFeed::publish`].
///
/// Subscribers that fall behind skip the events they missed and log a
/// warning.
#[derive(Debug, Clone)]
pub struct MemoryChangeFeed {
    tx: broadcast::Sender<UserEvent>,
}

impl MemoryChangeFeed {
    /// Create a feed buffering up to `capacity` events per subscriber.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Publish an event. Returns the number of live subscribers.
    pub fn publish(&self, event: UserEvent) -> usize {
        self.tx.send(event).unwrap_or(0)
    }
}

impl Default for MemoryChangeFeed {
    fn default() -> Self {
        Self::new(256)
    }
}

#[async_trait]
impl ChangeFeed for MemoryChangeFeed {
    async fn subscribe(&self) -> AppResult<UserEventStream> {
        let rx = self.tx.subscribe();
        let events = stream::unfold(rx, |mut rx| async move {
            loop {
                match rx.recv().await {
                    Ok(event) => return Some((event, rx)),
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Change feed subscriber lagged");
                    }
                    Err(RecvError::Closed) => return None,
                }
            }
        });
        Ok(Box::pin(events))
    }

    async fn emit(&self, event: UserEvent) -> AppResult<()> {
        let receivers = self.publish(event);
        if receivers == 0 {
            debug!("Change feed event emitted with no subscribers");
        }
        Ok(())
    }
}
