//! Change-feed trait for externally originated user events.

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;

use crate::events::UserEvent;
use crate::result::AppResult;

/// A stream of user events from the change feed.
pub type UserEventStream = Pin<Box<dyn Stream<Item = UserEvent> + Send>>;

/// A source of user account changes made outside the hub (for example a
/// database change stream). Delivery is at-least-once.
#[async_trait]
pub trait ChangeFeed: Send + Sync + std::fmt::Debug + 'static {
    /// Open a subscription. The stream ends when the feed is closed.
    async fn subscribe(&self) -> AppResult<UserEventStream>;

    /// Record an account change made through this service. Subscribers,
    /// including this hub's own listener, see it like any other change.
    async fn emit(&self, event: UserEvent) -> AppResult<()>;
}
