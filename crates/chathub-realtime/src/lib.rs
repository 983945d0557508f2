//! # chathub-realtime
//!
//! Real-time hub for ChatHub. Provides:
//!
//! - A connection registry with at most one live socket per user
//! - Ephemeral room membership keyed by user and by connection
//! - Message relay with persist-then-broadcast fan-out
//! - The per-message attachment upload state machine
//! - The cascading deletion coordinator and change-feed listener
//!
//! Registry and room state are owned by a single actor task
//! ([`hub::HubActor`]); everything else talks to it through the cloneable
//! [`HubHandle`].

pub mod attachment;
pub mod bridge;
pub mod connection;
pub mod deletion;
pub mod hub;
pub mod message;
pub mod metrics;
pub mod relay;
pub mod room;
pub mod server;
pub mod throttle;

pub use attachment::tracker::AttachmentTracker;
pub use bridge::event_bridge::EventBridge;
pub use bridge::memory_feed::MemoryChangeFeed;
pub use deletion::coordinator::DeletionCoordinator;
pub use deletion::listener::ChangeFeedListener;
pub use hub::handle::HubHandle;
pub use relay::MessageRelay;
pub use server::RealtimeEngine;
pub use throttle::UserThrottle;
