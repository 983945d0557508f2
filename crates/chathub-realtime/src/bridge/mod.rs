//! Bridges from domain events into hub broadcasts.

pub mod event_bridge;
pub mod memory_feed;

pub use event_bridge::EventBridge;
pub use memory_feed::MemoryChangeFeed;
