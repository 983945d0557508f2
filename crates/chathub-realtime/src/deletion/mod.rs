//! Cascading deletion on account removal, and retention removals.

pub mod coordinator;
pub mod listener;

pub use coordinator::{DeletionCoordinator, DeletionReport};
pub use listener::ChangeFeedListener;
