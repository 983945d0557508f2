//! In-memory persistence.

pub mod store;

pub use store::MemoryChatStore;
