//! # chathub-storage
//!
//! Storage-side collaborators of the ChatHub hub:
//!
//! - `memory`: a [`ChatStore`](chathub_core::traits::ChatStore) kept in
//!   process memory, used by the server binary and by tests
//! - `media`: the image [`MediaTranscoder`](chathub_core::traits::MediaTranscoder)

pub mod media;
pub mod memory;

pub use media::ImageTranscoder;
pub use memory::MemoryChatStore;
