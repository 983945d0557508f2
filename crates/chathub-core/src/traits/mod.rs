//! Core traits defined in `chathub-core` and implemented by other crates.

pub mod change_feed;
pub mod media;
pub mod resources;
pub mod store;

pub use change_feed::{ChangeFeed, UserEventStream};
pub use media::{MediaTranscoder, RoomImage, TranscodedMedia};
pub use resources::UserResourceRelease;
pub use store::ChatStore;
