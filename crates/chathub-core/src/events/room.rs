//! Room-related domain events.

use serde::{Deserialize, Serialize};

use crate::types::{RoomId, UserId};

/// Events related to room documents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RoomEvent {
    /// A room was created or renamed.
    Upserted {
        /// The room ID.
        room_id: RoomId,
        /// Current display name.
        name: String,
        /// Room author.
        author_id: UserId,
        /// Image URL, if any.
        img_url: Option<String>,
        /// Image blur-hash, if any.
        img_blur: Option<String>,
    },
    /// A room was deleted.
    Deleted {
        /// The room ID.
        room_id: RoomId,
        /// The user who deleted it.
        actor_id: UserId,
    },
}
