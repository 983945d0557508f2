//! User-related domain events.

use serde::{Deserialize, Serialize};

use crate::types::UserId;

/// Events related to user accounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum UserEvent {
    /// A user account was removed. Triggers the deletion cascade.
    Deleted {
        /// The user ID.
        user_id: UserId,
    },
    /// A user changed their profile picture.
    PictureUpdated {
        /// The user ID.
        user_id: UserId,
        /// The new picture as a `data:` URL or raw base64.
        base64pfp: String,
    },
}

impl UserEvent {
    /// The user this event concerns.
    pub fn user_id(&self) -> UserId {
        match self {
            Self::Deleted { user_id } | Self::PictureUpdated { user_id, .. } => *user_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deleted_wire_shape() {
        let user_id = UserId::new();
        let json = serde_json::to_value(UserEvent::Deleted { user_id }).expect("serialize");
        assert_eq!(json["type"], "Deleted");
        assert_eq!(json["user_id"], user_id.to_string());
        let back: UserEvent = serde_json::from_value(json).expect("deserialize");
        assert_eq!(back.user_id(), user_id);
    }
}
