//! Request DTOs with validation.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Create room request body.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateRoomRequest {
    /// Display name.
    #[validate(length(min = 1, max = 24, message = "Room name must be 1-24 characters"))]
    pub name: String,
}

impl CreateRoomRequest {
    /// The name with surrounding whitespace removed.
    pub fn trimmed_name(&self) -> &str {
        self.name.trim()
    }
}

/// Rename room request body.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpdateRoomRequest {
    /// New display name.
    #[validate(length(min = 1, max = 24, message = "Room name must be 1-24 characters"))]
    pub name: String,
}

impl UpdateRoomRequest {
    /// The name with surrounding whitespace removed.
    pub fn trimmed_name(&self) -> &str {
        self.name.trim()
    }
}

/// Query parameters for listing rooms.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListRoomsQuery {
    /// Only rooms authored by the caller.
    #[serde(default)]
    pub own: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_room_name_length() {
        let ok = CreateRoomRequest {
            name: "general".to_string(),
        };
        assert!(ok.validate().is_ok());

        let empty = CreateRoomRequest {
            name: String::new(),
        };
        assert!(empty.validate().is_err());

        let long = CreateRoomRequest {
            name: "x".repeat(25),
        };
        assert!(long.validate().is_err());
    }

    #[test]
    fn test_rename_uses_same_limits() {
        let req = UpdateRoomRequest {
            name: "  lounge ".to_string(),
        };
        assert!(req.validate().is_ok());
        assert_eq!(req.trimmed_name(), "lounge");
        assert!(
            UpdateRoomRequest {
                name: "y".repeat(25)
            }
            .validate()
            .is_err()
        );
    }
}
