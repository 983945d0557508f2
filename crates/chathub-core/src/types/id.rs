//! Newtype wrappers around [`uuid::Uuid`] for domain identifiers, plus the
//! hub-local integer [`ConnectionId`].
//!
//! Using distinct types prevents accidentally passing a `RoomId` where a
//! `MessageId` is expected.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Macro to define a newtype ID wrapper around `Uuid`.
///
/// The second argument names the `Uuid` constructor used by `new()`.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident, $generate:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Create a new identifier.
            pub fn new() -> Self {
                Self(Uuid::$generate())
            }

            /// Create an identifier from an existing UUID.
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Return the inner UUID value.
            pub fn into_uuid(self) -> Uuid {
                self.0
            }

            /// Return a reference to the inner UUID.
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s).map(Self)
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Uuid {
                id.0
            }
        }
    };
}

define_id!(
    /// Unique identifier for a user, supplied by the authenticator.
    UserId, new_v4
);

define_id!(
    /// Unique identifier for a chat room.
    RoomId, new_v4
);

define_id!(
    /// Unique identifier for a chat message. Time-ordered (UUID v7) so ids
    /// sort by creation. Also keys the message's attachment.
    MessageId, now_v7
);

/// Hub-assigned identifier for one live socket connection.
///
/// Allocated from a monotonically increasing counter, never reused within
/// a process lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(pub u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_id_new() {
        let id1 = UserId::new();
        let id2 = UserId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_room_id_display_matches_uuid() {
        let uuid = Uuid::new_v4();
        let id = RoomId::from_uuid(uuid);
        assert_eq!(id.to_string(), uuid.to_string());
    }

    #[test]
    fn test_message_ids_are_time_ordered() {
        let first = MessageId::new();
        let second = MessageId::new();
        assert_eq!(first.as_uuid().get_version_num(), 7);
        assert!(first < second);
    }

    #[test]
    fn test_id_from_str_rejects_garbage() {
        assert!("not-a-uuid".parse::<UserId>().is_err());
        let uuid = Uuid::new_v4();
        let parsed: UserId = uuid.to_string().parse().expect("valid uuid");
        assert_eq!(parsed.into_uuid(), uuid);
    }

    #[test]
    fn test_ids_serialize_transparently() {
        let id = MessageId::new();
        let json = serde_json::to_string(&id).expect("serialize");
        assert_eq!(json, format!("\"{}\"", id.as_uuid()));
        assert_eq!(serde_json::to_string(&ConnectionId(7)).expect("serialize"), "7");
    }
}
