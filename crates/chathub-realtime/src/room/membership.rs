//! Room membership manager: every room plus the connection → rooms
//! reverse index.

use std::collections::{HashMap, HashSet};

use chathub_core::types::{ConnectionId, RoomId, UserId};

use super::room::Room;

/// All rooms with live members.
///
/// Rooms are created on first join and kept when they become empty; only
/// [`RoomMembership::drop_room`] forgets one. Owned by the hub actor.
#[derive(Debug, Default)]
pub struct RoomMembership {
    rooms: HashMap<RoomId, Room>,
    /// Connection → rooms it has joined.
    joined: HashMap<ConnectionId, HashSet<RoomId>>,
}

impl RoomMembership {
    /// Creates an empty manager.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a member, creating the room if needed. Returns `false` when the
    /// membership already existed.
    pub fn join(&mut self, room_id: RoomId, user_id: UserId, conn_id: ConnectionId) -> bool {
        let room = self
            .rooms
            .entry(room_id)
            .or_insert_with(|| Room::new(room_id));
        let displaced = match room.connection_of(user_id) {
            Some(existing) if existing == conn_id => return false,
            other => other,
        };
        room.insert(user_id, conn_id);

        if let Some(old) = displaced {
            self.forget(old, room_id);
        }
        self.joined.entry(conn_id).or_default().insert(room_id);
        true
    }

    /// Removes a user from one room. Absence is a no-op returning `false`.
    pub fn leave(&mut self, room_id: RoomId, user_id: UserId) -> bool {
        let Some(conn_id) = self
            .rooms
            .get_mut(&room_id)
            .and_then(|room| room.remove_user(user_id))
        else {
            return false;
        };
        self.forget(conn_id, room_id);
        true
    }

    /// Removes a connection from every room it joined. Returns the rooms it
    /// was removed from.
    pub fn remove_connection(&mut self, conn_id: ConnectionId) -> Vec<RoomId> {
        let rooms: Vec<RoomId> = self
            .joined
            .remove(&conn_id)
            .map(|set| set.into_iter().collect())
            .unwrap_or_default();
        for room_id in &rooms {
            if let Some(room) = self.rooms.get_mut(room_id) {
                room.remove_connection(conn_id);
            }
        }
        rooms
    }

    /// Snapshot of a room's members. Unknown rooms have none.
    pub fn members_of(&self, room_id: RoomId) -> Vec<(ConnectionId, UserId)> {
        self.rooms
            .get(&room_id)
            .map(Room::members)
            .unwrap_or_default()
    }

    /// Rooms the connection currently occupies.
    pub fn rooms_of(&self, conn_id: ConnectionId) -> Vec<RoomId> {
        self.joined
            .get(&conn_id)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Whether the user is a member of the room.
    pub fn is_member(&self, room_id: RoomId, user_id: UserId) -> bool {
        self.rooms
            .get(&room_id)
            .is_some_and(|room| room.contains_user(user_id))
    }

    /// Whether the room exists in memory (possibly empty).
    pub fn contains_room(&self, room_id: RoomId) -> bool {
        self.rooms.contains_key(&room_id)
    }

    /// Forget a room entirely.
    pub fn drop_room(&mut self, room_id: RoomId) -> bool {
        let Some(room) = self.rooms.remove(&room_id) else {
            return false;
        };
        for (conn_id, _) in room.members() {
            self.forget(conn_id, room_id);
        }
        true
    }

    /// Number of rooms held in memory.
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    fn forget(&mut self, conn_id: ConnectionId, room_id: RoomId) {
        if let Some(set) = self.joined.get_mut(&conn_id) {
            set.remove(&room_id);
            if set.is_empty() {
                self.joined.remove(&conn_id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_is_idempotent() {
        let mut rooms = RoomMembership::new();
        let (room, user, conn) = (RoomId::new(), UserId::new(), ConnectionId(1));
        assert!(rooms.join(room, user, conn));
        assert!(!rooms.join(room, user, conn));
        assert_eq!(rooms.members_of(room), vec![(conn, user)]);
    }

    #[test]
    fn test_leave_keeps_empty_room() {
        let mut rooms = RoomMembership::new();
        let (room, user, conn) = (RoomId::new(), UserId::new(), ConnectionId(1));
        rooms.join(room, user, conn);
        assert!(rooms.leave(room, user));
        assert!(!rooms.leave(room, user));
        assert!(rooms.members_of(room).is_empty());
        assert!(rooms.contains_room(room));
        assert!(rooms.rooms_of(conn).is_empty());
    }

    #[test]
    fn test_remove_connection_clears_every_room() {
        let mut rooms = RoomMembership::new();
        let (a, b) = (RoomId::new(), RoomId::new());
        let (user, conn) = (UserId::new(), ConnectionId(3));
        rooms.join(a, user, conn);
        rooms.join(b, user, conn);

        let mut removed = rooms.remove_connection(conn);
        removed.sort();
        let mut expected = vec![a, b];
        expected.sort();
        assert_eq!(removed, expected);
        assert!(!rooms.is_member(a, user));
        assert!(!rooms.is_member(b, user));
    }

    #[test]
    fn test_rejoin_on_new_connection_replaces_old() {
        let mut rooms = RoomMembership::new();
        let (room, user) = (RoomId::new(), UserId::new());
        rooms.join(room, user, ConnectionId(1));
        rooms.join(room, user, ConnectionId(2));
        assert_eq!(rooms.members_of(room), vec![(ConnectionId(2), user)]);
        assert!(rooms.rooms_of(ConnectionId(1)).is_empty());
    }

    #[test]
    fn test_drop_room_updates_reverse_index() {
        let mut rooms = RoomMembership::new();
        let (room, user, conn) = (RoomId::new(), UserId::new(), ConnectionId(1));
        rooms.join(room, user, conn);
        assert!(rooms.drop_room(room));
        assert!(rooms.rooms_of(conn).is_empty());
        assert_eq!(rooms.room_count(), 0);
    }
}
