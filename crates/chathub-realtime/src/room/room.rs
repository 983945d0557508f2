//! Single room with member tracking.

use std::collections::HashMap;

use chathub_core::types::{ConnectionId, RoomId, UserId};

/// A room's live members, indexed both ways.
#[derive(Debug, Clone)]
pub struct Room {
    /// Room ID.
    pub id: RoomId,
    by_user: HashMap<UserId, ConnectionId>,
    by_conn: HashMap<ConnectionId, UserId>,
}

impl Room {
    /// Creates a new empty room.
    pub fn new(id: RoomId) -> Self {
        Self {
            id,
            by_user: HashMap::new(),
            by_conn: HashMap::new(),
        }
    }

    /// Adds a member, replacing any previous connection for the same user.
    pub fn insert(&mut self, user_id: UserId, conn_id: ConnectionId) {
        if let Some(old) = self.by_user.insert(user_id, conn_id) {
            self.by_conn.remove(&old);
        }
        self.by_conn.insert(conn_id, user_id);
    }

    /// The connection a user joined with.
    pub fn connection_of(&self, user_id: UserId) -> Option<ConnectionId> {
        self.by_user.get(&user_id).copied()
    }

    /// Removes a member by user. Returns the connection it was joined with.
    pub fn remove_user(&mut self, user_id: UserId) -> Option<ConnectionId> {
        let conn_id = self.by_user.remove(&user_id)?;
        self.by_conn.remove(&conn_id);
        Some(conn_id)
    }

    /// Removes a member by connection.
    pub fn remove_connection(&mut self, conn_id: ConnectionId) -> Option<UserId> {
        let user_id = self.by_conn.remove(&conn_id)?;
        self.by_user.remove(&user_id);
        Some(user_id)
    }

    /// Whether the user is a member.
    pub fn contains_user(&self, user_id: UserId) -> bool {
        self.by_user.contains_key(&user_id)
    }

    /// Snapshot of `(connection, user)` pairs.
    pub fn members(&self) -> Vec<(ConnectionId, UserId)> {
        self.by_conn.iter().map(|(c, u)| (*c, *u)).collect()
    }

    /// Member count.
    pub fn len(&self) -> usize {
        self.by_conn.len()
    }

    /// Whether the room has no members.
    pub fn is_empty(&self) -> bool {
        self.by_conn.is_empty()
    }
}
