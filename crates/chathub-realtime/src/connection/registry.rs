//! Canonical table of live connections.

use std::collections::HashMap;

use chathub_core::types::{ConnectionId, UserId};

use super::handle::ConnectionHandle;

/// Maps connection IDs to handles and users to their single live
/// connection.
///
/// Not synchronized: owned exclusively by the hub actor.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    by_id: HashMap<ConnectionId, ConnectionHandle>,
    by_user: HashMap<UserId, ConnectionId>,
    next_id: u64,
}

impl ConnectionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a fresh connection ID.
    pub fn next_id(&mut self) -> ConnectionId {
        self.next_id += 1;
        ConnectionId(self.next_id)
    }

    /// Insert a handle. Returns the handle it displaced for the same user,
    /// which the caller must finish evicting.
    pub fn insert(&mut self, handle: ConnectionHandle) -> Option<ConnectionHandle> {
        let previous = self
            .by_user
            .insert(handle.user_id, handle.id)
            .and_then(|old| self.by_id.remove(&old));
        self.by_id.insert(handle.id, handle);
        previous
    }

    /// Remove a connection by ID. The user mapping is cleared only if it
    /// still points at this connection.
    pub fn remove(&mut self, conn_id: ConnectionId) -> Option<ConnectionHandle> {
        let handle = self.by_id.remove(&conn_id)?;
        if self.by_user.get(&handle.user_id) == Some(&conn_id) {
            self.by_user.remove(&handle.user_id);
        }
        Some(handle)
    }

    /// Remove a user's live connection.
    pub fn remove_user(&mut self, user_id: UserId) -> Option<ConnectionHandle> {
        let conn_id = self.by_user.remove(&user_id)?;
        self.by_id.remove(&conn_id)
    }

    /// The user's live connection ID.
    pub fn lookup(&self, user_id: UserId) -> Option<ConnectionId> {
        self.by_user.get(&user_id).copied()
    }

    /// Handle for a connection ID.
    pub fn get(&self, conn_id: ConnectionId) -> Option<&ConnectionHandle> {
        self.by_id.get(&conn_id)
    }

    /// Iterate over every live connection.
    pub fn iter(&self) -> impl Iterator<Item = &ConnectionHandle> {
        self.by_id.values()
    }

    /// Number of live connections.
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    /// Whether no connection is registered.
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Remove every connection.
    pub fn drain(&mut self) -> Vec<ConnectionHandle> {
        self.by_user.clear();
        self.by_id.drain().map(|(_, handle)| handle).collect()
    }
}
