//! Commands accepted by the hub actor.

use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;

use chathub_core::types::{ConnectionId, RoomId, UserId};

use crate::message::types::OutboundMessage;

/// What the socket side receives when a connection is registered.
#[derive(Debug)]
pub struct Registration {
    /// Hub-assigned connection ID.
    pub conn_id: ConnectionId,
    /// Frames to write to the socket, in order.
    pub outbound: mpsc::Receiver<OutboundMessage>,
    /// Cancelled when the hub evicts the connection.
    pub cancel: CancellationToken,
}

/// Per-broadcast delivery tally.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryReport {
    /// Frames queued to a peer.
    pub delivered: usize,
    /// Frames dropped for a full or closed peer.
    pub dropped: usize,
}

impl DeliveryReport {
    /// Sum two reports.
    pub fn merge(self, other: Self) -> Self {
        Self {
            delivered: self.delivered + other.delivered,
            dropped: self.dropped + other.dropped,
        }
    }
}

/// Point-in-time hub counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HubStats {
    /// Live connections.
    pub connections: usize,
    /// Rooms held in memory.
    pub rooms: usize,
}

/// Commands sent to the hub actor. Every command carrying a `reply` is
/// answered once it has been applied.
#[derive(Debug)]
pub enum HubCommand {
    /// Register a new connection, evicting the user's previous one.
    Register {
        user_id: UserId,
        reply: oneshot::Sender<Registration>,
    },
    /// Remove a connection. No-op if it was already superseded.
    UnregisterConnection {
        conn_id: ConnectionId,
        reply: oneshot::Sender<bool>,
    },
    /// Remove whatever connection the user has.
    UnregisterUser {
        user_id: UserId,
        reply: oneshot::Sender<Option<ConnectionId>>,
    },
    /// The user's live connection.
    Lookup {
        user_id: UserId,
        reply: oneshot::Sender<Option<ConnectionId>>,
    },
    /// Add the user's live connection to a room.
    Join {
        room_id: RoomId,
        user_id: UserId,
        reply: oneshot::Sender<bool>,
    },
    /// Remove the user from a room.
    Leave {
        room_id: RoomId,
        user_id: UserId,
        reply: oneshot::Sender<bool>,
    },
    /// Snapshot of a room's members.
    Members {
        room_id: RoomId,
        reply: oneshot::Sender<Vec<(ConnectionId, UserId)>>,
    },
    /// Rooms the user occupies.
    RoomsOf {
        user_id: UserId,
        reply: oneshot::Sender<Vec<RoomId>>,
    },
    /// Forget a room and its memberships.
    DropRoom {
        room_id: RoomId,
        reply: oneshot::Sender<bool>,
    },
    /// Queue a frame to one connection.
    SendToConnection {
        conn_id: ConnectionId,
        message: OutboundMessage,
        reply: oneshot::Sender<bool>,
    },
    /// Queue a frame to every member of a room, optionally skipping a user.
    BroadcastRoom {
        room_id: RoomId,
        message: OutboundMessage,
        exclude: Option<UserId>,
        reply: oneshot::Sender<DeliveryReport>,
    },
    /// Queue a frame to every connection, optionally skipping a user.
    BroadcastAll {
        message: OutboundMessage,
        exclude: Option<UserId>,
        reply: oneshot::Sender<DeliveryReport>,
    },
    /// Close and remove the user's connection.
    Evict {
        user_id: UserId,
        reply: oneshot::Sender<bool>,
    },
    /// Current counts.
    Stats { reply: oneshot::Sender<HubStats> },
    /// Close every connection and stop the actor.
    Shutdown { reply: oneshot::Sender<usize> },
}
