//! Cloneable client of the hub actor.

use tokio::sync::{mpsc, oneshot};

use chathub_core::error::AppError;
use chathub_core::result::AppResult;
use chathub_core::types::{ConnectionId, RoomId, UserId};

use super::command::{DeliveryReport, HubCommand, HubStats, Registration};
use crate::message::types::OutboundMessage;

/// Submits commands to the hub and awaits their replies.
///
/// Every method fails with `ServiceUnavailable` once the actor has stopped.
#[derive(Debug, Clone)]
pub struct HubHandle {
    tx: mpsc::Sender<HubCommand>,
}

impl HubHandle {
    pub(crate) fn new(tx: mpsc::Sender<HubCommand>) -> Self {
        Self { tx }
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> HubCommand,
    ) -> AppResult<T> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(build(reply))
            .await
            .map_err(|_| AppError::service_unavailable("Hub is not running"))?;
        rx.await
            .map_err(|_| AppError::service_unavailable("Hub stopped before replying"))
    }

    /// Register a connection for an authenticated user. Any connection the
    /// user already had is evicted first.
    pub async fn register(&self, user_id: UserId) -> AppResult<Registration> {
        self.request(|reply| HubCommand::Register { user_id, reply })
            .await
    }

    /// Remove a connection and its room memberships. Returns `false` when
    /// the connection was already gone or superseded.
    pub async fn unregister_connection(&self, conn_id: ConnectionId) -> AppResult<bool> {
        self.request(|reply| HubCommand::UnregisterConnection { conn_id, reply })
            .await
    }

    /// Remove the user's connection without closing its socket.
    pub async fn unregister_user(&self, user_id: UserId) -> AppResult<Option<ConnectionId>> {
        self.request(|reply| HubCommand::UnregisterUser { user_id, reply })
            .await
    }

    /// The user's live connection, if any.
    pub async fn lookup(&self, user_id: UserId) -> AppResult<Option<ConnectionId>> {
        self.request(|reply| HubCommand::Lookup { user_id, reply })
            .await
    }

    /// Join a room. Returns `false` if the user has no live connection.
    pub async fn join(&self, room_id: RoomId, user_id: UserId) -> AppResult<bool> {
        self.request(|reply| HubCommand::Join {
            room_id,
            user_id,
            reply,
        })
        .await
    }

    /// Leave a room. Returns `false` if the user was not a member.
    pub async fn leave(&self, room_id: RoomId, user_id: UserId) -> AppResult<bool> {
        self.request(|reply| HubCommand::Leave {
            room_id,
            user_id,
            reply,
        })
        .await
    }

    /// Snapshot of a room's members.
    pub async fn members_of(&self, room_id: RoomId) -> AppResult<Vec<(ConnectionId, UserId)>> {
        self.request(|reply| HubCommand::Members { room_id, reply })
            .await
    }

    /// Rooms the user currently occupies.
    pub async fn rooms_of(&self, user_id: UserId) -> AppResult<Vec<RoomId>> {
        self.request(|reply| HubCommand::RoomsOf { user_id, reply })
            .await
    }

    /// Forget a room and all of its memberships.
    pub async fn drop_room(&self, room_id: RoomId) -> AppResult<bool> {
        self.request(|reply| HubCommand::DropRoom { room_id, reply })
            .await
    }

    /// Queue a frame to a single connection.
    pub async fn send_to_connection(
        &self,
        conn_id: ConnectionId,
        message: impl Into<OutboundMessage>,
    ) -> AppResult<bool> {
        let message = message.into();
        self.request(|reply| HubCommand::SendToConnection {
            conn_id,
            message,
            reply,
        })
        .await
    }

    /// Queue a frame to every member of a room except `exclude`.
    pub async fn broadcast_room(
        &self,
        room_id: RoomId,
        message: impl Into<OutboundMessage>,
        exclude: Option<UserId>,
    ) -> AppResult<DeliveryReport> {
        let message = message.into();
        self.request(|reply| HubCommand::BroadcastRoom {
            room_id,
            message,
            exclude,
            reply,
        })
        .await
    }

    /// Queue a frame to every connection except `exclude`.
    pub async fn broadcast_all(
        &self,
        message: impl Into<OutboundMessage>,
        exclude: Option<UserId>,
    ) -> AppResult<DeliveryReport> {
        let message = message.into();
        self.request(|reply| HubCommand::BroadcastAll {
            message,
            exclude,
            reply,
        })
        .await
    }

    /// Close and remove the user's connection from the registry and every
    /// room. Returns `false` if the user was not connected.
    pub async fn evict(&self, user_id: UserId) -> AppResult<bool> {
        self.request(|reply| HubCommand::Evict { user_id, reply })
            .await
    }

    /// Current connection and room counts.
    pub async fn stats(&self) -> AppResult<HubStats> {
        self.request(|reply| HubCommand::Stats { reply }).await
    }

    /// Close every connection and stop the actor. Returns how many
    /// connections were closed.
    pub async fn shutdown(&self) -> AppResult<usize> {
        self.request(|reply| HubCommand::Shutdown { reply }).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chathub_core::config::realtime::RealtimeConfig;
    use chathub_core::error::ErrorKind;

    use super::*;
    use crate::hub::actor::HubActor;
    use crate::message::types::HubEvent;
    use crate::metrics::HubMetrics;

    fn spawn() -> HubHandle {
        HubActor::spawn(&RealtimeConfig::default(), Arc::new(HubMetrics::new())).0
    }

    #[tokio::test]
    async fn test_register_supersedes_previous_connection() {
        let hub = spawn();
        let user = UserId::new();
        let first = hub.register(user).await.expect("register");
        let second = hub.register(user).await.expect("register");

        assert!(first.cancel.is_cancelled());
        assert!(!second.cancel.is_cancelled());
        assert_eq!(hub.lookup(user).await.expect("lookup"), Some(second.conn_id));
        assert!(!hub.unregister_connection(first.conn_id).await.expect("unregister"));
        assert_eq!(hub.lookup(user).await.expect("lookup"), Some(second.conn_id));
    }

    #[tokio::test]
    async fn test_join_without_connection_fails_silently() {
        let hub = spawn();
        assert!(!hub.join(RoomId::new(), UserId::new()).await.expect("join"));
    }

    #[tokio::test]
    async fn test_unregister_clears_rooms() {
        let hub = spawn();
        let (room, user) = (RoomId::new(), UserId::new());
        let reg = hub.register(user).await.expect("register");
        assert!(hub.join(room, user).await.expect("join"));
        assert!(hub.unregister_connection(reg.conn_id).await.expect("unregister"));
        assert!(hub.members_of(room).await.expect("members").is_empty());
        assert!(hub.rooms_of(user).await.expect("rooms").is_empty());
        assert_eq!(hub.stats().await.expect("stats").rooms, 1);
    }

    #[tokio::test]
    async fn test_unregister_user_removes_mapping() {
        let hub = spawn();
        let user = UserId::new();
        let reg = hub.register(user).await.expect("register");
        assert_eq!(
            hub.unregister_user(user).await.expect("unregister"),
            Some(reg.conn_id)
        );
        assert_eq!(hub.lookup(user).await.expect("lookup"), None);
    }

    #[tokio::test]
    async fn test_send_to_connection() {
        let hub = spawn();
        let mut reg = hub.register(UserId::new()).await.expect("register");
        assert!(
            hub.send_to_connection(reg.conn_id, HubEvent::error("x"))
                .await
                .expect("send")
        );
        assert_eq!(
            reg.outbound.recv().await,
            Some(OutboundMessage::Event(HubEvent::error("x")))
        );
        assert!(
            !hub.send_to_connection(ConnectionId(9_999), HubEvent::error("x"))
                .await
                .expect("send")
        );
    }

    #[tokio::test]
    async fn test_shutdown_closes_connections_and_stops() {
        let hub = spawn();
        let reg = hub.register(UserId::new()).await.expect("register");
        assert_eq!(hub.shutdown().await.expect("shutdown"), 1);
        assert!(reg.cancel.is_cancelled());
        let err = hub.stats().await.expect_err("actor stopped");
        assert_eq!(err.kind, ErrorKind::ServiceUnavailable);
    }
}
