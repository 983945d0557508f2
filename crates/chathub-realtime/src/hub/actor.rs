//! The hub actor.
//!
//! One task owns the [`ConnectionRegistry`] and [`RoomMembership`] and
//! applies [`HubCommand`]s in the order they were submitted, so a registry
//! mutation and the matching room cleanup are always a single step. Peer
//! writes are `try_send` into bounded queues and never wait.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use chathub_core::config::realtime::RealtimeConfig;
use chathub_core::types::{ConnectionId, RoomId, UserId};

use super::command::{DeliveryReport, HubCommand, HubStats, Registration};
use super::handle::HubHandle;
use crate::connection::handle::{ConnectionHandle, Delivery};
use crate::connection::registry::ConnectionRegistry;
use crate::message::types::OutboundMessage;
use crate::metrics::HubMetrics;
use crate::room::membership::RoomMembership;

/// State owned by the hub task.
#[derive(Debug)]
pub struct HubActor {
    registry: ConnectionRegistry,
    rooms: RoomMembership,
    outbound_buffer_size: usize,
    metrics: Arc<HubMetrics>,
}

impl HubActor {
    /// Create the actor without starting it.
    pub fn new(config: &RealtimeConfig, metrics: Arc<HubMetrics>) -> Self {
        Self {
            registry: ConnectionRegistry::new(),
            rooms: RoomMembership::new(),
            outbound_buffer_size: config.outbound_buffer_size.max(1),
            metrics,
        }
    }

    /// Spawn the actor on the current runtime.
    pub fn spawn(config: &RealtimeConfig, metrics: Arc<HubMetrics>) -> (HubHandle, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(config.command_buffer_size.max(1));
        let actor = Self::new(config, metrics);
        let task = tokio::spawn(actor.run(rx));
        (HubHandle::new(tx), task)
    }

    /// Process commands until every handle is dropped or a shutdown
    /// command arrives.
    pub async fn run(mut self, mut rx: mpsc::Receiver<HubCommand>) {
        info!("Hub actor started");
        while let Some(command) = rx.recv().await {
            if let HubCommand::Shutdown { reply } = command {
                let closed = self.close_all();
                let _ = reply.send(closed);
                break;
            }
            self.handle_command(command);
        }
        self.close_all();
        info!("Hub actor stopped");
    }

    fn handle_command(&mut self, command: HubCommand) {
        match command {
            HubCommand::Register { user_id, reply } => {
                let _ = reply.send(self.register(user_id));
            }
            HubCommand::UnregisterConnection { conn_id, reply } => {
                let _ = reply.send(self.unregister_connection(conn_id));
            }
            HubCommand::UnregisterUser { user_id, reply } => {
                let removed = self.registry.remove_user(user_id).map(|handle| {
                    self.rooms.remove_connection(handle.id);
                    handle.id
                });
                let _ = reply.send(removed);
            }
            HubCommand::Lookup { user_id, reply } => {
                let _ = reply.send(self.registry.lookup(user_id));
            }
            HubCommand::Join {
                room_id,
                user_id,
                reply,
            } => {
                let _ = reply.send(self.join(room_id, user_id));
            }
            HubCommand::Leave {
                room_id,
                user_id,
                reply,
            } => {
                let _ = reply.send(self.rooms.leave(room_id, user_id));
            }
            HubCommand::Members { room_id, reply } => {
                let _ = reply.send(self.rooms.members_of(room_id));
            }
            HubCommand::RoomsOf { user_id, reply } => {
                let rooms = self
                    .registry
                    .lookup(user_id)
                    .map(|conn_id| self.rooms.rooms_of(conn_id))
                    .unwrap_or_default();
                let _ = reply.send(rooms);
            }
            HubCommand::DropRoom { room_id, reply } => {
                let _ = reply.send(self.rooms.drop_room(room_id));
            }
            HubCommand::SendToConnection {
                conn_id,
                message,
                reply,
            } => {
                let queued = self
                    .registry
                    .get(conn_id)
                    .is_some_and(|handle| self.deliver(handle, message).is_queued());
                let _ = reply.send(queued);
            }
            HubCommand::BroadcastRoom {
                room_id,
                message,
                exclude,
                reply,
            } => {
                let _ = reply.send(self.broadcast_room(room_id, &message, exclude));
            }
            HubCommand::BroadcastAll {
                message,
                exclude,
                reply,
            } => {
                let _ = reply.send(self.broadcast_all(&message, exclude));
            }
            HubCommand::Evict { user_id, reply } => {
                let _ = reply.send(self.evict(user_id));
            }
            HubCommand::Stats { reply } => {
                let _ = reply.send(HubStats {
                    connections: self.registry.len(),
                    rooms: self.rooms.room_count(),
                });
            }
            HubCommand::Shutdown { reply } => {
                let _ = reply.send(self.close_all());
            }
        }
    }

    fn register(&mut self, user_id: UserId) -> Registration {
        let (tx, rx) = mpsc::channel(self.outbound_buffer_size);
        let cancel = CancellationToken::new();
        let conn_id = self.registry.next_id();

        let handle = ConnectionHandle::new(conn_id, user_id, tx, cancel.clone());
        if let Some(previous) = self.registry.insert(handle) {
            self.rooms.remove_connection(previous.id);
            previous.close();
            HubMetrics::inc(&self.metrics.connections_evicted);
            info!(
                user_id = %user_id,
                old_conn_id = %previous.id,
                new_conn_id = %conn_id,
                "Superseded existing connection"
            );
        }

        HubMetrics::inc(&self.metrics.connections_total);
        debug!(conn_id = %conn_id, user_id = %user_id, "Connection registered");

        Registration {
            conn_id,
            outbound: rx,
            cancel,
        }
    }

    fn unregister_connection(&mut self, conn_id: ConnectionId) -> bool {
        match self.registry.remove(conn_id) {
            Some(handle) => {
                self.rooms.remove_connection(conn_id);
                debug!(conn_id = %conn_id, user_id = %handle.user_id, "Connection unregistered");
                true
            }
            None => false,
        }
    }

    fn join(&mut self, room_id: RoomId, user_id: UserId) -> bool {
        let Some(conn_id) = self.registry.lookup(user_id) else {
            warn!(
                room_id = %room_id,
                user_id = %user_id,
                "Join ignored: user has no live connection"
            );
            return false;
        };
        self.rooms.join(room_id, user_id, conn_id);
        debug!(room_id = %room_id, user_id = %user_id, conn_id = %conn_id, "Joined room");
        true
    }

    fn evict(&mut self, user_id: UserId) -> bool {
        let Some(handle) = self.registry.remove_user(user_id) else {
            return false;
        };
        self.rooms.remove_connection(handle.id);
        handle.close();
        HubMetrics::inc(&self.metrics.connections_evicted);
        info!(user_id = %user_id, conn_id = %handle.id, "Connection evicted");
        true
    }

    fn deliver(&self, handle: &ConnectionHandle, message: OutboundMessage) -> Delivery {
        let outcome = handle.send(message);
        if outcome.is_queued() {
            HubMetrics::inc(&self.metrics.frames_queued);
        } else {
            HubMetrics::inc(&self.metrics.frames_dropped);
        }
        outcome
    }

    fn broadcast_room(
        &self,
        room_id: RoomId,
        message: &OutboundMessage,
        exclude: Option<UserId>,
    ) -> DeliveryReport {
        let targets = self
            .rooms
            .members_of(room_id)
            .into_iter()
            .filter(|(_, user_id)| Some(*user_id) != exclude)
            .filter_map(|(conn_id, _)| self.registry.get(conn_id));
        self.fan_out(targets, message)
    }

    fn broadcast_all(&self, message: &OutboundMessage, exclude: Option<UserId>) -> DeliveryReport {
        let targets = self
            .registry
            .iter()
            .filter(|handle| Some(handle.user_id) != exclude);
        self.fan_out(targets, message)
    }

    fn fan_out<'a>(
        &self,
        targets: impl Iterator<Item = &'a ConnectionHandle>,
        message: &OutboundMessage,
    ) -> DeliveryReport {
        let mut report = DeliveryReport::default();
        for handle in targets {
            if self.deliver(handle, message.clone()).is_queued() {
                report.delivered += 1;
            } else {
                report.dropped += 1;
            }
        }
        report
    }

    fn close_all(&mut self) -> usize {
        let handles = self.registry.drain();
        for handle in &handles {
            self.rooms.remove_connection(handle.id);
            handle.close();
        }
        if !handles.is_empty() {
            info!(count = handles.len(), "Closed all connections");
        }
        handles.len()
    }
}
