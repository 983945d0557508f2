//! Message relay: validate, persist, then fan out.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, warn};

use chathub_core::result::AppResult;
use chathub_core::traits::ChatStore;
use chathub_core::types::{AttachmentState, ConnectionId, Message, MessageId, RoomId, UserId};

use crate::hub::command::DeliveryReport;
use crate::hub::handle::HubHandle;
use crate::message::types::{ChatPayload, HubEvent, InboundMessage};
use crate::message::validator::MessageValidator;
use crate::metrics::HubMetrics;
use crate::throttle::UserThrottle;

/// Rejection text for throttled senders.
pub const THROTTLED: &str = "You are sending messages too quickly";
/// Rejection text when the sender has not joined the named room.
pub const NOT_A_MEMBER: &str = "You are not a member of this room";
/// Rejection text when the sender occupies no room.
pub const NO_ROOM: &str = "Join a room before sending messages";
/// Rejection text when persistence failed for a room.
pub const NOT_SAVED: &str = "Your message could not be saved";

/// The connection a message arrived on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sender {
    /// Sender's connection.
    pub conn_id: ConnectionId,
    /// Sender's user.
    pub user_id: UserId,
}

/// What happened to an inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayOutcome {
    /// Rejected before persistence; the sender received `chatroom_err`.
    Rejected {
        /// The reason sent to the client.
        reason: String,
    },
    /// Persisted and broadcast to at least one room.
    Relayed {
        /// Assigned message ID.
        message_id: MessageId,
        /// Rooms the message was persisted to.
        rooms: Vec<RoomId>,
        /// Combined peer delivery tally.
        report: DeliveryReport,
    },
}

/// Relays chat messages from one sender to the other members of the
/// target rooms.
#[derive(Debug, Clone)]
pub struct MessageRelay {
    hub: HubHandle,
    store: Arc<dyn ChatStore>,
    validator: MessageValidator,
    throttle: Option<Arc<UserThrottle>>,
    metrics: Arc<HubMetrics>,
}

impl MessageRelay {
    /// Create a relay.
    pub fn new(
        hub: HubHandle,
        store: Arc<dyn ChatStore>,
        validator: MessageValidator,
        metrics: Arc<HubMetrics>,
    ) -> Self {
        Self {
            hub,
            store,
            validator,
            throttle: None,
            metrics,
        }
    }

    /// Apply a per-user throttle to every send.
    pub fn with_throttle(mut self, throttle: Arc<UserThrottle>) -> Self {
        self.throttle = Some(throttle);
        self
    }

    /// Handle one inbound message.
    ///
    /// Validation, throttling and membership failures are reported to the
    /// sender only. Only a stopped hub is returned as an error.
    pub async fn relay(&self, sender: Sender, inbound: InboundMessage) -> AppResult<RelayOutcome> {
        if let Some(throttle) = &self.throttle {
            if !throttle.check(sender.user_id).await {
                return self.reject(sender, THROTTLED).await;
            }
        }

        if let Err(e) = self.validator.validate_content(&inbound.content) {
            return self.reject(sender, e.message).await;
        }

        let occupied = self.hub.rooms_of(sender.user_id).await?;
        let targets = match inbound.room_id {
            Some(room_id) if occupied.contains(&room_id) => vec![room_id],
            Some(_) => return self.reject(sender, NOT_A_MEMBER).await,
            None if occupied.is_empty() => return self.reject(sender, NO_ROOM).await,
            None => occupied,
        };

        let message_id = MessageId::new();
        let timestamp = Utc::now();
        let attachment = AttachmentState::initial(inbound.has_attachment);

        let mut rooms = Vec::with_capacity(targets.len());
        let mut report = DeliveryReport::default();

        for room_id in targets {
            let message = Message {
                id: message_id,
                room_id,
                sender_id: sender.user_id,
                content: inbound.content.clone(),
                timestamp,
                attachment,
                mime_type: None,
            };

            if let Err(e) = self.store.append_message(message.clone()).await {
                warn!(
                    room_id = %room_id,
                    user_id = %sender.user_id,
                    error = %e,
                    "Failed to persist message; not broadcasting"
                );
                self.hub
                    .send_to_connection(sender.conn_id, HubEvent::error(NOT_SAVED))
                    .await?;
                continue;
            }

            let delivered = self
                .hub
                .broadcast_room(room_id, ChatPayload::from(&message), Some(sender.user_id))
                .await?;
            report = report.merge(delivered);
            rooms.push(room_id);
        }

        if rooms.is_empty() {
            HubMetrics::inc(&self.metrics.messages_rejected);
            return Ok(RelayOutcome::Rejected {
                reason: NOT_SAVED.to_string(),
            });
        }

        if inbound.has_attachment {
            self.hub
                .send_to_connection(sender.conn_id, HubEvent::AttachmentUpload { id: message_id })
                .await?;
        }

        HubMetrics::inc(&self.metrics.messages_relayed);
        debug!(
            message_id = %message_id,
            user_id = %sender.user_id,
            rooms = rooms.len(),
            delivered = report.delivered,
            dropped = report.dropped,
            "Relayed message"
        );

        Ok(RelayOutcome::Relayed {
            message_id,
            rooms,
            report,
        })
    }

    async fn reject(&self, sender: Sender, reason: impl Into<String>) -> AppResult<RelayOutcome> {
        let reason = reason.into();
        HubMetrics::inc(&self.metrics.messages_rejected);
        debug!(user_id = %sender.user_id, reason = %reason, "Rejected message");
        self.hub
            .send_to_connection(sender.conn_id, HubEvent::error(reason.clone()))
            .await?;
        Ok(RelayOutcome::Rejected { reason })
    }
}
