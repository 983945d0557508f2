//! Inbound and outbound WebSocket message type definitions.
//!
//! Outbound frames come in two shapes: a bare chat payload (no
//! `event_type`) and an event envelope tagged by `event_type`. Clients
//! tell them apart by the presence of that field.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use chathub_core::types::{AttachmentState, Message, MessageId, RoomId, UserId};

/// A chat message sent by the client over its socket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundMessage {
    /// Text body.
    pub content: String,
    /// Whether an attachment upload will follow.
    #[serde(default)]
    pub has_attachment: bool,
    /// Target room. When omitted the message goes to every room the sender
    /// currently occupies.
    #[serde(default)]
    pub room_id: Option<RoomId>,
}

/// Frames sent by the server to the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OutboundMessage {
    /// Event envelope.
    Event(HubEvent),
    /// A relayed chat message.
    Chat(ChatPayload),
}

impl From<HubEvent> for OutboundMessage {
    fn from(event: HubEvent) -> Self {
        Self::Event(event)
    }
}

impl From<ChatPayload> for OutboundMessage {
    fn from(payload: ChatPayload) -> Self {
        Self::Chat(payload)
    }
}

impl OutboundMessage {
    /// Serialize to the JSON text frame written to the socket.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// A relayed chat message as seen by peers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatPayload {
    /// Message ID.
    #[serde(rename = "ID")]
    pub id: MessageId,
    /// Room the message was posted to.
    pub room_id: RoomId,
    /// Sender.
    pub uid: UserId,
    /// Text body.
    pub content: String,
    /// When the relay accepted the message.
    pub timestamp: DateTime<Utc>,
    /// Whether an attachment has been stored.
    pub has_attachment: bool,
    /// Whether an attachment upload is still expected.
    pub attachment_pending: bool,
    /// Whether the attachment upload failed.
    #[serde(default)]
    pub attachment_error: bool,
    /// MIME type of the stored attachment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

impl From<&Message> for ChatPayload {
    fn from(message: &Message) -> Self {
        Self {
            id: message.id,
            room_id: message.room_id,
            uid: message.sender_id,
            content: message.content.clone(),
            timestamp: message.timestamp,
            has_attachment: message.attachment == AttachmentState::Complete,
            attachment_pending: message.attachment == AttachmentState::Pending,
            attachment_error: message.attachment == AttachmentState::Error,
            mime_type: message.mime_type.clone(),
        }
    }
}

/// Event envelopes, tagged by `event_type`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum HubEvent {
    /// A room was created or renamed.
    ChatroomUpdate {
        /// Room ID.
        #[serde(rename = "ID")]
        id: RoomId,
        /// Display name.
        name: String,
        /// Room author.
        author_id: UserId,
        /// Room image URL.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        img_url: Option<String>,
        /// Room image blur-hash.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        img_blur: Option<String>,
    },
    /// A room was deleted.
    ChatroomDelete {
        /// Room ID.
        #[serde(rename = "ID")]
        id: RoomId,
    },
    /// The client's last request was rejected.
    ChatroomErr {
        /// Human-readable reason.
        content: String,
    },
    /// A message was removed.
    MessageDelete {
        /// Message ID.
        #[serde(rename = "ID")]
        id: MessageId,
    },
    /// The sender may now upload the declared attachment.
    AttachmentUpload {
        /// Message ID the upload must target.
        #[serde(rename = "ID")]
        id: MessageId,
    },
    /// An attachment finished uploading.
    AttachmentComplete {
        /// Message ID.
        #[serde(rename = "ID")]
        id: MessageId,
        /// Stored MIME type.
        mime_type: String,
    },
    /// An attachment upload failed.
    AttachmentError {
        /// Message ID.
        #[serde(rename = "ID")]
        id: MessageId,
    },
    /// A user account was deleted.
    UserDelete {
        /// User ID.
        #[serde(rename = "ID")]
        id: UserId,
    },
    /// A user changed their profile picture.
    PfpUpdate {
        /// User ID.
        #[serde(rename = "ID")]
        id: UserId,
        /// The new picture.
        base64pfp: String,
    },
}

impl HubEvent {
    /// Shorthand for a `chatroom_err` event.
    pub fn error(content: impl Into<String>) -> Self {
        Self::ChatroomErr {
            content: content.into(),
        }
    }

    /// The `event_type` tag this event serializes with.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::ChatroomUpdate { .. } => "chatroom_update",
            Self::ChatroomDelete { .. } => "chatroom_delete",
            Self::ChatroomErr { .. } => "chatroom_err",
            Self::MessageDelete { .. } => "message_delete",
            Self::AttachmentUpload { .. } => "attachment_upload",
            Self::AttachmentComplete { .. } => "attachment_complete",
            Self::AttachmentError { .. } => "attachment_error",
            Self::UserDelete { .. } => "user_delete",
            Self::PfpUpdate { .. } => "pfp_update",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inbound_defaults() {
        let msg: InboundMessage = serde_json::from_str(r#"{"content":"hi"}"#).expect("parse");
        assert_eq!(msg.content, "hi");
        assert!(!msg.has_attachment);
        assert!(msg.room_id.is_none());
    }

    #[test]
    fn test_inbound_with_room() {
        let room = RoomId::new();
        let raw = format!(r#"{{"content":"hi","has_attachment":true,"room_id":"{room}"}}"#);
        let msg: InboundMessage = serde_json::from_str(&raw).expect("parse");
        assert_eq!(msg.room_id, Some(room));
        assert!(msg.has_attachment);
    }

    #[test]
    fn test_chat_payload_has_no_event_type() {
        let payload = ChatPayload {
            id: MessageId::new(),
            room_id: RoomId::new(),
            uid: UserId::new(),
            content: "hi".to_string(),
            timestamp: Utc::now(),
            has_attachment: false,
            attachment_pending: true,
            attachment_error: false,
            mime_type: None,
        };
        let json = serde_json::to_value(OutboundMessage::from(payload.clone())).expect("json");
        assert!(json.get("event_type").is_none());
        assert!(json.get("mime_type").is_none());
        assert_eq!(json["attachment_error"], false);
        assert_eq!(json["ID"], payload.id.to_string());
        assert_eq!(json["uid"], payload.uid.to_string());
        assert_eq!(json["attachment_pending"], true);
    }

    #[test]
    fn test_event_envelope_shape() {
        let id = MessageId::new();
        let json = serde_json::to_value(OutboundMessage::from(HubEvent::AttachmentComplete {
            id,
            mime_type: "image/png".to_string(),
        }))
        .expect("json");
        assert_eq!(json["event_type"], "attachment_complete");
        assert_eq!(json["ID"], id.to_string());
        assert_eq!(json["mime_type"], "image/png");

        let err = serde_json::to_value(HubEvent::error("nope")).expect("json");
        assert_eq!(err["event_type"], "chatroom_err");
        assert_eq!(err["content"], "nope");
    }

    #[test]
    fn test_event_type_matches_serialized_tag() {
        let events = [
            HubEvent::ChatroomDelete { id: RoomId::new() },
            HubEvent::MessageDelete { id: MessageId::new() },
            HubEvent::UserDelete { id: UserId::new() },
            HubEvent::PfpUpdate {
                id: UserId::new(),
                base64pfp: String::new(),
            },
        ];
        for event in events {
            let json = serde_json::to_value(&event).expect("json");
            assert_eq!(json["event_type"], event.event_type());
        }
    }

    #[test]
    fn test_optional_room_fields_are_omitted() {
        let json = serde_json::to_value(HubEvent::ChatroomUpdate {
            id: RoomId::new(),
            name: "general".to_string(),
            author_id: UserId::new(),
            img_url: None,
            img_blur: None,
        })
        .expect("json");
        assert!(json.get("img_url").is_none());
        assert!(json.get("img_blur").is_none());
    }
}
