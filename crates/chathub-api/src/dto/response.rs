//! Response DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use chathub_core::types::{MessageId, RoomId, RoomRecord, UserId};
use chathub_realtime::hub::HubStats;
use chathub_realtime::message::ChatPayload;
use chathub_realtime::metrics::MetricsSnapshot;

/// Standard success response wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T: Serialize> {
    /// Whether the request was successful.
    pub success: bool,
    /// Response data.
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Creates a successful response.
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// A room as returned to clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomResponse {
    /// Room ID.
    #[serde(rename = "ID")]
    pub id: RoomId,
    /// Display name.
    pub name: String,
    /// Room author.
    pub author_id: UserId,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last update time.
    pub updated_at: DateTime<Utc>,
    /// Where the room image is served, if one was uploaded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub img_url: Option<String>,
    /// Room image blur placeholder as a data URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub img_blur: Option<String>,
    /// Messages in posting order, in the same shape the socket delivers.
    pub messages: Vec<ChatPayload>,
}

impl From<&RoomRecord> for RoomResponse {
    fn from(room: &RoomRecord) -> Self {
        Self {
            id: room.id,
            name: room.name.clone(),
            author_id: room.author_id,
            created_at: room.created_at,
            updated_at: room.updated_at,
            img_url: room_image_url(room),
            img_blur: room.img_blur.clone(),
            messages: room.messages.iter().map(ChatPayload::from).collect(),
        }
    }
}

/// A room without its messages, as listed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomSummary {
    /// Room ID.
    #[serde(rename = "ID")]
    pub id: RoomId,
    /// Display name.
    pub name: String,
    /// Room author.
    pub author_id: UserId,
    /// Last update time.
    pub updated_at: DateTime<Utc>,
    /// Where the room image is served, if one was uploaded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub img_url: Option<String>,
    /// Room image blur placeholder as a data URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub img_blur: Option<String>,
}

impl From<&RoomRecord> for RoomSummary {
    fn from(room: &RoomRecord) -> Self {
        Self {
            id: room.id,
            name: room.name.clone(),
            author_id: room.author_id,
            updated_at: room.updated_at,
            img_url: room_image_url(room),
            img_blur: room.img_blur.clone(),
        }
    }
}

/// Path the room's image is served from. A blur placeholder is only
/// recorded alongside a stored image.
pub fn room_image_url(room: &RoomRecord) -> Option<String> {
    room.img_blur
        .as_ref()
        .map(|_| format!("/api/rooms/{}/image", room.id))
}

/// Result of a join or leave.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MembershipResponse {
    /// Room ID.
    pub room_id: RoomId,
    /// Whether membership changed.
    pub changed: bool,
}

/// Stored attachment summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttachmentResponse {
    /// Message the attachment belongs to.
    #[serde(rename = "ID")]
    pub id: MessageId,
    /// Stored MIME type.
    pub mime_type: String,
}

/// Result of a profile picture update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PictureResponse {
    /// Data URL announced to other users.
    pub base64pfp: String,
}

/// Result of an account deletion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeletionResponse {
    /// Deleted user.
    pub user_id: UserId,
    /// Rooms authored by the user that were removed.
    pub rooms_deleted: usize,
    /// Messages removed from other rooms.
    pub messages_stripped: usize,
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Status string.
    pub status: String,
    /// Server version.
    pub version: String,
    /// Live WebSocket connections.
    pub ws_connections: usize,
    /// Rooms held in memory.
    pub rooms: usize,
    /// Hub counters.
    pub metrics: MetricsSnapshot,
}

impl HealthResponse {
    /// Build from hub state.
    pub fn new(stats: HubStats, metrics: MetricsSnapshot) -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            ws_connections: stats.connections,
            rooms: stats.rooms,
            metrics,
        }
    }
}

