//! Persisted chat model: rooms, messages and their attachment state.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::{MessageId, RoomId, UserId};
use crate::error::AppError;
use crate::result::AppResult;

/// Per-message attachment lifecycle.
///
/// Transitions only move forward: `None` is fixed at creation when the
/// client did not declare an attachment, `Pending` may become `Complete`
/// or `Error`, and both of those are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttachmentState {
    /// No attachment was declared.
    #[default]
    None,
    /// Declared by the sender; upload not yet finished.
    Pending,
    /// Uploaded and stored.
    Complete,
    /// Upload failed. No retry.
    Error,
}

impl AttachmentState {
    /// The state a freshly relayed message starts in.
    pub fn initial(has_attachment: bool) -> Self {
        if has_attachment {
            Self::Pending
        } else {
            Self::None
        }
    }

    /// Whether `self -> next` is a legal transition.
    pub fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Complete) | (Self::Pending, Self::Error)
        )
    }

    /// Apply a transition, rejecting anything that does not move forward.
    pub fn transition(self, next: Self) -> AppResult<Self> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(AppError::conflict(format!(
                "Illegal attachment transition {self:?} -> {next:?}"
            )))
        }
    }

    /// Whether the message carries a stored attachment.
    pub fn has_attachment(self) -> bool {
        self == Self::Complete
    }

    /// Whether an upload is still expected.
    pub fn is_pending(self) -> bool {
        self == Self::Pending
    }

    /// Whether no further transition is possible.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Complete | Self::Error)
    }
}

/// A chat message as persisted inside its room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Message ID, also the key of its attachment.
    pub id: MessageId,
    /// Room the message was posted to.
    pub room_id: RoomId,
    /// Author.
    pub sender_id: UserId,
    /// Text body.
    pub content: String,
    /// When the relay accepted the message.
    pub timestamp: DateTime<Utc>,
    /// Attachment lifecycle state.
    pub attachment: AttachmentState,
    /// MIME type of the stored attachment, once complete.
    pub mime_type: Option<String>,
}

/// Fields written atomically when an attachment upload finishes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentUpdate {
    /// The new state (`Complete` or `Error`).
    pub state: AttachmentState,
    /// MIME type of the stored payload (only set on completion).
    pub mime_type: Option<String>,
}

impl AttachmentUpdate {
    /// A successful upload.
    pub fn complete(mime_type: impl Into<String>) -> Self {
        Self {
            state: AttachmentState::Complete,
            mime_type: Some(mime_type.into()),
        }
    }

    /// A failed upload.
    pub fn failed() -> Self {
        Self {
            state: AttachmentState::Error,
            mime_type: None,
        }
    }
}

/// A stored attachment. Its ID equals the owning message's ID.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    /// Owning message.
    pub id: MessageId,
    /// MIME type of `binary`.
    pub mime_type: String,
    /// Encoded payload.
    pub binary: Bytes,
}

/// A persisted room document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomRecord {
    /// Room ID.
    pub id: RoomId,
    /// Display name.
    pub name: String,
    /// Creator; only the author may delete the room.
    pub author_id: UserId,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last update time.
    pub updated_at: DateTime<Utc>,
    /// Messages in posting order.
    #[serde(default)]
    pub messages: Vec<Message>,
    /// Blur-hash placeholder for the room image, if one was uploaded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub img_blur: Option<String>,
}

impl RoomRecord {
    /// Create an empty room authored by `author_id`.
    pub fn new(name: impl Into<String>, author_id: UserId) -> Self {
        let now = Utc::now();
        Self {
            id: RoomId::new(),
            name: name.into(),
            author_id,
            created_at: now,
            updated_at: now,
            messages: Vec::new(),
            img_blur: None,
        }
    }
}
