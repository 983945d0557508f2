//! Document store trait for rooms, messages and attachments.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};

use crate::result::AppResult;
use crate::types::{Attachment, AttachmentUpdate, Message, MessageId, RoomId, RoomRecord, UserId};

/// Persistence for everything the hub does not keep in memory.
///
/// Messages live inside their room document; attachments and room images
/// are stored separately, keyed by message ID and room ID respectively.
/// Implementations must make each method atomic with respect to the
/// document it touches.
#[async_trait]
pub trait ChatStore: Send + Sync + std::fmt::Debug + 'static {
    /// Insert a new room document.
    async fn create_room(&self, room: RoomRecord) -> AppResult<RoomRecord>;

    /// Fetch a room document.
    async fn get_room(&self, room_id: RoomId) -> AppResult<Option<RoomRecord>>;

    /// Every room document, or only those authored by `author_id`.
    async fn list_rooms(&self, author_id: Option<UserId>) -> AppResult<Vec<RoomRecord>>;

    /// Rename a room, returning the updated document. Fails with `NotFound`
    /// when the room does not exist.
    async fn rename_room(&self, room_id: RoomId, name: String) -> AppResult<RoomRecord>;

    /// Remove a room document, returning it if it existed.
    async fn delete_room(&self, room_id: RoomId) -> AppResult<Option<RoomRecord>>;

    /// Store or replace a room's image and record its blur placeholder on
    /// the room document, returning the updated document. Fails with
    /// `NotFound` when the room does not exist.
    async fn put_room_image(
        &self,
        room_id: RoomId,
        binary: Bytes,
        img_blur: String,
    ) -> AppResult<RoomRecord>;

    /// Fetch a room's image.
    async fn get_room_image(&self, room_id: RoomId) -> AppResult<Option<Bytes>>;

    /// Remove a room's image. Absent images are not an error.
    async fn delete_room_image(&self, room_id: RoomId) -> AppResult<()>;

    /// Append a message to its room. Fails with `NotFound` when the room
    /// document does not exist.
    async fn append_message(&self, message: Message) -> AppResult<()>;

    /// Look up a message inside a room.
    async fn find_message(
        &self,
        room_id: RoomId,
        message_id: MessageId,
    ) -> AppResult<Option<Message>>;

    /// Remove a message from its room, returning it if it existed.
    async fn remove_message(
        &self,
        room_id: RoomId,
        message_id: MessageId,
    ) -> AppResult<Option<Message>>;

    /// Atomically write the attachment fields of a message.
    async fn update_attachment(
        &self,
        room_id: RoomId,
        message_id: MessageId,
        update: AttachmentUpdate,
    ) -> AppResult<()>;

    /// Remove every room authored by `author_id`, returning the removed
    /// documents.
    async fn delete_rooms_by_author(&self, author_id: UserId) -> AppResult<Vec<RoomRecord>>;

    /// Remove every message sent by `sender_id` from every room, returning
    /// the removed messages.
    async fn strip_user_messages(&self, sender_id: UserId) -> AppResult<Vec<Message>>;

    /// Store an attachment. Fails with `Conflict` if one already exists for
    /// the same message ID.
    async fn put_attachment(&self, attachment: Attachment) -> AppResult<()>;

    /// Fetch an attachment.
    async fn get_attachment(&self, message_id: MessageId) -> AppResult<Option<Attachment>>;

    /// Whether an attachment exists for the message.
    async fn attachment_exists(&self, message_id: MessageId) -> AppResult<bool>;

    /// Remove an attachment, returning whether one existed.
    async fn delete_attachment(&self, message_id: MessageId) -> AppResult<bool>;

    /// Every message whose timestamp is strictly before `cutoff`.
    async fn expired_messages(&self, cutoff: DateTime<Utc>)
    -> AppResult<Vec<(RoomId, MessageId)>>;
}
