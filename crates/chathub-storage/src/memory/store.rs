//! [`ChatStore`] backed by concurrent hash maps.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tracing::debug;

use chathub_core::error::AppError;
use chathub_core::result::AppResult;
use chathub_core::traits::ChatStore;
use chathub_core::types::{
    Attachment, AttachmentUpdate, Message, MessageId, RoomId, RoomRecord, UserId,
};

/// Process-local document store.
///
/// Each map entry is one document; DashMap's shard locks make every
/// single-document operation atomic. Contents are lost on restart.
#[derive(Debug, Default)]
pub struct MemoryChatStore {
    rooms: DashMap<RoomId, RoomRecord>,
    room_images: DashMap<RoomId, Bytes>,
    attachments: DashMap<MessageId, Attachment>,
}

impl MemoryChatStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored room documents.
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    /// Whether a room image is stored.
    pub fn has_room_image(&self, room_id: RoomId) -> bool {
        self.room_images.contains_key(&room_id)
    }
}

#[async_trait]
impl ChatStore for MemoryChatStore {
    async fn create_room(&self, room: RoomRecord) -> AppResult<RoomRecord> {
        match self.rooms.entry(room.id) {
            Entry::Occupied(_) => Err(AppError::conflict(format!(
                "Room {} already exists",
                room.id
            ))),
            Entry::Vacant(slot) => {
                slot.insert(room.clone());
                Ok(room)
            }
        }
    }

    async fn get_room(&self, room_id: RoomId) -> AppResult<Option<RoomRecord>> {
        Ok(self.rooms.get(&room_id).map(|r| r.value().clone()))
    }

    async fn list_rooms(&self, author_id: Option<UserId>) -> AppResult<Vec<RoomRecord>> {
        let mut rooms: Vec<RoomRecord> = self
            .rooms
            .iter()
            .filter(|r| author_id.is_none_or(|author| r.author_id == author))
            .map(|r| r.value().clone())
            .collect();
        rooms.sort_by_key(|r| r.created_at);
        Ok(rooms)
    }

    async fn rename_room(&self, room_id: RoomId, name: String) -> AppResult<RoomRecord> {
        let mut room = self
            .rooms
            .get_mut(&room_id)
            .ok_or_else(|| AppError::not_found(format!("Room {room_id} not found")))?;
        room.name = name;
        room.updated_at = Utc::now();
        Ok(room.clone())
    }

    async fn delete_room(&self, room_id: RoomId) -> AppResult<Option<RoomRecord>> {
        Ok(self.rooms.remove(&room_id).map(|(_, room)| room))
    }

    async fn put_room_image(
        &self,
        room_id: RoomId,
        binary: Bytes,
        img_blur: String,
    ) -> AppResult<RoomRecord> {
        let mut room = self
            .rooms
            .get_mut(&room_id)
            .ok_or_else(|| AppError::not_found(format!("Room {room_id} not found")))?;
        self.room_images.insert(room_id, binary);
        room.img_blur = Some(img_blur);
        room.updated_at = Utc::now();
        Ok(room.clone())
    }

    async fn get_room_image(&self, room_id: RoomId) -> AppResult<Option<Bytes>> {
        Ok(self.room_images.get(&room_id).map(|b| b.value().clone()))
    }

    async fn delete_room_image(&self, room_id: RoomId) -> AppResult<()> {
        self.room_images.remove(&room_id);
        Ok(())
    }

    async fn append_message(&self, message: Message) -> AppResult<()> {
        let mut room = self
            .rooms
            .get_mut(&message.room_id)
            .ok_or_else(|| AppError::not_found(format!("Room {} not found", message.room_id)))?;
        room.updated_at = Utc::now();
        room.messages.push(message);
        Ok(())
    }

    async fn find_message(
        &self,
        room_id: RoomId,
        message_id: MessageId,
    ) -> AppResult<Option<Message>> {
        Ok(self
            .rooms
            .get(&room_id)
            .and_then(|room| room.messages.iter().find(|m| m.id == message_id).cloned()))
    }

    async fn remove_message(
        &self,
        room_id: RoomId,
        message_id: MessageId,
    ) -> AppResult<Option<Message>> {
        let Some(mut room) = self.rooms.get_mut(&room_id) else {
            return Ok(None);
        };
        let position = room.messages.iter().position(|m| m.id == message_id);
        Ok(position.map(|idx| room.messages.remove(idx)))
    }

    async fn update_attachment(
        &self,
        room_id: RoomId,
        message_id: MessageId,
        update: AttachmentUpdate,
    ) -> AppResult<()> {
        let mut room = self
            .rooms
            .get_mut(&room_id)
            .ok_or_else(|| AppError::not_found(format!("Room {room_id} not found")))?;
        let message = room
            .messages
            .iter_mut()
            .find(|m| m.id == message_id)
            .ok_or_else(|| AppError::not_found(format!("Message {message_id} not found")))?;

        message.attachment = message.attachment.transition(update.state)?;
        if update.mime_type.is_some() {
            message.mime_type = update.mime_type;
        }
        Ok(())
    }

    async fn delete_rooms_by_author(&self, author_id: UserId) -> AppResult<Vec<RoomRecord>> {
        let owned: Vec<RoomId> = self
            .rooms
            .iter()
            .filter(|r| r.author_id == author_id)
            .map(|r| r.id)
            .collect();

        let removed: Vec<RoomRecord> = owned
            .into_iter()
            .filter_map(|id| self.rooms.remove(&id).map(|(_, room)| room))
            .collect();

        debug!(author_id = %author_id, count = removed.len(), "Deleted authored rooms");
        Ok(removed)
    }

    async fn strip_user_messages(&self, sender_id: UserId) -> AppResult<Vec<Message>> {
        let mut stripped = Vec::new();
        for mut room in self.rooms.iter_mut() {
            let (mine, others): (Vec<Message>, Vec<Message>) = std::mem::take(&mut room.messages)
                .into_iter()
                .partition(|m| m.sender_id == sender_id);
            room.messages = others;
            stripped.extend(mine);
        }
        debug!(user_id = %sender_id, count = stripped.len(), "Stripped user messages");
        Ok(stripped)
    }

    async fn put_attachment(&self, attachment: Attachment) -> AppResult<()> {
        match self.attachments.entry(attachment.id) {
            Entry::Occupied(_) => Err(AppError::conflict(format!(
                "Attachment for message {} already exists",
                attachment.id
            ))),
            Entry::Vacant(slot) => {
                slot.insert(attachment);
                Ok(())
            }
        }
    }

    async fn get_attachment(&self, message_id: MessageId) -> AppResult<Option<Attachment>> {
        Ok(self.attachments.get(&message_id).map(|a| a.value().clone()))
    }

    async fn attachment_exists(&self, message_id: MessageId) -> AppResult<bool> {
        Ok(self.attachments.contains_key(&message_id))
    }

    async fn delete_attachment(&self, message_id: MessageId) -> AppResult<bool> {
        Ok(self.attachments.remove(&message_id).is_some())
    }

    async fn expired_messages(
        &self,
        cutoff: DateTime<Utc>,
    ) -> AppResult<Vec<(RoomId, MessageId)>> {
        Ok(self
            .rooms
            .iter()
            .flat_map(|room| {
                room.messages
                    .iter()
                    .filter(|m| m.timestamp < cutoff)
                    .map(|m| (m.room_id, m.id))
                    .collect::<Vec<_>>()
            })
            .collect())
    }
}
