//! Attachment lifecycle tracker.
//!
//! Drives a message's attachment from `pending` to `complete` or `error`
//! and tells the room about it. Once [`AttachmentTracker::begin_upload`]
//! has accepted an upload, every failure other than a duplicate ends in
//! `error`; a message is never left `pending` by a failed upload.

use std::sync::Arc;

use bytes::Bytes;
use dashmap::DashSet;
use tracing::{debug, info, warn};

use chathub_core::error::{AppError, ErrorKind};
use chathub_core::result::AppResult;
use chathub_core::traits::{ChatStore, MediaTranscoder, TranscodedMedia};
use chathub_core::types::{
    Attachment, AttachmentState, AttachmentUpdate, Message, MessageId, RoomId, UserId,
};

use crate::hub::command::DeliveryReport;
use crate::hub::handle::HubHandle;
use crate::message::types::HubEvent;
use crate::metrics::HubMetrics;

/// Coordinates attachment uploads against the store and the hub.
#[derive(Debug, Clone)]
pub struct AttachmentTracker {
    hub: HubHandle,
    store: Arc<dyn ChatStore>,
    transcoder: Arc<dyn MediaTranscoder>,
    max_bytes: usize,
    metrics: Arc<HubMetrics>,
    in_flight: Arc<DashSet<MessageId>>,
}

/// Exclusive right to upload a message's attachment, released on drop.
struct UploadClaim {
    in_flight: Arc<DashSet<MessageId>>,
    message_id: MessageId,
}

impl Drop for UploadClaim {
    fn drop(&mut self) {
        self.in_flight.remove(&self.message_id);
    }
}

impl AttachmentTracker {
    /// Create a tracker rejecting payloads above `max_bytes`.
    pub fn new(
        hub: HubHandle,
        store: Arc<dyn ChatStore>,
        transcoder: Arc<dyn MediaTranscoder>,
        max_bytes: usize,
        metrics: Arc<HubMetrics>,
    ) -> Self {
        Self {
            hub,
            store,
            transcoder,
            max_bytes,
            metrics,
            in_flight: Arc::new(DashSet::new()),
        }
    }

    fn claim(&self, message_id: MessageId) -> AppResult<UploadClaim> {
        if !self.in_flight.insert(message_id) {
            return Err(AppError::conflict("Attachment upload already in progress"));
        }
        Ok(UploadClaim {
            in_flight: Arc::clone(&self.in_flight),
            message_id,
        })
    }

    /// Check that `uploader` may upload an attachment for the message.
    ///
    /// The message must exist in the room, belong to the uploader, still be
    /// `pending`, and not already have a stored attachment.
    pub async fn begin_upload(
        &self,
        message_id: MessageId,
        room_id: RoomId,
        uploader: UserId,
    ) -> AppResult<Message> {
        let message = self
            .store
            .find_message(room_id, message_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Message {message_id} not found")))?;

        if message.sender_id != uploader {
            return Err(AppError::authorization(
                "Only the sender may upload this attachment",
            ));
        }

        if message.attachment != AttachmentState::Pending {
            return Err(AppError::conflict("Message is not awaiting an attachment"));
        }

        if self.store.attachment_exists(message_id).await? {
            return Err(AppError::conflict("Attachment already uploaded"));
        }

        Ok(message)
    }

    /// Mark the attachment complete and notify every room member,
    /// including the sender.
    pub async fn complete(
        &self,
        message_id: MessageId,
        room_id: RoomId,
        mime_type: &str,
    ) -> AppResult<DeliveryReport> {
        self.store
            .update_attachment(room_id, message_id, AttachmentUpdate::complete(mime_type))
            .await?;
        HubMetrics::inc(&self.metrics.attachments_completed);
        self.notify_complete(message_id, room_id, mime_type).await
    }

    async fn notify_complete(
        &self,
        message_id: MessageId,
        room_id: RoomId,
        mime_type: &str,
    ) -> AppResult<DeliveryReport> {
        self.hub
            .broadcast_room(
                room_id,
                HubEvent::AttachmentComplete {
                    id: message_id,
                    mime_type: mime_type.to_string(),
                },
                None,
            )
            .await
    }

    /// Mark the attachment failed and notify every room member. No retry.
    pub async fn fail(&self, message_id: MessageId, room_id: RoomId) -> AppResult<DeliveryReport> {
        self.store
            .update_attachment(room_id, message_id, AttachmentUpdate::failed())
            .await?;
        HubMetrics::inc(&self.metrics.attachments_failed);

        self.hub
            .broadcast_room(room_id, HubEvent::AttachmentError { id: message_id }, None)
            .await
    }

    /// Accept, transcode, store and complete an upload. Returns the stored
    /// MIME type.
    ///
    /// Only one upload per message runs at a time; a concurrent duplicate
    /// is rejected with `Conflict` before it touches the message. Rejections
    /// from [`Self::begin_upload`] and duplicate stores leave the message
    /// untouched. Any other failure moves it to `error` before the error is
    /// returned.
    pub async fn upload(
        &self,
        message_id: MessageId,
        room_id: RoomId,
        uploader: UserId,
        mime_type: &str,
        payload: Bytes,
    ) -> AppResult<String> {
        let _claim = self.claim(message_id)?;
        self.begin_upload(message_id, room_id, uploader).await?;

        let media = match self.prepare(mime_type, payload).await {
            Ok(media) => media,
            Err(e) => {
                self.abort(message_id, room_id, false, &e).await;
                return Err(e);
            }
        };
        let stored_mime = media.mime_type.clone();

        if let Err(e) = self
            .store
            .put_attachment(Attachment {
                id: message_id,
                mime_type: media.mime_type,
                binary: media.binary,
            })
            .await
        {
            // Another writer owns the stored attachment and its lifecycle.
            if e.kind == ErrorKind::Conflict {
                debug!(message_id = %message_id, "Duplicate attachment store rejected");
                return Err(e);
            }
            self.abort(message_id, room_id, false, &e).await;
            return Err(e);
        }

        if let Err(e) = self
            .store
            .update_attachment(room_id, message_id, AttachmentUpdate::complete(&stored_mime))
            .await
        {
            self.abort(message_id, room_id, true, &e).await;
            return Err(e);
        }
        HubMetrics::inc(&self.metrics.attachments_completed);
        self.notify_complete(message_id, room_id, &stored_mime).await?;

        info!(
            message_id = %message_id,
            room_id = %room_id,
            mime_type = %stored_mime,
            "Attachment stored"
        );
        Ok(stored_mime)
    }

    async fn prepare(&self, mime_type: &str, payload: Bytes) -> AppResult<TranscodedMedia> {
        if payload.len() > self.max_bytes {
            return Err(AppError::validation(format!(
                "Attachment exceeds maximum size of {} bytes",
                self.max_bytes
            )));
        }
        self.transcoder.transcode(mime_type, payload).await
    }

    async fn abort(&self, message_id: MessageId, room_id: RoomId, stored: bool, cause: &AppError) {
        warn!(
            message_id = %message_id,
            room_id = %room_id,
            error = %cause,
            "Attachment upload failed"
        );

        if stored {
            if let Err(e) = self.store.delete_attachment(message_id).await {
                warn!(message_id = %message_id, error = %e, "Failed to remove partial attachment");
            }
        }

        if let Err(e) = self.fail(message_id, room_id).await {
            warn!(
                message_id = %message_id,
                error = %e,
                "Failed to mark attachment as errored"
            );
        }
    }
}
