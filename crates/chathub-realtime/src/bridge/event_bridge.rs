//! Domain event → hub broadcast mapping.
//!
//! Room lifecycle and profile changes are announced to every connected
//! user, not just room members, so room lists stay current everywhere.

use tracing::debug;

use chathub_core::events::RoomEvent;
use chathub_core::result::AppResult;
use chathub_core::types::UserId;

use crate::hub::command::DeliveryReport;
use crate::hub::handle::HubHandle;
use crate::message::types::HubEvent;

/// Bridges room and profile events into the hub.
#[derive(Debug, Clone)]
pub struct EventBridge {
    hub: HubHandle,
}

impl EventBridge {
    /// Create a new event bridge.
    pub fn new(hub: HubHandle) -> Self {
        Self { hub }
    }

    /// Handle a room event.
    ///
    /// Upserts go to everyone except the author. Deletions drop the
    /// in-memory room and go to everyone.
    pub async fn on_room_event(&self, event: &RoomEvent) -> AppResult<DeliveryReport> {
        match event {
            RoomEvent::Upserted {
                room_id,
                name,
                author_id,
                img_url,
                img_blur,
            } => {
                debug!(room_id = %room_id, "Broadcasting room update");
                self.hub
                    .broadcast_all(
                        HubEvent::ChatroomUpdate {
                            id: *room_id,
                            name: name.clone(),
                            author_id: *author_id,
                            img_url: img_url.clone(),
                            img_blur: img_blur.clone(),
                        },
                        Some(*author_id),
                    )
                    .await
            }
            RoomEvent::Deleted { room_id, actor_id } => {
                debug!(room_id = %room_id, actor_id = %actor_id, "Broadcasting room deletion");
                self.hub.drop_room(*room_id).await?;
                self.hub
                    .broadcast_all(HubEvent::ChatroomDelete { id: *room_id }, None)
                    .await
            }
        }
    }

    /// Announce a new profile picture to everyone but its owner.
    pub async fn on_picture_updated(
        &self,
        user_id: UserId,
        base64pfp: &str,
    ) -> AppResult<DeliveryReport> {
        self.hub
            .broadcast_all(
                HubEvent::PfpUpdate {
                    id: user_id,
                    base64pfp: base64pfp.to_string(),
                },
                Some(user_id),
            )
            .await
    }
}
