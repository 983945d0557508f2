//! Account deletion and profile picture handlers.

use axum::Json;
use axum::extract::{Multipart, State};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use chathub_core::error::AppError;
use chathub_core::events::UserEvent;

use crate::dto::response::{ApiResponse, DeletionResponse, PictureResponse};
use crate::error::ApiError;
use crate::extractors::AuthUser;
use crate::handlers::attachment::read_file_field;
use crate::state::AppState;

/// DELETE /api/users/me
///
/// The cascade runs before responding so the counts are exact. The
/// deletion is then emitted on the change feed for every other subscriber;
/// this hub's tombstone keeps its own redelivery silent.
pub async fn delete_me(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<ApiResponse<DeletionResponse>>, ApiError> {
    let user_id = auth.user_id();
    let report = state.realtime.deletions.delete_user(user_id).await?;
    state.change_feed.emit(UserEvent::Deleted { user_id }).await?;

    Ok(Json(ApiResponse::ok(DeletionResponse {
        user_id,
        rooms_deleted: report.rooms_deleted,
        messages_stripped: report.messages_stripped,
    })))
}

/// POST /api/users/me/picture
///
/// The picture is normalized like any attachment and emitted on the change
/// feed as a data URL, which announces it to everyone else. The account
/// service owns the stored copy.
pub async fn update_picture(
    State(state): State<AppState>,
    auth: AuthUser,
    multipart: Multipart,
) -> Result<Json<ApiResponse<PictureResponse>>, ApiError> {
    let file = read_file_field(multipart).await?;
    if !file.mime_type.starts_with("image/") {
        return Err(AppError::validation("Profile picture must be an image").into());
    }
    if file.data.len() > state.config.attachments.max_bytes {
        return Err(AppError::validation(format!(
            "Picture exceeds maximum size of {} bytes",
            state.config.attachments.max_bytes
        ))
        .into());
    }

    let media = state.transcoder.transcode(&file.mime_type, file.data).await?;
    let base64pfp = format!(
        "data:{};base64,{}",
        media.mime_type,
        STANDARD.encode(&media.binary)
    );

    state
        .change_feed
        .emit(UserEvent::PictureUpdated {
            user_id: auth.user_id(),
            base64pfp: base64pfp.clone(),
        })
        .await?;

    Ok(Json(ApiResponse::ok(PictureResponse { base64pfp })))
}
