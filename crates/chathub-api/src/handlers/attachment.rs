//! Attachment upload and download handlers.

use axum::Json;
use axum::body::Body;
use axum::extract::{Multipart, Path, State};
use axum::http::{StatusCode, header};
use axum::response::Response;
use bytes::Bytes;

use chathub_core::error::AppError;
use chathub_core::types::{MessageId, RoomId};

use crate::dto::response::{ApiResponse, AttachmentResponse};
use crate::error::ApiError;
use crate::extractors::AuthUser;
use crate::state::AppState;

/// Fallback when the part carries no content type.
const OCTET_STREAM: &str = "application/octet-stream";

/// A single uploaded file.
#[derive(Debug)]
pub struct UploadedFile {
    /// Declared MIME type.
    pub mime_type: String,
    /// Raw bytes.
    pub data: Bytes,
}

/// Read the `file` field of a multipart body.
pub async fn read_file_field(mut multipart: Multipart) -> Result<UploadedFile, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::validation(format!("Multipart error: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let mime_type = field.content_type().unwrap_or(OCTET_STREAM).to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::validation(format!("Read error: {e}")))?;
        return Ok(UploadedFile { mime_type, data });
    }
    Err(AppError::validation("file is required"))
}

/// POST /api/rooms/{id}/messages/{message_id}/attachment
pub async fn upload_attachment(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((room_id, message_id)): Path<(RoomId, MessageId)>,
    multipart: Multipart,
) -> Result<Json<ApiResponse<AttachmentResponse>>, ApiError> {
    if !state.realtime.throttle.check(auth.user_id()).await {
        return Err(AppError::rate_limit("Too many uploads").into());
    }

    let file = read_file_field(multipart).await?;
    let mime_type = state
        .realtime
        .attachments
        .upload(message_id, room_id, auth.user_id(), &file.mime_type, file.data)
        .await?;

    Ok(Json(ApiResponse::ok(AttachmentResponse {
        id: message_id,
        mime_type,
    })))
}

/// GET /api/attachments/{message_id}
pub async fn download_attachment(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(message_id): Path<MessageId>,
) -> Result<Response, ApiError> {
    let attachment = state
        .store
        .get_attachment(message_id)
        .await?
        .ok_or_else(|| AppError::not_found("Attachment not found"))?;

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, attachment.mime_type)
        .header(header::CONTENT_LENGTH, attachment.binary.len())
        .body(Body::from(attachment.binary))
        .map_err(|e| AppError::internal(format!("Response build failed: {e}")))?;

    Ok(response)
}
