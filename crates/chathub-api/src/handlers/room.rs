//! Room CRUD, image and membership handlers.

use axum::Json;
use axum::body::Body;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::{StatusCode, header};
use axum::response::Response;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use validator::Validate;

use chathub_core::error::AppError;
use chathub_core::events::RoomEvent;
use chathub_core::types::{RoomId, RoomRecord, UserId};

use crate::dto::request::{CreateRoomRequest, ListRoomsQuery, UpdateRoomRequest};
use crate::dto::response::{
    ApiResponse, MembershipResponse, RoomResponse, RoomSummary, room_image_url,
};
use crate::error::ApiError;
use crate::extractors::AuthUser;
use crate::handlers::attachment::read_file_field;
use crate::state::AppState;

const NAME_LENGTH: &str = "Room name must be 1-24 characters";

/// Fetch a room or fail with `NotFound`.
async fn find_room(state: &AppState, id: RoomId) -> Result<RoomRecord, ApiError> {
    Ok(state
        .store
        .get_room(id)
        .await?
        .ok_or_else(|| AppError::not_found("Room not found"))?)
}

/// Fetch a room the caller authored.
async fn find_own_room(state: &AppState, id: RoomId, user_id: UserId) -> Result<RoomRecord, ApiError> {
    let room = find_room(state, id).await?;
    if room.author_id != user_id {
        return Err(AppError::authorization("Only the room author can modify it").into());
    }
    Ok(room)
}

/// Authors may not hold two rooms with the same name, ignoring case.
async fn ensure_unique_name(
    state: &AppState,
    author_id: UserId,
    name: &str,
    renaming: Option<RoomId>,
) -> Result<(), ApiError> {
    let taken = state
        .store
        .list_rooms(Some(author_id))
        .await?
        .iter()
        .any(|r| Some(r.id) != renaming && r.name.eq_ignore_ascii_case(name));
    if taken {
        return Err(AppError::validation("You already have a room by that name").into());
    }
    Ok(())
}

/// Tell everyone but the author about the room's current state.
async fn announce(state: &AppState, room: &RoomRecord) -> Result<(), ApiError> {
    state
        .realtime
        .events
        .on_room_event(&RoomEvent::Upserted {
            room_id: room.id,
            name: room.name.clone(),
            author_id: room.author_id,
            img_url: room_image_url(room),
            img_blur: room.img_blur.clone(),
        })
        .await?;
    Ok(())
}

/// GET /api/rooms
pub async fn list_rooms(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<ListRoomsQuery>,
) -> Result<Json<ApiResponse<Vec<RoomSummary>>>, ApiError> {
    let author = query.own.then(|| auth.user_id());
    let rooms = state.store.list_rooms(author).await?;
    Ok(Json(ApiResponse::ok(
        rooms.iter().map(RoomSummary::from).collect(),
    )))
}

/// POST /api/rooms
pub async fn create_room(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<CreateRoomRequest>,
) -> Result<(StatusCode, Json<ApiResponse<RoomResponse>>), ApiError> {
    req.validate()?;
    let name = req.trimmed_name();
    if name.is_empty() {
        return Err(AppError::validation(NAME_LENGTH).into());
    }
    ensure_unique_name(&state, auth.user_id(), name, None).await?;

    let room = state
        .store
        .create_room(RoomRecord::new(name, auth.user_id()))
        .await?;
    announce(&state, &room).await?;

    tracing::info!(room_id = %room.id, user_id = %room.author_id, "Room created");
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(RoomResponse::from(&room)))))
}

/// GET /api/rooms/{id}
pub async fn get_room(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<RoomId>,
) -> Result<Json<ApiResponse<RoomResponse>>, ApiError> {
    let room = find_room(&state, id).await?;
    Ok(Json(ApiResponse::ok(RoomResponse::from(&room))))
}

/// PATCH /api/rooms/{id}
pub async fn update_room(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<RoomId>,
    Json(req): Json<UpdateRoomRequest>,
) -> Result<Json<ApiResponse<RoomSummary>>, ApiError> {
    req.validate()?;
    let name = req.trimmed_name();
    if name.is_empty() {
        return Err(AppError::validation(NAME_LENGTH).into());
    }
    find_own_room(&state, id, auth.user_id()).await?;
    ensure_unique_name(&state, auth.user_id(), name, Some(id)).await?;

    let room = state.store.rename_room(id, name.to_string()).await?;
    announce(&state, &room).await?;

    tracing::info!(room_id = %id, name = %room.name, "Room renamed");
    Ok(Json(ApiResponse::ok(RoomSummary::from(&room))))
}

/// DELETE /api/rooms/{id}
pub async fn delete_room(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<RoomId>,
) -> Result<StatusCode, ApiError> {
    find_own_room(&state, id, auth.user_id()).await?;

    if let Some(room) = state.store.delete_room(id).await? {
        state.store.delete_room_image(id).await?;
        for message in &room.messages {
            state.store.delete_attachment(message.id).await?;
        }
    }

    state
        .realtime
        .events
        .on_room_event(&RoomEvent::Deleted {
            room_id: id,
            actor_id: auth.user_id(),
        })
        .await?;

    tracing::info!(room_id = %id, user_id = %auth.user_id(), "Room deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/rooms/{id}/image
///
/// The image is scaled and stored; its blur placeholder is kept on the room
/// document and sent to everyone else with the image URL.
pub async fn upload_room_image(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<RoomId>,
    multipart: Multipart,
) -> Result<Json<ApiResponse<RoomSummary>>, ApiError> {
    find_own_room(&state, id, auth.user_id()).await?;

    let file = read_file_field(multipart).await?;
    if !file.mime_type.starts_with("image/") {
        return Err(AppError::validation("File is not an image").into());
    }
    let max_bytes = state.config.attachments.max_bytes;
    if file.data.len() > max_bytes {
        return Err(
            AppError::validation(format!("Image exceeds maximum size of {max_bytes} bytes")).into(),
        );
    }

    let image = state.transcoder.room_image(&file.mime_type, file.data).await?;
    let img_blur = format!("data:image/jpeg;base64,{}", STANDARD.encode(&image.blur));
    let room = state.store.put_room_image(id, image.binary, img_blur).await?;
    announce(&state, &room).await?;

    tracing::info!(room_id = %id, "Room image updated");
    Ok(Json(ApiResponse::ok(RoomSummary::from(&room))))
}

/// GET /api/rooms/{id}/image
pub async fn get_room_image(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<RoomId>,
) -> Result<Response, ApiError> {
    let binary = state
        .store
        .get_room_image(id)
        .await?
        .ok_or_else(|| AppError::not_found("Room has no image"))?;

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "image/jpeg")
        .header(header::CONTENT_LENGTH, binary.len())
        .body(Body::from(binary))
        .map_err(|e| AppError::internal(format!("Response build failed: {e}")))?;
    Ok(response)
}

/// POST /api/rooms/{id}/join
pub async fn join_room(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<RoomId>,
) -> Result<Json<ApiResponse<MembershipResponse>>, ApiError> {
    find_room(&state, id).await?;

    let changed = state.realtime.hub.join(id, auth.user_id()).await?;
    Ok(Json(ApiResponse::ok(MembershipResponse {
        room_id: id,
        changed,
    })))
}

/// POST /api/rooms/{id}/leave
pub async fn leave_room(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<RoomId>,
) -> Result<Json<ApiResponse<MembershipResponse>>, ApiError> {
    let changed = state.realtime.hub.leave(id, auth.user_id()).await?;
    Ok(Json(ApiResponse::ok(MembershipResponse {
        room_id: id,
        changed,
    })))
}
