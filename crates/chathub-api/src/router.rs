//! Route definitions for the ChatHub HTTP API.
//!
//! REST routes are mounted under `/api`; the WebSocket upgrade lives at
//! `/ws`. The router receives `AppState` and passes it to all handlers via
//! Axum's `State` extractor.

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
};
use http::Method;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Multipart framing on top of the attachment ceiling.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Build the complete Axum router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.server.body_limit_bytes;
    let upload_limit = state.config.attachments.max_bytes + MULTIPART_OVERHEAD;

    let api_routes = Router::new()
        .merge(room_routes())
        .merge(upload_routes().layer(DefaultBodyLimit::max(upload_limit)))
        .merge(user_routes())
        .merge(health_routes());

    let ws_routes = Router::new().route("/ws", get(handlers::ws::ws_upgrade));

    let cors = build_cors_layer(&state);

    Router::new()
        .nest("/api", api_routes)
        .merge(ws_routes)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Room CRUD, membership and downloads
fn room_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/rooms",
            get(handlers::room::list_rooms).post(handlers::room::create_room),
        )
        .route(
            "/rooms/{id}",
            get(handlers::room::get_room)
                .patch(handlers::room::update_room)
                .delete(handlers::room::delete_room),
        )
        .route("/rooms/{id}/image", get(handlers::room::get_room_image))
        .route("/rooms/{id}/join", post(handlers::room::join_room))
        .route("/rooms/{id}/leave", post(handlers::room::leave_room))
        .route(
            "/attachments/{message_id}",
            get(handlers::attachment::download_attachment),
        )
}

/// Multipart uploads, which get the larger body limit
fn upload_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/rooms/{id}/messages/{message_id}/attachment",
            post(handlers::attachment::upload_attachment),
        )
        .route("/rooms/{id}/image", post(handlers::room::upload_room_image))
        .route("/users/me/picture", post(handlers::user::update_picture))
}

/// User self-service endpoints
fn user_routes() -> Router<AppState> {
    Router::new().route("/users/me", delete(handlers::user::delete_me))
}

/// Health check endpoints (no auth required)
fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(handlers::health::health))
}

/// Build CORS layer from configuration
fn build_cors_layer(state: &AppState) -> CorsLayer {
    let origins = &state.config.server.allowed_origins;

    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers(Any);

    if origins.iter().any(|o| o == "*") {
        cors.allow_origin(Any)
    } else {
        let origins: Vec<http::HeaderValue> =
            origins.iter().filter_map(|o| o.parse().ok()).collect();
        cors.allow_origin(AllowOrigin::list(origins))
    }
}
