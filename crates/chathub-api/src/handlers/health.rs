//! Health check handler.

use axum::Json;
use axum::extract::State;

use crate::dto::response::{ApiResponse, HealthResponse};
use crate::error::ApiError;
use crate::state::AppState;

/// GET /api/health
pub async fn health(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<HealthResponse>>, ApiError> {
    let stats = state.realtime.hub.stats().await?;
    let metrics = state.realtime.metrics.snapshot();
    Ok(Json(ApiResponse::ok(HealthResponse::new(stats, metrics))))
}
