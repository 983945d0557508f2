//! `AuthUser` extractor: pulls the JWT from the Authorization header (or the
//! `token` query parameter for WebSocket upgrades) and validates it.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use chathub_auth::Claims;
use chathub_core::error::AppError;
use chathub_core::types::UserId;

use crate::error::ApiError;
use crate::state::AppState;

/// Extracted authenticated user available in handlers.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Claims);

impl AuthUser {
    /// The authenticated user.
    pub fn user_id(&self) -> UserId {
        self.0.user_id()
    }
}

impl std::ops::Deref for AuthUser {
    type Target = Claims;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Browsers cannot set headers on a WebSocket handshake, so the token may
/// also arrive as `?token=`.
fn query_token(parts: &Parts) -> Option<&str> {
    parts
        .uri
        .query()?
        .split('&')
        .find_map(|pair| pair.strip_prefix("token="))
        .filter(|t| !t.is_empty())
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = match parts.headers.get("authorization") {
            Some(value) => value
                .to_str()
                .ok()
                .and_then(|v| v.strip_prefix("Bearer "))
                .ok_or_else(|| AppError::authentication("Invalid Authorization header format"))?,
            None => query_token(parts)
                .ok_or_else(|| AppError::authentication("Missing Authorization header"))?,
        };

        let claims = state.jwt_decoder.decode_access_token(token)?;
        Ok(AuthUser(claims))
    }
}
