//! JWT token validation.

use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use tracing::debug;

use chathub_core::config::auth::AuthConfig;
use chathub_core::error::AppError;

use super::claims::Claims;

/// Validates HS256 bearer tokens.
#[derive(Clone)]
pub struct JwtDecoder {
    /// HMAC secret key for verification.
    decoding_key: DecodingKey,
    /// Validation configuration.
    validation: Validation,
}

impl std::fmt::Debug for JwtDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtDecoder")
            .field("validation", &self.validation)
            .finish()
    }
}

impl JwtDecoder {
    /// Creates a new decoder from auth configuration.
    pub fn new(config: &AuthConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = config.leeway_seconds;

        Self {
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            validation,
        }
    }

    /// Decodes and validates an access token string.
    pub fn decode_access_token(&self, token: &str) -> Result<Claims, AppError> {
        let token_data =
            decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
                debug!(error = %e, "Rejected bearer token");
                match e.kind() {
                    jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                        AppError::authentication("Token has expired")
                    }
                    jsonwebtoken::errors::ErrorKind::InvalidToken => {
                        AppError::authentication("Invalid token format")
                    }
                    jsonwebtoken::errors::ErrorKind::InvalidSignature => {
                        AppError::authentication("Invalid token signature")
                    }
                    _ => AppError::authentication(format!("Token validation failed: {e}")),
                }
            })?;

        Ok(token_data.claims)
    }
}

#[cfg(test)]
mod tests {
    use chathub_core::error::ErrorKind;
    use chathub_core::types::UserId;
    use chrono::Utc;

    use super::*;
    use crate::jwt::JwtEncoder;

    fn config(secret: &str) -> AuthConfig {
        AuthConfig {
            jwt_secret: secret.to_string(),
            leeway_seconds: 0,
            access_ttl_minutes: 5,
        }
    }

    #[test]
    fn test_round_trip_yields_subject() {
        let cfg = config("s3cret");
        let user = UserId::new();
        let token = JwtEncoder::new(&cfg)
            .generate_access_token(user)
            .expect("encode");
        let claims = JwtDecoder::new(&cfg)
            .decode_access_token(&token)
            .expect("decode");
        assert_eq!(claims.user_id(), user);
        assert!(!claims.is_expired());
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let token = JwtEncoder::new(&config("one"))
            .generate_access_token(UserId::new())
            .expect("encode");
        let err = JwtDecoder::new(&config("two"))
            .decode_access_token(&token)
            .expect_err("signature must not verify");
        assert_eq!(err.kind, ErrorKind::Authentication);
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let cfg = config("s3cret");
        let now = Utc::now().timestamp();
        let token = JwtEncoder::new(&cfg)
            .encode_claims(&Claims {
                sub: UserId::new(),
                iat: now - 600,
                exp: now - 300,
            })
            .expect("encode");
        let err = JwtDecoder::new(&cfg)
            .decode_access_token(&token)
            .expect_err("expired token");
        assert_eq!(err.message, "Token has expired");
    }

    #[test]
    fn test_garbage_is_rejected() {
        let err = JwtDecoder::new(&config("s3cret"))
            .decode_access_token("definitely.not.ajwt")
            .expect_err("garbage");
        assert_eq!(err.kind, ErrorKind::Authentication);
    }
}
