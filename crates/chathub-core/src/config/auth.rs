//! Authentication configuration.

use serde::{Deserialize, Serialize};

/// Bearer-token verification configuration.
///
/// ChatHub does not issue tokens for end users; it only verifies tokens
/// minted by the account service that shares this secret.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Secret key for JWT verification (HMAC-SHA256).
    #[serde(default = "default_jwt_secret")]
    pub jwt_secret: String,
    /// Clock skew tolerance in seconds when checking `exp`.
    #[serde(default = "default_leeway")]
    pub leeway_seconds: u64,
    /// Token TTL in minutes, used by the encoder in tests and tooling.
    #[serde(default = "default_access_ttl")]
    pub access_ttl_minutes: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: default_jwt_secret(),
            leeway_seconds: default_leeway(),
            access_ttl_minutes: default_access_ttl(),
        }
    }
}

fn default_jwt_secret() -> String {
    "CHANGE_ME_IN_PRODUCTION".to_string()
}

fn default_leeway() -> u64 {
    30
}

fn default_access_ttl() -> i64 {
    60
}
