//! Application configuration schemas.
//!
//! All configuration structs are deserialized from TOML files via the
//! `config` crate. Each sub-module represents a logical configuration
//! section. Every field carries a serde default so an empty file (or no
//! file at all) yields a runnable configuration.

pub mod app;
pub mod attachment;
pub mod auth;
pub mod logging;
pub mod rate_limit;
pub mod realtime;
pub mod retention;

use serde::{Deserialize, Serialize};

use self::app::ServerConfig;
use self::attachment::AttachmentConfig;
use self::auth::AuthConfig;
use self::logging::LoggingConfig;
use self::rate_limit::RateLimitConfig;
use self::realtime::RealtimeConfig;
use self::retention::RetentionConfig;

use crate::error::AppError;

/// Root application configuration.
///
/// This struct is the top-level deserialization target for the merged
/// TOML configuration files (default.toml + environment overlay).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Token verification settings.
    #[serde(default)]
    pub auth: AuthConfig,
    /// Real-time hub settings.
    #[serde(default)]
    pub realtime: RealtimeConfig,
    /// Attachment upload and transcoding settings.
    #[serde(default)]
    pub attachments: AttachmentConfig,
    /// Message retention sweep settings.
    #[serde(default)]
    pub retention: RetentionConfig,
    /// Per-user send throttling.
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from TOML files.
    ///
    /// Merges the default configuration with an environment-specific overlay
    /// and environment variables prefixed with `CHATHUB__`.
    pub fn load(env: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("CHATHUB")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        let config: Self = config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that deserialize but cannot be used.
    pub fn validate(&self) -> Result<(), AppError> {
        self.retention.message_ttl()?;
        Ok(())
    }
}
