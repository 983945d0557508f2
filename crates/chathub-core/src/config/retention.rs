//! Message retention configuration.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Longest accepted message TTL, one year.
pub const MAX_MESSAGE_TTL_MINUTES: i64 = 365 * 24 * 60;

/// Scheduled removal of old chat messages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetentionConfig {
    /// Whether the sweep is scheduled at all.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Messages older than this are removed.
    #[serde(default = "default_message_ttl")]
    pub message_ttl_minutes: i64,
    /// Cron expression (with seconds) for the sweep.
    #[serde(default = "default_sweep_cron")]
    pub sweep_cron: String,
}

impl RetentionConfig {
    /// The message TTL. Fails unless it lies between one minute and
    /// [`MAX_MESSAGE_TTL_MINUTES`].
    pub fn message_ttl(&self) -> Result<Duration, AppError> {
        let minutes = self.message_ttl_minutes;
        if !(1..=MAX_MESSAGE_TTL_MINUTES).contains(&minutes) {
            return Err(AppError::configuration(format!(
                "retention.message_ttl_minutes must be between 1 and {MAX_MESSAGE_TTL_MINUTES}, got {minutes}"
            )));
        }
        Duration::try_minutes(minutes).ok_or_else(|| {
            AppError::configuration(format!("retention.message_ttl_minutes out of range: {minutes}"))
        })
    }
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            message_ttl_minutes: default_message_ttl(),
            sweep_cron: default_sweep_cron(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_message_ttl() -> i64 {
    20
}

fn default_sweep_cron() -> String {
    "0 * * * * *".to_string()
}
