//! Per-user throttling configuration.

use serde::{Deserialize, Serialize};

/// Token bucket parameters applied per user to message sends and uploads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Whether throttling is applied.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Bucket capacity (burst size).
    #[serde(default = "default_burst")]
    pub burst: u32,
    /// Tokens refilled per second.
    #[serde(default = "default_per_second")]
    pub per_second: f64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            burst: default_burst(),
            per_second: default_per_second(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_burst() -> u32 {
    10
}

fn default_per_second() -> f64 {
    2.0
}
