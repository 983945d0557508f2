//! Attachment upload configuration.

use serde::{Deserialize, Serialize};

/// Attachment size and image transcoding limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttachmentConfig {
    /// Maximum accepted payload size in bytes, checked before decoding.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,
    /// Longest edge, in pixels, that stored images are capped to.
    #[serde(default = "default_max_image_edge")]
    pub max_image_edge: u32,
}

impl Default for AttachmentConfig {
    fn default() -> Self {
        Self {
            max_bytes: default_max_bytes(),
            max_image_edge: default_max_image_edge(),
        }
    }
}

fn default_max_bytes() -> usize {
    20 * 1024 * 1024
}

fn default_max_image_edge() -> u32 {
    350
}
