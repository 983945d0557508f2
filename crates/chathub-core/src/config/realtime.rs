//! Real-time hub configuration.

use serde::{Deserialize, Serialize};

/// Real-time (WebSocket hub) configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealtimeConfig {
    /// Capacity of each connection's outbound queue. Events to a full queue
    /// are dropped for that peer.
    #[serde(default = "default_outbound_buffer")]
    pub outbound_buffer_size: usize,
    /// Capacity of the hub's command queue.
    #[serde(default = "default_command_buffer")]
    pub command_buffer_size: usize,
    /// Maximum chat message length in characters.
    #[serde(default = "default_max_message_length")]
    pub max_message_length: usize,
    /// Per-frame socket write timeout in seconds.
    #[serde(default = "default_write_timeout")]
    pub write_timeout_seconds: u64,
    /// How long a processed user deletion is remembered to suppress
    /// re-delivered notifications.
    #[serde(default = "default_tombstone_ttl")]
    pub deletion_tombstone_ttl_seconds: u64,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            outbound_buffer_size: default_outbound_buffer(),
            command_buffer_size: default_command_buffer(),
            max_message_length: default_max_message_length(),
            write_timeout_seconds: default_write_timeout(),
            deletion_tombstone_ttl_seconds: default_tombstone_ttl(),
        }
    }
}

fn default_outbound_buffer() -> usize {
    256
}

fn default_command_buffer() -> usize {
    1024
}

fn default_max_message_length() -> usize {
    200
}

fn default_write_timeout() -> u64 {
    10
}

fn default_tombstone_ttl() -> u64 {
    3600
}
