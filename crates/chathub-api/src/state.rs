//! Application state shared across all handlers.

use std::sync::Arc;

use chathub_auth::JwtDecoder;
use chathub_core::config::AppConfig;
use chathub_core::traits::{ChangeFeed, ChatStore, MediaTranscoder};
use chathub_realtime::RealtimeEngine;

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<AppState>`.
/// All fields are `Arc`-wrapped for cheap cloning across tasks.
#[derive(Debug, Clone)]
pub struct AppState {
    // ── Configuration ────────────────────────────────────────
    /// Application configuration
    pub config: Arc<AppConfig>,

    // ── Infrastructure ───────────────────────────────────────
    /// Room, message and attachment persistence
    pub store: Arc<dyn ChatStore>,
    /// Image normalization for uploads
    pub transcoder: Arc<dyn MediaTranscoder>,
    /// Account change feed the hub listens on
    pub change_feed: Arc<dyn ChangeFeed>,

    // ── Auth ─────────────────────────────────────────────────
    /// JWT token decoder and validator
    pub jwt_decoder: Arc<JwtDecoder>,

    // ── Realtime ─────────────────────────────────────────────
    /// WebSocket realtime engine
    pub realtime: Arc<RealtimeEngine>,
}

impl AppState {
    /// Assemble the state from already-built components.
    pub fn new(
        config: Arc<AppConfig>,
        store: Arc<dyn ChatStore>,
        transcoder: Arc<dyn MediaTranscoder>,
        change_feed: Arc<dyn ChangeFeed>,
        jwt_decoder: Arc<JwtDecoder>,
        realtime: Arc<RealtimeEngine>,
    ) -> Self {
        Self {
            config,
            store,
            transcoder,
            change_feed,
            jwt_decoder,
            realtime,
        }
    }
}
