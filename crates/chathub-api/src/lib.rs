//! # chathub-api
//!
//! HTTP API layer for ChatHub built on Axum.
//!
//! Provides the room and attachment endpoints, explicit account deletion,
//! the WebSocket upgrade that feeds the real-time hub, extractors, DTOs,
//! and error mapping.

pub mod dto;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod router;
pub mod state;

pub use router::build_router;
pub use state::AppState;
