//! WebSocket message types and validation.

pub mod types;
pub mod validator;

pub use types::{ChatPayload, HubEvent, InboundMessage, OutboundMessage};
pub use validator::MessageValidator;
