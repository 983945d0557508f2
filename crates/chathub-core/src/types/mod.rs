//! Core type definitions used across the ChatHub workspace.

pub mod id;
pub mod message;

pub use id::*;
pub use message::{Attachment, AttachmentState, AttachmentUpdate, Message, RoomRecord};
