//! # chathub-core
//!
//! Core crate for ChatHub. Contains the collaborator traits the real-time
//! hub talks through (persistence, change feed, media transcoding, per-user
//! resources), configuration schemas, typed identifiers, the persisted
//! room/message model, domain events, and the unified error system.
//!
//! This crate has **no** internal dependencies on other ChatHub crates.

pub mod config;
pub mod error;
pub mod events;
pub mod result;
pub mod traits;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
