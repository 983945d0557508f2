//! Request handlers, one module per resource.

pub mod attachment;
pub mod health;
pub mod room;
pub mod user;
pub mod ws;
