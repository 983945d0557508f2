//! Domain events consumed by the real-time hub.
//!
//! Events arrive either from ChatHub's own HTTP surface or from the
//! external change feed, and are translated into hub broadcasts.

pub mod room;
pub mod user;

pub use room::RoomEvent;
pub use user::UserEvent;
