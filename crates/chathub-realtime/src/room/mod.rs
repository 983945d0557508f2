//! Ephemeral room membership.

pub mod membership;
pub mod room;

pub use membership::RoomMembership;
pub use room::Room;
