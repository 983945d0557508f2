//! The hub actor and its command protocol.

pub mod actor;
pub mod command;
pub mod handle;

pub use actor::HubActor;
pub use command::{DeliveryReport, HubCommand, HubStats, Registration};
pub use handle::HubHandle;
