//! Live connection bookkeeping.

pub mod handle;
pub mod registry;

pub use handle::{ConnectionHandle, Delivery};
pub use registry::ConnectionRegistry;
