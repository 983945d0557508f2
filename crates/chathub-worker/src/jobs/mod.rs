//! Built-in job implementations.

pub mod retention;

pub use retention::{RetentionSummary, RetentionSweep};
