//! Attachment upload lifecycle.

pub mod tracker;

pub use tracker::AttachmentTracker;
