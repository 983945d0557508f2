//! Attachment media processing.

pub mod transcoder;

pub use transcoder::ImageTranscoder;
