//! Media transcoding trait for attachment uploads.

use async_trait::async_trait;
use bytes::Bytes;

use crate::result::AppResult;

/// Output of a transcode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscodedMedia {
    /// MIME type of `binary`, which may differ from the input type.
    pub mime_type: String,
    /// Encoded payload.
    pub binary: Bytes,
}

/// A room image ready for storage. Both images are JPEG.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomImage {
    /// The normalized image.
    pub binary: Bytes,
    /// A tiny rendition shown while `binary` loads.
    pub blur: Bytes,
}

/// Normalizes an uploaded payload before storage.
#[async_trait]
pub trait MediaTranscoder: Send + Sync + std::fmt::Debug + 'static {
    /// Transcode `payload` declared as `mime_type`. Payloads the transcoder
    /// does not handle are returned unchanged.
    async fn transcode(&self, mime_type: &str, payload: Bytes) -> AppResult<TranscodedMedia>;

    /// Normalize a room image and derive its blur placeholder. Fails with
    /// `Validation` when `payload` is not a decodable image.
    async fn room_image(&self, mime_type: &str, payload: Bytes) -> AppResult<RoomImage>;
}
