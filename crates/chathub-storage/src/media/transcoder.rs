//! Image transcoder for message attachments.

use std::io::Cursor;

use async_trait::async_trait;
use bytes::Bytes;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat};

use chathub_core::config::attachment::AttachmentConfig;
use chathub_core::error::{AppError, ErrorKind};
use chathub_core::result::AppResult;
use chathub_core::traits::{MediaTranscoder, RoomImage, TranscodedMedia};

/// Width room images are scaled to.
const ROOM_IMAGE_WIDTH: u32 = 400;

/// Dimensions of the blur placeholder.
const BLUR_WIDTH: u32 = 6;
const BLUR_HEIGHT: u32 = 2;

/// Caps image attachments to a maximum edge length and re-encodes them.
///
/// JPEG and PNG keep their format. GIF and WebP are flattened to a single
/// PNG frame. Anything else passes through untouched.
#[derive(Debug, Clone)]
pub struct ImageTranscoder {
    max_edge: u32,
}

impl ImageTranscoder {
    /// Create a transcoder capping images to `max_edge` pixels.
    pub fn new(max_edge: u32) -> Self {
        Self { max_edge }
    }

    /// Create a transcoder from attachment configuration.
    pub fn from_config(config: &AttachmentConfig) -> Self {
        Self::new(config.max_image_edge)
    }

    /// Check if a MIME type is decoded and resized.
    pub fn is_supported(mime_type: &str) -> bool {
        matches!(
            mime_type,
            "image/jpeg" | "image/png" | "image/gif" | "image/webp"
        )
    }

    /// Decode, shrink if needed, and re-encode.
    fn resize_image(data: &[u8], mime_type: &str, max_edge: u32) -> AppResult<TranscodedMedia> {
        let source_format = ImageFormat::from_mime_type(mime_type)
            .ok_or_else(|| AppError::validation(format!("Unsupported image type {mime_type}")))?;

        let img = image::load_from_memory_with_format(data, source_format)
            .map_err(|e| AppError::validation(format!("Failed to decode image: {e}")))?;

        let img = if img.width().max(img.height()) > max_edge {
            img.resize(max_edge, max_edge, FilterType::Lanczos3)
        } else {
            img
        };

        let (img, target_format) = match source_format {
            ImageFormat::Jpeg => (DynamicImage::ImageRgb8(img.to_rgb8()), ImageFormat::Jpeg),
            _ => (img, ImageFormat::Png),
        };

        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), target_format)
            .map_err(|e| AppError::storage(format!("Failed to encode image: {e}")))?;

        Ok(TranscodedMedia {
            mime_type: target_format.to_mime_type().to_string(),
            binary: Bytes::from(buf),
        })
    }

    /// Scale to [`ROOM_IMAGE_WIDTH`] and derive the blur placeholder.
    fn render_room_image(data: &[u8], mime_type: &str) -> AppResult<RoomImage> {
        if !Self::is_supported(mime_type) {
            return Err(AppError::validation(format!(
                "Unsupported room image type {mime_type}"
            )));
        }
        let source_format = ImageFormat::from_mime_type(mime_type)
            .ok_or_else(|| AppError::validation(format!("Unsupported image type {mime_type}")))?;
        let img = image::load_from_memory_with_format(data, source_format)
            .map_err(|e| AppError::validation(format!("Failed to decode image: {e}")))?;

        let img = img.resize(ROOM_IMAGE_WIDTH, u32::MAX, FilterType::Lanczos3);
        let blur = img.resize_exact(BLUR_WIDTH, BLUR_HEIGHT, FilterType::Lanczos3);

        Ok(RoomImage {
            binary: Self::encode_jpeg(img)?,
            blur: Self::encode_jpeg(blur)?,
        })
    }

    fn encode_jpeg(img: DynamicImage) -> AppResult<Bytes> {
        let mut buf = Vec::new();
        DynamicImage::ImageRgb8(img.to_rgb8())
            .write_to(&mut Cursor::new(&mut buf), ImageFormat::Jpeg)
            .map_err(|e| AppError::storage(format!("Failed to encode image: {e}")))?;
        Ok(Bytes::from(buf))
    }
}

#[async_trait]
impl MediaTranscoder for ImageTranscoder {
    async fn transcode(&self, mime_type: &str, payload: Bytes) -> AppResult<TranscodedMedia> {
        if !Self::is_supported(mime_type) {
            return Ok(TranscodedMedia {
                mime_type: mime_type.to_string(),
                binary: payload,
            });
        }

        let mime = mime_type.to_string();
        let max_edge = self.max_edge;
        let input_len = payload.len();

        let media = tokio::task::spawn_blocking(move || Self::resize_image(&payload, &mime, max_edge))
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Internal, "Transcode task panicked", e))??;

        tracing::debug!(
            source_mime = mime_type,
            output_mime = %media.mime_type,
            input_bytes = input_len,
            output_bytes = media.binary.len(),
            "Transcoded attachment"
        );

        Ok(media)
    }

    async fn room_image(&self, mime_type: &str, payload: Bytes) -> AppResult<RoomImage> {
        let mime = mime_type.to_string();
        let image = tokio::task::spawn_blocking(move || Self::render_room_image(&payload, &mime))
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Internal, "Room image task panicked", e))??;

        tracing::debug!(
            source_mime = mime_type,
            image_bytes = image.binary.len(),
            blur_bytes = image.blur.len(),
            "Rendered room image"
        );
        Ok(image)
    }
}

#[cfg(test)]
mod tests {
    use image::{GenericImageView, RgbImage, RgbaImage};

    use super::*;

    fn encode(img: DynamicImage, format: ImageFormat) -> Bytes {
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), format)
            .expect("encode fixture");
        Bytes::from(buf)
    }

    #[tokio::test]
    async fn test_png_is_capped_on_longest_edge() {
        let png = encode(
            DynamicImage::ImageRgba8(RgbaImage::new(700, 200)),
            ImageFormat::Png,
        );
        let out = ImageTranscoder::new(350)
            .transcode("image/png", png)
            .await
            .expect("transcode");
        assert_eq!(out.mime_type, "image/png");
        let decoded = image::load_from_memory(&out.binary).expect("decode output");
        assert_eq!(decoded.dimensions(), (350, 100));
    }

    #[tokio::test]
    async fn test_jpeg_stays_jpeg() {
        let jpeg = encode(
            DynamicImage::ImageRgb8(RgbImage::new(200, 800)),
            ImageFormat::Jpeg,
        );
        let out = ImageTranscoder::new(350)
            .transcode("image/jpeg", jpeg)
            .await
            .expect("transcode");
        assert_eq!(out.mime_type, "image/jpeg");
        let decoded = image::load_from_memory(&out.binary).expect("decode output");
        assert_eq!(decoded.height(), 350);
    }

    #[tokio::test]
    async fn test_small_image_is_not_upscaled() {
        let png = encode(
            DynamicImage::ImageRgb8(RgbImage::new(40, 30)),
            ImageFormat::Png,
        );
        let out = ImageTranscoder::new(350)
            .transcode("image/png", png)
            .await
            .expect("transcode");
        let decoded = image::load_from_memory(&out.binary).expect("decode output");
        assert_eq!(decoded.dimensions(), (40, 30));
    }

    #[tokio::test]
    async fn test_gif_becomes_png() {
        let gif = encode(
            DynamicImage::ImageRgba8(RgbaImage::new(10, 10)),
            ImageFormat::Gif,
        );
        let out = ImageTranscoder::new(350)
            .transcode("image/gif", gif)
            .await
            .expect("transcode");
        assert_eq!(out.mime_type, "image/png");
    }

    #[tokio::test]
    async fn test_non_image_passes_through() {
        let payload = Bytes::from_static(b"%PDF-1.7");
        let out = ImageTranscoder::new(350)
            .transcode("application/pdf", payload.clone())
            .await
            .expect("transcode");
        assert_eq!(out.mime_type, "application/pdf");
        assert_eq!(out.binary, payload);
    }

    #[tokio::test]
    async fn test_room_image_is_scaled_to_fixed_width_with_blur() {
        let png = encode(
            DynamicImage::ImageRgba8(RgbaImage::new(800, 200)),
            ImageFormat::Png,
        );
        let out = ImageTranscoder::new(350)
            .room_image("image/png", png)
            .await
            .expect("room image");

        let image = image::load_from_memory_with_format(&out.binary, ImageFormat::Jpeg)
            .expect("decode image");
        assert_eq!(image.dimensions(), (400, 100));
        let blur = image::load_from_memory_with_format(&out.blur, ImageFormat::Jpeg)
            .expect("decode blur");
        assert_eq!(blur.dimensions(), (6, 2));
    }

    #[tokio::test]
    async fn test_room_image_rejects_non_images() {
        let err = ImageTranscoder::new(350)
            .room_image("application/pdf", Bytes::from_static(b"%PDF-1.7"))
            .await
            .expect_err("not an image");
        assert_eq!(err.kind, ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_corrupt_image_is_a_validation_error() {
        let err = ImageTranscoder::new(350)
            .transcode("image/png", Bytes::from_static(b"not a png"))
            .await
            .expect_err("corrupt payload");
        assert_eq!(err.kind, ErrorKind::Validation);
    }
}
