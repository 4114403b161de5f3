//! Base64 JPEG thumbnails for meme listings.

use std::io::Cursor;

use base64::Engine;
use image::codecs::jpeg::JpegEncoder;
use meme_core::{defaults, Error, Result, ThumbnailMaker};

/// Thumbnail maker backed by the `image` crate.
///
/// Decodes any supported image format, shrinks it to fit a square bounding
/// box (aspect ratio preserved, never upscaled), drops alpha, and encodes it
/// as base64 JPEG.
#[derive(Debug, Clone)]
pub struct ImageThumbnailer {
    max_size: u32,
    quality: u8,
}

impl ImageThumbnailer {
    pub fn new(max_size: u32, quality: u8) -> Self {
        Self { max_size, quality }
    }
}

impl Default for ImageThumbnailer {
    fn default() -> Self {
        Self::new(defaults::THUMBNAIL_SIZE, defaults::THUMBNAIL_JPEG_QUALITY)
    }
}

impl ThumbnailMaker for ImageThumbnailer {
    fn make_base64(&self, data: &[u8]) -> Result<String> {
        let img = image::load_from_memory(data)
            .map_err(|e| Error::InvalidInput(format!("Cannot decode image: {}", e)))?;

        let img = if img.width() > self.max_size || img.height() > self.max_size {
            img.thumbnail(self.max_size, self.max_size)
        } else {
            img
        };
        let rgb = img.to_rgb8();

        let mut buf = Cursor::new(Vec::new());
        JpegEncoder::new_with_quality(&mut buf, self.quality)
            .encode_image(&rgb)
            .map_err(|e| Error::Internal(format!("Cannot encode thumbnail: {}", e)))?;

        Ok(base64::engine::general_purpose::STANDARD.encode(buf.into_inner()))
    }
}
