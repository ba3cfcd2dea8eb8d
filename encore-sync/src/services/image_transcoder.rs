//! Image transcoding to WebP

use image::ImageFormat;
use std::io::Cursor;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TranscodeError {
    #[error("Decode failed: {0}")]
    Decode(String),

    #[error("Encode failed: {0}")]
    Encode(String),
}

/// Binary-in, binary-out image conversion
pub trait ImageTranscoder: Send + Sync {
    fn transcode(&self, bytes: &[u8]) -> Result<Vec<u8>, TranscodeError>;
}

/// Lossless WebP encoder for any format `image` can decode (PNG, JPEG, WebP)
#[derive(Debug, Clone, Copy, Default)]
pub struct WebpTranscoder;

impl ImageTranscoder for WebpTranscoder {
    fn transcode(&self, bytes: &[u8]) -> Result<Vec<u8>, TranscodeError> {
        let decoded =
            image::load_from_memory(bytes).map_err(|e| TranscodeError::Decode(e.to_string()))?;

        // The WebP encoder only accepts 8-bit L/LA/RGB/RGBA buffers
        let rgba = image::DynamicImage::ImageRgba8(decoded.to_rgba8());

        let mut out = Cursor::new(Vec::new());
        rgba.write_to(&mut out, ImageFormat::WebP)
            .map_err(|e| TranscodeError::Encode(e.to_string()))?;

        Ok(out.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn png_bytes() -> Vec<u8> {
        let img = RgbaImage::from_pixel(4, 4, Rgba([200, 30, 30, 255]));
        let mut out = Cursor::new(Vec::new());
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut out, ImageFormat::Png)
            .unwrap();
        out.into_inner()
    }

    #[test]
    fn test_png_to_webp() {
        let webp = WebpTranscoder.transcode(&png_bytes()).unwrap();
        assert_eq!(&webp[0..4], b"RIFF");
        assert_eq!(&webp[8..12], b"WEBP");
    }

    #[test]
    fn test_garbage_is_decode_error() {
        let result = WebpTranscoder.transcode(b"not an image");
        assert!(matches!(result, Err(TranscodeError::Decode(_))));
    }
}
