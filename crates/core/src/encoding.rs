//! JPEG encoding of served frames.

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::RgbImage;

use crate::error::CoreError;

/// JPEG quality used when none is configured.
pub const DEFAULT_JPEG_QUALITY: u8 = 50;

/// Encode an RGB frame as a JPEG. `quality` is clamped to 1..=100.
pub fn encode_jpeg(image: &RgbImage, quality: u8) -> Result<Vec<u8>, CoreError> {
    let mut out = Cursor::new(Vec::new());
    JpegEncoder::new_with_quality(&mut out, quality.clamp(1, 100))
        .encode_image(image)
        .map_err(|e| CoreError::Internal(format!("JPEG encoding failed: {e}")))?;
    Ok(out.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn produces_jpeg_magic() {
        let image = RgbImage::from_pixel(16, 8, image::Rgb([200, 10, 10]));
        let bytes = encode_jpeg(&image, DEFAULT_JPEG_QUALITY).unwrap();
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);

        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (16, 8));
    }

    #[test]
    fn quality_zero_is_clamped() {
        let image = RgbImage::new(4, 4);
        assert!(encode_jpeg(&image, 0).is_ok());
    }
}
