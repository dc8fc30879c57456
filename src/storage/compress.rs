use std::io::Cursor;

use image::DynamicImage;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;

use crate::errors::StorageError;

/// Re-encodes `data` as JPEG at `quality`, downscaling so neither dimension
/// exceeds `max_dimension`. Alpha is dropped and palette images flatten to
/// RGB; images already within bounds are never upscaled.
pub fn compress_to_jpeg(
    data: &[u8],
    max_dimension: u32,
    quality: u8,
) -> Result<Vec<u8>, StorageError> {
    let decoded = image::load_from_memory(data)
        .map_err(|e| StorageError::Compress(format!("decode failed: {e}")))?;

    let image = DynamicImage::ImageRgb8(decoded.to_rgb8());

    let image = if image.width().max(image.height()) > max_dimension {
        image.resize(max_dimension, max_dimension, FilterType::Lanczos3)
    } else {
        image
    };

    let mut buf = Cursor::new(Vec::new());
    let encoder = JpegEncoder::new_with_quality(&mut buf, quality);
    image
        .write_with_encoder(encoder)
        .map_err(|e| StorageError::Compress(format!("encode failed: {e}")))?;

    Ok(buf.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgba, RgbaImage};

    fn rgba_png(width: u32, height: u32) -> Vec<u8> {
        let mut img = RgbaImage::new(width, height);
        for pixel in img.pixels_mut() {
            *pixel = Rgba([10, 120, 200, 64]);
        }
        let mut buf = Cursor::new(Vec::new());
        DynamicImage::ImageRgba8(img)
            .write_to(&mut buf, ImageFormat::Png)
            .unwrap();
        buf.into_inner()
    }

    fn dimensions(jpeg: &[u8]) -> (u32, u32) {
        let decoded = image::load_from_memory(jpeg).unwrap();
        (decoded.width(), decoded.height())
    }

    #[test]
    fn output_is_jpeg_even_for_alpha_sources() {
        let out = compress_to_jpeg(&rgba_png(40, 40), 128, 80).unwrap();
        assert_eq!(image::guess_format(&out).unwrap(), ImageFormat::Jpeg);
    }

    #[test]
    fn landscape_downscale_caps_longer_side() {
        let out = compress_to_jpeg(&rgba_png(512, 256), 128, 80).unwrap();
        assert_eq!(dimensions(&out), (128, 64));
    }

    #[test]
    fn portrait_downscale_caps_longer_side() {
        let out = compress_to_jpeg(&rgba_png(256, 512), 128, 80).unwrap();
        assert_eq!(dimensions(&out), (64, 128));
    }

    #[test]
    fn in_bounds_images_keep_their_dimensions() {
        let out = compress_to_jpeg(&rgba_png(100, 50), 128, 80).unwrap();
        assert_eq!(dimensions(&out), (100, 50));
    }

    #[test]
    fn small_images_are_never_upscaled() {
        let out = compress_to_jpeg(&rgba_png(16, 8), 1920, 80).unwrap();
        assert_eq!(dimensions(&out), (16, 8));
    }

    #[test]
    fn garbage_input_is_a_compress_error() {
        let err = compress_to_jpeg(&[0u8; 16], 128, 80).unwrap_err();
        assert!(matches!(err, StorageError::Compress(_)));
    }
}
