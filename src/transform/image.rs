//! Image recompression.
//!
//! PNG and JPEG files are decoded and re-encoded, which strips metadata
//! and normalizes compression. Everything else (SVG, GIF, WebP, ICO)
//! is copied through unchanged.

use std::io::Cursor;
use std::path::Path;

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::ImageEncoder;

use super::TransformError;
use crate::config::BuildConfig;

/// Optimize one image file, returning the (possibly identical) bytes.
pub fn optimize(content: &[u8], path: &Path, config: &BuildConfig) -> Result<Vec<u8>, TransformError> {
    if !config.images {
        return Ok(content.to_vec());
    }

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    let encoded = match ext.as_deref() {
        Some("png") => reencode_png(content)?,
        Some("jpg" | "jpeg") => reencode_jpeg(content, config.jpeg_quality)?,
        _ => return Ok(content.to_vec()),
    };

    // Re-encoding is not guaranteed to shrink; keep the smaller variant
    if encoded.len() < content.len() {
        Ok(encoded)
    } else {
        Ok(content.to_vec())
    }
}

fn reencode_png(content: &[u8]) -> Result<Vec<u8>, TransformError> {
    let img = image::load_from_memory(content).map_err(|e| TransformError::Image(e.to_string()))?;

    let mut out = Vec::new();
    let encoder = PngEncoder::new_with_quality(
        Cursor::new(&mut out),
        CompressionType::Best,
        FilterType::Adaptive,
    );
    encoder
        .write_image(img.as_bytes(), img.width(), img.height(), img.color().into())
        .map_err(|e| TransformError::Image(e.to_string()))?;
    Ok(out)
}

fn reencode_jpeg(content: &[u8], quality: u8) -> Result<Vec<u8>, TransformError> {
    let img = image::load_from_memory(content).map_err(|e| TransformError::Image(e.to_string()))?;

    let mut out = Vec::new();
    let encoder = JpegEncoder::new_with_quality(Cursor::new(&mut out), quality.clamp(1, 100));
    encoder
        .write_image(img.as_bytes(), img.width(), img.height(), img.color().into())
        .map_err(|e| TransformError::Image(e.to_string()))?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn sample_png() -> Vec<u8> {
        let img = image::RgbaImage::from_fn(16, 16, |x, y| {
            image::Rgba([(x * 16) as u8, (y * 16) as u8, 128, 255])
        });
        let mut out = Vec::new();
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut out), image::ImageFormat::Png)
            .unwrap();
        out
    }

    #[test]
    fn test_png_reencode_valid() {
        let config = BuildConfig::default();
        let input = sample_png();
        let out = optimize(&input, &PathBuf::from("logo.png"), &config).unwrap();
        assert!(image::load_from_memory(&out).is_ok());
        assert!(out.len() <= input.len());
    }

    #[test]
    fn test_unknown_format_copied() {
        let config = BuildConfig::default();
        let input = b"<svg xmlns=\"http://www.w3.org/2000/svg\"/>".to_vec();
        let out = optimize(&input, &PathBuf::from("icon.svg"), &config).unwrap();
        assert_eq!(out, input);
    }

    #[test]
    fn test_corrupt_image_is_per_file_error() {
        let config = BuildConfig::default();
        let err = optimize(b"not a png", &PathBuf::from("broken.png"), &config);
        assert!(matches!(err, Err(TransformError::Image(_))));
    }

    #[test]
    fn test_images_disabled_passthrough() {
        let config = BuildConfig {
            images: false,
            ..BuildConfig::default()
        };
        let input = b"not a png".to_vec();
        let out = optimize(&input, &PathBuf::from("broken.png"), &config).unwrap();
        assert_eq!(out, input);
    }
}
