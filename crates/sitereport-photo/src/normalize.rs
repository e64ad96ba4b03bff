//! Upload gate and orientation normalization.

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageDecoder, ImageFormat, ImageReader};
use tracing::debug;

use crate::error::PhotoError;

/// Uploads above this size are rejected before any decode work.
pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// Re-encode quality for JPEG output.
const JPEG_QUALITY: u8 = 95;

/// Validate an upload before it reaches the normalizer. These are entry
/// gates, not normalization: the payload is untouched.
pub fn check_upload(bytes: &[u8], mime: &str) -> Result<(), PhotoError> {
    if !mime.starts_with("image/") {
        return Err(PhotoError::UnsupportedType(mime.to_string()));
    }
    if bytes.len() > MAX_UPLOAD_BYTES {
        return Err(PhotoError::TooLarge {
            size: bytes.len(),
            limit: MAX_UPLOAD_BYTES,
        });
    }
    Ok(())
}

/// An orientation-normalized raster plus its decoded dimensions.
#[derive(Debug, Clone)]
pub struct Normalized {
    pub bytes: Vec<u8>,
    pub mime: &'static str,
    pub width: u32,
    pub height: u32,
}

/// Decode the source into a fixed-origin raster and re-encode it fresh.
///
/// Any EXIF orientation is baked into the pixels and the metadata is
/// dropped with the re-encode, so the output displays upright everywhere.
/// PNG sources stay PNG to keep transparency; everything else becomes
/// JPEG. Callers fall back to the original bytes on `Decode` errors
/// rather than failing the upload.
pub fn normalize(bytes: &[u8]) -> Result<Normalized, PhotoError> {
    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| PhotoError::Decode(e.to_string()))?;
    let format = reader
        .format()
        .ok_or_else(|| PhotoError::Decode("unrecognized image format".to_string()))?;

    let mut decoder = reader
        .into_decoder()
        .map_err(|e| PhotoError::Decode(e.to_string()))?;
    let orientation = decoder
        .orientation()
        .map_err(|e| PhotoError::Decode(e.to_string()))?;
    let mut img =
        DynamicImage::from_decoder(decoder).map_err(|e| PhotoError::Decode(e.to_string()))?;
    img.apply_orientation(orientation);

    let (width, height) = (img.width(), img.height());
    debug!(?format, width, height, "photo normalized");

    match format {
        ImageFormat::Png => {
            let mut out = Vec::new();
            img.write_to(&mut Cursor::new(&mut out), ImageFormat::Png)
                .map_err(|e| PhotoError::Decode(e.to_string()))?;
            Ok(Normalized {
                bytes: out,
                mime: "image/png",
                width,
                height,
            })
        }
        _ => {
            let rgb = img.to_rgb8();
            let mut out = Vec::new();
            let mut encoder = JpegEncoder::new_with_quality(&mut out, JPEG_QUALITY);
            encoder
                .encode_image(&rgb)
                .map_err(|e| PhotoError::Decode(e.to_string()))?;
            Ok(Normalized {
                bytes: out,
                mime: "image/jpeg",
                width,
                height,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = RgbaImage::from_pixel(width, height, Rgba([10, 200, 30, 255]));
        let mut out = Vec::new();
        DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut out), ImageFormat::Png)
            .unwrap();
        out
    }

    fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            width,
            height,
            Rgba([10, 200, 30, 255]),
        ))
        .to_rgb8();
        let mut out = Vec::new();
        let mut encoder = JpegEncoder::new_with_quality(&mut out, 90);
        encoder.encode_image(&img).unwrap();
        out
    }

    #[test]
    fn test_gate_rejects_non_image_mime() {
        let err = check_upload(b"hello", "text/plain").unwrap_err();
        assert!(matches!(err, PhotoError::UnsupportedType(_)));
    }

    #[test]
    fn test_gate_rejects_oversized_payload() {
        let payload = vec![0u8; MAX_UPLOAD_BYTES + 1];
        let err = check_upload(&payload, "image/jpeg").unwrap_err();
        assert!(matches!(
            err,
            PhotoError::TooLarge { size, .. } if size == MAX_UPLOAD_BYTES + 1
        ));
    }

    #[test]
    fn test_gate_accepts_image_at_the_limit() {
        let payload = vec![0u8; MAX_UPLOAD_BYTES];
        assert!(check_upload(&payload, "image/png").is_ok());
    }

    #[test]
    fn test_normalize_png_keeps_format_and_dimensions() {
        let src = png_bytes(12, 7);
        let normalized = normalize(&src).unwrap();
        assert_eq!(normalized.mime, "image/png");
        assert_eq!((normalized.width, normalized.height), (12, 7));

        let decoded = image::load_from_memory(&normalized.bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (12, 7));
    }

    #[test]
    fn test_normalize_jpeg_re_encodes_as_jpeg() {
        let src = jpeg_bytes(16, 9);
        let normalized = normalize(&src).unwrap();
        assert_eq!(normalized.mime, "image/jpeg");
        assert_eq!((normalized.width, normalized.height), (16, 9));

        let decoded = image::load_from_memory(&normalized.bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (16, 9));
    }

    #[test]
    fn test_normalize_rejects_garbage() {
        let err = normalize(b"definitely not an image").unwrap_err();
        assert!(matches!(err, PhotoError::Decode(_)));
    }
}
