//! Image XObject construction.
//!
//! JPEG sources embed unmodified behind a DCTDecode filter; everything
//! else (and any photo that had annotations flattened onto it) embeds as
//! a zlib-compressed raw RGB raster behind FlateDecode.

use std::io::Write;

use flate2::write::ZlibEncoder;
use flate2::Compression;
use image::RgbImage;
use lopdf::{dictionary, Object, Stream};

use crate::error::ExportError;

pub struct PageImage {
    pub width: u32,
    pub height: u32,
    pub stream: Stream,
}

pub fn jpeg_xobject(bytes: Vec<u8>, width: u32, height: u32) -> PageImage {
    let dict = dictionary! {
        "Type" => "XObject",
        "Subtype" => "Image",
        "Width" => Object::Integer(width as i64),
        "Height" => Object::Integer(height as i64),
        "ColorSpace" => "DeviceRGB",
        "BitsPerComponent" => Object::Integer(8),
        "Filter" => "DCTDecode",
    };
    PageImage {
        width,
        height,
        stream: Stream::new(dict, bytes),
    }
}

pub fn rgb_xobject(raster: &RgbImage) -> Result<PageImage, ExportError> {
    let (width, height) = raster.dimensions();
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(raster.as_raw())
        .map_err(|e| ExportError::Pdf(e.to_string()))?;
    let data = encoder
        .finish()
        .map_err(|e| ExportError::Pdf(e.to_string()))?;

    let dict = dictionary! {
        "Type" => "XObject",
        "Subtype" => "Image",
        "Width" => Object::Integer(width as i64),
        "Height" => Object::Integer(height as i64),
        "ColorSpace" => "DeviceRGB",
        "BitsPerComponent" => Object::Integer(8),
        "Filter" => "FlateDecode",
    };
    Ok(PageImage {
        width,
        height,
        stream: Stream::new(dict, data),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_jpeg_xobject_keeps_bytes_verbatim() {
        let bytes = vec![0xff, 0xd8, 0xff, 0xe0, 0x00];
        let image = jpeg_xobject(bytes.clone(), 4, 3);
        assert_eq!(image.stream.content, bytes);
        assert_eq!(
            image.stream.dict.get(b"Filter").unwrap(),
            &Object::Name(b"DCTDecode".to_vec())
        );
    }

    #[test]
    fn test_rgb_xobject_compresses_raster() {
        let raster = RgbImage::from_pixel(8, 8, Rgb([200, 10, 10]));
        let image = rgb_xobject(&raster).unwrap();
        assert_eq!((image.width, image.height), (8, 8));
        // Uniform data compresses well below the raw 8*8*3 bytes.
        assert!(image.stream.content.len() < 192);
        assert_eq!(
            image.stream.dict.get(b"Filter").unwrap(),
            &Object::Name(b"FlateDecode".to_vec())
        );
    }
}
