//! Image encoding: rendered page PNG → base64 `ImageData`.
//!
//! Used only by the vision OCR engine. The rasteriser already writes PNG, so
//! the bytes are wrapped as-is; PNG is lossless, and text crispness matters
//! far more than payload size for transcription accuracy.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use edgequake_llm::ImageData;
use tracing::debug;

/// PNG signature, checked before bytes are sent to a vision model.
const PNG_MAGIC: [u8; 8] = [0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1A, b'\n'];

/// Wrap a rendered page PNG as base64 `ImageData` ready for the vision API.
///
/// `detail: "high"` lets GPT-4-class models tile the page at full resolution;
/// the low-detail overview loses statement fine print.
pub fn encode_png(png: &[u8]) -> Result<ImageData, image::ImageError> {
    if !png.starts_with(&PNG_MAGIC) {
        // Not a PNG: decode whatever it is and re-encode.
        let img = image::load_from_memory(png)?;
        let mut buf = Vec::new();
        img.write_to(&mut std::io::Cursor::new(&mut buf), image::ImageFormat::Png)?;
        return Ok(wrap(&buf));
    }
    Ok(wrap(png))
}

fn wrap(png: &[u8]) -> ImageData {
    let b64 = STANDARD.encode(png);
    debug!("Encoded page image → {} bytes base64", b64.len());
    ImageData::new(b64, "image/png").with_detail("high")
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, Rgba, RgbaImage};
    use std::io::Cursor;

    fn sample(format: image::ImageFormat) -> Vec<u8> {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(10, 10, Rgba([255, 0, 0, 255])));
        let mut buf = Vec::new();
        img.to_rgb8()
            .write_to(&mut Cursor::new(&mut buf), format)
            .expect("encode sample");
        buf
    }

    #[test]
    fn png_is_wrapped_verbatim() {
        let png = sample(image::ImageFormat::Png);
        let data = encode_png(&png).expect("encode should succeed");
        assert_eq!(data.mime_type, "image/png");
        assert_eq!(STANDARD.decode(&data.data).expect("valid base64"), png);
    }

    #[test]
    fn jpeg_is_reencoded_as_png() {
        let jpeg = sample(image::ImageFormat::Jpeg);
        let data = encode_png(&jpeg).expect("encode should succeed");
        let decoded = STANDARD.decode(&data.data).expect("valid base64");
        assert!(decoded.starts_with(&PNG_MAGIC));
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(encode_png(b"definitely not an image").is_err());
    }
}
