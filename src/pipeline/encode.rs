//! Image encoding: `DynamicImage` → base64 PNG ready for the model API.
//!
//! The Gemini API accepts images as base64 blobs embedded in the JSON
//! request body. PNG is chosen over JPEG because it is lossless — text
//! crispness matters far more than file size when the model must read
//! small-print rate and quantity columns.

use crate::error::BillscanError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::DynamicImage;
use std::io::Cursor;
use tracing::debug;

/// A base64-encoded image with its MIME type, as the model API wants it.
#[derive(Debug, Clone)]
pub struct EncodedImage {
    /// Base64 payload (no data-URI prefix).
    pub data: String,
    /// Always "image/png" in practice; kept explicit for the request body.
    pub mime_type: &'static str,
}

/// Encode a decoded bill image as a base64 PNG.
pub fn encode_image(img: &DynamicImage) -> Result<EncodedImage, BillscanError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .map_err(|e| BillscanError::Internal(format!("PNG encoding failed: {e}")))?;

    let b64 = STANDARD.encode(&buf);
    debug!("Encoded image → {} bytes base64", b64.len());

    Ok(EncodedImage {
        data: b64,
        mime_type: "image/png",
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    #[test]
    fn encode_small_image() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(10, 10, Rgba([255, 0, 0, 255])));
        let encoded = encode_image(&img).expect("encode should succeed");
        assert_eq!(encoded.mime_type, "image/png");
        assert!(!encoded.data.is_empty());
        // Verify it's valid base64
        let decoded = STANDARD.decode(&encoded.data).expect("valid base64");
        assert!(!decoded.is_empty());
    }
}
