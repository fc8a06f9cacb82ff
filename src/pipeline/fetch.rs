//! Image resolution: download the document URL and decode it into pixels.
//!
//! ## Why decode here?
//!
//! "The bytes arrived" and "the bytes are an image" are different claims.
//! Decoding immediately after download means a corrupt or mislabelled file
//! fails with a [`BillscanError::DecodeFailed`] naming the real problem,
//! instead of surfacing later as a confusing model-side rejection. The
//! decoded image never touches disk: it lives in memory for the lifetime of
//! the request and is re-encoded to PNG by the next stage.

use crate::error::BillscanError;
use image::DynamicImage;
use std::time::Duration;
use tracing::{debug, info};

/// Check if the input string looks like a URL we can fetch.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Download the document at `url` and decode it into an image.
///
/// The whole request (connect + body) is bounded by `timeout_secs`. Any
/// transport failure or non-success status maps to
/// [`BillscanError::FetchFailed`]; a timeout maps to
/// [`BillscanError::FetchTimeout`]; undecodable bytes map to
/// [`BillscanError::DecodeFailed`].
pub async fn fetch_image(url: &str, timeout_secs: u64) -> Result<DynamicImage, BillscanError> {
    if !is_url(url) {
        return Err(BillscanError::InvalidUrl {
            input: url.to_string(),
        });
    }

    info!("Downloading bill image from: {}", url);

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| BillscanError::FetchFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            BillscanError::FetchTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            BillscanError::FetchFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    })?;

    if !response.status().is_success() {
        return Err(BillscanError::FetchFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    let bytes = response.bytes().await.map_err(|e| {
        if e.is_timeout() {
            BillscanError::FetchTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            BillscanError::FetchFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    })?;

    debug!("Downloaded {} bytes", bytes.len());
    decode_image(&bytes)
}

/// Decode raw bytes into an image, guessing the format from the content.
pub fn decode_image(bytes: &[u8]) -> Result<DynamicImage, BillscanError> {
    let img = image::load_from_memory(bytes).map_err(|e| BillscanError::DecodeFailed {
        detail: e.to_string(),
    })?;

    debug!("Decoded image: {}x{}", img.width(), img.height());
    Ok(img)
}
