//! Error types for the billscan library.
//!
//! Everything that can abort a request maps to one [`BillscanError`] variant.
//! Field-level problems inside the reconciliation step are deliberately *not*
//! errors: a missing `item_rate` on one line is defaulted and logged at
//! `debug!`, never surfaced to the caller. The variants here cover the three
//! stages that can genuinely fail a request — fetching the document, decoding
//! its bytes, and talking to the vision model.
//!
//! [`crate::extract::extract_bill_to_envelope`] catches every variant and
//! folds it into the response envelope's `error` field, so callers of the
//! envelope API never see a `Result` at all.

use thiserror::Error;

/// All errors returned by the billscan library.
#[derive(Debug, Error)]
pub enum BillscanError {
    // ── Fetch errors ──────────────────────────────────────────────────────
    /// The document reference is not an HTTP/HTTPS URL.
    #[error("Invalid document URL '{input}': expected an http:// or https:// URL")]
    InvalidUrl { input: String },

    /// The document URL was syntactically valid but the download failed
    /// (transport error or non-success HTTP status).
    #[error("Failed to download document '{url}': {reason}")]
    FetchFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'")]
    FetchTimeout { url: String, secs: u64 },

    // ── Decode errors ─────────────────────────────────────────────────────
    /// The downloaded bytes are not a decodable image.
    #[error("Document is not a decodable image: {detail}")]
    DecodeFailed { detail: String },

    // ── Model errors ──────────────────────────────────────────────────────
    /// No vision model is available (missing API key etc.).
    #[error("Vision model is not configured.\n{hint}")]
    ModelNotConfigured { hint: String },

    /// The vision model API returned an error.
    #[error("Vision model call failed: {message}")]
    ModelFailed { message: String },

    /// The vision model call exceeded the configured timeout.
    #[error("Vision model call timed out after {elapsed_ms}ms")]
    ApiTimeout { elapsed_ms: u64 },

    /// The model responded, but the text is not parseable JSON.
    #[error("Vision model returned unparseable output: {detail}")]
    MalformedResponse { detail: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetch_failed_display() {
        let e = BillscanError::FetchFailed {
            url: "https://example.com/bill.png".into(),
            reason: "HTTP 404 Not Found".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("bill.png"), "got: {msg}");
        assert!(msg.contains("404"), "got: {msg}");
    }

    #[test]
    fn fetch_timeout_display() {
        let e = BillscanError::FetchTimeout {
            url: "https://example.com/bill.png".into(),
            secs: 10,
        };
        assert!(e.to_string().contains("10s"));
    }

    #[test]
    fn malformed_response_display() {
        let e = BillscanError::MalformedResponse {
            detail: "expected value at line 1 column 1".into(),
        };
        assert!(e.to_string().contains("unparseable"));
    }

    #[test]
    fn model_not_configured_display() {
        let e = BillscanError::ModelNotConfigured {
            hint: "Set GEMINI_API_KEY or pass api_key in the config.".into(),
        };
        assert!(e.to_string().contains("GEMINI_API_KEY"));
    }
}
