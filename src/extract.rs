//! Extraction entry points.
//!
//! Two flavours of the same pipeline:
//!
//! * [`extract_bill`] — returns `Result`, for library callers who want to
//!   branch on the concrete [`BillscanError`].
//! * [`extract_bill_to_envelope`] — never fails; every error is folded into
//!   the [`ResponseEnvelope`], which is what the HTTP wrapper serves. The
//!   envelope contract is that "this document could not be processed" is a
//!   structured payload, not a transport fault.

use crate::config::ExtractionConfig;
use crate::error::BillscanError;
use crate::output::{ExtractionResult, ResponseEnvelope};
use crate::pipeline::{encode, fetch, model, reconcile};
use std::time::Instant;
use tracing::{info, warn};

/// Extract and reconcile line items from the bill image at `document_url`.
///
/// Pipeline: fetch → encode → model → reconcile. The first three stages can
/// fail; reconciliation is total and cannot.
///
/// # Errors
/// * [`BillscanError::InvalidUrl`] / [`BillscanError::FetchFailed`] /
///   [`BillscanError::FetchTimeout`] — the document could not be retrieved
/// * [`BillscanError::DecodeFailed`] — the bytes are not an image
/// * [`BillscanError::ModelNotConfigured`] / [`BillscanError::ModelFailed`] /
///   [`BillscanError::ApiTimeout`] / [`BillscanError::MalformedResponse`] —
///   the vision model call failed or returned unusable output
pub async fn extract_bill(
    document_url: impl AsRef<str>,
    config: &ExtractionConfig,
) -> Result<ExtractionResult, BillscanError> {
    let start = Instant::now();
    let document_url = document_url.as_ref();
    info!("Starting extraction: {}", document_url);

    // ── Step 1: Fetch and decode the document image ──────────────────────
    let image = fetch::fetch_image(document_url, config.fetch_timeout_secs).await?;

    // ── Step 2: Encode for the multimodal request body ───────────────────
    let encoded = encode::encode_image(&image)?;

    // ── Step 3: Ask the vision model for the raw line-item tree ──────────
    let vision = model::resolve_model(config)?;
    let raw = model::extract_raw(&vision, &encoded, config).await?;

    // ── Step 4: Reconcile into the domain model ──────────────────────────
    let result = reconcile::reconcile(&raw);

    info!(
        "Extracted {} items, reconciled amount {:.2}, in {:?}",
        result.total_item_count,
        result.reconciled_amount,
        start.elapsed()
    );
    Ok(result)
}

/// Like [`extract_bill`], but infallible: failures become
/// `{ is_success: false, error }` envelopes.
pub async fn extract_bill_to_envelope(
    document_url: impl AsRef<str>,
    config: &ExtractionConfig,
) -> ResponseEnvelope {
    match extract_bill(document_url, config).await {
        Ok(data) => ResponseEnvelope::success(data),
        Err(e) => {
            warn!("Extraction failed: {}", e);
            ResponseEnvelope::failure(e.to_string())
        }
    }
}
