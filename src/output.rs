//! Domain model for extracted bill data.
//!
//! These are the *sanitized* types: by the time a [`BillItem`] exists, every
//! field has been through the reconciliation engine's coercion table and is
//! guaranteed present. The raw model output never reaches callers — only
//! these records do.
//!
//! Serde field names match the wire format the service has always spoken
//! (`item_name`, `pagewise_line_items`, `is_success`, …), so the JSON a
//! client sees is stable regardless of internal refactors.

use serde::{Deserialize, Serialize};

/// One purchased line on a bill.
///
/// Aggregate rows (subtotal, tax, discount, grand total) are excluded by the
/// extraction prompt and never become `BillItem`s.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillItem {
    /// Free-text product/service name. "Unknown" when the model omitted it.
    pub item_name: String,
    /// Total charge for this line. Defaults to 0.0 rather than dropping
    /// the item — the count invariant must include every extracted line.
    pub item_amount: f64,
    /// Unit price. 0.0 when absent or unparseable.
    pub item_rate: f64,
    /// Quantity purchased. 1.0 when absent or unparseable.
    pub item_quantity: f64,
}

/// All line items found on one page of the document.
///
/// Item order is the model's encounter order, preserved verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageLineItems {
    /// Page identifier as text ("1" when the model omitted it).
    pub page_no: String,
    pub bill_items: Vec<BillItem>,
}

/// The full, reconciled extraction payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    /// Pages in source order, each with its items in source order.
    pub pagewise_line_items: Vec<PageLineItems>,
    /// Count of items across all pages, including fully-defaulted ones.
    pub total_item_count: usize,
    /// Sum of every item's `item_amount` across all pages, rounded to two
    /// decimal places. Derived arithmetic — never copied from any
    /// grand-total field the document or the model reports.
    pub reconciled_amount: f64,
}

/// Uniform response envelope for the extraction operation.
///
/// Failures travel inside the envelope (`is_success: false` + `error`), not
/// as transport-level errors: "this document could not be processed" is a
/// successful HTTP conversation carrying a structured failure payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    pub is_success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<ExtractionResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ResponseEnvelope {
    /// Wrap a successful extraction.
    pub fn success(data: ExtractionResult) -> Self {
        Self {
            is_success: true,
            data: Some(data),
            error: None,
        }
    }

    /// Wrap a failure description.
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            is_success: false,
            data: None,
            error: Some(error.into()),
        }
    }
}

/// Inbound request body: a URL to the bill image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentRequest {
    /// URL of the bill image.
    pub document: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_envelope_omits_error_field() {
        let env = ResponseEnvelope::success(ExtractionResult {
            pagewise_line_items: vec![],
            total_item_count: 0,
            reconciled_amount: 0.0,
        });
        let json = serde_json::to_value(&env).unwrap();
        assert_eq!(json["is_success"], true);
        assert!(json.get("error").is_none());
        assert!(json.get("data").is_some());
    }

    #[test]
    fn failure_envelope_omits_data_field() {
        let env = ResponseEnvelope::failure("fetch failed");
        let json = serde_json::to_value(&env).unwrap();
        assert_eq!(json["is_success"], false);
        assert_eq!(json["error"], "fetch failed");
        assert!(json.get("data").is_none());
    }

    #[test]
    fn extraction_result_round_trips() {
        let result = ExtractionResult {
            pagewise_line_items: vec![PageLineItems {
                page_no: "1".into(),
                bill_items: vec![BillItem {
                    item_name: "Paracetamol".into(),
                    item_amount: 50.0,
                    item_rate: 25.0,
                    item_quantity: 2.0,
                }],
            }],
            total_item_count: 1,
            reconciled_amount: 50.0,
        };
        let json = serde_json::to_string(&result).unwrap();
        let back: ExtractionResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back, result);
    }
}
