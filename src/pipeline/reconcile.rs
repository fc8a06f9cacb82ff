//! Reconciliation: coerce the untrusted model output into the domain model
//! and derive the total from the line items themselves.
//!
//! ## The coercion table
//!
//! Every field access on the raw tree is defensive: presence check, type
//! coercion, default. No item is ever dropped for a bad field — a bill with
//! one smudged amount still yields a complete item list, with that one
//! amount defaulted (and logged at `debug!`). The table:
//!
//! | field           | coercion            | default   |
//! |-----------------|---------------------|-----------|
//! | `page_no`       | text (numbers too)  | `"1"`     |
//! | `item_name`     | text                | `Unknown` |
//! | `item_amount`   | number or num-text  | `0.0`     |
//! | `item_rate`     | number or num-text  | `0.0`     |
//! | `item_quantity` | number or num-text  | `1.0`     |
//!
//! ## Why derive the total?
//!
//! A hallucinated or mis-OCR'd "Grand Total" row on the source document must
//! not be able to corrupt the reported total. `reconciled_amount` is always
//! the arithmetic sum of the items this engine itself sanitized, rounded to
//! two decimal places — no field of the raw tree is ever copied into it.

use crate::output::{BillItem, ExtractionResult, PageLineItems};
use serde_json::Value;
use tracing::debug;

/// Coerce a raw field to text. Numbers are stringified so a model that
/// emits `"page_no": 1` behaves the same as one that emits `"page_no": "1"`.
fn coerce_string(value: Option<&Value>, default: &str) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => default.to_string(),
    }
}

/// Coerce a raw field to f64. Accepts JSON numbers and numeric strings
/// ("12.50" is a common model output for currency columns); anything else
/// takes the default.
fn coerce_f64(value: Option<&Value>, default: f64) -> f64 {
    match value {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(default),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(default),
        _ => default,
    }
}

/// Round to two decimal places, half away from zero.
fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// Sanitize one raw item into a [`BillItem`]. Total function — any shape of
/// `raw` produces an item, in the worst case fully defaulted.
fn sanitize_item(raw: &Value) -> BillItem {
    let item = BillItem {
        item_name: coerce_string(raw.get("item_name"), "Unknown"),
        item_amount: coerce_f64(raw.get("item_amount"), 0.0),
        item_rate: coerce_f64(raw.get("item_rate"), 0.0),
        item_quantity: coerce_f64(raw.get("item_quantity"), 1.0),
    };
    if !raw
        .get("item_amount")
        .map(|v| v.is_number())
        .unwrap_or(false)
    {
        debug!("Defaulted item_amount for item '{}'", item.item_name);
    }
    item
}

/// Validate, sanitize, and normalize the raw extraction into the domain
/// model, deriving `total_item_count` and `reconciled_amount`.
///
/// Never fails on malformed *content*: a missing `pagewise_line_items`, a
/// page whose `bill_items` is absent or mistyped, or any bad item field all
/// degrade to empty/default values rather than errors. Encounter order of
/// pages and items is preserved.
pub fn reconcile(raw: &Value) -> ExtractionResult {
    let pages = raw
        .get("pagewise_line_items")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[]);

    let mut pagewise = Vec::with_capacity(pages.len());
    let mut total_item_count = 0usize;
    let mut amount_sum = 0.0f64;

    for page in pages {
        let items = page
            .get("bill_items")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[]);

        let mut bill_items = Vec::with_capacity(items.len());
        for raw_item in items {
            let item = sanitize_item(raw_item);
            amount_sum += item.item_amount;
            total_item_count += 1;
            bill_items.push(item);
        }

        pagewise.push(PageLineItems {
            page_no: coerce_string(page.get("page_no"), "1"),
            bill_items,
        });
    }

    debug!(
        "Reconciled {} items across {} pages, sum {:.2}",
        total_item_count,
        pagewise.len(),
        amount_sum
    );

    ExtractionResult {
        pagewise_line_items: pagewise,
        total_item_count,
        reconciled_amount: round2(amount_sum),
    }
}
