//! The instruction contract sent to the vision model.
//!
//! Centralising the prompt here serves two purposes:
//!
//! 1. **Single source of truth** — tightening an extraction rule (e.g. a new
//!    aggregate-row name to exclude) requires editing exactly one place.
//!
//! 2. **Testability** — unit tests can inspect the prompt directly without
//!    calling a real model, so a regression in the rules is caught cheaply.
//!
//! The prompt *requests* a JSON shape; nothing guarantees the model honours
//! it. The reconciliation engine re-validates every field downstream, so a
//! prompt change can never widen what reaches callers.

/// Fixed instruction contract for bill line-item extraction.
///
/// Rule 3 is the load-bearing one: aggregate rows must never appear as line
/// items, because the reconciled total is computed by summing line items and
/// a copied-through "Grand Total" row would double the sum.
pub const EXTRACTION_PROMPT: &str = r#"You are an expert OCR and financial data extraction system.
Analyze the provided invoice image.

Your goal is to extract line items accurately.

RULES:
1. Extract the 'item_name', 'item_amount' (total for that line), 'item_rate' (unit price), and 'item_quantity'.
2. If quantity is missing, assume 1. If rate is missing, infer it from amount/quantity.
3. IMPORTANT: Do NOT include lines that are 'Subtotal', 'Tax', 'GST', 'Discount', or 'Grand Total' in the line items list. Only extract actual products or services.
4. Ignore page numbers or footer text.
5. Return the data in valid JSON format matching this structure exactly:

{
  "pagewise_line_items": [
    {
      "page_no": "1",
      "bill_items": [
         { "item_name": "string", "item_amount": float, "item_rate": float, "item_quantity": float }
      ]
    }
  ]
}"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_excludes_aggregate_rows() {
        for aggregate in ["Subtotal", "Tax", "GST", "Discount", "Grand Total"] {
            assert!(
                EXTRACTION_PROMPT.contains(aggregate),
                "prompt must name aggregate row {aggregate:?}"
            );
        }
    }

    #[test]
    fn prompt_names_every_item_field() {
        for field in ["item_name", "item_amount", "item_rate", "item_quantity"] {
            assert!(EXTRACTION_PROMPT.contains(field));
        }
    }

    #[test]
    fn prompt_describes_target_shape() {
        assert!(EXTRACTION_PROMPT.contains("pagewise_line_items"));
        assert!(EXTRACTION_PROMPT.contains("page_no"));
        assert!(EXTRACTION_PROMPT.contains("bill_items"));
    }
}
