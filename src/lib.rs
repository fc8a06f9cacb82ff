//! # billscan
//!
//! Extract and reconcile purchased line items from bill/invoice images
//! using a vision language model.
//!
//! ## Why this crate?
//!
//! Reading a bill with classic OCR means reassembling columns, currency
//! symbols, and multi-line item names from raw text boxes. A vision model
//! reads the bill like a human would — but its output is an *untrusted*,
//! loosely-shaped JSON tree. This crate owns the part that makes that
//! usable: a reconciliation engine that defensively coerces every field
//! into a strict domain model, and derives the bill total by summing the
//! extracted line items rather than trusting any grand-total figure printed
//! on the document (or invented by the model).
//!
//! ## Pipeline Overview
//!
//! ```text
//! URL
//!  │
//!  ├─ 1. Fetch      download the image, bounded timeout
//!  ├─ 2. Decode     bytes → pixels (corrupt files fail here, early)
//!  ├─ 3. Encode     PNG → base64 for the multimodal request
//!  ├─ 4. Model      Gemini generateContent with a fixed instruction contract
//!  └─ 5. Reconcile  coerce every field, sum the items, round to cents
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use billscan::{extract_bill, ExtractionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // API key from the config, or GEMINI_API_KEY in the environment
//!     let config = ExtractionConfig::default();
//!     let result = extract_bill("https://example.com/bill.png", &config).await?;
//!     println!("{} items, total {:.2}",
//!         result.total_item_count,
//!         result.reconciled_amount);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature  | Default | Description |
//! |----------|---------|-------------|
//! | `server` | on      | Enables the `billscan` HTTP server binary (axum + clap + anyhow + tracing-subscriber) |
//!
//! Disable `server` when using only the library:
//! ```toml
//! billscan = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod extract;
pub mod output;
pub mod pipeline;
pub mod prompts;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ExtractionConfig, ExtractionConfigBuilder};
pub use error::BillscanError;
pub use extract::{extract_bill, extract_bill_to_envelope};
pub use output::{
    BillItem, DocumentRequest, ExtractionResult, PageLineItems, ResponseEnvelope,
};
pub use pipeline::encode::EncodedImage;
pub use pipeline::model::{GeminiModel, ModelOptions, VisionModel};
pub use pipeline::reconcile::reconcile;
