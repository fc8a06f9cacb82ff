//! Pipeline stages for bill extraction.
//!
//! Each submodule implements exactly one transformation step. Keeping stages
//! separate makes each independently testable and lets us swap an
//! implementation (e.g. a different vision provider) without touching the
//! others.
//!
//! ## Data Flow
//!
//! ```text
//! fetch ──▶ encode ──▶ model ──▶ reconcile
//! (URL)     (base64)   (VLM)     (coerce + total)
//! ```
//!
//! 1. [`fetch`]     — download the document URL and decode it into pixels
//! 2. [`encode`]    — PNG-encode and base64-wrap the image for the
//!    multimodal API request body
//! 3. [`model`]     — send the image plus the instruction contract to the
//!    vision model; the only stage with model I/O
//! 4. [`reconcile`] — coerce the untrusted response tree into the domain
//!    model and derive the total from the items themselves

pub mod encode;
pub mod fetch;
pub mod model;
pub mod reconcile;
