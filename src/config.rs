//! Configuration for bill extraction.
//!
//! Every knob lives in one [`ExtractionConfig`] struct, built via its
//! [`ExtractionConfigBuilder`]. Keeping the whole configuration in one place
//! makes it trivial to `Arc`-share across request handlers, log it, and diff
//! two runs to understand why their outputs differ.
//!
//! # Design choice: credential injected, not ambient
//! The API key is a field set once at construction, never read from the
//! environment at call time. That keeps the extraction adapter swappable in
//! tests: hand the builder a mock [`VisionModel`] and no credential is
//! needed at all.

use crate::error::BillscanError;
use crate::pipeline::model::VisionModel;
use std::fmt;
use std::sync::Arc;

/// Configuration for a bill extraction run.
///
/// Built via [`ExtractionConfig::builder()`] or [`ExtractionConfig::default()`].
///
/// # Example
/// ```rust
/// use billscan::ExtractionConfig;
///
/// let config = ExtractionConfig::builder()
///     .api_key("AIza...")
///     .model("gemini-2.5-flash")
///     .fetch_timeout_secs(10)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ExtractionConfig {
    /// Gemini API key. When `None`, the `GEMINI_API_KEY` environment
    /// variable is consulted once, at model construction time.
    pub api_key: Option<String>,

    /// Model identifier, e.g. "gemini-2.5-pro". Default: "gemini-2.5-pro".
    ///
    /// The default favours accuracy over latency. Switch to
    /// "gemini-2.5-flash" when throughput matters more than the last few
    /// percent of line-item recall on dense bills.
    pub model: String,

    /// Sampling temperature for the extraction completion. Default: 0.1.
    ///
    /// Low temperature keeps the model faithful to what is printed on the
    /// bill. Higher values introduce creativity that manifests as invented
    /// line items.
    pub temperature: f32,

    /// Maximum tokens the model may generate. Default: 4096.
    ///
    /// Dense multi-page bills can run long; truncation mid-array turns a
    /// valid response into unparseable JSON, so this is sized generously.
    pub max_output_tokens: usize,

    /// Document download timeout in seconds. Default: 10.
    pub fetch_timeout_secs: u64,

    /// Vision model call timeout in seconds. Default: 60.
    pub api_timeout_secs: u64,

    /// Pre-constructed vision model. Takes precedence over `api_key`/`model`.
    pub vision_model: Option<Arc<dyn VisionModel>>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: "gemini-2.5-pro".to_string(),
            temperature: 0.1,
            max_output_tokens: 4096,
            fetch_timeout_secs: 10,
            api_timeout_secs: 60,
            vision_model: None,
        }
    }
}

impl fmt::Debug for ExtractionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractionConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_output_tokens", &self.max_output_tokens)
            .field("fetch_timeout_secs", &self.fetch_timeout_secs)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field(
                "vision_model",
                &self.vision_model.as_ref().map(|_| "<dyn VisionModel>"),
            )
            .finish()
    }
}

impl ExtractionConfig {
    /// Create a new builder for `ExtractionConfig`.
    pub fn builder() -> ExtractionConfigBuilder {
        ExtractionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ExtractionConfig`].
#[derive(Debug)]
pub struct ExtractionConfigBuilder {
    config: ExtractionConfig,
}

impl ExtractionConfigBuilder {
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = Some(key.into());
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 1.0);
        self
    }

    pub fn max_output_tokens(mut self, n: usize) -> Self {
        self.config.max_output_tokens = n;
        self
    }

    pub fn fetch_timeout_secs(mut self, secs: u64) -> Self {
        self.config.fetch_timeout_secs = secs.max(1);
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs.max(1);
        self
    }

    pub fn vision_model(mut self, model: Arc<dyn VisionModel>) -> Self {
        self.config.vision_model = Some(model);
        self
    }

    /// Validate and produce the final config.
    pub fn build(self) -> Result<ExtractionConfig, BillscanError> {
        if self.config.model.trim().is_empty() {
            return Err(BillscanError::InvalidConfig(
                "model name must not be empty".to_string(),
            ));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_reference_behaviour() {
        let config = ExtractionConfig::default();
        assert_eq!(config.model, "gemini-2.5-pro");
        assert_eq!(config.temperature, 0.1);
        assert_eq!(config.fetch_timeout_secs, 10);
        assert!(config.api_key.is_none());
    }

    #[test]
    fn builder_clamps_temperature() {
        let config = ExtractionConfig::builder()
            .temperature(5.0)
            .build()
            .unwrap();
        assert_eq!(config.temperature, 1.0);
    }

    #[test]
    fn builder_rejects_empty_model() {
        let err = ExtractionConfig::builder().model("  ").build().unwrap_err();
        assert!(matches!(err, BillscanError::InvalidConfig(_)));
    }

    #[test]
    fn debug_redacts_api_key() {
        let config = ExtractionConfig::builder().api_key("secret").build().unwrap();
        let dbg = format!("{config:?}");
        assert!(!dbg.contains("secret"));
        assert!(dbg.contains("redacted"));
    }
}
