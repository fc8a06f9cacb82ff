//! Vision model interaction: send the bill image plus the instruction
//! contract, get back a raw JSON tree.
//!
//! This module is intentionally thin — all prompt engineering lives in
//! [`crate::prompts`] and all response validation lives in
//! [`crate::pipeline::reconcile`]. What remains here is the provider
//! boundary: the [`VisionModel`] trait (so tests can substitute a canned
//! model) and the [`GeminiModel`] implementation of the Generative Language
//! REST API.
//!
//! ## Trust boundary
//!
//! The request asks for `responseMimeType: "application/json"` and a low
//! temperature, which makes well-formed JSON *likely*, not guaranteed.
//! Everything returned from here is an untyped [`serde_json::Value`];
//! nothing downstream may assume any field exists.

use crate::config::ExtractionConfig;
use crate::error::BillscanError;
use crate::pipeline::encode::EncodedImage;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Sampling options forwarded to the model call.
#[derive(Debug, Clone)]
pub struct ModelOptions {
    pub temperature: f32,
    pub max_output_tokens: usize,
}

impl From<&ExtractionConfig> for ModelOptions {
    fn from(config: &ExtractionConfig) -> Self {
        Self {
            temperature: config.temperature,
            max_output_tokens: config.max_output_tokens,
        }
    }
}

/// An external vision-capable model: image in, text believed to be JSON out.
///
/// Object safe so configs can carry `Arc<dyn VisionModel>`; tests implement
/// it with canned responses and never touch the network.
#[async_trait]
pub trait VisionModel: Send + Sync {
    /// Send `prompt` and `image` to the model and return its raw text.
    async fn complete(
        &self,
        prompt: &str,
        image: &EncodedImage,
        options: &ModelOptions,
    ) -> Result<String, BillscanError>;
}

// ── Gemini REST types ─────────────────────────────────────────────────────
// URL pattern: /v1beta/models/{model}:generateContent?key={api_key}
// Auth travels in the query string, not a header.

#[derive(Serialize)]
struct GeminiInlineData<'a> {
    #[serde(rename = "mimeType")]
    mime_type: &'a str,
    data: &'a str,
}

#[derive(Serialize)]
#[serde(untagged)]
enum GeminiPart<'a> {
    Text { text: &'a str },
    Image {
        #[serde(rename = "inlineData")]
        inline_data: GeminiInlineData<'a>,
    },
}

#[derive(Serialize)]
struct GeminiContent<'a> {
    role: &'a str,
    parts: Vec<GeminiPart<'a>>,
}

#[derive(Serialize)]
struct GeminiGenerationConfig {
    temperature: f32,
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: usize,
    /// Asks the model to emit bare JSON rather than prose-wrapped JSON.
    #[serde(rename = "responseMimeType")]
    response_mime_type: &'static str,
}

#[derive(Serialize)]
struct GeminiRequest<'a> {
    contents: Vec<GeminiContent<'a>>,
    #[serde(rename = "generationConfig")]
    generation_config: GeminiGenerationConfig,
}

#[derive(Deserialize)]
struct GeminiResponse {
    candidates: Option<Vec<GeminiCandidate>>,
    error: Option<GeminiApiError>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiCandidateContent>,
    #[serde(rename = "finishReason")]
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct GeminiCandidateContent {
    parts: Option<Vec<GeminiCandidatePart>>,
}

#[derive(Deserialize)]
struct GeminiCandidatePart {
    text: Option<String>,
}

#[derive(Deserialize)]
struct GeminiApiError {
    message: Option<String>,
}

/// The Gemini implementation of [`VisionModel`].
pub struct GeminiModel {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

impl GeminiModel {
    /// Construct a model client. `api_key` is captured here, once — the
    /// adapter never reads the environment at call time.
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        api_timeout_secs: u64,
    ) -> Result<Self, BillscanError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(api_timeout_secs))
            .build()
            .map_err(|e| BillscanError::Internal(format!("HTTP client build failed: {e}")))?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            model: model.into(),
            base_url: GEMINI_BASE_URL.to_string(),
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        )
    }
}

#[async_trait]
impl VisionModel for GeminiModel {
    async fn complete(
        &self,
        prompt: &str,
        image: &EncodedImage,
        options: &ModelOptions,
    ) -> Result<String, BillscanError> {
        let body = GeminiRequest {
            contents: vec![GeminiContent {
                role: "user",
                parts: vec![
                    GeminiPart::Text { text: prompt },
                    GeminiPart::Image {
                        inline_data: GeminiInlineData {
                            mime_type: image.mime_type,
                            data: &image.data,
                        },
                    },
                ],
            }],
            generation_config: GeminiGenerationConfig {
                temperature: options.temperature,
                max_output_tokens: options.max_output_tokens,
                response_mime_type: "application/json",
            },
        };

        let start = Instant::now();
        let response = self
            .client
            .post(self.endpoint())
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    BillscanError::ApiTimeout {
                        elapsed_ms: start.elapsed().as_millis() as u64,
                    }
                } else {
                    BillscanError::ModelFailed {
                        message: e.to_string(),
                    }
                }
            })?;

        let status = response.status();
        let parsed: GeminiResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                BillscanError::ApiTimeout {
                    elapsed_ms: start.elapsed().as_millis() as u64,
                }
            } else {
                BillscanError::ModelFailed {
                    message: format!("HTTP {status}: unreadable response body: {e}"),
                }
            }
        })?;

        if !status.is_success() {
            let detail = parsed
                .error
                .and_then(|e| e.message)
                .unwrap_or_else(|| "no error detail".to_string());
            return Err(BillscanError::ModelFailed {
                message: format!("HTTP {status}: {detail}"),
            });
        }

        let candidate = parsed
            .candidates
            .and_then(|mut c| if c.is_empty() { None } else { Some(c.remove(0)) })
            .ok_or_else(|| BillscanError::ModelFailed {
                message: "response contained no candidates".to_string(),
            })?;

        if let Some(reason) = candidate.finish_reason.as_deref() {
            // STOP and MAX_TOKENS still carry text; safety blocks do not.
            if reason == "SAFETY" || reason == "PROHIBITED_CONTENT" {
                return Err(BillscanError::ModelFailed {
                    message: format!("generation blocked: {reason}"),
                });
            }
            if reason == "MAX_TOKENS" {
                warn!("Model output truncated at max_output_tokens; JSON may be incomplete");
            }
        }

        let text = candidate
            .content
            .and_then(|c| c.parts)
            .and_then(|parts| parts.into_iter().find_map(|p| p.text))
            .ok_or_else(|| BillscanError::ModelFailed {
                message: "candidate contained no text part".to_string(),
            })?;

        debug!(
            "Model responded with {} chars in {:?}",
            text.len(),
            start.elapsed()
        );
        Ok(text)
    }
}

/// Resolve the model to use: the config's override if present, otherwise a
/// [`GeminiModel`] from the configured (or `GEMINI_API_KEY` env) credential.
pub fn resolve_model(config: &ExtractionConfig) -> Result<Arc<dyn VisionModel>, BillscanError> {
    if let Some(model) = &config.vision_model {
        return Ok(Arc::clone(model));
    }

    let api_key = match &config.api_key {
        Some(key) => key.clone(),
        None => std::env::var("GEMINI_API_KEY").map_err(|_| BillscanError::ModelNotConfigured {
            hint: "Set GEMINI_API_KEY or pass api_key in the config.".to_string(),
        })?,
    };

    Ok(Arc::new(GeminiModel::new(
        api_key,
        config.model.clone(),
        config.api_timeout_secs,
    )?))
}

/// Call the model and parse its text into an untyped JSON tree.
///
/// A JSON response channel is requested, but some model versions still wrap
/// the payload in a ```json fence; the fence is stripped before parsing.
/// Unparseable text maps to [`BillscanError::MalformedResponse`].
pub async fn extract_raw(
    model: &Arc<dyn VisionModel>,
    image: &EncodedImage,
    config: &ExtractionConfig,
) -> Result<serde_json::Value, BillscanError> {
    let options = ModelOptions::from(config);
    let text = model
        .complete(crate::prompts::EXTRACTION_PROMPT, image, &options)
        .await?;

    let payload = strip_json_fence(&text);
    serde_json::from_str(payload).map_err(|e| BillscanError::MalformedResponse {
        detail: e.to_string(),
    })
}

/// Strip a surrounding ```json … ``` (or bare ```) fence, if present.
fn strip_json_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn options_follow_config() {
        let config = ExtractionConfig::default();
        let opts = ModelOptions::from(&config);
        assert_eq!(opts.temperature, 0.1);
        assert_eq!(opts.max_output_tokens, 4096);
    }

    #[test]
    fn strip_fence_variants() {
        assert_eq!(strip_json_fence("{\"a\":1}"), "{\"a\":1}");
        assert_eq!(strip_json_fence("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_json_fence("```\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_json_fence("  {\"a\":1}  "), "{\"a\":1}");
    }

    #[test]
    fn request_body_shape() {
        let image = EncodedImage {
            data: "aGVsbG8=".to_string(),
            mime_type: "image/png",
        };
        let body = GeminiRequest {
            contents: vec![GeminiContent {
                role: "user",
                parts: vec![
                    GeminiPart::Text { text: "prompt" },
                    GeminiPart::Image {
                        inline_data: GeminiInlineData {
                            mime_type: image.mime_type,
                            data: &image.data,
                        },
                    },
                ],
            }],
            generation_config: GeminiGenerationConfig {
                temperature: 0.1,
                max_output_tokens: 4096,
                response_mime_type: "application/json",
            },
        };

        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["contents"][0]["role"], "user");
        assert_eq!(value["contents"][0]["parts"][0]["text"], "prompt");
        assert_eq!(
            value["contents"][0]["parts"][1]["inlineData"]["mimeType"],
            "image/png"
        );
        assert_eq!(
            value["generationConfig"]["responseMimeType"],
            "application/json"
        );
        // f32 → JSON number; compare with a tolerance rather than bit-exact.
        let temp = value["generationConfig"]["temperature"].as_f64().unwrap();
        assert!((temp - 0.1).abs() < 1e-6);
    }

    #[test]
    fn gemini_endpoint_pattern() {
        let model = GeminiModel::new("test-key", "gemini-2.5-pro", 60).unwrap();
        let url = model.endpoint();
        assert!(url.contains("/models/gemini-2.5-pro:generateContent"));
        assert!(url.ends_with("key=test-key"));
    }

    #[test]
    fn response_text_extraction() {
        let raw = json!({
            "candidates": [{
                "content": { "parts": [{ "text": "{\"pagewise_line_items\":[]}" }] },
                "finishReason": "STOP"
            }]
        });
        let parsed: GeminiResponse = serde_json::from_value(raw).unwrap();
        let text = parsed.candidates.unwrap().remove(0).content.unwrap().parts.unwrap()
            .into_iter()
            .find_map(|p| p.text)
            .unwrap();
        assert!(text.contains("pagewise_line_items"));
    }

    struct CannedModel(String);

    #[async_trait]
    impl VisionModel for CannedModel {
        async fn complete(
            &self,
            _prompt: &str,
            _image: &EncodedImage,
            _options: &ModelOptions,
        ) -> Result<String, BillscanError> {
            Ok(self.0.clone())
        }
    }

    fn test_image() -> EncodedImage {
        EncodedImage {
            data: "aGVsbG8=".to_string(),
            mime_type: "image/png",
        }
    }

    #[tokio::test]
    async fn extract_raw_parses_json() {
        let model: Arc<dyn VisionModel> =
            Arc::new(CannedModel(r#"{"pagewise_line_items":[]}"#.to_string()));
        let config = ExtractionConfig::default();
        let raw = extract_raw(&model, &test_image(), &config).await.unwrap();
        assert!(raw["pagewise_line_items"].is_array());
    }

    #[tokio::test]
    async fn extract_raw_strips_fences() {
        let model: Arc<dyn VisionModel> = Arc::new(CannedModel(
            "```json\n{\"pagewise_line_items\":[]}\n```".to_string(),
        ));
        let config = ExtractionConfig::default();
        let raw = extract_raw(&model, &test_image(), &config).await.unwrap();
        assert!(raw["pagewise_line_items"].is_array());
    }

    #[tokio::test]
    async fn extract_raw_rejects_non_json() {
        let model: Arc<dyn VisionModel> =
            Arc::new(CannedModel("Sorry, I cannot read this image.".to_string()));
        let config = ExtractionConfig::default();
        let err = extract_raw(&model, &test_image(), &config).await.unwrap_err();
        assert!(matches!(err, BillscanError::MalformedResponse { .. }));
    }

    #[test]
    fn resolve_model_prefers_override() {
        let canned: Arc<dyn VisionModel> = Arc::new(CannedModel("{}".to_string()));
        let config = ExtractionConfig::builder()
            .vision_model(Arc::clone(&canned))
            .build()
            .unwrap();
        // No api_key set anywhere; the override must win without one.
        assert!(resolve_model(&config).is_ok());
    }
}
