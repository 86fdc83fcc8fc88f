//! OpenAI-compatible vision API describer
//!
//! Implements ImageDescriber by making chat-completion calls with image
//! content parts to any OpenAI-compatible vision endpoint. The model is
//! asked for a strict JSON payload; the reply is parsed into an
//! ImageDescription.

use std::future::Future;
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use backoff::ExponentialBackoff;
use base64::Engine;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::VisionSettings;
use crate::error::{Error, Result};
use crate::types::{ImageAttribute, ImageDescription, ImageRef, Variant};

use super::ImageDescriber;

/// System prompt sent with every describe request. The model must answer
/// with JSON only; anything else fails parsing and is retried.
const SYSTEM_PROMPT: &str = "You are a marketing image analyst. Describe the \
product image you are given for A/B testing purposes. Respond with JSON only, \
no prose, in exactly this shape: {\"caption\": \"one-sentence description\", \
\"attributes\": [{\"tag\": \"kebab-case-keyword\", \"confidence\": 0.0}]}. \
Tags describe marketing-relevant qualities such as family-safe, premium, \
budget, durable, stylish, high-tech, simple, trending. Confidence is your \
certainty in [0,1]. List 3 to 8 attributes.";

// ─────────────────────────────────────────────────────────────────
// OpenAI API types (request/response)
// ─────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: MessageContent,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrlPart },
}

#[derive(Debug, Serialize)]
struct ImageUrlPart {
    url: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

/// The JSON payload the model is instructed to produce
#[derive(Debug, Deserialize)]
struct VisionPayload {
    caption: String,
    #[serde(default)]
    attributes: Vec<VisionAttribute>,
}

#[derive(Debug, Deserialize)]
struct VisionAttribute {
    tag: String,
    #[serde(default)]
    confidence: Option<f32>,
}

// ─────────────────────────────────────────────────────────────────
// OpenAI Describer
// ─────────────────────────────────────────────────────────────────

/// Vision API describer for any OpenAI-compatible endpoint
pub struct OpenAiDescriber {
    settings: VisionSettings,
    client: Client,
}

impl OpenAiDescriber {
    /// Create a new describer with the given vision settings
    pub fn new(settings: VisionSettings) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| Error::Internal(format!("Failed to create HTTP client: {}", e)))?;

        info!(
            base_url = %settings.base_url,
            model = %settings.model,
            "Vision describer created"
        );

        Ok(Self { settings, client })
    }

    /// Build the authorization header value (if API key is set)
    fn auth_header(&self) -> Option<String> {
        if self.settings.api_key.is_empty() {
            None
        } else {
            Some(format!("Bearer {}", self.settings.api_key))
        }
    }

    /// Resolve an image reference to a URL the API accepts.
    ///
    /// Remote URLs pass through; local files are read and inlined as
    /// base64 data URLs. An unreadable file is a permanent error.
    async fn image_payload_url(&self, image: &ImageRef) -> Result<String> {
        match image {
            ImageRef::Url(url) => Ok(url.to_string()),
            ImageRef::Path(path) => {
                let bytes = tokio::fs::read(path).await.map_err(|e| {
                    Error::invalid_image(
                        path.display().to_string(),
                        format!("cannot read file: {}", e),
                    )
                })?;
                let mime = mime_for_path(path);
                let encoded = base64::engine::general_purpose::STANDARD.encode(&bytes);
                Ok(format!("data:{};base64,{}", mime, encoded))
            }
        }
    }

    /// Make one describe request, without retry
    async fn describe_once(&self, variant: Variant, image_url: String) -> Result<ImageDescription> {
        let request_body = ChatCompletionRequest {
            model: self.settings.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: MessageContent::Text(SYSTEM_PROMPT.to_string()),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: MessageContent::Parts(vec![
                        ContentPart::Text {
                            text: "Describe this marketing image.".to_string(),
                        },
                        ContentPart::ImageUrl {
                            image_url: ImageUrlPart { url: image_url },
                        },
                    ]),
                },
            ],
            max_tokens: Some(500),
            temperature: Some(0.2),
        };

        let url = format!("{}/chat/completions", self.settings.base_url);
        let mut req = self.client.post(&url).json(&request_body);
        if let Some(auth) = self.auth_header() {
            req = req.header("Authorization", auth);
        }

        let response = req.send().await.map_err(|e| {
            Error::description_unavailable(variant, format!("request error: {}", e))
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::description_unavailable(
                variant,
                format!("API error {}: {}", status, body),
            ));
        }

        let parsed: ChatCompletionResponse = response.json().await.map_err(|e| {
            Error::description_unavailable(variant, format!("malformed API response: {}", e))
        })?;

        let content = parsed
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .ok_or_else(|| {
                Error::description_unavailable(variant, "no content in API response")
            })?;

        parse_vision_payload(variant, &content)
    }
}

#[async_trait]
impl ImageDescriber for OpenAiDescriber {
    fn name(&self) -> &'static str {
        "openai"
    }

    async fn describe(&self, variant: Variant, image: &ImageRef) -> Result<ImageDescription> {
        // Resolve the payload once; reference errors never retry
        let image_url = self.image_payload_url(image).await?;

        let policy = ExponentialBackoff {
            max_elapsed_time: Some(Duration::from_secs(self.settings.retry_max_elapsed_secs)),
            ..Default::default()
        };

        let description = retry_transient(policy, variant, || {
            let image_url = image_url.clone();
            async move { self.describe_once(variant, image_url).await }
        })
        .await?;

        debug!(
            variant = %variant,
            attributes = description.attributes.len(),
            "Image described"
        );

        Ok(description)
    }
}

/// Retry an operation with bounded exponential backoff while it fails
/// with a retryable error. Permanent errors surface immediately.
async fn retry_transient<F, Fut>(
    policy: ExponentialBackoff,
    variant: Variant,
    mut op: F,
) -> Result<ImageDescription>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<ImageDescription>>,
{
    backoff::future::retry(policy, || {
        let attempt = op();
        async move {
            match attempt.await {
                Ok(description) => Ok(description),
                Err(e) if e.is_retryable() => {
                    warn!(variant = %variant, error = %e, "Retrying image description");
                    Err(backoff::Error::transient(e))
                }
                Err(e) => Err(backoff::Error::permanent(e)),
            }
        }
    })
    .await
}

/// Parse the model's JSON answer into an ImageDescription
fn parse_vision_payload(variant: Variant, content: &str) -> Result<ImageDescription> {
    let trimmed = strip_code_fences(content);

    let payload: VisionPayload = serde_json::from_str(trimmed).map_err(|e| {
        Error::description_unavailable(variant, format!("model reply was not valid JSON: {}", e))
    })?;

    let attributes = payload
        .attributes
        .into_iter()
        .filter(|a| !a.tag.trim().is_empty())
        .map(|a| ImageAttribute {
            tag: normalize_tag(&a.tag),
            confidence: a.confidence.map(|c| c.clamp(0.0, 1.0)),
        })
        .collect();

    Ok(ImageDescription::new(payload.caption, attributes))
}

/// Strip markdown code fences some models wrap JSON answers in
fn strip_code_fences(content: &str) -> &str {
    let trimmed = content.trim();
    let without_open = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    without_open.strip_suffix("```").unwrap_or(without_open).trim()
}

/// Normalize a tag to lowercase kebab-case
fn normalize_tag(tag: &str) -> String {
    tag.trim()
        .to_lowercase()
        .replace([' ', '_'], "-")
}

/// Pick a MIME type from the file extension
fn mime_for_path(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .as_deref()
    {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("bmp") => "image/bmp",
        _ => "application/octet-stream",
    }
}

// ─────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_header() {
        let settings = VisionSettings {
            api_key: "sk-test-123".to_string(),
            ..Default::default()
        };
        let describer = OpenAiDescriber::new(settings).unwrap();
        assert_eq!(
            describer.auth_header(),
            Some("Bearer sk-test-123".to_string())
        );

        let no_key = OpenAiDescriber::new(VisionSettings::default()).unwrap();
        assert_eq!(no_key.auth_header(), None);
    }

    #[test]
    fn test_parse_vision_payload() {
        let content = r#"{"caption": "A sleek laptop on a desk", "attributes": [
            {"tag": "High Tech", "confidence": 0.9},
            {"tag": "premium", "confidence": 0.7},
            {"tag": "stylish"}
        ]}"#;

        let description = parse_vision_payload(Variant::A, content).unwrap();
        assert_eq!(description.caption, "A sleek laptop on a desk");
        assert_eq!(description.attributes.len(), 3);
        assert_eq!(description.attributes[0].tag, "high-tech");
        assert_eq!(description.attributes[0].confidence, Some(0.9));
        assert_eq!(description.attributes[2].confidence, None);
    }

    #[test]
    fn test_parse_vision_payload_with_fences() {
        let content = "```json\n{\"caption\": \"A toy\", \"attributes\": []}\n```";
        let description = parse_vision_payload(Variant::B, content).unwrap();
        assert_eq!(description.caption, "A toy");
        assert!(description.is_degenerate());
    }

    #[test]
    fn test_parse_vision_payload_rejects_prose() {
        let content = "Sure! Here is a description of the image.";
        let err = parse_vision_payload(Variant::A, content).unwrap_err();
        assert!(err.is_retryable());
    }

    #[test]
    fn test_parse_clamps_confidence() {
        let content = r#"{"caption": "x", "attributes": [{"tag": "budget", "confidence": 1.5}]}"#;
        let description = parse_vision_payload(Variant::A, content).unwrap();
        assert_eq!(description.attributes[0].confidence, Some(1.0));
    }

    #[test]
    fn test_normalize_tag() {
        assert_eq!(normalize_tag("Family Safe"), "family-safe");
        assert_eq!(normalize_tag("high_tech"), "high-tech");
        assert_eq!(normalize_tag(" Premium "), "premium");
    }

    #[test]
    fn test_mime_for_path() {
        assert_eq!(mime_for_path(Path::new("a.jpg")), "image/jpeg");
        assert_eq!(mime_for_path(Path::new("a.PNG")), "image/png");
        assert_eq!(mime_for_path(Path::new("a.webp")), "image/webp");
    }

    #[tokio::test]
    async fn test_transient_errors_retry_until_success() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        let attempts = AtomicUsize::new(0);
        let policy = ExponentialBackoff {
            initial_interval: Duration::from_millis(1),
            max_elapsed_time: Some(Duration::from_secs(5)),
            ..Default::default()
        };

        let result = retry_transient(policy, Variant::A, || {
            let n = attempts.fetch_add(1, Ordering::SeqCst);
            async move {
                if n == 0 {
                    Err(Error::description_unavailable(Variant::A, "API error 503"))
                } else {
                    Ok(ImageDescription::new("recovered", vec![]))
                }
            }
        })
        .await;

        assert_eq!(attempts.load(Ordering::SeqCst), 2);
        assert_eq!(result.unwrap().caption, "recovered");
    }

    #[tokio::test]
    async fn test_permanent_errors_do_not_retry() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        let attempts = AtomicUsize::new(0);
        let policy = ExponentialBackoff {
            initial_interval: Duration::from_millis(1),
            max_elapsed_time: Some(Duration::from_secs(5)),
            ..Default::default()
        };

        let result = retry_transient(policy, Variant::B, || {
            attempts.fetch_add(1, Ordering::SeqCst);
            async { Err(Error::invalid_image("x.txt", "unsupported format")) }
        })
        .await;

        assert_eq!(attempts.load(Ordering::SeqCst), 1);
        assert!(matches!(
            result.unwrap_err(),
            Error::InvalidImageReference { .. }
        ));
    }

    #[tokio::test]
    async fn test_missing_local_file_is_permanent() {
        let describer = OpenAiDescriber::new(VisionSettings::default()).unwrap();
        let image = ImageRef::Path("/nonexistent/image.png".into());

        let err = describer.describe(Variant::A, &image).await.unwrap_err();
        assert!(matches!(err, Error::InvalidImageReference { .. }));
    }
}
