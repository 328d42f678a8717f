//! Gemini (Google) provider.

use crate::error::Result;
use crate::gateway::CallSpec;
use crate::providers::{resolve_api_key, Provider, ProviderKind};
use crate::request::{GenerationRequest, Modality};
use serde::Serialize;

const BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default text model.
pub const DEFAULT_TEXT_MODEL: &str = "gemini-2.0-flash";
/// Default image model.
pub const DEFAULT_IMAGE_MODEL: &str = "gemini-2.0-flash-preview-image-generation";

/// Builder for GeminiProvider.
#[derive(Debug, Clone)]
pub struct GeminiProviderBuilder {
    api_key: Option<String>,
    base_url: String,
    text_model: String,
    image_model: String,
}

impl Default for GeminiProviderBuilder {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: BASE_URL.to_string(),
            text_model: DEFAULT_TEXT_MODEL.to_string(),
            image_model: DEFAULT_IMAGE_MODEL.to_string(),
        }
    }
}

impl GeminiProviderBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the API key.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Overrides the API base URL.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Sets the default text model.
    pub fn text_model(mut self, model: impl Into<String>) -> Self {
        self.text_model = model.into();
        self
    }

    /// Sets the default image model.
    pub fn image_model(mut self, model: impl Into<String>) -> Self {
        self.image_model = model.into();
        self
    }

    /// Builds the provider.
    pub fn build(self) -> Result<GeminiProvider> {
        let api_key = resolve_api_key(self.api_key, ProviderKind::Gemini)?;
        Ok(GeminiProvider {
            api_key,
            base_url: self.base_url,
            text_model: self.text_model,
            image_model: self.image_model,
        })
    }
}

/// Gemini provider.
///
/// Image models return the picture as base64 `inlineData` inside the JSON
/// response, alongside any caption text.
pub struct GeminiProvider {
    api_key: String,
    base_url: String,
    text_model: String,
    image_model: String,
}

impl GeminiProvider {
    /// Creates a new `GeminiProviderBuilder`.
    pub fn builder() -> GeminiProviderBuilder {
        GeminiProviderBuilder::new()
    }
}

impl Provider for GeminiProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Gemini
    }

    fn call_spec(&self, modality: Modality, request: &GenerationRequest) -> Result<CallSpec> {
        let model = match modality {
            Modality::Text => request.text.model.as_deref().unwrap_or(&self.text_model),
            Modality::Image => request.image.model.as_deref().unwrap_or(&self.image_model),
        };
        let url = format!("{}/models/{}:generateContent", self.base_url, model);
        let body = GeminiRequest::new(modality, request);

        Ok(CallSpec::post(modality.call_id(), url)
            .header("x-goog-api-key", self.api_key.as_str())
            .json(serde_json::to_value(&body)?))
    }
}

// Request types
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest<'a> {
    contents: Vec<GeminiContent<'a>>,
    generation_config: GeminiConfig,
}

#[derive(Debug, Serialize)]
struct GeminiContent<'a> {
    parts: Vec<GeminiPart<'a>>,
}

#[derive(Debug, Serialize)]
struct GeminiPart<'a> {
    text: &'a str,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_modalities: Option<Vec<&'static str>>,
}

impl<'a> GeminiRequest<'a> {
    fn new(modality: Modality, req: &'a GenerationRequest) -> Self {
        let generation_config = match modality {
            Modality::Text => GeminiConfig {
                max_output_tokens: req.text.max_tokens,
                temperature: req.text.temperature,
                ..Default::default()
            },
            Modality::Image => GeminiConfig {
                response_modalities: Some(vec!["TEXT", "IMAGE"]),
                ..Default::default()
            },
        };

        Self {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart { text: &req.prompt }],
            }],
            generation_config,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::CallBody;

    fn provider() -> GeminiProvider {
        GeminiProviderBuilder::new()
            .api_key("AIza-test")
            .base_url("http://localhost:9999")
            .build()
            .unwrap()
    }

    fn json_body(spec: &CallSpec) -> &serde_json::Value {
        match &spec.body {
            CallBody::Json(v) => v,
            other => panic!("expected JSON body, got {other:?}"),
        }
    }

    #[test]
    fn test_text_call() {
        let request = GenerationRequest::new("Describe a nebula")
            .with_max_tokens(256)
            .with_temperature(0.9);
        let spec = provider().call_spec(Modality::Text, &request).unwrap();

        assert_eq!(
            spec.url,
            "http://localhost:9999/models/gemini-2.0-flash:generateContent"
        );
        assert_eq!(spec.header_value("x-goog-api-key"), Some("AIza-test"));
        assert!(spec.header_value("authorization").is_none());

        let body = json_body(&spec);
        assert_eq!(body["contents"][0]["parts"][0]["text"], "Describe a nebula");
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 256);
        assert_eq!(body["generationConfig"]["temperature"], 0.9);
        assert!(body["generationConfig"].get("responseModalities").is_none());
    }

    #[test]
    fn test_image_call_requests_image_modality() {
        let spec = provider()
            .call_spec(Modality::Image, &GenerationRequest::new("a nebula"))
            .unwrap();

        assert_eq!(
            spec.url,
            "http://localhost:9999/models/gemini-2.0-flash-preview-image-generation:generateContent"
        );
        let modalities = &json_body(&spec)["generationConfig"]["responseModalities"];
        assert_eq!(modalities, &serde_json::json!(["TEXT", "IMAGE"]));
    }

    #[test]
    fn test_request_model_overrides_default() {
        let request = GenerationRequest::new("hi").with_text_model("gemini-1.5-pro");
        let spec = provider().call_spec(Modality::Text, &request).unwrap();
        assert!(spec.url.ends_with("/models/gemini-1.5-pro:generateContent"));
    }
}
