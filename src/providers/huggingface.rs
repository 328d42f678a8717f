//! Hugging Face Inference API provider.
//!
//! Text models answer with JSON (`[{"generated_text": ...}]`); diffusion
//! models answer with raw image bytes.

use crate::error::Result;
use crate::gateway::{CallSpec, ResponseKind};
use crate::providers::{resolve_api_key, Provider, ProviderKind};
use crate::request::{GenerationRequest, Modality};
use serde_json::{json, Map, Value};

const BASE_URL: &str = "https://api-inference.huggingface.co";

/// Default text model.
pub const DEFAULT_TEXT_MODEL: &str = "gpt2";
/// Default image model.
pub const DEFAULT_IMAGE_MODEL: &str = "runwayml/stable-diffusion-v1-5";
/// `max_length` sent when the request has no token budget.
const DEFAULT_MAX_LENGTH: u32 = 200;

/// Builder for HuggingFaceProvider.
#[derive(Debug, Clone)]
pub struct HuggingFaceProviderBuilder {
    api_key: Option<String>,
    base_url: String,
    text_model: String,
    image_model: String,
}

impl Default for HuggingFaceProviderBuilder {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: BASE_URL.to_string(),
            text_model: DEFAULT_TEXT_MODEL.to_string(),
            image_model: DEFAULT_IMAGE_MODEL.to_string(),
        }
    }
}

impl HuggingFaceProviderBuilder {
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
    pub fn build(self) -> Result<HuggingFaceProvider> {
        let api_key = resolve_api_key(self.api_key, ProviderKind::HuggingFace)?;
        Ok(HuggingFaceProvider {
            api_key,
            base_url: self.base_url,
            text_model: self.text_model,
            image_model: self.image_model,
        })
    }
}

/// Hugging Face Inference API provider.
pub struct HuggingFaceProvider {
    api_key: String,
    base_url: String,
    text_model: String,
    image_model: String,
}

impl HuggingFaceProvider {
    /// Creates a new `HuggingFaceProviderBuilder`.
    pub fn builder() -> HuggingFaceProviderBuilder {
        HuggingFaceProviderBuilder::new()
    }

    fn model_url(&self, model: &str) -> String {
        format!("{}/models/{}", self.base_url, model)
    }

    fn text_call(&self, request: &GenerationRequest) -> CallSpec {
        let model = request.text.model.as_deref().unwrap_or(&self.text_model);

        let mut parameters = Map::new();
        parameters.insert(
            "max_length".into(),
            json!(request.text.max_tokens.unwrap_or(DEFAULT_MAX_LENGTH)),
        );
        if let Some(t) = request.text.temperature {
            parameters.insert("temperature".into(), json!(t));
        }

        CallSpec::post(Modality::Text.call_id(), self.model_url(model))
            .bearer(&self.api_key)
            .json(json!({
                "inputs": request.prompt,
                "parameters": Value::Object(parameters),
            }))
    }

    fn image_call(&self, request: &GenerationRequest) -> CallSpec {
        let model = request.image.model.as_deref().unwrap_or(&self.image_model);

        let mut body = json!({ "inputs": request.prompt });
        if let Some(r) = request.image.resolution {
            body["parameters"] = json!({ "width": r.width, "height": r.height });
        }

        CallSpec::post(Modality::Image.call_id(), self.model_url(model))
            .bearer(&self.api_key)
            .header("Accept", "image/png")
            .json(body)
            .expect(ResponseKind::Binary)
    }
}

impl Provider for HuggingFaceProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::HuggingFace
    }

    fn call_spec(&self, modality: Modality, request: &GenerationRequest) -> Result<CallSpec> {
        Ok(match modality {
            Modality::Text => self.text_call(request),
            Modality::Image => self.image_call(request),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::CallBody;

    fn provider() -> HuggingFaceProvider {
        HuggingFaceProviderBuilder::new()
            .api_key("hf_test")
            .base_url("http://localhost:9999/")
            .build()
            .unwrap()
    }

    fn body(spec: &CallSpec) -> &Value {
        match &spec.body {
            CallBody::Json(v) => v,
            other => panic!("expected JSON body, got {other:?}"),
        }
    }

    #[test]
    fn test_builder_without_key_fails() {
        assert!(HuggingFaceProviderBuilder::new().build().is_err());
    }

    #[test]
    fn test_text_call_defaults() {
        let spec = provider()
            .call_spec(Modality::Text, &GenerationRequest::new("Once upon a time"))
            .unwrap();

        assert_eq!(spec.id, "text");
        assert_eq!(spec.url, "http://localhost:9999/models/gpt2");
        assert_eq!(spec.header_value("Authorization"), Some("Bearer hf_test"));
        assert_eq!(spec.expect, ResponseKind::Json);

        let body = body(&spec);
        assert_eq!(body["inputs"], "Once upon a time");
        assert_eq!(body["parameters"]["max_length"], 200);
        assert!(body["parameters"].get("temperature").is_none());
    }

    #[test]
    fn test_text_call_with_params() {
        let request = GenerationRequest::new("Once upon a time")
            .with_text_model("distilgpt2")
            .with_max_tokens(50)
            .with_temperature(0.5);
        let spec = provider().call_spec(Modality::Text, &request).unwrap();

        assert_eq!(spec.url, "http://localhost:9999/models/distilgpt2");
        assert_eq!(body(&spec)["parameters"]["max_length"], 50);
        assert_eq!(body(&spec)["parameters"]["temperature"], 0.5);
    }

    #[test]
    fn test_image_call_expects_binary() {
        let request = GenerationRequest::new("a lighthouse").with_resolution(512, 768);
        let spec = provider().call_spec(Modality::Image, &request).unwrap();

        assert_eq!(spec.id, "image");
        assert_eq!(
            spec.url,
            "http://localhost:9999/models/runwayml/stable-diffusion-v1-5"
        );
        assert_eq!(spec.expect, ResponseKind::Binary);
        assert_eq!(body(&spec)["parameters"]["width"], 512);
        assert_eq!(body(&spec)["parameters"]["height"], 768);
    }
}
