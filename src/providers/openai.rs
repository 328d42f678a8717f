//! OpenAI provider (chat completions, image generations).

use crate::error::Result;
use crate::gateway::CallSpec;
use crate::providers::{resolve_api_key, Provider, ProviderKind};
use crate::request::{GenerationRequest, Modality};
use serde::Serialize;

const BASE_URL: &str = "https://api.openai.com/v1";

/// Default text model.
pub const DEFAULT_TEXT_MODEL: &str = "gpt-4o-mini";
/// Default image model.
pub const DEFAULT_IMAGE_MODEL: &str = "dall-e-3";
const DEFAULT_SIZE: &str = "1024x1024";

/// Builder for OpenAiProvider.
#[derive(Debug, Clone)]
pub struct OpenAiProviderBuilder {
    api_key: Option<String>,
    base_url: String,
    text_model: String,
    image_model: String,
}

impl Default for OpenAiProviderBuilder {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: BASE_URL.to_string(),
            text_model: DEFAULT_TEXT_MODEL.to_string(),
            image_model: DEFAULT_IMAGE_MODEL.to_string(),
        }
    }
}

impl OpenAiProviderBuilder {
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

    /// Sets the default chat model.
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
    pub fn build(self) -> Result<OpenAiProvider> {
        let api_key = resolve_api_key(self.api_key, ProviderKind::OpenAi)?;
        Ok(OpenAiProvider {
            api_key,
            base_url: self.base_url,
            text_model: self.text_model,
            image_model: self.image_model,
        })
    }
}

/// OpenAI provider.
pub struct OpenAiProvider {
    api_key: String,
    base_url: String,
    text_model: String,
    image_model: String,
}

impl OpenAiProvider {
    /// Creates a new `OpenAiProviderBuilder`.
    pub fn builder() -> OpenAiProviderBuilder {
        OpenAiProviderBuilder::new()
    }
}

impl Provider for OpenAiProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::OpenAi
    }

    fn call_spec(&self, modality: Modality, request: &GenerationRequest) -> Result<CallSpec> {
        let spec = match modality {
            Modality::Text => {
                let body = ChatRequest {
                    model: request.text.model.as_deref().unwrap_or(&self.text_model),
                    messages: vec![ChatMessage {
                        role: "user",
                        content: &request.prompt,
                    }],
                    max_tokens: request.text.max_tokens,
                    temperature: request.text.temperature,
                };
                CallSpec::post(modality.call_id(), format!("{}/chat/completions", self.base_url))
                    .json(serde_json::to_value(&body)?)
            }
            Modality::Image => {
                let model = request.image.model.as_deref().unwrap_or(&self.image_model);
                let body = ImageRequest {
                    model,
                    prompt: &request.prompt,
                    n: 1,
                    size: request
                        .image
                        .resolution
                        .map(|r| r.to_string())
                        .unwrap_or_else(|| DEFAULT_SIZE.to_string()),
                    // gpt-image-* always answers with b64_json and rejects the field
                    response_format: model.starts_with("dall-e").then_some("b64_json"),
                };
                CallSpec::post(modality.call_id(), format!("{}/images/generations", self.base_url))
                    .json(serde_json::to_value(&body)?)
            }
        };
        Ok(spec.bearer(&self.api_key))
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ImageRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    n: u32,
    size: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<&'static str>,
}
