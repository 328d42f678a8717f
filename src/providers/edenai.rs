//! Eden AI provider.
//!
//! Eden AI fans a request out to a named sub-provider (`"openai"`,
//! `"stabilityai"`, ...) and nests each answer under that name, e.g.
//! `{"openai": {"generated_text": ...}}`. The request's model id selects the
//! sub-provider.

use crate::error::Result;
use crate::gateway::CallSpec;
use crate::providers::{resolve_api_key, Provider, ProviderKind};
use crate::request::{GenerationRequest, Modality};
use serde::Serialize;

const BASE_URL: &str = "https://api.edenai.run/v2";

/// Default sub-provider for both modalities.
pub const DEFAULT_SUB_PROVIDER: &str = "openai";
const DEFAULT_RESOLUTION: &str = "512x512";

/// Builder for EdenAiProvider.
#[derive(Debug, Clone)]
pub struct EdenAiProviderBuilder {
    api_key: Option<String>,
    base_url: String,
    text_provider: String,
    image_provider: String,
}

impl Default for EdenAiProviderBuilder {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: BASE_URL.to_string(),
            text_provider: DEFAULT_SUB_PROVIDER.to_string(),
            image_provider: DEFAULT_SUB_PROVIDER.to_string(),
        }
    }
}

impl EdenAiProviderBuilder {
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

    /// Sets the default sub-provider for text generation.
    pub fn text_provider(mut self, name: impl Into<String>) -> Self {
        self.text_provider = name.into();
        self
    }

    /// Sets the default sub-provider for image generation.
    pub fn image_provider(mut self, name: impl Into<String>) -> Self {
        self.image_provider = name.into();
        self
    }

    /// Builds the provider.
    pub fn build(self) -> Result<EdenAiProvider> {
        let api_key = resolve_api_key(self.api_key, ProviderKind::EdenAi)?;
        Ok(EdenAiProvider {
            api_key,
            base_url: self.base_url,
            text_provider: self.text_provider,
            image_provider: self.image_provider,
        })
    }
}

/// Eden AI provider.
pub struct EdenAiProvider {
    api_key: String,
    base_url: String,
    text_provider: String,
    image_provider: String,
}

impl EdenAiProvider {
    /// Creates a new `EdenAiProviderBuilder`.
    pub fn builder() -> EdenAiProviderBuilder {
        EdenAiProviderBuilder::new()
    }
}

impl Provider for EdenAiProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::EdenAi
    }

    fn call_spec(&self, modality: Modality, request: &GenerationRequest) -> Result<CallSpec> {
        let spec = match modality {
            Modality::Text => {
                let body = EdenTextRequest {
                    providers: request.text.model.as_deref().unwrap_or(&self.text_provider),
                    text: &request.prompt,
                    max_tokens: request.text.max_tokens,
                    temperature: request.text.temperature,
                };
                CallSpec::post(modality.call_id(), format!("{}/text/generation", self.base_url))
                    .json(serde_json::to_value(&body)?)
            }
            Modality::Image => {
                let resolution = request
                    .image
                    .resolution
                    .map(|r| r.to_string())
                    .unwrap_or_else(|| DEFAULT_RESOLUTION.to_string());
                let body = EdenImageRequest {
                    providers: request.image.model.as_deref().unwrap_or(&self.image_provider),
                    text: &request.prompt,
                    resolution,
                    num_images: 1,
                };
                CallSpec::post(modality.call_id(), format!("{}/image/generation", self.base_url))
                    .json(serde_json::to_value(&body)?)
            }
        };
        Ok(spec.bearer(&self.api_key))
    }
}

#[derive(Debug, Serialize)]
struct EdenTextRequest<'a> {
    providers: &'a str,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
}

#[derive(Debug, Serialize)]
struct EdenImageRequest<'a> {
    providers: &'a str,
    text: &'a str,
    resolution: String,
    num_images: u32,
}
