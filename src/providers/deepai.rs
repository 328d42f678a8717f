//! DeepAI provider (image only).
//!
//! DeepAI takes a form body and answers with `{"id": ..., "output_url": ...}`,
//! so the image arrives as a URL rather than inline data.

use crate::error::Result;
use crate::gateway::CallSpec;
use crate::providers::{resolve_api_key, unsupported, Provider, ProviderKind};
use crate::request::{GenerationRequest, Modality};

const BASE_URL: &str = "https://api.deepai.org/api";

/// Default image endpoint.
pub const DEFAULT_IMAGE_MODEL: &str = "text2img";

/// Builder for DeepAiProvider.
#[derive(Debug, Clone)]
pub struct DeepAiProviderBuilder {
    api_key: Option<String>,
    base_url: String,
    image_model: String,
}

impl Default for DeepAiProviderBuilder {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: BASE_URL.to_string(),
            image_model: DEFAULT_IMAGE_MODEL.to_string(),
        }
    }
}

impl DeepAiProviderBuilder {
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

    /// Sets the default image endpoint (e.g. `"text2img"`).
    pub fn image_model(mut self, model: impl Into<String>) -> Self {
        self.image_model = model.into();
        self
    }

    /// Builds the provider.
    pub fn build(self) -> Result<DeepAiProvider> {
        let api_key = resolve_api_key(self.api_key, ProviderKind::DeepAi)?;
        Ok(DeepAiProvider {
            api_key,
            base_url: self.base_url,
            image_model: self.image_model,
        })
    }
}

/// DeepAI provider.
pub struct DeepAiProvider {
    api_key: String,
    base_url: String,
    image_model: String,
}

impl DeepAiProvider {
    /// Creates a new `DeepAiProviderBuilder`.
    pub fn builder() -> DeepAiProviderBuilder {
        DeepAiProviderBuilder::new()
    }
}

impl Provider for DeepAiProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::DeepAi
    }

    fn call_spec(&self, modality: Modality, request: &GenerationRequest) -> Result<CallSpec> {
        if modality != Modality::Image {
            return Err(unsupported(self.kind(), modality));
        }

        let endpoint = request.image.model.as_deref().unwrap_or(&self.image_model);
        let mut form = vec![("text".to_string(), request.prompt.clone())];
        if let Some(r) = request.image.resolution {
            form.push(("width".to_string(), r.width.to_string()));
            form.push(("height".to_string(), r.height.to_string()));
        }

        Ok(
            CallSpec::post(modality.call_id(), format!("{}/{}", self.base_url, endpoint))
                .header("api-key", self.api_key.as_str())
                .form(form),
        )
    }
}
