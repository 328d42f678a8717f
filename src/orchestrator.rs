//! Combines the gateway and the extractors into one generation request.

use crate::config::Config;
use crate::error::Result;
use crate::extract::{base64_data_uri, find_base64_image, find_first_url, longest_text, to_data_uri};
use crate::gateway::{Dispatch, DispatchExt, Gateway, ProviderCallOutcome, RawPayload};
use crate::providers::{self, Provider};
use crate::request::{GenerationRequest, Modality};
use crate::result::NormalizedResult;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Runs generation requests against the configured providers.
///
/// Provider failures never surface as errors: they leave the matching result
/// field empty. Only an invalid request is an `Err`.
pub struct Orchestrator {
    dispatcher: Arc<dyn Dispatch>,
    text: Arc<dyn Provider>,
    image: Arc<dyn Provider>,
    retries: u32,
    shutdown: CancellationToken,
}

impl Orchestrator {
    /// Creates an orchestrator from its parts.
    pub fn new(dispatcher: Arc<dyn Dispatch>, text: Arc<dyn Provider>, image: Arc<dyn Provider>) -> Self {
        Self {
            dispatcher,
            text,
            image,
            retries: 0,
            shutdown: CancellationToken::new(),
        }
    }

    /// Builds the gateway and the selected providers from `config`.
    pub fn from_config(config: &Config) -> Result<Self> {
        let gateway = Gateway::builder().timeout(config.timeout).build()?;
        let text = providers::from_config(config.text_provider, config)?;
        let image = providers::from_config(config.image_provider, config)?;
        Ok(Self::new(Arc::new(gateway), text, image))
    }

    /// Sets how many times retryable call failures are re-issued.
    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    /// Token that cancels every in-flight provider call when triggered.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Returns the provider serving `modality`.
    pub fn provider(&self, modality: Modality) -> &Arc<dyn Provider> {
        match modality {
            Modality::Text => &self.text,
            Modality::Image => &self.image,
        }
    }

    /// Generates text and an image concurrently.
    pub async fn generate(&self, request: &GenerationRequest) -> Result<NormalizedResult> {
        self.run(request, &[Modality::Text, Modality::Image]).await
    }

    /// Generates text only.
    pub async fn generate_text(&self, request: &GenerationRequest) -> Result<NormalizedResult> {
        self.run(request, &[Modality::Text]).await
    }

    /// Generates an image only.
    pub async fn generate_image(&self, request: &GenerationRequest) -> Result<NormalizedResult> {
        self.run(request, &[Modality::Image]).await
    }

    async fn run(&self, request: &GenerationRequest, modalities: &[Modality]) -> Result<NormalizedResult> {
        request.validate()?;

        let calls = modalities
            .iter()
            .map(|&m| self.provider(m).call_spec(m, request))
            .collect::<Result<Vec<_>>>()?;

        let cancel = self.shutdown.child_token();
        let mut outcomes = self
            .dispatcher
            .dispatch_with_retries(calls, &cancel, self.retries)
            .await?;

        let mut result = NormalizedResult::default();
        if let Some(outcome) = outcomes.take(Modality::Text.call_id()) {
            result.text = extract_text(outcome);
        }
        if let Some(outcome) = outcomes.take(Modality::Image.call_id()) {
            let (image_base64, image_url) = extract_image(outcome);
            result.image_base64 = image_base64;
            result.image_url = image_url;
        }

        tracing::info!(
            text = result.text.is_some(),
            image_base64 = result.image_base64.is_some(),
            image_url = result.image_url.is_some(),
            "generation finished"
        );

        Ok(result.with_fallback_note())
    }
}

fn extract_text(outcome: ProviderCallOutcome) -> Option<String> {
    match outcome {
        ProviderCallOutcome::Success(RawPayload::Json(payload)) => {
            Some(longest_text(&payload)).filter(|text| !text.is_empty())
        }
        _ => None,
    }
}

/// Base64 first, then a URL.
fn extract_image(outcome: ProviderCallOutcome) -> (Option<String>, Option<String>) {
    match outcome {
        ProviderCallOutcome::Success(RawPayload::Binary { bytes, content_type }) if !bytes.is_empty() => {
            (Some(to_data_uri(&bytes, content_type.as_deref())), None)
        }
        ProviderCallOutcome::Success(RawPayload::Json(payload)) => match find_base64_image(&payload) {
            Some(b64) => (Some(base64_data_uri(&b64)), None),
            None => (None, find_first_url(&payload)),
        },
        _ => (None, None),
    }
}
