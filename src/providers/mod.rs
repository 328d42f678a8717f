//! Generation providers.
//!
//! A provider knows how to turn a [`GenerationRequest`] into a [`CallSpec`]
//! for its API. It does not send anything itself; the gateway does, and the
//! extractor reads whatever comes back.

#[cfg(feature = "deepai")]
mod deepai;
#[cfg(feature = "edenai")]
mod edenai;
#[cfg(feature = "gemini")]
mod gemini;
#[cfg(feature = "huggingface")]
mod huggingface;
#[cfg(feature = "openai")]
mod openai;

#[cfg(feature = "deepai")]
pub use deepai::{DeepAiProvider, DeepAiProviderBuilder};
#[cfg(feature = "edenai")]
pub use edenai::{EdenAiProvider, EdenAiProviderBuilder};
#[cfg(feature = "gemini")]
pub use gemini::{GeminiProvider, GeminiProviderBuilder};
#[cfg(feature = "huggingface")]
pub use huggingface::{HuggingFaceProvider, HuggingFaceProviderBuilder};
#[cfg(feature = "openai")]
pub use openai::{OpenAiProvider, OpenAiProviderBuilder};

use crate::config::Config;
use crate::error::{GenBridgeError, Result};
use crate::gateway::CallSpec;
use crate::request::{GenerationRequest, Modality};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Provider kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Hugging Face Inference API.
    HuggingFace,
    /// Eden AI aggregator.
    EdenAi,
    /// Google Gemini.
    Gemini,
    /// OpenAI.
    OpenAi,
    /// DeepAI.
    DeepAi,
}

impl ProviderKind {
    /// Every provider kind, in display order.
    pub const ALL: [ProviderKind; 5] = [
        Self::HuggingFace,
        Self::EdenAi,
        Self::Gemini,
        Self::OpenAi,
        Self::DeepAi,
    ];

    /// Returns the short identifier (e.g. `"huggingface"`).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HuggingFace => "huggingface",
            Self::EdenAi => "edenai",
            Self::Gemini => "gemini",
            Self::OpenAi => "openai",
            Self::DeepAi => "deepai",
        }
    }

    /// Returns the provider's display name.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::HuggingFace => "Hugging Face Inference",
            Self::EdenAi => "Eden AI",
            Self::Gemini => "Gemini (Google)",
            Self::OpenAi => "OpenAI",
            Self::DeepAi => "DeepAI",
        }
    }

    /// Environment variable holding the provider's credential.
    pub fn credential_env(&self) -> &'static str {
        match self {
            Self::HuggingFace => "HF_API_KEY",
            Self::EdenAi => "EDENAI_API_KEY",
            Self::Gemini => "GEMINI_API_KEY",
            Self::OpenAi => "OPENAI_API_KEY",
            Self::DeepAi => "DEEPAI_API_KEY",
        }
    }

    /// Modalities the provider can generate.
    pub fn modalities(&self) -> &'static [Modality] {
        match self {
            Self::DeepAi => &[Modality::Image],
            _ => &[Modality::Text, Modality::Image],
        }
    }

    /// Returns true if the provider can generate `modality`.
    pub fn supports(&self, modality: Modality) -> bool {
        self.modalities().contains(&modality)
    }

    /// Returns true if the provider's feature is compiled in.
    pub fn is_enabled(&self) -> bool {
        match self {
            Self::HuggingFace => cfg!(feature = "huggingface"),
            Self::EdenAi => cfg!(feature = "edenai"),
            Self::Gemini => cfg!(feature = "gemini"),
            Self::OpenAi => cfg!(feature = "openai"),
            Self::DeepAi => cfg!(feature = "deepai"),
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = GenBridgeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "huggingface" | "hugging-face" | "hf" => Ok(Self::HuggingFace),
            "edenai" | "eden-ai" | "eden" => Ok(Self::EdenAi),
            "gemini" | "google" => Ok(Self::Gemini),
            "openai" => Ok(Self::OpenAi),
            "deepai" => Ok(Self::DeepAi),
            other => Err(GenBridgeError::Config(format!(
                "unknown provider '{other}'. Valid values: huggingface, edenai, gemini, openai, deepai"
            ))),
        }
    }
}

/// Trait for generation providers.
pub trait Provider: Send + Sync {
    /// Returns the kind of this provider.
    fn kind(&self) -> ProviderKind;

    /// Builds the outbound call for `modality`.
    ///
    /// The call id is the modality's [`call_id`](Modality::call_id).
    /// Fails with [`GenBridgeError::InvalidRequest`] for unsupported modalities.
    fn call_spec(&self, modality: Modality, request: &GenerationRequest) -> Result<CallSpec>;

    /// Returns the name of this provider for display.
    fn name(&self) -> &str {
        self.kind().display_name()
    }

    /// Returns true if the provider can generate `modality`.
    fn supports(&self, modality: Modality) -> bool {
        self.kind().supports(modality)
    }
}

/// Builds the provider of `kind` from the startup configuration.
pub fn from_config(kind: ProviderKind, config: &Config) -> Result<Arc<dyn Provider>> {
    let api_key = config.require(kind)?;
    match kind {
        #[cfg(feature = "huggingface")]
        ProviderKind::HuggingFace => Ok(Arc::new(
            HuggingFaceProvider::builder().api_key(api_key).build()?,
        )),
        #[cfg(feature = "edenai")]
        ProviderKind::EdenAi => Ok(Arc::new(EdenAiProvider::builder().api_key(api_key).build()?)),
        #[cfg(feature = "gemini")]
        ProviderKind::Gemini => Ok(Arc::new(GeminiProvider::builder().api_key(api_key).build()?)),
        #[cfg(feature = "openai")]
        ProviderKind::OpenAi => Ok(Arc::new(OpenAiProvider::builder().api_key(api_key).build()?)),
        #[cfg(feature = "deepai")]
        ProviderKind::DeepAi => Ok(Arc::new(DeepAiProvider::builder().api_key(api_key).build()?)),
        #[allow(unreachable_patterns)]
        other => Err(GenBridgeError::Config(format!(
            "provider '{other}' is not enabled in this build"
        ))),
    }
}

/// Resolves a builder's API key, rejecting missing or blank keys.
#[allow(dead_code)]
pub(crate) fn resolve_api_key(key: Option<String>, kind: ProviderKind) -> Result<String> {
    key.filter(|k| !k.trim().is_empty()).ok_or_else(|| {
        GenBridgeError::Config(format!(
            "{} not set and no API key provided",
            kind.credential_env()
        ))
    })
}

#[allow(dead_code)]
pub(crate) fn unsupported(kind: ProviderKind, modality: Modality) -> GenBridgeError {
    GenBridgeError::InvalidRequest(format!("{} does not support {modality} generation", kind.display_name()))
}
