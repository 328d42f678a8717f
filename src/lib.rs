#![warn(missing_docs)]
//! genbridge - prompt-to-provider bridge for text and image generation.
//!
//! A prompt goes out to a text provider and an image provider at the same
//! time. Whatever comes back, in whatever JSON shape or as raw image bytes,
//! is reduced to one [`NormalizedResult`]:
//!
//! ```json
//! { "text": "...", "imageBase64": "data:image/png;base64,...", "imageUrl": null }
//! ```
//!
//! A provider that fails or times out leaves its field `null`; the request
//! still succeeds. Only an invalid request (e.g. an empty prompt) is an error.
//!
//! # Quick Start
//!
//! ```no_run
//! use genbridge::{Config, GenerationRequest, Orchestrator};
//!
//! #[tokio::main]
//! async fn main() -> genbridge::Result<()> {
//!     let config = Config::from_env()?;
//!     let orchestrator = Orchestrator::from_config(&config)?;
//!     let request = GenerationRequest::new("A lighthouse at dusk").with_max_tokens(120);
//!     let result = orchestrator.generate(&request).await?;
//!     println!("{}", serde_json::to_string_pretty(&result)?);
//!     Ok(())
//! }
//! ```
//!
//! # Features
//!
//! ## Providers
//! - `huggingface`: Hugging Face Inference API
//! - `edenai`: Eden AI
//! - `gemini`: Gemini (Google)
//! - `openai`: OpenAI (chat completions, DALL-E / gpt-image)
//! - `deepai`: DeepAI (image only)
//!
//! ## Meta Features
//! - `providers`: All providers
//! - `server`: axum HTTP surface
//! - `cli`: Command-line interface (implies `server`)

pub mod config;
pub mod error;
pub mod extract;
pub mod gateway;
pub mod orchestrator;
pub mod providers;
pub mod request;
pub mod result;

#[cfg(feature = "server")]
pub mod server;

// Re-export error types at crate root
pub use error::{GenBridgeError, Result};

pub use config::{Config, Credentials};
pub use gateway::{
    CallFailure, CallSpec, Dispatch, DispatchExt, Gateway, GatewayBuilder, Outcomes,
    ProviderCallOutcome, RawPayload,
};
pub use orchestrator::Orchestrator;
pub use providers::{Provider, ProviderKind};
pub use request::{GenerationRequest, Modality, Resolution};
pub use result::{NormalizedResult, NO_OUTPUT_NOTE};

#[cfg(feature = "deepai")]
pub use providers::{DeepAiProvider, DeepAiProviderBuilder};
#[cfg(feature = "edenai")]
pub use providers::{EdenAiProvider, EdenAiProviderBuilder};
#[cfg(feature = "gemini")]
pub use providers::{GeminiProvider, GeminiProviderBuilder};
#[cfg(feature = "huggingface")]
pub use providers::{HuggingFaceProvider, HuggingFaceProviderBuilder};
#[cfg(feature = "openai")]
pub use providers::{OpenAiProvider, OpenAiProviderBuilder};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::error::{GenBridgeError, Result};
    pub use crate::extract::{find_base64_image, find_first_url, longest_text};
    pub use crate::gateway::{Dispatch, DispatchExt, Gateway};
    pub use crate::orchestrator::Orchestrator;
    pub use crate::providers::{Provider, ProviderKind};
    pub use crate::request::{GenerationRequest, Modality};
    pub use crate::result::NormalizedResult;
    pub use crate::Config;
}
