//! The inbound generation request.

use crate::error::{GenBridgeError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The kind of content requested from a provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Modality {
    /// Generated text.
    Text,
    /// Generated image.
    Image,
}

impl Modality {
    /// Returns the call id used for this modality when dispatching.
    pub fn call_id(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Image => "image",
        }
    }
}

impl fmt::Display for Modality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.call_id())
    }
}

/// Image size in pixels, written as `"WxH"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Resolution {
    /// Creates a resolution.
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl FromStr for Resolution {
    type Err = GenBridgeError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || GenBridgeError::InvalidRequest(format!("invalid resolution '{s}', expected WxH"));
        let (w, h) = s.trim().split_once(['x', 'X']).ok_or_else(invalid)?;
        let width = w.trim().parse().map_err(|_| invalid())?;
        let height = h.trim().parse().map_err(|_| invalid())?;
        Ok(Self { width, height })
    }
}

impl Serialize for Resolution {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Resolution {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Parameters for the text call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextParams {
    /// Provider model id; the provider default is used when absent.
    pub model: Option<String>,
    /// Token budget for the generated text.
    pub max_tokens: Option<u32>,
    /// Sampling temperature (0.0 - 2.0).
    pub temperature: Option<f64>,
}

/// Parameters for the image call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageParams {
    /// Provider model id; the provider default is used when absent.
    pub model: Option<String>,
    /// Desired output size.
    pub resolution: Option<Resolution>,
}

/// A request to generate text and/or an image from one prompt.
///
/// Every field defaults when deserializing, so a body without a prompt is
/// rejected by [`validate`](Self::validate) instead of by the JSON parser.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationRequest {
    /// The user prompt.
    pub prompt: String,
    /// Text call parameters.
    pub text: TextParams,
    /// Image call parameters.
    pub image: ImageParams,
}

impl GenerationRequest {
    /// Creates a new request with the given prompt.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Self::default()
        }
    }

    /// Sets the text model.
    pub fn with_text_model(mut self, model: impl Into<String>) -> Self {
        self.text.model = Some(model.into());
        self
    }

    /// Sets the token budget for the text call.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.text.max_tokens = Some(max_tokens);
        self
    }

    /// Sets the sampling temperature for the text call.
    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.text.temperature = Some(temperature);
        self
    }

    /// Sets the image model.
    pub fn with_image_model(mut self, model: impl Into<String>) -> Self {
        self.image.model = Some(model.into());
        self
    }

    /// Sets the image resolution.
    pub fn with_resolution(mut self, width: u32, height: u32) -> Self {
        self.image.resolution = Some(Resolution::new(width, height));
        self
    }

    /// Checks the request before any provider is contacted.
    pub fn validate(&self) -> Result<()> {
        if self.prompt.trim().is_empty() {
            return Err(GenBridgeError::InvalidRequest("Prompt required".into()));
        }
        if let Some(t) = self.text.temperature {
            if !(0.0..=2.0).contains(&t) {
                return Err(GenBridgeError::InvalidRequest(format!(
                    "temperature must be between 0.0 and 2.0, got {t}"
                )));
            }
        }
        if self.text.max_tokens == Some(0) {
            return Err(GenBridgeError::InvalidRequest("max_tokens must be positive".into()));
        }
        if let Some(r) = self.image.resolution {
            if r.width == 0 || r.height == 0 {
                return Err(GenBridgeError::InvalidRequest(format!(
                    "resolution must be non-zero, got {r}"
                )));
            }
        }
        Ok(())
    }
}
