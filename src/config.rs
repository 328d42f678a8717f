//! Startup configuration.
//!
//! Everything is read once, when the process starts. Request handling only
//! ever sees a `&Config`; nothing reads the environment per request.

use crate::error::{GenBridgeError, Result};
use crate::gateway::DEFAULT_TIMEOUT;
use crate::providers::ProviderKind;
use crate::request::Modality;
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

/// Selects the text provider.
pub const TEXT_PROVIDER_ENV: &str = "GENBRIDGE_TEXT_PROVIDER";
/// Selects the image provider.
pub const IMAGE_PROVIDER_ENV: &str = "GENBRIDGE_IMAGE_PROVIDER";
/// Per-call deadline in whole seconds.
pub const TIMEOUT_ENV: &str = "GENBRIDGE_TIMEOUT_SECS";
/// Fallback variable for the Gemini credential.
pub const GOOGLE_API_KEY_ENV: &str = "GOOGLE_API_KEY";

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 3000;

/// Provider credentials, one slot per provider.
#[derive(Clone, Default)]
pub struct Credentials {
    huggingface: Option<String>,
    edenai: Option<String>,
    gemini: Option<String>,
    openai: Option<String>,
    deepai: Option<String>,
}

impl Credentials {
    fn slot(&self, kind: ProviderKind) -> &Option<String> {
        match kind {
            ProviderKind::HuggingFace => &self.huggingface,
            ProviderKind::EdenAi => &self.edenai,
            ProviderKind::Gemini => &self.gemini,
            ProviderKind::OpenAi => &self.openai,
            ProviderKind::DeepAi => &self.deepai,
        }
    }

    fn slot_mut(&mut self, kind: ProviderKind) -> &mut Option<String> {
        match kind {
            ProviderKind::HuggingFace => &mut self.huggingface,
            ProviderKind::EdenAi => &mut self.edenai,
            ProviderKind::Gemini => &mut self.gemini,
            ProviderKind::OpenAi => &mut self.openai,
            ProviderKind::DeepAi => &mut self.deepai,
        }
    }

    /// Returns the credential for `kind`, ignoring blank values.
    pub fn get(&self, kind: ProviderKind) -> Option<&str> {
        self.slot(kind)
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }

    /// Sets the credential for `kind`.
    pub fn set(&mut self, kind: ProviderKind, key: impl Into<String>) {
        *self.slot_mut(kind) = Some(key.into());
    }

    /// Returns true if a non-blank credential is present for `kind`.
    pub fn has(&self, kind: ProviderKind) -> bool {
        self.get(kind).is_some()
    }
}

// Keys never reach logs.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut set = f.debug_set();
        for kind in ProviderKind::ALL {
            if self.has(kind) {
                set.entry(&kind.as_str());
            }
        }
        set.finish()
    }
}

/// Process configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Provider credentials.
    pub credentials: Credentials,
    /// Provider used for text generation.
    pub text_provider: ProviderKind,
    /// Provider used for image generation.
    pub image_provider: ProviderKind,
    /// Per-call deadline.
    pub timeout: Duration,
    /// Interface the HTTP server binds.
    pub host: String,
    /// Port the HTTP server binds.
    pub port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            credentials: Credentials::default(),
            text_provider: ProviderKind::HuggingFace,
            image_provider: ProviderKind::HuggingFace,
            timeout: DEFAULT_TIMEOUT,
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

impl Config {
    /// Loads configuration from the process environment and validates it.
    pub fn from_env() -> Result<Self> {
        let config = Self::from_lookup(|name| std::env::var(name).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration through `lookup` without validating it.
    ///
    /// Fails only when a value is present but malformed.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        for kind in ProviderKind::ALL {
            if let Some(key) = get(kind.credential_env()) {
                config.credentials.set(kind, key);
            }
        }
        if !config.credentials.has(ProviderKind::Gemini) {
            if let Some(key) = get(GOOGLE_API_KEY_ENV) {
                config.credentials.set(ProviderKind::Gemini, key);
            }
        }

        if let Some(v) = get(TEXT_PROVIDER_ENV) {
            config.text_provider = v.parse()?;
        }
        if let Some(v) = get(IMAGE_PROVIDER_ENV) {
            config.image_provider = v.parse()?;
        }
        if let Some(v) = get(TIMEOUT_ENV) {
            config.timeout = Duration::from_secs(parse_setting(TIMEOUT_ENV, &v)?);
        }
        if let Some(v) = get("HOST") {
            config.host = v.trim().to_string();
        }
        if let Some(v) = get("PORT") {
            config.port = parse_setting("PORT", &v)?;
        }

        Ok(config)
    }

    /// Checks that the selected providers can run.
    ///
    /// Each selected provider must be compiled in, able to serve the modality
    /// it is selected for, and have a credential.
    pub fn validate(&self) -> Result<()> {
        if self.timeout.is_zero() {
            return Err(GenBridgeError::Config(format!("{TIMEOUT_ENV} must be positive")));
        }
        for (modality, kind) in [
            (Modality::Text, self.text_provider),
            (Modality::Image, self.image_provider),
        ] {
            if !kind.is_enabled() {
                return Err(GenBridgeError::Config(format!(
                    "provider '{kind}' is not enabled in this build"
                )));
            }
            if !kind.supports(modality) {
                return Err(GenBridgeError::Config(format!(
                    "{} cannot generate {modality}; choose another {modality} provider",
                    kind.display_name()
                )));
            }
            self.require(kind)?;
        }
        Ok(())
    }

    /// Returns the credential for `kind` or a configuration error naming its variable.
    pub fn require(&self, kind: ProviderKind) -> Result<&str> {
        self.credentials.get(kind).ok_or_else(|| {
            GenBridgeError::Config(format!(
                "{} not set; {} requires an API key",
                kind.credential_env(),
                kind.display_name()
            ))
        })
    }

    /// Returns the address the HTTP server binds.
    pub fn bind_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|_| GenBridgeError::Config(format!("invalid bind address {}:{}", self.host, self.port)))
    }
}

fn parse_setting<T: FromStr>(name: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| GenBridgeError::Config(format!("invalid {name}: '{value}'")))
}
