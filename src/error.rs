//! Error types for the bridge.
//!
//! Only structural problems are errors here. A provider call that fails is a
//! value ([`CallFailure`](crate::gateway::CallFailure)) recorded in the call's
//! outcome, never a [`GenBridgeError`].

/// Maximum characters kept from an upstream body when it is recorded for diagnosis.
pub const EXCERPT_MAX_CHARS: usize = 200;

/// Errors that abort an operation.
#[derive(Debug, thiserror::Error)]
pub enum GenBridgeError {
    /// Missing credential or unusable setting. Fatal at startup.
    #[error("configuration error: {0}")]
    Config(String),

    /// The inbound request is unusable (e.g. empty prompt).
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// HTTP client construction or local transport setup failed.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error (binding a listener, writing an image).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to decode base64 data.
    #[error("failed to decode: {0}")]
    Decode(String),
}

impl GenBridgeError {
    /// Returns true if the caller caused this error and should fix the request.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidRequest(_) | Self::Json(_))
    }
}

/// Result type alias for bridge operations.
pub type Result<T> = std::result::Result<T, GenBridgeError>;

/// Collapses whitespace and truncates an upstream body to [`EXCERPT_MAX_CHARS`].
///
/// Provider error bodies can be large HTML pages or multi-line JSON; the
/// excerpt keeps enough to diagnose from a log line.
pub fn sanitize_excerpt(text: &str) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    match collapsed.char_indices().nth(EXCERPT_MAX_CHARS) {
        Some((cut, _)) => format!("{}...", &collapsed[..cut]),
        None => collapsed,
    }
}

/// Parses the `Retry-After` header as whole seconds.
pub fn parse_retry_after(headers: &reqwest::header::HeaderMap) -> Option<u64> {
    headers
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_client_error() {
        assert!(GenBridgeError::InvalidRequest("Prompt required".into()).is_client_error());
        assert!(!GenBridgeError::Config("HF_API_KEY missing".into()).is_client_error());
        assert!(!GenBridgeError::Decode("bad base64".into()).is_client_error());
    }

    #[test]
    fn test_error_display() {
        let err = GenBridgeError::Config("HF_API_KEY is not set".into());
        assert_eq!(err.to_string(), "configuration error: HF_API_KEY is not set");

        let err = GenBridgeError::InvalidRequest("Prompt required".into());
        assert_eq!(err.to_string(), "invalid request: Prompt required");
    }

    #[test]
    fn test_sanitize_excerpt_collapses_whitespace() {
        assert_eq!(
            sanitize_excerpt("  {\n  \"error\":\n\t\"model loading\" }  "),
            "{ \"error\": \"model loading\" }"
        );
    }

    #[test]
    fn test_sanitize_excerpt_truncates_on_char_boundary() {
        let long = "é".repeat(EXCERPT_MAX_CHARS + 50);
        let excerpt = sanitize_excerpt(&long);
        assert!(excerpt.ends_with("..."));
        assert_eq!(excerpt.chars().count(), EXCERPT_MAX_CHARS + 3);

        let short = "short body";
        assert_eq!(sanitize_excerpt(short), short);
    }

    #[test]
    fn test_parse_retry_after() {
        let mut headers = reqwest::header::HeaderMap::new();
        assert_eq!(parse_retry_after(&headers), None);

        headers.insert(reqwest::header::RETRY_AFTER, "7".parse().unwrap());
        assert_eq!(parse_retry_after(&headers), Some(7));

        headers.insert(
            reqwest::header::RETRY_AFTER,
            "Wed, 21 Oct 2015 07:28:00 GMT".parse().unwrap(),
        );
        assert_eq!(parse_retry_after(&headers), None);
    }
}
