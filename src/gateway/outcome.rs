//! Per-call outcomes.

use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;

/// Payload of a successful call.
#[derive(Debug, Clone, PartialEq)]
pub enum RawPayload {
    /// Parsed JSON document.
    Json(Value),
    /// Raw response bytes with the response content type, if any.
    Binary {
        /// Response body.
        bytes: Vec<u8>,
        /// `Content-Type` header value.
        content_type: Option<String>,
    },
}

impl RawPayload {
    /// Returns the JSON value, if this is a JSON payload.
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Self::Json(v) => Some(v),
            Self::Binary { .. } => None,
        }
    }
}

/// Why a call produced no payload.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CallFailure {
    /// Connection, TLS or body-read error.
    #[error("transport error: {0}")]
    Transport(String),

    /// The call did not settle before its deadline.
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    /// The call was cancelled before it settled.
    #[error("cancelled")]
    Cancelled,

    /// The provider answered with a non-2xx status.
    #[error("HTTP {status}: {excerpt}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Sanitized body excerpt.
        excerpt: String,
        /// `Retry-After` seconds, when sent.
        retry_after: Option<u64>,
    },

    /// A JSON response was expected but the body did not parse.
    #[error("non-JSON response: {excerpt}")]
    NonJson {
        /// Sanitized body excerpt.
        excerpt: String,
    },

    /// Bytes were expected but the body is neither JSON nor an image.
    #[error("non-image response ({content_type}): {excerpt}")]
    NonImage {
        /// `Content-Type` header value, or `"unknown"`.
        content_type: String,
        /// Sanitized body excerpt.
        excerpt: String,
    },
}

impl CallFailure {
    /// Network-level failure: transport error, timeout or cancellation.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Timeout(_) | Self::Cancelled)
    }

    /// The provider answered, but not with something usable.
    pub fn is_protocol(&self) -> bool {
        matches!(self, Self::Status { .. } | Self::NonJson { .. } | Self::NonImage { .. })
    }

    /// Returns true if re-issuing the same call may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(_) | Self::Timeout(_) => true,
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            Self::Cancelled | Self::NonJson { .. } | Self::NonImage { .. } => false,
        }
    }

    /// Returns the suggested delay before retrying, if the provider gave one.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::Status {
                retry_after: Some(secs),
                ..
            } => Some(Duration::from_secs(*secs)),
            _ => None,
        }
    }

    /// Short class name for log fields.
    pub fn class(&self) -> &'static str {
        match self {
            Self::Transport(_) => "transport",
            Self::Timeout(_) => "timeout",
            Self::Cancelled => "cancelled",
            Self::Status { .. } => "status",
            Self::NonJson { .. } => "non_json",
            Self::NonImage { .. } => "non_image",
        }
    }
}

/// Result of one dispatched call.
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderCallOutcome {
    /// The call returned a usable payload.
    Success(RawPayload),
    /// The call failed.
    Failure(CallFailure),
}

impl ProviderCallOutcome {
    /// Returns the payload on success.
    pub fn payload(&self) -> Option<&RawPayload> {
        match self {
            Self::Success(p) => Some(p),
            Self::Failure(_) => None,
        }
    }

    /// Returns the failure, if any.
    pub fn failure(&self) -> Option<&CallFailure> {
        match self {
            Self::Success(_) => None,
            Self::Failure(f) => Some(f),
        }
    }

    /// Returns true on success.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

impl From<std::result::Result<RawPayload, CallFailure>> for ProviderCallOutcome {
    fn from(result: std::result::Result<RawPayload, CallFailure>) -> Self {
        match result {
            Ok(payload) => Self::Success(payload),
            Err(failure) => Self::Failure(failure),
        }
    }
}

/// Outcomes of one dispatch, keyed by call id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Outcomes {
    inner: HashMap<String, ProviderCallOutcome>,
}

impl Outcomes {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the outcome of a call, replacing any earlier one.
    pub fn insert(&mut self, id: impl Into<String>, outcome: ProviderCallOutcome) {
        self.inner.insert(id.into(), outcome);
    }

    /// Returns the outcome of a call.
    pub fn get(&self, id: &str) -> Option<&ProviderCallOutcome> {
        self.inner.get(id)
    }

    /// Removes and returns the outcome of a call.
    pub fn take(&mut self, id: &str) -> Option<ProviderCallOutcome> {
        self.inner.remove(id)
    }

    /// Number of recorded outcomes.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Returns true if nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Iterates over `(call id, outcome)` pairs in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ProviderCallOutcome)> {
        self.inner.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl IntoIterator for Outcomes {
    type Item = (String, ProviderCallOutcome);
    type IntoIter = std::collections::hash_map::IntoIter<String, ProviderCallOutcome>;

    fn into_iter(self) -> Self::IntoIter {
        self.inner.into_iter()
    }
}

impl FromIterator<(String, ProviderCallOutcome)> for Outcomes {
    fn from_iter<I: IntoIterator<Item = (String, ProviderCallOutcome)>>(iter: I) -> Self {
        Self {
            inner: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_failure_classes() {
        assert!(CallFailure::Transport("connection refused".into()).is_transport());
        assert!(CallFailure::Timeout(Duration::from_secs(30)).is_transport());
        assert!(CallFailure::Cancelled.is_transport());

        let status = CallFailure::Status {
            status: 503,
            excerpt: "loading".into(),
            retry_after: None,
        };
        assert!(status.is_protocol());
        assert!(!status.is_transport());
        assert!(CallFailure::NonJson { excerpt: "<html>".into() }.is_protocol());

        let non_image = CallFailure::NonImage {
            content_type: "text/html".into(),
            excerpt: "<html>".into(),
        };
        assert!(non_image.is_protocol());
        assert!(!non_image.is_retryable());
        assert_eq!(non_image.class(), "non_image");
    }

    #[test]
    fn test_is_retryable() {
        assert!(CallFailure::Timeout(Duration::from_secs(1)).is_retryable());
        assert!(CallFailure::Transport("reset".into()).is_retryable());
        assert!(CallFailure::Status { status: 429, excerpt: String::new(), retry_after: Some(3) }.is_retryable());
        assert!(CallFailure::Status { status: 502, excerpt: String::new(), retry_after: None }.is_retryable());

        assert!(!CallFailure::Cancelled.is_retryable());
        assert!(!CallFailure::Status { status: 401, excerpt: String::new(), retry_after: None }.is_retryable());
        assert!(!CallFailure::NonJson { excerpt: String::new() }.is_retryable());
    }

    #[test]
    fn test_retry_after() {
        let limited = CallFailure::Status {
            status: 429,
            excerpt: String::new(),
            retry_after: Some(12),
        };
        assert_eq!(limited.retry_after(), Some(Duration::from_secs(12)));
        assert_eq!(CallFailure::Timeout(Duration::from_secs(1)).retry_after(), None);
    }

    #[test]
    fn test_failure_display() {
        let err = CallFailure::Status {
            status: 404,
            excerpt: "Not found".into(),
            retry_after: None,
        };
        assert_eq!(err.to_string(), "HTTP 404: Not found");
        assert_eq!(CallFailure::Cancelled.to_string(), "cancelled");
    }

    #[test]
    fn test_outcomes_map() {
        let mut outcomes = Outcomes::new();
        outcomes.insert("text", ProviderCallOutcome::Success(RawPayload::Json(json!({"a": 1}))));
        outcomes.insert("image", ProviderCallOutcome::Failure(CallFailure::Cancelled));

        assert_eq!(outcomes.len(), 2);
        assert!(outcomes.get("text").unwrap().is_success());
        assert_eq!(
            outcomes.get("image").unwrap().failure(),
            Some(&CallFailure::Cancelled)
        );
        assert!(outcomes.take("text").is_some());
        assert!(outcomes.get("text").is_none());
    }
}
