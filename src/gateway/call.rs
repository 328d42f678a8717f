//! Outbound call specifications.

use serde_json::Value;
use std::time::Duration;

/// Body of an outbound call.
#[derive(Debug, Clone, PartialEq)]
pub enum CallBody {
    /// JSON body (`Content-Type: application/json`).
    Json(Value),
    /// URL-encoded form body.
    Form(Vec<(String, String)>),
    /// No body.
    Empty,
}

/// What the caller expects back on success.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseKind {
    /// A JSON document; a 2xx body that does not parse is a failure.
    #[default]
    Json,
    /// Raw bytes (e.g. an image). A JSON content type is still parsed as JSON.
    Binary,
}

/// One outbound call to a provider.
#[derive(Debug, Clone, PartialEq)]
pub struct CallSpec {
    /// Identifier of the call within one dispatch (e.g. `"text"`).
    pub id: String,
    /// HTTP method.
    pub method: reqwest::Method,
    /// Target URL.
    pub url: String,
    /// Extra request headers, including the credential.
    pub headers: Vec<(String, String)>,
    /// Request body.
    pub body: CallBody,
    /// Expected response kind.
    pub expect: ResponseKind,
    /// Overrides the gateway's default timeout for this call.
    pub timeout: Option<Duration>,
}

impl CallSpec {
    /// Creates a POST call with no headers, an empty body and a JSON response.
    pub fn post(id: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            method: reqwest::Method::POST,
            url: url.into(),
            headers: Vec::new(),
            body: CallBody::Empty,
            expect: ResponseKind::Json,
            timeout: None,
        }
    }

    /// Adds a request header.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Adds an `Authorization: Bearer` header.
    pub fn bearer(self, token: &str) -> Self {
        self.header("Authorization", format!("Bearer {token}"))
    }

    /// Sets a JSON body.
    pub fn json(mut self, body: Value) -> Self {
        self.body = CallBody::Json(body);
        self
    }

    /// Sets a form body.
    pub fn form(mut self, fields: Vec<(String, String)>) -> Self {
        self.body = CallBody::Form(fields);
        self
    }

    /// Sets the expected response kind.
    pub fn expect(mut self, kind: ResponseKind) -> Self {
        self.expect = kind;
        self
    }

    /// Sets a per-call timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Returns the value of a header, matched case-insensitively.
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}
