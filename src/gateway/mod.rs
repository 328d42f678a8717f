//! Provider gateway: concurrent outbound calls with independent failure.
//!
//! A [`Gateway`] issues every [`CallSpec`] of a dispatch at once and waits for
//! all of them to settle. Each call races its own deadline and the caller's
//! [`CancellationToken`]; a failing call becomes a [`CallFailure`] in the
//! returned [`Outcomes`] and never aborts its siblings.
//!
//! The gateway itself never retries. Callers that want retries opt in through
//! [`DispatchExt::dispatch_with_retries`].

mod call;
mod outcome;

pub use call::{CallBody, CallSpec, ResponseKind};
pub use outcome::{CallFailure, Outcomes, ProviderCallOutcome, RawPayload};

use crate::error::{parse_retry_after, sanitize_excerpt, GenBridgeError, Result};
use crate::extract::ImageFormat;
use async_trait::async_trait;
use futures::future::join_all;
use std::collections::HashSet;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

/// Default per-call deadline.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Delay before a retry when the provider did not send `Retry-After`.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Upper bound on a provider-requested retry delay.
pub const MAX_RETRY_DELAY: Duration = Duration::from_secs(30);

/// Something that can run a set of provider calls to completion.
#[async_trait]
pub trait Dispatch: Send + Sync {
    /// Issues all `calls` concurrently and returns one outcome per call id.
    ///
    /// Fails only when the call set itself is unusable (empty or duplicate
    /// ids); upstream failures are recorded in the outcomes.
    async fn dispatch(&self, calls: Vec<CallSpec>, cancel: &CancellationToken) -> Result<Outcomes>;
}

/// Caller-side retry policy on top of any [`Dispatch`].
#[async_trait]
pub trait DispatchExt: Dispatch {
    /// Dispatches `calls`, then re-dispatches retryable failures up to
    /// `max_retries` more times.
    async fn dispatch_with_retries(
        &self,
        calls: Vec<CallSpec>,
        cancel: &CancellationToken,
        max_retries: u32,
    ) -> Result<Outcomes> {
        let mut outcomes = self.dispatch(calls.clone(), cancel).await?;

        for attempt in 1..=max_retries {
            let failures: Vec<(&CallSpec, &CallFailure)> = calls
                .iter()
                .filter_map(|c| outcomes.get(&c.id).and_then(|o| o.failure()).map(|f| (c, f)))
                .filter(|(_, f)| f.is_retryable())
                .collect();
            if failures.is_empty() {
                break;
            }

            let delay = failures
                .iter()
                .filter_map(|(_, f)| f.retry_after())
                .max()
                .unwrap_or(DEFAULT_RETRY_DELAY)
                .min(MAX_RETRY_DELAY);
            let retry: Vec<CallSpec> = failures.into_iter().map(|(c, _)| c.clone()).collect();

            tracing::warn!(
                attempt,
                max_retries,
                calls = retry.len(),
                delay_ms = delay.as_millis() as u64,
                "retrying failed provider calls"
            );

            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(delay) => {}
            }

            for (id, outcome) in self.dispatch(retry, cancel).await? {
                outcomes.insert(id, outcome);
            }
        }

        Ok(outcomes)
    }
}

impl<T: Dispatch + ?Sized> DispatchExt for T {}

/// Builder for [`Gateway`].
#[derive(Debug, Clone)]
pub struct GatewayBuilder {
    timeout: Duration,
    user_agent: String,
}

impl Default for GatewayBuilder {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            user_agent: concat!("genbridge/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl GatewayBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the default per-call deadline.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the `User-Agent` sent to providers.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Builds the gateway.
    pub fn build(self) -> Result<Gateway> {
        if self.timeout.is_zero() {
            return Err(GenBridgeError::Config("gateway timeout must be positive".into()));
        }
        let client = reqwest::Client::builder()
            .user_agent(self.user_agent)
            .build()?;
        Ok(Gateway {
            client,
            timeout: self.timeout,
        })
    }
}

/// HTTP gateway to generation providers.
#[derive(Debug, Clone)]
pub struct Gateway {
    client: reqwest::Client,
    timeout: Duration,
}

impl Gateway {
    /// Creates a new `GatewayBuilder`.
    pub fn builder() -> GatewayBuilder {
        GatewayBuilder::new()
    }

    /// Returns the default per-call deadline.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Runs one call to completion, deadline or cancellation.
    async fn settle(&self, spec: &CallSpec, cancel: &CancellationToken) -> ProviderCallOutcome {
        let deadline = spec.timeout.unwrap_or(self.timeout);
        let start = Instant::now();

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(CallFailure::Cancelled),
            settled = tokio::time::timeout(deadline, self.execute(spec)) => {
                settled.unwrap_or(Err(CallFailure::Timeout(deadline)))
            }
        };

        let elapsed_ms = start.elapsed().as_millis() as u64;
        match &result {
            Ok(payload) => tracing::debug!(
                call_id = %spec.id,
                elapsed_ms,
                payload = payload_kind(payload),
                "provider call succeeded"
            ),
            Err(failure) => tracing::warn!(
                call_id = %spec.id,
                elapsed_ms,
                failure = failure.class(),
                "provider call failed: {failure}"
            ),
        }

        result.into()
    }

    async fn execute(&self, spec: &CallSpec) -> std::result::Result<RawPayload, CallFailure> {
        let mut request = self.client.request(spec.method.clone(), &spec.url);
        for (name, value) in &spec.headers {
            request = request.header(name.as_str(), value.as_str());
        }
        request = match &spec.body {
            CallBody::Json(body) => request.json(body),
            CallBody::Form(fields) => request.form(fields),
            CallBody::Empty => request,
        };

        let response = request
            .send()
            .await
            .map_err(|e| CallFailure::Transport(sanitize_excerpt(&e.to_string())))?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = parse_retry_after(response.headers());
            let text = response.text().await.unwrap_or_default();
            return Err(CallFailure::Status {
                status: status.as_u16(),
                excerpt: sanitize_excerpt(&text),
                retry_after,
            });
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = response
            .bytes()
            .await
            .map_err(|e| CallFailure::Transport(sanitize_excerpt(&e.to_string())))?;

        let json_content = content_type
            .as_deref()
            .is_some_and(|ct| ct.to_ascii_lowercase().contains("json"));
        if json_content || spec.expect == ResponseKind::Json {
            return serde_json::from_slice(&bytes)
                .map(RawPayload::Json)
                .map_err(|_| CallFailure::NonJson {
                    excerpt: sanitize_excerpt(&String::from_utf8_lossy(&bytes)),
                });
        }

        if !is_image_body(content_type.as_deref(), &bytes) {
            return Err(CallFailure::NonImage {
                content_type: content_type.unwrap_or_else(|| "unknown".into()),
                excerpt: sanitize_excerpt(&String::from_utf8_lossy(&bytes)),
            });
        }

        Ok(RawPayload::Binary {
            bytes: bytes.to_vec(),
            content_type,
        })
    }
}

#[async_trait]
impl Dispatch for Gateway {
    async fn dispatch(&self, calls: Vec<CallSpec>, cancel: &CancellationToken) -> Result<Outcomes> {
        check_call_set(&calls)?;

        let settled = join_all(calls.iter().map(|spec| self.settle(spec, cancel))).await;

        Ok(calls.into_iter().map(|spec| spec.id).zip(settled).collect())
    }
}

/// Rejects empty call sets and duplicate call ids.
pub fn check_call_set(calls: &[CallSpec]) -> Result<()> {
    if calls.is_empty() {
        return Err(GenBridgeError::InvalidRequest("no provider calls to dispatch".into()));
    }
    let mut seen = HashSet::with_capacity(calls.len());
    for call in calls {
        if !seen.insert(call.id.as_str()) {
            return Err(GenBridgeError::InvalidRequest(format!(
                "duplicate call id '{}'",
                call.id
            )));
        }
    }
    Ok(())
}

/// Accepts a binary body when its content type or magic bytes say image.
///
/// `application/octet-stream` and a missing content type only pass when the
/// bytes themselves are a known image format.
fn is_image_body(content_type: Option<&str>, bytes: &[u8]) -> bool {
    if bytes.is_empty() {
        return false;
    }
    let declared_image = content_type
        .map(|ct| ct.trim().to_ascii_lowercase())
        .is_some_and(|ct| ct.starts_with("image/"));
    declared_image || ImageFormat::from_magic_bytes(bytes).is_some()
}

fn payload_kind(payload: &RawPayload) -> &'static str {
    match payload {
        RawPayload::Json(_) => "json",
        RawPayload::Binary { .. } => "binary",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_check_call_set() {
        assert!(check_call_set(&[]).is_err());

        let calls = vec![CallSpec::post("text", "http://a"), CallSpec::post("image", "http://b")];
        assert!(check_call_set(&calls).is_ok());

        let dupes = vec![CallSpec::post("text", "http://a"), CallSpec::post("text", "http://b")];
        let err = check_call_set(&dupes).unwrap_err();
        assert!(err.to_string().contains("duplicate call id 'text'"));
    }

    #[test]
    fn test_is_image_body() {
        let png = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0];
        assert!(is_image_body(Some("image/png"), &png));
        assert!(is_image_body(Some("application/octet-stream"), &png));
        assert!(is_image_body(None, &png));
        assert!(is_image_body(Some("IMAGE/JPEG; q=1"), b"opaque"));

        assert!(!is_image_body(Some("text/html"), b"<html>proxy error</html>"));
        assert!(!is_image_body(Some("application/octet-stream"), b"plain words"));
        assert!(!is_image_body(Some("image/png"), b""));
    }

    #[test]
    fn test_builder_rejects_zero_timeout() {
        assert!(Gateway::builder().timeout(Duration::ZERO).build().is_err());

        let gateway = Gateway::builder()
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap();
        assert_eq!(gateway.timeout(), Duration::from_secs(5));
        assert_eq!(Gateway::builder().build().unwrap().timeout(), DEFAULT_TIMEOUT);
    }

    /// Fails the "flaky" call until `fail_times` attempts have been made.
    struct FlakyDispatch {
        attempts: AtomicU32,
        fail_times: u32,
        failure: CallFailure,
    }

    #[async_trait]
    impl Dispatch for FlakyDispatch {
        async fn dispatch(&self, calls: Vec<CallSpec>, _cancel: &CancellationToken) -> Result<Outcomes> {
            check_call_set(&calls)?;
            let mut outcomes = Outcomes::new();
            for call in calls {
                let outcome = if call.id == "flaky" {
                    let n = self.attempts.fetch_add(1, Ordering::SeqCst);
                    if n < self.fail_times {
                        ProviderCallOutcome::Failure(self.failure.clone())
                    } else {
                        ProviderCallOutcome::Success(RawPayload::Json(serde_json::json!("ok")))
                    }
                } else {
                    ProviderCallOutcome::Success(RawPayload::Json(serde_json::json!("steady")))
                };
                outcomes.insert(call.id, outcome);
            }
            Ok(outcomes)
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_only_retryable_failures() {
        let dispatch = FlakyDispatch {
            attempts: AtomicU32::new(0),
            fail_times: 2,
            failure: CallFailure::Timeout(Duration::from_secs(1)),
        };
        let calls = vec![CallSpec::post("flaky", "http://a"), CallSpec::post("steady", "http://b")];

        let outcomes = dispatch
            .dispatch_with_retries(calls, &CancellationToken::new(), 3)
            .await
            .unwrap();

        assert!(outcomes.get("flaky").unwrap().is_success());
        assert!(outcomes.get("steady").unwrap().is_success());
        assert_eq!(dispatch.attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_retry_for_client_errors() {
        let dispatch = FlakyDispatch {
            attempts: AtomicU32::new(0),
            fail_times: 5,
            failure: CallFailure::Status {
                status: 401,
                excerpt: "bad key".into(),
                retry_after: None,
            },
        };

        let outcomes = dispatch
            .dispatch_with_retries(vec![CallSpec::post("flaky", "http://a")], &CancellationToken::new(), 3)
            .await
            .unwrap();

        assert!(!outcomes.get("flaky").unwrap().is_success());
        assert_eq!(dispatch.attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_exhausted_keeps_last_failure() {
        let dispatch = FlakyDispatch {
            attempts: AtomicU32::new(0),
            fail_times: 10,
            failure: CallFailure::Transport("connection reset".into()),
        };

        let outcomes = dispatch
            .dispatch_with_retries(vec![CallSpec::post("flaky", "http://a")], &CancellationToken::new(), 2)
            .await
            .unwrap();

        assert_eq!(
            outcomes.get("flaky").unwrap().failure(),
            Some(&CallFailure::Transport("connection reset".into()))
        );
        assert_eq!(dispatch.attempts.load(Ordering::SeqCst), 3);
    }
}
