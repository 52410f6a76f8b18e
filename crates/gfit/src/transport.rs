//! HTTP transport for resolved requests.
//!
//! The resolver never performs I/O; everything network-facing sits behind
//! [`Transport`]. [`ReqwestTransport`] is the stock implementation: it
//! injects authentication, applies the timeout, sends the request and maps
//! the outcome into the client's error taxonomy. No retries and no
//! backoff live here; callers that want a policy wrap the trait.

use crate::error::{FitError, Result};
use crate::resolver::ResolvedRequest;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

impl From<reqwest::Error> for FitError {
    fn from(value: reqwest::Error) -> Self {
        Self::Transport(sanitize_reqwest_error(&value))
    }
}

/// Executes resolved requests against the network.
///
/// Implementations must be safe to share across tasks; the client holds one
/// transport for its whole lifetime.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Execute a resolved request and return the response body.
    ///
    /// # Errors
    ///
    /// Returns [`FitError::Http`] for non-2xx responses and
    /// [`FitError::Transport`] for connection-level failures.
    async fn execute(&self, request: ResolvedRequest) -> Result<Value>;
}

/// Client-level authentication for outbound requests.
///
/// A per-call `auth` value in the parameter bag overrides this for that call.
#[derive(Debug, Clone, Default)]
pub enum AuthConfig {
    #[default]
    None,
    /// `Authorization: Bearer <token>`.
    Bearer { token: String },
    /// Arbitrary static header.
    Header { name: String, value: String },
    /// Token appended to the query string.
    Query { name: String, value: String },
}

/// [`Transport`] backed by a shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
    auth: AuthConfig,
    timeout: Duration,
}

impl ReqwestTransport {
    /// Build a transport with the default timeout.
    #[must_use]
    pub fn new(auth: AuthConfig) -> Self {
        Self::with_timeout(auth, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Build a transport with an explicit per-request timeout.
    #[must_use]
    pub fn with_timeout(auth: AuthConfig, timeout: Duration) -> Self {
        Self {
            client: Client::new(),
            auth,
            timeout,
        }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn execute(&self, request: ResolvedRequest) -> Result<Value> {
        let ResolvedRequest {
            mut url,
            method,
            body,
            auth,
            ..
        } = request;

        apply_query_auth(&self.auth, &mut url);

        debug!(method = %method, url = %redact_url(&url), "executing request");

        let mut req = self.client.request(method, url);
        req = apply_auth(&self.auth, auth.as_ref(), req)?;
        if let Some(payload) = &body {
            req = req.json(payload);
        }
        req = req.timeout(self.timeout);

        let response = req.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if status.is_success() {
            debug!(status = status.as_u16(), "request succeeded");
            if text.is_empty() {
                return Ok(Value::Null);
            }
            // JSON is the norm for this API; fall back to the raw text.
            Ok(serde_json::from_str(&text).unwrap_or_else(|_| json!(text)))
        } else {
            let reason = status.canonical_reason().unwrap_or("Unknown");
            Err(FitError::Http(format!(
                "API returned {} {reason}: {text}",
                status.as_u16()
            )))
        }
    }
}

fn apply_auth(
    config: &AuthConfig,
    per_call: Option<&Value>,
    request: reqwest::RequestBuilder,
) -> Result<reqwest::RequestBuilder> {
    // Per-call credentials win over the client-level config.
    if let Some(value) = per_call {
        let Some(token) = value.as_str() else {
            return Err(FitError::Runtime(
                "per-call 'auth' must be a string token".to_string(),
            ));
        };
        return Ok(request.bearer_auth(token));
    }

    Ok(match config {
        AuthConfig::Bearer { token } => request.bearer_auth(token),
        AuthConfig::Header { name, value } => request.header(name, value),
        AuthConfig::Query { .. } | AuthConfig::None => request,
    })
}

fn apply_query_auth(config: &AuthConfig, url: &mut Url) {
    if let AuthConfig::Query { name, value } = config {
        url.query_pairs_mut().append_pair(name, value);
    }
}

/// Strip credentials, query and fragment from a URL for logging.
#[must_use]
pub fn redact_url(url: &Url) -> String {
    let mut u = url.clone();
    let _ = u.set_username("");
    let _ = u.set_password(None);
    u.set_query(None);
    u.set_fragment(None);
    u.to_string()
}

/// Render a reqwest error with any embedded URL redacted.
#[must_use]
pub fn sanitize_reqwest_error(e: &reqwest::Error) -> String {
    let mut msg = e.to_string();
    if let Some(u) = e.url() {
        msg = msg.replace(u.as_str(), &redact_url(u));
    }
    msg
}
