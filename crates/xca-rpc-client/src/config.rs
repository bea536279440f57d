//! JSON-RPC client configuration.
//!
//! Endpoint URLs for hosted RPC providers routinely embed an API key in the
//! path or query string, so the `Debug` output only shows scheme, host and
//! port.

use std::time::Duration;

use url::Url;

use crate::retry::RetryPolicy;

/// Configuration for one JSON-RPC endpoint.
#[derive(Clone)]
pub struct RpcClientConfig {
    /// Endpoint URL.
    pub endpoint: Url,
    /// Label used in logs and error messages (usually the network name).
    pub label: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Retry policy for idempotent reads. Transaction submission is never retried.
    pub retry: RetryPolicy,
}

impl std::fmt::Debug for RpcClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcClientConfig")
            .field("endpoint", &redact_url(&self.endpoint))
            .field("label", &self.label)
            .field("timeout_secs", &self.timeout_secs)
            .field("retry", &self.retry)
            .finish()
    }
}

impl RpcClientConfig {
    /// Configuration with a 30 second timeout and no retries.
    pub fn new(endpoint: Url, label: impl Into<String>) -> Self {
        Self {
            endpoint,
            label: label.into(),
            timeout_secs: 30,
            retry: RetryPolicy::NONE,
        }
    }

    /// Override the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_secs = timeout.as_secs().max(1);
        self
    }

    /// Override the retry policy for idempotent reads.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

/// Render a URL as `scheme://host:port/[REDACTED]` when it carries a path,
/// query or credentials.
pub fn redact_url(url: &Url) -> String {
    let host = url.host_str().unwrap_or("unknown");
    let base = match url.port() {
        Some(port) => format!("{}://{host}:{port}", url.scheme()),
        None => format!("{}://{host}", url.scheme()),
    };
    let sensitive = (url.path() != "/" && !url.path().is_empty())
        || url.query().is_some()
        || !url.username().is_empty()
        || url.password().is_some();
    if sensitive {
        format!("{base}/[REDACTED]")
    } else {
        base
    }
}
