//! Endpoint and retry configuration for a client session.
//!
//! [`ClientConfig`] is built once when the client is constructed and handed to
//! the token manager and the dispatcher. `Default` targets the production
//! service. Tests override the URLs to point at a local mock server and shrink
//! the delays.

use std::time::Duration;

/// Production resource API host. Request paths are appended verbatim.
pub const API_BASE_URL: &str = "https://portal.prod.fortisase.com";

/// OAuth token endpoint used for the password grant.
pub const TOKEN_URL: &str = "https://customerapiauth.fortinet.com/api/v1/oauth/token/";

/// Covers TCP + TLS handshake only.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Full round trip including the response body.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Retry behavior for the dispatcher and the operation executor.
///
/// Two independent loops use these values:
/// - The dispatcher resends on transport failures (connection refused, reset,
///   timeout) up to `transport_attempts` sends, `transport_delay` apart.
/// - The executor retries envelope codes 429 and 500 after a fixed `backoff`.
///   Both codes draw on one shared budget: 429 alone allows
///   `rate_limited_retries` retries, 500 alone `server_error_retries`, and a
///   mix spends the budget proportionally.
///
/// With the defaults, an operation that only ever sees 429 is sent 11 times
/// (one send plus 10 retries), one more than a plain 10-unit countdown would
/// allow. One that only sees 500 is sent 4 times.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total sends per request for transport failures (initial send included).
    pub transport_attempts: u32,
    /// Wait between transport-level resends.
    pub transport_delay: Duration,
    /// Wait before retrying a 429 or 500 answer.
    pub backoff: Duration,
    /// Retries allowed when every failure is a 429.
    pub rate_limited_retries: u32,
    /// Retries allowed when every failure is a 500.
    pub server_error_retries: u32,
}

impl RetryPolicy {
    /// Size of the shared retry budget in cost units.
    ///
    /// A 429 retry costs `server_error_retries` units and a 500 retry costs
    /// `rate_limited_retries` units, so the budget admits exactly the
    /// configured count of either kind.
    pub fn budget(&self) -> u32 {
        self.rate_limited_retries
            .max(1)
            .saturating_mul(self.server_error_retries.max(1))
    }

    /// Budget units one retry of the given envelope code costs, or `None`
    /// when the code is not retryable.
    pub fn cost(&self, code: i64) -> Option<u32> {
        match code {
            429 if self.rate_limited_retries > 0 => Some(self.server_error_retries.max(1)),
            500 if self.server_error_retries > 0 => Some(self.rate_limited_retries.max(1)),
            _ => None,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            transport_attempts: 16,
            transport_delay: Duration::from_secs(1),
            backoff: Duration::from_secs(2),
            rate_limited_retries: 10,
            server_error_retries: 3,
        }
    }
}

/// Process-wide settings for one client session.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Scheme and host of the resource API, without a trailing slash.
    pub api_base_url: String,
    /// Full URL of the OAuth token endpoint.
    pub token_url: String,
    /// TCP + TLS handshake limit.
    pub connect_timeout: Duration,
    /// Whole-request limit.
    pub request_timeout: Duration,
    /// Retry behavior.
    pub retry: RetryPolicy,
}

impl ClientConfig {
    /// Overrides the resource API host.
    pub fn with_api_base_url(mut self, url: &str) -> Self {
        self.api_base_url = url.trim_end_matches('/').to_string();
        self
    }

    /// Overrides the token endpoint.
    pub fn with_token_url(mut self, url: &str) -> Self {
        self.token_url = url.to_string();
        self
    }

    /// Replaces the retry policy.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Builds the shared `reqwest::Client` with this config's timeouts.
    pub(crate) fn http_client(&self) -> crate::error::Result<reqwest::Client> {
        let client = reqwest::Client::builder()
            .connect_timeout(self.connect_timeout)
            .timeout(self.request_timeout)
            .build()?;
        Ok(client)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            api_base_url: API_BASE_URL.to_string(),
            token_url: TOKEN_URL.to_string(),
            connect_timeout: CONNECT_TIMEOUT,
            request_timeout: REQUEST_TIMEOUT,
            retry: RetryPolicy::default(),
        }
    }
}
