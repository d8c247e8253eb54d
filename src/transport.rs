//! Request dispatch with reconnect on transport failure.
//!
//! [`Dispatcher`] sends a [`ResolvedRequest`] to the configured API host with
//! bearer auth and JSON headers. It only interprets transport failures: any
//! completed round trip hands back the body, whatever the HTTP status, and
//! the envelope classifier decides what that body means.
//!
//! Reconnect behavior:
//! - TLS/certificate failures abort at once with `Connection`; resending
//!   would fail the same way.
//! - Other transport failures (refused, reset, timed out) resend the identical
//!   request after a fixed delay, up to `transport_attempts` sends in total,
//!   then fail with `ConnectionLost` wrapping the last error.

use std::error::Error as _;
use std::time::Duration;

use reqwest::Client;
use reqwest::header::{ACCEPT, CONTENT_TYPE};

use crate::config::ClientConfig;
use crate::error::{FortiSaseError, Result};
use crate::request::ResolvedRequest;

/// Sends resolved requests to the resource API.
pub struct Dispatcher {
    client: Client,
    base_url: String,
    max_attempts: u32,
    retry_delay: Duration,
}

impl Dispatcher {
    /// Builds a dispatcher for `config.api_base_url`.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        Ok(Dispatcher {
            client: config.http_client()?,
            base_url: config.api_base_url.clone(),
            max_attempts: config.retry.transport_attempts.max(1),
            retry_delay: config.retry.transport_delay,
        })
    }

    /// Sends `request` with `token` as bearer auth and returns the response body.
    ///
    /// # Errors
    ///
    /// - `Connection` on TLS/certificate failure.
    /// - `ConnectionLost` when every attempt failed at the transport level.
    /// - `EmptyResponse` when the round trip completed with an empty body.
    /// - `Network` when reading the body fails.
    pub async fn send(&self, request: &ResolvedRequest, token: &str) -> Result<String> {
        let url = format!("{}{}", self.base_url, request.path);
        let mut attempt = 1;

        let response = loop {
            tracing::debug!(method = %request.method, %url, attempt, "dispatching request");
            match self.build_request(&url, request, token).send().await {
                Ok(response) => break response,
                // Malformed header or URL; resending cannot help.
                Err(err) if err.is_builder() => return Err(FortiSaseError::Network(err)),
                Err(err) if is_tls_error(&err) => {
                    return Err(FortiSaseError::Connection { url, source: err });
                }
                Err(err) if attempt >= self.max_attempts => {
                    return Err(FortiSaseError::ConnectionLost {
                        url,
                        attempts: attempt,
                        source: err,
                    });
                }
                Err(err) => {
                    tracing::warn!(%url, attempt, error = %err, "transport error, reconnecting");
                    tokio::time::sleep(self.retry_delay).await;
                    attempt += 1;
                }
            }
        };

        tracing::debug!(%url, status = %response.status(), "response received");
        // Reading the full body releases the connection back to the pool.
        let body = response.text().await?;
        if body.is_empty() {
            return Err(FortiSaseError::EmptyResponse { url });
        }
        Ok(body)
    }

    fn build_request(
        &self,
        url: &str,
        request: &ResolvedRequest,
        token: &str,
    ) -> reqwest::RequestBuilder {
        let mut req = self
            .client
            .request(request.method.clone(), url)
            .bearer_auth(token)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json");
        for (name, value) in &request.headers {
            req = req.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            req = req.body(body.clone());
        }
        req
    }
}

/// True when a transport error stems from TLS negotiation or certificate
/// verification.
///
/// reqwest does not expose a dedicated predicate, so the cause chain is
/// inspected for the TLS backend's messages.
pub(crate) fn is_tls_error(err: &reqwest::Error) -> bool {
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string().to_ascii_lowercase();
        if text.contains("certificate") || text.contains("tls") || text.contains("ssl") {
            return true;
        }
        source = cause.source();
    }
    false
}
