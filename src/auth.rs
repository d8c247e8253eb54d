//! OAuth password-grant authentication for the FortiSASE API.
//!
//! Exchanges the API user's username and password for an access token and a
//! refresh token at the fixed token endpoint. The tokens are cached in the
//! [`Credentials`] held by [`TokenManager`]. Consumers (e.g. `FortiSaseClient`)
//! read the cached token via `access_token()` and call `acquire_token()` when
//! it is absent.
//!
//! There is no local expiry tracking. A stale token is only discovered when
//! the API rejects it.

use serde::{Deserialize, Serialize};

use crate::config::ClientConfig;
use crate::credentials::Credentials;
use crate::error::{FortiSaseError, Result};
use crate::transport::is_tls_error;

/// OAuth client identifier the token endpoint expects.
const CLIENT_ID: &str = "FortiSASE";

/// JSON body sent to the token endpoint.
#[derive(Serialize)]
pub struct TokenRequest<'a> {
    username: &'a str,
    password: &'a str,
    client_id: &'a str,
    grant_type: &'a str,
}

/// Subset of the token endpoint response that we need.
///
/// Success carries `access_token`/`refresh_token`; a rejected grant carries
/// `status_message` instead, so every field is optional.
#[derive(Deserialize)]
pub struct TokenResponse {
    /// Bearer token for the resource API.
    #[serde(default)]
    pub access_token: Option<String>,
    /// Token for a later refresh grant.
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Reason given when the grant is rejected.
    #[serde(default)]
    pub status_message: Option<String>,
}

/// Manages token acquisition and caching for one session.
///
/// Invariants:
/// - `credentials.access_token` is only ever written by a successful grant
///   or by the caller at construction.
/// - Once an access token is held it is reused as is.
pub struct TokenManager {
    client: reqwest::Client,
    token_url: String,
    credentials: Credentials,
}

impl TokenManager {
    /// Creates a manager for `credentials` using `config.token_url`.
    pub fn new(credentials: Credentials, config: &ClientConfig) -> Result<Self> {
        Ok(TokenManager {
            client: config.http_client()?,
            token_url: config.token_url.clone(),
            credentials,
        })
    }

    /// Ensures an access token is held, running the password grant if needed.
    ///
    /// - Access token present: nothing to do.
    /// - Only a refresh token present: nothing to do either. There is no
    ///   refresh flow, so the state stays as it is and `access_token()` keeps
    ///   returning `None`.
    /// - Otherwise: password grant.
    ///
    /// # Errors
    ///
    /// - `Connection`: TLS/certificate failure reaching the endpoint.
    /// - `Network`: any other transport failure.
    /// - `EmptyResponse`: the endpoint answered with an empty body.
    /// - `Parse`: the body was not a JSON object.
    /// - `Authentication`: the grant was rejected (missing or empty
    ///   `access_token`).
    pub async fn acquire_token(&mut self) -> Result<()> {
        if self.credentials.has_access_token() {
            return Ok(());
        }
        if self.credentials.has_refresh_token() {
            tracing::debug!("refresh token held without access token; refresh flow not supported");
            return Ok(());
        }
        self.password_grant().await
    }

    async fn password_grant(&mut self) -> Result<()> {
        let body = TokenRequest {
            username: &self.credentials.username,
            password: &self.credentials.password,
            client_id: CLIENT_ID,
            grant_type: "password",
        };

        tracing::debug!(
            url = %self.token_url,
            username = %self.credentials.username,
            "requesting access token"
        );
        let response = match self.client.post(&self.token_url).json(&body).send().await {
            Ok(response) => response,
            Err(err) if is_tls_error(&err) => {
                return Err(FortiSaseError::Connection {
                    url: self.token_url.clone(),
                    source: err,
                });
            }
            Err(err) => return Err(err.into()),
        };

        // Read body before looking at it so a rejected grant still surfaces
        // the server's status message.
        let text = response.text().await?;
        if text.is_empty() {
            return Err(FortiSaseError::EmptyResponse {
                url: self.token_url.clone(),
            });
        }

        let resp: TokenResponse = serde_json::from_str(&text)?;
        match resp.access_token.filter(|token| !token.is_empty()) {
            Some(access_token) => {
                self.credentials.access_token = access_token;
                self.credentials.refresh_token = resp.refresh_token.unwrap_or_default();
                tracing::info!(username = %self.credentials.username, "access token acquired");
                Ok(())
            }
            None => Err(FortiSaseError::Authentication {
                message: resp.status_message.unwrap_or(text),
            }),
        }
    }

    /// Returns the cached access token, or `None` if none is held.
    pub fn access_token(&self) -> Option<&str> {
        Some(self.credentials.access_token.as_str()).filter(|t| !t.is_empty())
    }

    /// The session's credentials, including any tokens acquired so far.
    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }
}
