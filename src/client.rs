//! Authenticated operation executor for the FortiSASE API.
//!
//! `FortiSaseClient` owns a [`Dispatcher`] and a [`TokenManager`] behind a
//! `Mutex`. It exposes the three operation shapes resource bindings are built
//! from: `create_update`, `read` (plus `read_optional`) and `delete`.
//!
//! Token lifecycle:
//! - Lazy acquisition: the first operation that finds no cached token runs
//!   the password grant via `bearer_token()`.
//! - Single flight: the mutex is held for the whole exchange, so concurrent
//!   first-use callers wait for one grant instead of issuing their own.
//!
//! Retry behavior (all three operations):
//! - Envelope code 429 or 500: sleep a fixed backoff and resend. Both codes
//!   draw on one shared budget (see [`RetryPolicy`]); when it runs out the
//!   last error is returned.
//! - Every other error is returned at once.
//! - Transport reconnects happen below this layer, in the dispatcher.

use serde_json::Value;
use tokio::sync::Mutex;

use crate::auth::TokenManager;
use crate::config::{ClientConfig, RetryPolicy};
use crate::credentials::Credentials;
use crate::envelope::{DataPayload, Envelope, classify, json_type_name};
use crate::error::{FortiSaseError, Result};
use crate::request::OperationRequest;
use crate::transport::Dispatcher;

/// Authenticated client for the FortiSASE resource API.
pub struct FortiSaseClient {
    dispatcher: Dispatcher,
    auth: Mutex<TokenManager>,
    retry: RetryPolicy,
}

impl FortiSaseClient {
    /// Client for the production service with default retry settings.
    pub fn new(credentials: Credentials) -> Result<Self> {
        Self::with_config(credentials, ClientConfig::default())
    }

    /// Client with explicit endpoints and retry settings. Tests use this to
    /// point at a local mock server.
    pub fn with_config(credentials: Credentials, config: ClientConfig) -> Result<Self> {
        Ok(FortiSaseClient {
            dispatcher: Dispatcher::new(&config)?,
            auth: Mutex::new(TokenManager::new(credentials, &config)?),
            retry: config.retry,
        })
    }

    /// Snapshot of the session credentials, including acquired tokens.
    pub async fn credentials(&self) -> Credentials {
        self.auth.lock().await.credentials().clone()
    }

    /// Returns a non-empty bearer token, running the password grant if none
    /// is cached.
    async fn bearer_token(&self) -> Result<String> {
        let mut auth = self.auth.lock().await;
        auth.acquire_token().await?;
        auth.access_token()
            .map(str::to_owned)
            .ok_or_else(|| FortiSaseError::Authentication {
                message: "no access token available and refresh is not supported".to_string(),
            })
    }

    /// Sends `op` until it succeeds, fails fatally, or the retry budget for
    /// 429/500 answers runs out. Returns the successful envelope.
    async fn execute(&self, op: &OperationRequest) -> Result<Envelope> {
        let request = op.resolve()?;
        let budget = self.retry.budget();
        let mut spent = 0u32;
        let mut attempt = 1u32;

        loop {
            let token = self.bearer_token().await?;
            let body = self.dispatcher.send(&request, &token).await?;
            let envelope = Envelope::parse(&body);

            let err = match classify(envelope.as_ref(), &body) {
                Ok(_) => {
                    return envelope.ok_or(FortiSaseError::Opaque { body });
                }
                Err(err) => err,
            };

            let cost = err.code().and_then(|code| self.retry.cost(code));
            match cost {
                Some(cost) if spent + cost <= budget => {
                    spent += cost;
                    tracing::warn!(
                        method = %request.method,
                        path = %request.path,
                        attempt,
                        error = %err,
                        "retryable API error, backing off"
                    );
                    tokio::time::sleep(self.retry.backoff).await;
                    attempt += 1;
                }
                _ => return Err(err),
            }
        }
    }

    /// Creates or updates a resource.
    ///
    /// Returns the envelope's `data` object, or the whole envelope when
    /// `data` is absent or not an object.
    pub async fn create_update(&self, op: &OperationRequest) -> Result<Value> {
        let envelope = self.execute(op).await?;
        match envelope.data {
            DataPayload::Object(map) => Ok(Value::Object(map)),
            _ => Ok(Value::Object(envelope.raw)),
        }
    }

    /// Reads a resource.
    ///
    /// | `data` | result |
    /// |---|---|
    /// | absent | the whole envelope |
    /// | object | the object |
    /// | non-empty array | the first element |
    /// | empty array | `None` |
    ///
    /// # Errors
    ///
    /// - `Api` with code 404 when the resource does not exist. Not retried.
    /// - `Decode` when `data` is a string, number, bool or null.
    /// - Any other classified or transport error.
    pub async fn read(&self, op: &OperationRequest) -> Result<Option<Value>> {
        let envelope = self.execute(op).await?;
        match envelope.data {
            DataPayload::Absent => Ok(Some(Value::Object(envelope.raw))),
            DataPayload::Object(map) => Ok(Some(Value::Object(map))),
            DataPayload::List(items) => Ok(items.into_iter().next()),
            DataPayload::Other(value) => Err(FortiSaseError::Decode {
                found: json_type_name(&value),
            }),
        }
    }

    /// Like [`read`](Self::read), but a 404 yields `Ok(None)`.
    ///
    /// For callers that treat a missing resource as a normal answer.
    pub async fn read_optional(&self, op: &OperationRequest) -> Result<Option<Value>> {
        match self.read(op).await {
            Err(err) if err.is_not_found() => Ok(None),
            other => other,
        }
    }

    /// Deletes a resource.
    pub async fn delete(&self, op: &OperationRequest) -> Result<()> {
        self.execute(op).await.map(|_| ())
    }
}
