//! Typed error hierarchy for the fortisase crate.
//!
//! `FortiSaseError` covers every failure boundary of the request engine:
//! - The OAuth token endpoint (`Authentication`, `EmptyResponse`, `Parse`).
//! - The transport (`Connection` for TLS/certificate failures, `ConnectionLost`
//!   once the reconnect budget is spent, `Network` for everything else).
//! - The response envelope (`Api` for a classified status code, `Opaque` for a
//!   body without a usable `code`, `Decode` for a `data` field of the wrong shape).
//!
//! The API answers with its own status code inside the JSON body, independent
//! of the HTTP status. [`ApiErrorKind`] is the closed table of codes the
//! service documents. Anything else lands in [`ApiErrorKind::Unknown`].

use std::fmt;

/// Classifier code reported for responses that carry no numeric `code`.
pub const OPAQUE_CODE: i64 = -100;

/// Category of a non-200 API status code.
///
/// The nine named variants correspond one-to-one to the codes the API
/// documents. `Unknown` is the catch-all for any other numeric value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorKind {
    /// 400
    BadRequest,
    /// 401
    NotAuthorized,
    /// 403
    Forbidden,
    /// 404
    NotFound,
    /// 405
    MethodNotAllowed,
    /// 413
    EntityTooLarge,
    /// 424
    FailedDependency,
    /// 429
    RateLimited,
    /// 500
    InternalServerError,
    /// Any other code.
    Unknown,
}

impl ApiErrorKind {
    /// Maps an envelope status code to its category.
    pub fn from_code(code: i64) -> Self {
        match code {
            400 => ApiErrorKind::BadRequest,
            401 => ApiErrorKind::NotAuthorized,
            403 => ApiErrorKind::Forbidden,
            404 => ApiErrorKind::NotFound,
            405 => ApiErrorKind::MethodNotAllowed,
            413 => ApiErrorKind::EntityTooLarge,
            424 => ApiErrorKind::FailedDependency,
            429 => ApiErrorKind::RateLimited,
            500 => ApiErrorKind::InternalServerError,
            _ => ApiErrorKind::Unknown,
        }
    }

    /// Human-readable explanation of the category.
    pub fn description(self) -> &'static str {
        match self {
            ApiErrorKind::BadRequest => "Bad Request: request cannot be processed by the API",
            ApiErrorKind::NotAuthorized => {
                "Not Authorized: request without a valid access token"
            }
            ApiErrorKind::Forbidden => {
                "Forbidden: the account is missing permissions for this resource"
            }
            ApiErrorKind::NotFound => "Resource Not Found: unable to find the specified resource",
            ApiErrorKind::MethodNotAllowed => {
                "Method Not Allowed: the HTTP method is not allowed for this resource"
            }
            ApiErrorKind::EntityTooLarge => {
                "Request Entity Too Large: request cannot be processed due to its size"
            }
            ApiErrorKind::FailedDependency => {
                "Failed Dependency: duplicate resource, missing required parameter or \
                 attribute, or invalid attribute value"
            }
            ApiErrorKind::RateLimited => {
                "Too Many Requests: access temporarily blocked by rate limiting"
            }
            ApiErrorKind::InternalServerError => {
                "Internal Server Error: internal error when processing the request"
            }
            ApiErrorKind::Unknown => "Unknown error",
        }
    }
}

impl fmt::Display for ApiErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// Unified error type for all fortisase operations.
#[derive(Debug, thiserror::Error)]
pub enum FortiSaseError {
    /// TLS handshake or certificate verification failed.
    ///
    /// Treated as permanent: neither the token exchange nor the dispatcher
    /// retries it.
    #[error("TLS connection to {url} failed: {source}")]
    Connection {
        /// The URL being contacted.
        url: String,
        /// The underlying transport error.
        #[source]
        source: reqwest::Error,
    },

    /// Every reconnect attempt failed at the transport level.
    #[error("connection lost to {url} after {attempts} attempts: {source}")]
    ConnectionLost {
        /// The URL being contacted.
        url: String,
        /// How many sends were attempted.
        attempts: u32,
        /// The error from the final attempt.
        #[source]
        source: reqwest::Error,
    },

    /// The round trip completed but the response body was empty.
    #[error("empty response body from {url}")]
    EmptyResponse {
        /// The URL that answered with nothing.
        url: String,
    },

    /// No usable access token could be obtained.
    ///
    /// Carries the token endpoint's `status_message` when it rejected the
    /// grant.
    #[error("authentication failed: {message}")]
    Authentication {
        /// Server message or local explanation.
        message: String,
    },

    /// The envelope carried a non-200 status code.
    #[error("API error {code}: {kind}")]
    Api {
        /// The numeric code from the envelope.
        code: i64,
        /// The category the code maps to.
        kind: ApiErrorKind,
    },

    /// The body was not a JSON object, or had no numeric `code`.
    #[error("unrecognized response (code -100): {body}")]
    Opaque {
        /// The raw response text.
        body: String,
    },

    /// The envelope's `data` field had a shape the operation cannot return.
    #[error("unexpected type for `data` field: {found}")]
    Decode {
        /// The JSON type that was found.
        found: &'static str,
    },

    /// JSON (de)serialization failed.
    #[error("failed to parse JSON: {0}")]
    Parse(#[from] serde_json::Error),

    /// Transport failure outside the dispatcher's reconnect loop.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl FortiSaseError {
    /// Builds the `Api` variant for a code, picking its category.
    pub fn api(code: i64) -> Self {
        FortiSaseError::Api {
            code,
            kind: ApiErrorKind::from_code(code),
        }
    }

    /// The classifier code carried by this error, if any.
    ///
    /// `Api` errors return their envelope code and `Opaque` errors the
    /// sentinel [`OPAQUE_CODE`]. Transport and local errors return `None`.
    pub fn code(&self) -> Option<i64> {
        match self {
            FortiSaseError::Api { code, .. } => Some(*code),
            FortiSaseError::Opaque { .. } => Some(OPAQUE_CODE),
            _ => None,
        }
    }

    /// True for the API's "resource not found" answer.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            FortiSaseError::Api {
                kind: ApiErrorKind::NotFound,
                ..
            }
        )
    }
}

/// Convenience alias used throughout the library.
pub type Result<T> = std::result::Result<T, FortiSaseError>;
