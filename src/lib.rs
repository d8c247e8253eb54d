//! Async Rust client core for the FortiSASE management API.
//!
//! Authenticates once with an OAuth password grant, then issues resource
//! operations over HTTPS. The API reports its status inside a JSON envelope
//! (`{"code": ..., "data": ...}`); this crate classifies those codes into
//! typed errors and retries rate-limited (429) and server-error (500) answers
//! with a fixed backoff.
//!
//! # Modules
//!
//! - [`auth`]: Password-grant token acquisition and caching.
//! - [`client`]: Operation executor (`create_update`, `read`, `delete`).
//! - [`config`]: Endpoint URLs, timeouts and retry policy.
//! - [`credentials`]: Username/password and token storage.
//! - [`envelope`]: Response envelope decoding and status classification.
//! - [`error`]: Typed error hierarchy (`FortiSaseError`).
//! - [`request`]: Operation and resolved request values.
//! - [`template`]: `{placeholder}` path template resolution.
//! - [`transport`]: Request dispatch with reconnect on transport failure.
//!
//! # Quick Start
//!
//! ```ignore
//! use fortisase::client::FortiSaseClient;
//! use fortisase::credentials::Credentials;
//! use fortisase::request::OperationRequest;
//! use reqwest::Method;
//!
//! let client = FortiSaseClient::new(Credentials::new("api-user", "password"))?;
//! let template = "/resource-api/v1/security/antivirus-profiles/{primaryKey}";
//! let op = OperationRequest::new(Method::GET, template).primary_key("default");
//! let profile = client.read(&op).await?;
//! ```

#![warn(missing_docs)]

pub mod auth;
pub mod client;
pub mod config;
pub mod credentials;
pub mod envelope;
pub mod error;
pub mod request;
pub mod template;
pub mod transport;

pub use client::FortiSaseClient;
pub use credentials::Credentials;
pub use error::{FortiSaseError, Result};
pub use request::OperationRequest;
