//! Request values passed from resource bindings into the executor.
//!
//! A binding describes one call as an [`OperationRequest`]: verb, path
//! template, identifying values and an optional JSON body. The executor turns
//! it into a [`ResolvedRequest`] once per operation and resends that same
//! value on every attempt.

use std::collections::BTreeMap;

use reqwest::Method;
use serde_json::{Map, Value};

use crate::envelope::json_type_name;
use crate::template::{PathParams, PrimaryKey, resolve_path};

/// One intended API call, before path resolution.
#[derive(Debug, Clone)]
pub struct OperationRequest {
    /// HTTP verb.
    pub method: Method,
    /// Path with `{name}` placeholders, relative to the API host.
    pub url_template: String,
    /// Value for a single-placeholder template.
    pub primary_key: Option<PrimaryKey>,
    /// Values for multi-placeholder templates.
    pub path_params: PathParams,
    /// Extra request headers.
    pub header_params: BTreeMap<String, String>,
    /// JSON body fields. An empty map sends no body.
    pub body_params: Map<String, Value>,
}

impl OperationRequest {
    /// A request with no key, params, headers or body.
    pub fn new(method: Method, url_template: &str) -> Self {
        OperationRequest {
            method,
            url_template: url_template.to_string(),
            primary_key: None,
            path_params: PathParams::new(),
            header_params: BTreeMap::new(),
            body_params: Map::new(),
        }
    }

    /// Sets the primary key.
    pub fn primary_key(mut self, key: impl Into<PrimaryKey>) -> Self {
        self.primary_key = Some(key.into());
        self
    }

    /// Adds one named path parameter.
    pub fn path_param(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.path_params.insert(name.to_string(), value.into());
        self
    }

    /// Adds one request header.
    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.header_params.insert(name.to_string(), value.to_string());
        self
    }

    /// Replaces the body with the fields of a JSON object.
    ///
    /// The API only accepts object bodies. Any other value is dropped with a
    /// warning and the previous body is kept; callers taking user input (the
    /// CLI's `--body`) reject non-objects before getting here.
    pub fn body(mut self, body: Value) -> Self {
        match body {
            Value::Object(fields) => self.body_params = fields,
            other => tracing::warn!(
                template = %self.url_template,
                found = json_type_name(&other),
                "request body is not a JSON object; ignored"
            ),
        }
        self
    }

    /// Produces the concrete request. Pure: `self` is left untouched.
    pub fn resolve(&self) -> crate::error::Result<ResolvedRequest> {
        let path = resolve_path(
            &self.url_template,
            self.primary_key.as_ref(),
            &self.path_params,
        );
        let body = if self.body_params.is_empty() {
            None
        } else {
            Some(serde_json::to_vec(&self.body_params)?)
        };
        Ok(ResolvedRequest {
            method: self.method.clone(),
            path,
            headers: self.header_params.clone(),
            body,
        })
    }
}

/// A fully resolved request, ready to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRequest {
    /// HTTP verb.
    pub method: Method,
    /// Concrete path, appended to the API host.
    pub path: String,
    /// Extra request headers.
    pub headers: BTreeMap<String, String>,
    /// Serialized JSON body, if any.
    pub body: Option<Vec<u8>>,
}
