//! Path template resolution.
//!
//! Resource paths are written with `{name}` placeholders, e.g.
//! `/resource-api/v2/security/dlp-profiles/{primaryKey}`. Resolution never
//! fails: a placeholder without a value stays in the path and the API answers
//! it with a 404, which is where the caller finds out.

use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([^{}/]+)\}").expect("placeholder pattern is valid"));

/// Placeholder for the removed traffic-direction axis.
const DIRECTION_SEGMENT: &str = "/{direction}";

/// Named values for multi-placeholder templates.
pub type PathParams = HashMap<String, Value>;

/// The identifying value substituted into a one-placeholder template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrimaryKey {
    /// Named resources (profiles, groups, ...).
    Name(String),
    /// Numbered resources (policy IDs, ...).
    Id(i64),
}

impl fmt::Display for PrimaryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrimaryKey::Name(name) => f.write_str(name),
            PrimaryKey::Id(id) => write!(f, "{id}"),
        }
    }
}

impl From<&str> for PrimaryKey {
    fn from(name: &str) -> Self {
        PrimaryKey::Name(name.to_string())
    }
}

impl From<String> for PrimaryKey {
    fn from(name: String) -> Self {
        PrimaryKey::Name(name)
    }
}

impl From<i64> for PrimaryKey {
    fn from(id: i64) -> Self {
        PrimaryKey::Id(id)
    }
}

/// Resolves `template` into a concrete path.
///
/// Rules, applied in order:
/// 1. No placeholders: the template is returned as is.
/// 2. A `/{direction}` segment with no `direction` param is dropped and the
///    segment before it gets a plural `s` (`/dlp-profile/{direction}` becomes
///    `/dlp-profiles`).
/// 3. Exactly one placeholder left and a primary key given: the key replaces
///    it, whatever the placeholder is called.
/// 4. Otherwise every placeholder is looked up by name in `params`. Missing
///    names stay unresolved and are logged.
pub fn resolve_path(
    template: &str,
    primary_key: Option<&PrimaryKey>,
    params: &PathParams,
) -> String {
    if !PLACEHOLDER.is_match(template) {
        return template.to_string();
    }

    let path = if template.contains(DIRECTION_SEGMENT) && !params.contains_key("direction") {
        drop_direction(template)
    } else {
        template.to_string()
    };

    let count = PLACEHOLDER.find_iter(&path).count();
    if count == 1 {
        if let Some(key) = primary_key {
            let key = key.to_string();
            return PLACEHOLDER.replace(&path, regex::NoExpand(&key)).into_owned();
        }
    }

    let mut unresolved = Vec::new();
    let resolved = PLACEHOLDER.replace_all(&path, |caps: &regex::Captures<'_>| {
        let name = &caps[1];
        match params.get(name) {
            Some(value) => param_text(value),
            None => {
                unresolved.push(name.to_string());
                caps[0].to_string()
            }
        }
    });

    if !unresolved.is_empty() {
        tracing::warn!(
            template,
            missing = ?unresolved,
            "path placeholders left unresolved"
        );
    }
    resolved.into_owned()
}

/// Removes every `/{direction}` segment, pluralizing the segment before it.
fn drop_direction(template: &str) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(at) = rest.find(DIRECTION_SEGMENT) {
        out.push_str(&rest[..at]);
        if !out.is_empty() && !out.ends_with('/') {
            out.push('s');
        }
        rest = &rest[at + DIRECTION_SEGMENT.len()..];
    }
    out.push_str(rest);
    out
}

/// Strings substitute without quotes; other JSON values use their JSON text.
fn param_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
