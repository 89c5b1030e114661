//! PyPI package metadata records.
//!
//! Translates the loosely-structured JSON payloads served by the PyPI JSON
//! API into well-defined records. Normalization is total: absent or `null`
//! fields become empty strings, empty collections, `0` or `false`, so code
//! downstream never has to deal with missing values.

mod package;
mod requirement;
mod stats;

pub use package::{DistributionArtifact, Package};
pub use requirement::project_name;
pub use stats::{TopPackage, TopPackages};

// ============================================================================
// Error type
// ============================================================================

/// Errors produced while reading registry data.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid requirement specifier '{spec}'")]
    InvalidRequirement { spec: String },
}

// ============================================================================
// Lenient field access
// ============================================================================

/// Typed, defaulting accessors over a JSON object.
///
/// Every accessor falls back to the empty value of its type when the key is
/// missing, `null`, or holds a value of an unexpected shape.
pub(crate) mod field {
    use serde_json::{Map, Value};

    pub(crate) type Object = Map<String, Value>;

    pub(crate) fn text(obj: Option<&Object>, key: &str) -> String {
        match obj.and_then(|o| o.get(key)) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            Some(Value::Bool(b)) => b.to_string(),
            _ => String::new(),
        }
    }

    pub(crate) fn flag(obj: Option<&Object>, key: &str) -> bool {
        matches!(obj.and_then(|o| o.get(key)), Some(Value::Bool(true)))
    }

    pub(crate) fn integer(obj: Option<&Object>, key: &str) -> i64 {
        match obj.and_then(|o| o.get(key)) {
            Some(Value::Number(n)) => n
                .as_i64()
                .or_else(|| n.as_u64().map(|u| i64::try_from(u).unwrap_or(i64::MAX)))
                .unwrap_or(0),
            _ => 0,
        }
    }

    pub(crate) fn strings(obj: Option<&Object>, key: &str) -> Vec<String> {
        match obj.and_then(|o| o.get(key)) {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|item| item.as_str().map(str::to_string))
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Entries of a string-to-string object, in document order. Non-string
    /// values are skipped.
    pub(crate) fn pairs(obj: Option<&Object>, key: &str) -> Vec<(String, String)> {
        match obj.and_then(|o| o.get(key)) {
            Some(Value::Object(map)) => map
                .iter()
                .filter_map(|(k, v)| v.as_str().map(|v| (k.clone(), v.to_string())))
                .collect(),
            _ => Vec::new(),
        }
    }

    pub(crate) fn object<'a>(obj: Option<&'a Object>, key: &str) -> Option<&'a Object> {
        obj.and_then(|o| o.get(key)).and_then(Value::as_object)
    }

    pub(crate) fn array<'a>(obj: Option<&'a Object>, key: &str) -> &'a [Value] {
        obj.and_then(|o| o.get(key))
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}
