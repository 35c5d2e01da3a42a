use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::ops::Deref;

/// Nested metric tree returned by every analysis and by the report assembler.
///
/// Numeric leaves are always finite: anything that could not be computed is stored
/// as an explicit `null` so callers can tell "absent" from "zero".
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(transparent)]
pub struct MetricDocument(pub Value);

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ResolveError {
    #[error("path '{path}' runs into a {kind} at segment '{segment}'")]
    NotAnObject {
        path: String,
        segment: String,
        kind: &'static str,
    },
    #[error("value at '{path}' is a {kind}, not a number")]
    NotNumeric { path: String, kind: &'static str },
    #[error("value at '{path}' is the string '{raw}', not a number")]
    UnparsableString { path: String, raw: String },
}

impl MetricDocument {
    pub fn null() -> Self {
        Self(Value::Null)
    }

    pub fn is_null(&self) -> bool {
        self.0.is_null()
    }

    /// Looks up a dotted key path such as `executive_summary.overall_sustainability_score`.
    /// A missing key or a `null` anywhere along the path is `None`.
    pub fn get_path(&self, path: &str) -> Option<&Value> {
        let mut current = &self.0;
        for segment in path.split('.') {
            current = current.as_object()?.get(segment)?;
        }
        Some(current)
    }

    /// Resolves a dotted key path to a number.
    ///
    /// `Ok(None)` means "not available" (missing key, `null` leaf or `null` section).
    /// Walking through a scalar or array, or landing on a non-numeric leaf, is an error.
    pub fn resolve_number(&self, path: &str) -> Result<Option<f64>, ResolveError> {
        let mut current = &self.0;
        for segment in path.split('.') {
            match current {
                Value::Object(map) => match map.get(segment) {
                    Some(next) => current = next,
                    None => return Ok(None),
                },
                Value::Null => return Ok(None),
                other => {
                    return Err(ResolveError::NotAnObject {
                        path: path.to_string(),
                        segment: segment.to_string(),
                        kind: kind_of(other),
                    })
                }
            }
        }

        match current {
            Value::Null => Ok(None),
            Value::Number(number) => Ok(number.as_f64()),
            Value::String(raw) => raw
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|value| value.is_finite())
                .map(Some)
                .ok_or_else(|| ResolveError::UnparsableString {
                    path: path.to_string(),
                    raw: raw.clone(),
                }),
            other => Err(ResolveError::NotNumeric {
                path: path.to_string(),
                kind: kind_of(other),
            }),
        }
    }
}

impl Deref for MetricDocument {
    type Target = Value;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<Value> for MetricDocument {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

impl From<MetricDocument> for Value {
    fn from(value: MetricDocument) -> Self {
        value.0
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
