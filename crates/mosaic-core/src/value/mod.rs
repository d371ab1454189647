#[cfg(test)]
mod tests;

use crate::error::{ErrorClass, ErrorOrigin, InternalError};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error as ThisError;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

///
/// CoerceError
///
/// Raw form input that cannot be shaped into the field's value kind.
/// Always recoverable; surfaces as a per-field validation message.
///

#[derive(Debug, ThisError)]
pub enum CoerceError {
    #[error("expected {expected}, got {got}")]
    KindMismatch {
        expected: ValueKind,
        got: &'static str,
    },

    #[error("number out of range for {expected}")]
    OutOfRange { expected: ValueKind },

    #[error("timestamp is not an epoch-seconds integer or RFC 3339 string")]
    BadTimestamp,
}

impl From<CoerceError> for InternalError {
    fn from(err: CoerceError) -> Self {
        Self::new(ErrorClass::Validation, ErrorOrigin::Value, err.to_string())
    }
}

///
/// Value
///
/// Typed payload of one field value. Every stored field value is exactly one
/// of these; the kind is fixed per field type, never per row.
///

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Value {
    Bool(bool),
    Float64(f64),
    Int(i64),
    Text(String),
    /// Epoch seconds, UTC.
    Timestamp(i64),
    Uint(u64),
}

impl Value {
    #[must_use]
    pub const fn kind(&self) -> ValueKind {
        match self {
            Self::Bool(_) => ValueKind::Bool,
            Self::Float64(_) => ValueKind::Float64,
            Self::Int(_) => ValueKind::Int,
            Self::Text(_) => ValueKind::Text,
            Self::Timestamp(_) => ValueKind::Timestamp,
            Self::Uint(_) => ValueKind::Uint,
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Render the value for the attribute map handed to templating.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Bool(b) => serde_json::Value::Bool(*b),
            Self::Float64(f) => serde_json::Number::from_f64(*f)
                .map_or(serde_json::Value::Null, serde_json::Value::Number),
            Self::Int(i) => serde_json::Value::from(*i),
            Self::Text(s) => serde_json::Value::from(s.clone()),
            Self::Timestamp(t) => serde_json::Value::from(*t),
            Self::Uint(u) => serde_json::Value::from(*u),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Float64(x) => write!(f, "{x}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Text(s) => write!(f, "{s}"),
            Self::Timestamp(t) => write!(f, "{t}"),
            Self::Uint(u) => write!(f, "{u}"),
        }
    }
}

///
/// ValueKind
///
/// Lossy projection of `Value` used by field-type descriptors and column
/// builders.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    Bool,
    Float64,
    Int,
    Text,
    Timestamp,
    Uint,
}

impl ValueKind {
    /// Shape raw form input (JSON) into a typed value of this kind.
    ///
    /// JSON `null` maps to "unset" and is handled by the caller before
    /// coercion; passing it here is a kind mismatch.
    pub fn coerce(self, raw: &serde_json::Value) -> Result<Value, CoerceError> {
        match (self, raw) {
            (Self::Bool, serde_json::Value::Bool(b)) => Ok(Value::Bool(*b)),

            (Self::Float64, serde_json::Value::Number(n)) => n
                .as_f64()
                .map(Value::Float64)
                .ok_or(CoerceError::OutOfRange { expected: self }),

            (Self::Int, serde_json::Value::Number(n)) => n
                .as_i64()
                .map(Value::Int)
                .ok_or(CoerceError::OutOfRange { expected: self }),

            (Self::Uint, serde_json::Value::Number(n)) => n
                .as_u64()
                .map(Value::Uint)
                .ok_or(CoerceError::OutOfRange { expected: self }),

            (Self::Text, serde_json::Value::String(s)) => Ok(Value::Text(s.clone())),

            (Self::Timestamp, serde_json::Value::Number(n)) => n
                .as_i64()
                .map(Value::Timestamp)
                .ok_or(CoerceError::BadTimestamp),

            (Self::Timestamp, serde_json::Value::String(s)) => {
                let parsed =
                    OffsetDateTime::parse(s, &Rfc3339).map_err(|_| CoerceError::BadTimestamp)?;
                Ok(Value::Timestamp(parsed.unix_timestamp()))
            }

            (_, raw) => Err(CoerceError::KindMismatch {
                expected: self,
                got: json_kind_name(raw),
            }),
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Bool => "bool",
            Self::Float64 => "float64",
            Self::Int => "int",
            Self::Text => "text",
            Self::Timestamp => "timestamp",
            Self::Uint => "uint",
        };
        write!(f, "{s}")
    }
}

const fn json_kind_name(raw: &serde_json::Value) -> &'static str {
    match raw {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
