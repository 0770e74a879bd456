//! Typed argument values and their coercions.
//!
//! Every field on an arguments object has a [`ValueType`]. Raw input reaches
//! a field either as a string (path variable, query parameter), as raw bytes
//! (multipart part) or as a JSON value (request body), and the value type
//! decides how each of those is turned into a [`Value`].

use std::fmt;

use serde_json::Value as Json;
use thiserror::Error;

/// The declared type of an argument field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueType {
    String,
    Integer,
    Float,
    Bool,
    /// Raw binary payload, typically a multipart upload.
    Bytes,
    /// Free-form JSON, passed through untouched.
    Json,
    /// Homogeneous list; only reachable from JSON arrays.
    List(Box<ValueType>),
}

/// A typed value bound to an argument field.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Bytes(Vec<u8>),
    Json(Json),
    List(Vec<Value>),
}

/// Raw input could not be coerced into the declared type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("expected {expected}, got {found}")]
pub struct CoercionError {
    pub expected: String,
    pub found: String,
}

impl CoercionError {
    fn new(expected: &ValueType, found: impl Into<String>) -> Self {
        Self {
            expected: expected.to_string(),
            found: found.into(),
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueType::String => write!(f, "string"),
            ValueType::Integer => write!(f, "integer"),
            ValueType::Float => write!(f, "float"),
            ValueType::Bool => write!(f, "bool"),
            ValueType::Bytes => write!(f, "bytes"),
            ValueType::Json => write!(f, "json"),
            ValueType::List(inner) => write!(f, "list<{}>", inner),
        }
    }
}

impl ValueType {
    /// Whether a single raw string (path variable, query parameter) can
    /// populate a field of this type.
    pub fn settable_from_string(&self) -> bool {
        !matches!(self, ValueType::List(_))
    }

    /// Coerce a raw string. Callers check [`Self::settable_from_string`] first.
    pub fn parse_str(&self, raw: &str) -> Result<Value, CoercionError> {
        let quoted = || format!("'{}'", raw);
        match self {
            ValueType::String => Ok(Value::String(raw.to_string())),
            ValueType::Integer => raw
                .trim()
                .parse()
                .map(Value::Integer)
                .map_err(|_| CoercionError::new(self, quoted())),
            ValueType::Float => raw
                .trim()
                .parse()
                .map(Value::Float)
                .map_err(|_| CoercionError::new(self, quoted())),
            ValueType::Bool => parse_bool(raw)
                .map(Value::Bool)
                .ok_or_else(|| CoercionError::new(self, quoted())),
            ValueType::Bytes => Ok(Value::Bytes(raw.as_bytes().to_vec())),
            ValueType::Json => serde_json::from_str(raw)
                .map(Value::Json)
                .map_err(|e| CoercionError::new(self, format!("{} ({})", quoted(), e))),
            ValueType::List(_) => Err(CoercionError::new(self, quoted())),
        }
    }

    /// Coerce the raw bytes of an uploaded part.
    pub fn parse_bytes(&self, raw: Vec<u8>) -> Result<Value, CoercionError> {
        match self {
            ValueType::Bytes => Ok(Value::Bytes(raw)),
            _ => {
                let text = String::from_utf8(raw)
                    .map_err(|_| CoercionError::new(self, "non-UTF-8 bytes"))?;
                self.parse_str(&text)
            }
        }
    }

    /// Coerce a JSON value taken from a request body mapping.
    pub fn from_json(&self, json: &Json) -> Result<Value, CoercionError> {
        let mismatch = || CoercionError::new(self, json_kind(json));
        match (self, json) {
            (ValueType::Json, _) => Ok(Value::Json(json.clone())),
            (ValueType::String, Json::String(s)) => Ok(Value::String(s.clone())),
            (ValueType::Bytes, Json::String(s)) => Ok(Value::Bytes(s.clone().into_bytes())),
            (ValueType::Integer, Json::Number(n)) => {
                n.as_i64().map(Value::Integer).ok_or_else(mismatch)
            }
            (ValueType::Float, Json::Number(n)) => {
                n.as_f64().map(Value::Float).ok_or_else(mismatch)
            }
            (ValueType::Integer | ValueType::Float, Json::String(s)) => self.parse_str(s),
            (ValueType::Bool, Json::Bool(b)) => Ok(Value::Bool(*b)),
            (ValueType::List(inner), Json::Array(items)) => items
                .iter()
                .map(|item| inner.from_json(item))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::List),
            _ => Err(mismatch()),
        }
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Some(true),
        "0" | "false" | "no" => Some(false),
        _ => None,
    }
}

fn json_kind(json: &Json) -> &'static str {
    match json {
        Json::Null => "null",
        Json::Bool(_) => "a boolean",
        Json::Number(_) => "a number",
        Json::String(_) => "a string",
        Json::Array(_) => "an array",
        Json::Object(_) => "an object",
    }
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Render as JSON. Bytes are rendered as lossy UTF-8 text.
    pub fn to_json(&self) -> Json {
        match self {
            Value::String(s) => Json::from(s.as_str()),
            Value::Integer(i) => Json::from(*i),
            Value::Float(f) => Json::from(*f),
            Value::Bool(b) => Json::from(*b),
            Value::Bytes(b) => Json::from(String::from_utf8_lossy(b).into_owned()),
            Value::Json(j) => j.clone(),
            Value::List(items) => Json::Array(items.iter().map(Value::to_json).collect()),
        }
    }
}
