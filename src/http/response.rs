//! Response encoding.
//!
//! # Responsibilities
//! - Serialize payloads into the hardened JSON wire format
//! - Add the fixed security headers to every API response
//! - Strip type-info wrappers from payloads on request (debug aid)
//!
//! # Design Decisions
//! - Every body starts with the XSSI prefix, whatever the status
//! - `<` and `>` are escaped after serialization so no response can be
//!   content-sniffed as HTML
//! - `Content-Disposition: attachment` keeps browsers from rendering inline

use axum::body::{Body, Bytes};
use axum::http::{header, HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde_json::Value;

/// Prefix making the body invalid as an executable script.
pub const XSSI_PREFIX: &str = ")]}'\n";

/// Content type of every API response.
pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

const CONTENT_DISPOSITION: &str = "attachment; filename=response.json";

/// The finished response handed back to the transport.
#[derive(Debug, Clone)]
pub struct ResponseEnvelope {
    status: StatusCode,
    content_type: &'static str,
    headers: Vec<(HeaderName, HeaderValue)>,
    body: Bytes,
}

impl ResponseEnvelope {
    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn content_type(&self) -> &'static str {
        self.content_type
    }

    /// Headers set in addition to the content type.
    pub fn headers(&self) -> &[(HeaderName, HeaderValue)] {
        &self.headers
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Body with the XSSI prefix removed, parsed back into JSON.
    pub fn json(&self) -> Result<Value, serde_json::Error> {
        let body = self.body.strip_prefix(XSSI_PREFIX.as_bytes()).unwrap_or(&self.body[..]);
        serde_json::from_slice(body)
    }
}

impl IntoResponse for ResponseEnvelope {
    fn into_response(self) -> Response {
        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = self.status;

        let headers = response.headers_mut();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(self.content_type));
        for (name, value) in self.headers {
            headers.insert(name, value);
        }
        response
    }
}

/// Build the envelope for `payload` with the given status.
pub fn encode(status: StatusCode, payload: &Value) -> ResponseEnvelope {
    let serialized = payload.to_string();

    let mut body = String::with_capacity(XSSI_PREFIX.len() + serialized.len());
    body.push_str(XSSI_PREFIX);
    for c in serialized.chars() {
        match c {
            '<' => body.push_str("\\u003c"),
            '>' => body.push_str("\\u003e"),
            _ => body.push(c),
        }
    }

    ResponseEnvelope {
        status,
        content_type: JSON_CONTENT_TYPE,
        headers: vec![
            (header::CONTENT_DISPOSITION, HeaderValue::from_static(CONTENT_DISPOSITION)),
            (header::X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff")),
        ],
        body: Bytes::from(body),
    }
}

/// Recursively unwrap `{"value": ..., <type metadata>}` wrappers.
///
/// Debug aid only; programmatic clients must not depend on it.
pub fn strip_type_info(value: Value) -> Value {
    match value {
        Value::Array(items) => Value::Array(items.into_iter().map(strip_type_info).collect()),
        Value::Object(mut map) => match map.remove("value") {
            Some(inner) => strip_type_info(inner),
            None => Value::Object(
                map.into_iter()
                    .map(|(k, v)| (k, strip_type_info(v)))
                    .collect(),
            ),
        },
        other => other,
    }
}
