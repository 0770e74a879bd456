//! Request-side wire types.
//!
//! # Responsibilities
//! - Generate unique request IDs (UUID v4)
//! - Restrict methods to the two the gateway dispatches (GET, POST)
//! - Decode query strings into ordered key/value pairs
//! - Carry an already-collected body to the synchronous dispatch path
//!
//! # Design Decisions
//! - Bodies are fully buffered before dispatch; binding never does I/O
//! - Multipart parts are split on the transport task, so the binder only sees
//!   names and bytes

use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;

use axum::body::Bytes;
use axum::http::{HeaderMap, HeaderValue, Method, Request};
use thiserror::Error;
use tower_http::request_id::{MakeRequestId, RequestId};
use uuid::Uuid;

/// Header carrying the per-request correlation ID.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Methods a route can be registered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HttpMethod {
    Get,
    Post,
}

/// A method other than GET or POST was supplied.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsupported method: {0}")]
pub struct UnsupportedMethod(pub String);

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = UnsupportedMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(HttpMethod::Get),
            "POST" => Ok(HttpMethod::Post),
            _ => Err(UnsupportedMethod(s.to_string())),
        }
    }
}

impl TryFrom<&Method> for HttpMethod {
    type Error = UnsupportedMethod;

    fn try_from(method: &Method) -> Result<Self, Self::Error> {
        if *method == Method::GET {
            Ok(HttpMethod::Get)
        } else if *method == Method::POST {
            Ok(HttpMethod::Post)
        } else {
            Err(UnsupportedMethod(method.to_string()))
        }
    }
}

/// Decoded query string, in wire order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    /// Decode an `application/x-www-form-urlencoded` query string.
    pub fn parse(query: Option<&str>) -> Self {
        let pairs = query
            .map(|q| {
                url::form_urlencoded::parse(q.as_bytes())
                    .into_owned()
                    .collect()
            })
            .unwrap_or_default();
        Self { pairs }
    }

    /// Value of `name`; the last occurrence wins.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.pairs
            .iter()
            .rev()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// True when `name` is present with a non-empty value.
    pub fn is_set(&self, name: &str) -> bool {
        self.get(name).is_some_and(|value| !value.is_empty())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for QueryParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            pairs: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

/// One part of a `multipart/form-data` body.
#[derive(Debug, Clone)]
pub struct FormPart {
    pub name: String,
    pub file_name: Option<String>,
    pub data: Bytes,
}

/// A buffered request body.
#[derive(Debug, Clone, Default)]
pub enum RequestBody {
    /// GET requests, or nothing was sent.
    #[default]
    Empty,
    /// Any non-multipart body; bound as JSON.
    Raw(Bytes),
    /// Parts of a `multipart/form-data` body.
    Multipart(Vec<FormPart>),
}

/// Everything dispatch needs from one HTTP request, detached from the
/// transport.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: QueryParams,
    pub headers: HeaderMap,
    pub remote_addr: Option<SocketAddr>,
    pub body: RequestBody,
}

impl ApiRequest {
    /// A bodiless request with no headers or peer address.
    pub fn new(method: Method, path_and_query: &str) -> Self {
        let (path, query) = match path_and_query.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (path_and_query, None),
        };
        Self {
            method,
            path: path.to_string(),
            query: QueryParams::parse(query),
            headers: HeaderMap::new(),
            remote_addr: None,
            body: RequestBody::Empty,
        }
    }

    pub fn with_body(mut self, body: RequestBody) -> Self {
        self.body = body;
        self
    }

    pub fn with_header(mut self, name: &'static str, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn with_remote_addr(mut self, addr: SocketAddr) -> Self {
        self.remote_addr = Some(addr);
        self
    }
}

/// Produces `x-request-id` values for requests that arrive without one.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestIdGenerator;

impl MakeRequestId for RequestIdGenerator {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}
