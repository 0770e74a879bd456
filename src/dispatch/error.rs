//! Per-request failure taxonomy and its wire mapping.

use axum::http::StatusCode;
use serde_json::{json, Value};
use thiserror::Error;

use crate::binding::BindError;
use crate::dispatch::handler::HandlerError;
use crate::http::response::{encode, ResponseEnvelope};
use crate::routing::RouteNotFound;

/// Everything that can stop a request from producing a 200.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    RouteNotFound(#[from] RouteNotFound),

    #[error(transparent)]
    Binding(#[from] BindError),

    #[error("Access denied by ACL: {message}")]
    AccessDenied { message: String, subject: String },

    #[error("{0}")]
    Handler(String),
}

impl From<HandlerError> for ApiError {
    fn from(err: HandlerError) -> Self {
        match err {
            HandlerError::AccessDenied { message, subject } => {
                ApiError::AccessDenied { message, subject }
            }
            HandlerError::Failed(message) => ApiError::Handler(message),
        }
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::RouteNotFound(_) => StatusCode::NOT_FOUND,
            ApiError::AccessDenied { .. } => StatusCode::FORBIDDEN,
            ApiError::Binding(_) | ApiError::Handler(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Client-visible body: a message, plus the subject for denials.
    pub fn body(&self) -> Value {
        match self {
            ApiError::AccessDenied { subject, .. } => json!({
                "message": self.to_string(),
                "subject": subject,
            }),
            _ => json!({ "message": self.to_string() }),
        }
    }

    /// Short label for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::RouteNotFound(_) => "route_not_found",
            ApiError::Binding(_) => "binding",
            ApiError::AccessDenied { .. } => "access_denied",
            ApiError::Handler(_) => "handler",
        }
    }

    pub fn into_envelope(self) -> ResponseEnvelope {
        encode(self.status(), &self.body())
    }
}
