//! Request dispatch: bind, derive token, invoke, encode.

use std::sync::Arc;
use std::time::Instant;

use axum::http::{Method, StatusCode};
use serde_json::Value;

use crate::binding;
use crate::config::ApiConfig;
use crate::dispatch::error::ApiError;
use crate::http::request::ApiRequest;
use crate::http::response::{encode, strip_type_info, ResponseEnvelope};
use crate::observability::metrics;
use crate::routing::{Registry, RouteMatch, RouteNotFound};
use crate::security::TokenFactory;

/// Query parameter enabling type-info stripping.
pub const STRIP_TYPE_INFO_PARAM: &str = "strip_type_info";

/// Runs matched requests through their handlers.
///
/// Shared by every request; holds only read-only state.
#[derive(Debug)]
pub struct Dispatcher {
    registry: Arc<Registry>,
    tokens: TokenFactory,
    strip_type_info_header: String,
}

impl Dispatcher {
    pub fn new(registry: Arc<Registry>, config: &ApiConfig) -> Self {
        Self {
            registry,
            tokens: TokenFactory::new(config),
            strip_type_info_header: config.strip_type_info_header.to_ascii_lowercase(),
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn resolve(&self, method: &Method, path: &str) -> Result<RouteMatch, RouteNotFound> {
        self.registry.match_route(method, path)
    }

    /// Resolve and dispatch in one step.
    pub fn handle(&self, request: &ApiRequest) -> ResponseEnvelope {
        match self.resolve(&request.method, &request.path) {
            Ok(matched) => self.dispatch(&matched, request),
            Err(not_found) => self.reject(request, "none", Instant::now(), not_found.into()),
        }
    }

    /// Dispatch a request already resolved to `matched`.
    pub fn dispatch(&self, matched: &RouteMatch, request: &ApiRequest) -> ResponseEnvelope {
        let start = Instant::now();
        let handler = matched.route.descriptor().name();

        match self.execute(matched, request) {
            Ok(payload) => {
                let payload = if self.strip_type_info_requested(request) {
                    strip_type_info(payload)
                } else {
                    payload
                };
                let envelope = encode(StatusCode::OK, &payload);
                metrics::record_request(request.method.as_str(), handler, 200, start);
                envelope
            }
            Err(err) => self.reject(request, handler, start, err),
        }
    }

    fn execute(&self, matched: &RouteMatch, request: &ApiRequest) -> Result<Value, ApiError> {
        let route = &matched.route;
        let descriptor = route.descriptor();

        let args = binding::bind(
            descriptor,
            route.method(),
            &matched.path_vars,
            &request.query,
            &request.body,
        )?;

        let token = self.tokens.derive(
            route.method(),
            &request.headers,
            &request.query,
            request.remote_addr,
            descriptor.max_execution_time(),
        );

        tracing::debug!(
            path = %request.path,
            method = %request.method,
            handler = descriptor.name(),
            username = ?token.username,
            "Dispatching API call"
        );

        Ok(descriptor.invoke(args, &token)?)
    }

    /// Log a failure, count it, and encode it.
    pub(crate) fn reject(
        &self,
        request: &ApiRequest,
        handler: &str,
        start: Instant,
        err: ApiError,
    ) -> ResponseEnvelope {
        match &err {
            ApiError::RouteNotFound(_) => tracing::warn!(
                path = %request.path,
                method = %request.method,
                "No API handler matched"
            ),
            ApiError::Binding(e) => tracing::error!(
                path = %request.path,
                method = %request.method,
                handler = handler,
                error = %e,
                "Error while parsing request"
            ),
            ApiError::AccessDenied { message, subject } => tracing::warn!(
                path = %request.path,
                method = %request.method,
                handler = handler,
                subject = %subject,
                error = %message,
                "Access denied"
            ),
            ApiError::Handler(message) => tracing::error!(
                path = %request.path,
                method = %request.method,
                handler = handler,
                error = %message,
                "Error while processing request"
            ),
        }

        metrics::record_failure(handler, err.kind());
        let envelope = err.into_envelope();
        let status = envelope.status().as_u16();
        metrics::record_request(request.method.as_str(), handler, status, start);
        envelope
    }

    fn strip_type_info_requested(&self, request: &ApiRequest) -> bool {
        request.query.is_set(STRIP_TYPE_INFO_PARAM)
            || request
                .headers
                .get(self.strip_type_info_header.as_str())
                .is_some_and(|v| !v.is_empty())
    }
}
