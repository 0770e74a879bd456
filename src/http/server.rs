//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router with a single catch-all API handler
//! - Wire up middleware (request ID, tracing, body limit)
//! - Collect request bodies (JSON or multipart) on the async side
//! - Hand the collected request to the dispatcher on the blocking pool
//! - Serve until the shutdown signal fires
//!
//! # Design Decisions
//! - Every response, including body-limit and read-timeout failures, is an
//!   encoded envelope; no layer answers on its own
//! - Handlers are never cancelled; only body collection is time-bounded

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::{Body, Bytes},
    extract::{ConnectInfo, DefaultBodyLimit, FromRequest, Multipart, State},
    http::{header, HeaderMap, Request, StatusCode},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::binding::BindError;
use crate::config::GatewayConfig;
use crate::dispatch::{ApiError, Dispatcher};
use crate::http::request::{
    ApiRequest, FormPart, HttpMethod, QueryParams, RequestBody, RequestIdGenerator, X_REQUEST_ID,
};
use crate::routing::Registry;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
    pub limits: BodyLimits,
}

/// Bounds applied while collecting a POST body.
#[derive(Debug, Clone, Copy)]
pub struct BodyLimits {
    pub max_size: usize,
    pub read_timeout: Duration,
}

impl BodyLimits {
    pub fn from_config(config: &GatewayConfig) -> Self {
        Self {
            max_size: config.listener.max_body_size,
            read_timeout: Duration::from_secs(config.timeouts.body_read_secs),
        }
    }
}

/// HTTP front end of the gateway.
pub struct HttpServer {
    router: Router,
    config: GatewayConfig,
}

impl HttpServer {
    pub fn new(config: GatewayConfig, registry: Arc<Registry>) -> Self {
        let state = AppState {
            dispatcher: Arc::new(Dispatcher::new(registry, &config.api)),
            limits: BodyLimits::from_config(&config),
        };
        let router = Self::build_router(&config, state);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    ///
    /// The body limit is enforced by the extractors in `read_body`, so an
    /// oversized body is reported through the dispatcher like any other
    /// binding failure.
    fn build_router(config: &GatewayConfig, state: AppState) -> Router {
        Router::new()
            .route("/{*path}", any(api_handler))
            .route("/", any(api_handler))
            .with_state(state)
            .layer(DefaultBodyLimit::max(config.listener.max_body_size))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                let request_id = request
                    .headers()
                    .get(X_REQUEST_ID)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("unknown");
                tracing::info_span!(
                    "request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = %request_id,
                )
            }))
            .layer(SetRequestIdLayer::x_request_id(RequestIdGenerator))
    }

    /// The fully layered router, for in-process testing.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Serve on `listener` until `shutdown` fires, then drain in-flight
    /// requests.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("HTTP server draining");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Catch-all API handler.
async fn api_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let remote_addr = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);

    let mut api_request = ApiRequest {
        method: request.method().clone(),
        path: request.uri().path().to_string(),
        query: QueryParams::parse(request.uri().query()),
        headers: request.headers().clone(),
        remote_addr,
        body: RequestBody::Empty,
    };

    let dispatcher = Arc::clone(&state.dispatcher);
    let matched = match dispatcher.resolve(&api_request.method, &api_request.path) {
        Ok(matched) => matched,
        Err(not_found) => {
            return dispatcher
                .reject(&api_request, "none", Instant::now(), not_found.into())
                .into_response()
        }
    };

    if matched.route.method() == HttpMethod::Post {
        match read_body(request, state.limits).await {
            Ok(body) => api_request.body = body,
            Err(e) => {
                let handler = matched.route.descriptor().name();
                return dispatcher
                    .reject(&api_request, handler, Instant::now(), ApiError::Binding(e))
                    .into_response();
            }
        }
    }

    let handler = matched.route.descriptor().name();
    let worker = Arc::clone(&dispatcher);
    let request_for_worker = api_request.clone();
    let task = tokio::task::spawn_blocking(move || worker.dispatch(&matched, &request_for_worker));
    match task.await {
        Ok(envelope) => envelope.into_response(),
        Err(e) => {
            let err = ApiError::Handler(format!("handler task failed: {e}"));
            dispatcher
                .reject(&api_request, handler, Instant::now(), err)
                .into_response()
        }
    }
}

/// Collect the body within `limits`: multipart parts for
/// `multipart/form-data`, raw bytes otherwise.
async fn read_body(request: Request<Body>, limits: BodyLimits) -> Result<RequestBody, BindError> {
    tokio::time::timeout(limits.read_timeout, collect_body(request, limits.max_size))
        .await
        .map_err(|_| {
            BindError::Body(format!("timed out after {}s", limits.read_timeout.as_secs()))
        })?
}

/// The extractors enforce the router's `DefaultBodyLimit` and report an
/// exceeded limit as 413, whichever way the body was framed.
async fn collect_body(request: Request<Body>, max_size: usize) -> Result<RequestBody, BindError> {
    let body_error = |status: StatusCode, text: String| {
        if status == StatusCode::PAYLOAD_TOO_LARGE {
            BindError::BodyTooLarge { limit: max_size }
        } else {
            BindError::Body(text)
        }
    };

    if !is_multipart(request.headers()) {
        let bytes = Bytes::from_request(request, &())
            .await
            .map_err(|e| body_error(e.status(), e.body_text()))?;
        return Ok(if bytes.is_empty() {
            RequestBody::Empty
        } else {
            RequestBody::Raw(bytes)
        });
    }

    let mut multipart = Multipart::from_request(request, &())
        .await
        .map_err(|e| body_error(e.status(), e.body_text()))?;

    let mut parts = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| body_error(e.status(), e.body_text()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);
        let data = field
            .bytes()
            .await
            .map_err(|e| body_error(e.status(), e.body_text()))?;
        parts.push(FormPart { name, file_name, data });
    }
    Ok(RequestBody::Multipart(parts))
}

fn is_multipart(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.trim_start().to_ascii_lowercase().starts_with("multipart/form-data"))
}
