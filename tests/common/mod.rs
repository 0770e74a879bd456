//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use api_gateway::binding::{
    AdditionalArgsSchema, ArgsObject, ArgsSchema, FieldDescriptor, ValueType,
};
use api_gateway::config::GatewayConfig;
use api_gateway::dispatch::{ApiHandler, HandlerError};
use api_gateway::http::{HttpMethod, HttpServer, XSSI_PREFIX};
use api_gateway::routing::{Registry, RegistryBuilder};
use api_gateway::security::{AccessDenied, Token};
use axum::body::Body;
use axum::http::Response;
use serde_json::{json, Value};

/// Echoes bound arguments and the derived token back to the caller.
pub struct EchoHandler;

impl ApiHandler for EchoHandler {
    fn name(&self) -> &'static str {
        "Echo"
    }

    fn args_schema(&self) -> Option<ArgsSchema> {
        Some(
            ArgsSchema::new("EchoArgs")
                .with_field("client_id", ValueType::String)
                .with_field("foo", ValueType::Integer)
                .with_field("bar", ValueType::String)
                .with_descriptor(FieldDescriptor::new("file", ValueType::Bytes).not_from_path()),
        )
    }

    fn additional_args_schema(&self) -> AdditionalArgsSchema {
        AdditionalArgsSchema::new().with_bundle(
            "extra",
            ArgsSchema::new("ExtraArgs").with_field("field1", ValueType::String),
        )
    }

    fn handle(&self, args: Option<ArgsObject>, token: &Token) -> Result<Value, HandlerError> {
        Ok(json!({
            "args": args.map(|a| a.to_json()),
            "token": token.to_json(),
        }))
    }
}

/// Returns a fixed payload, ignoring its input.
pub struct FixedHandler(pub Value);

impl ApiHandler for FixedHandler {
    fn name(&self) -> &'static str {
        "Fixed"
    }

    fn handle(&self, _args: Option<ArgsObject>, _token: &Token) -> Result<Value, HandlerError> {
        Ok(self.0.clone())
    }
}

/// Always denied by its access checker.
pub struct DeniedHandler;

impl ApiHandler for DeniedHandler {
    fn name(&self) -> &'static str {
        "Denied"
    }

    fn handle(&self, _args: Option<ArgsObject>, _token: &Token) -> Result<Value, HandlerError> {
        Err(AccessDenied::new("approval missing", "aff4:/C.1000000000000000").into())
    }
}

/// Fails with a plain handler error.
pub struct FailingHandler;

impl ApiHandler for FailingHandler {
    fn name(&self) -> &'static str {
        "Failing"
    }

    fn handle(&self, _args: Option<ArgsObject>, _token: &Token) -> Result<Value, HandlerError> {
        Err(HandlerError::failed("datastore unavailable"))
    }
}

/// Registry with the test handlers mounted under `/api/test`.
pub fn test_registry() -> Arc<Registry> {
    let mut builder = RegistryBuilder::new(Duration::from_secs(20));
    builder
        .register(HttpMethod::Get, "/api/test/echo", Arc::new(EchoHandler))
        .unwrap()
        .register(HttpMethod::Get, "/api/test/clients/{client_id}", Arc::new(EchoHandler))
        .unwrap()
        .register(HttpMethod::Post, "/api/test/echo", Arc::new(EchoHandler))
        .unwrap()
        .register(
            HttpMethod::Get,
            "/api/test/tagged",
            Arc::new(FixedHandler(json!({
                "type": "ApiClient",
                "value": {
                    "id": {"type": "str", "value": "C.1"},
                    "labels": [{"type": "str", "value": "prod"}, "plain"],
                },
            }))),
        )
        .unwrap()
        .register(
            HttpMethod::Get,
            "/api/test/html",
            Arc::new(FixedHandler(json!({"note": "<script>alert(1)</script>"}))),
        )
        .unwrap()
        .register(HttpMethod::Get, "/api/test/denied", Arc::new(DeniedHandler))
        .unwrap()
        .register(HttpMethod::Get, "/api/test/failing", Arc::new(FailingHandler))
        .unwrap();
    Arc::new(builder.build())
}

/// Fully layered router over the test registry.
pub fn test_router() -> axum::Router {
    HttpServer::new(GatewayConfig::default(), test_registry()).router()
}

/// Collect a response body as text.
pub async fn body_text(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Parse a gateway body, asserting the XSSI prefix is present.
pub fn parse_body(text: &str) -> Value {
    let json = text
        .strip_prefix(XSSI_PREFIX)
        .unwrap_or_else(|| panic!("missing XSSI prefix: {:?}", text));
    serde_json::from_str(json).unwrap()
}
