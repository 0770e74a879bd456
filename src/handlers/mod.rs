//! Built-in API handlers and registry bootstrap.
//!
//! # Routes
//! - `GET  /api/routes`: registered routes
//! - `GET  /api/config/{name}`: one configuration option (reason required)
//! - `GET  /api/users/me/token`: the caller's derived token
//! - `POST /api/uploads/{*path}`: multipart upload summary

pub mod config;
pub mod routes;
pub mod token;
pub mod uploads;

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use serde_json::{json, Value};

use crate::config::GatewayConfig;
use crate::http::request::HttpMethod;
use crate::routing::{Registry, RegistryBuilder, RegistryError};
use crate::security::ReasonRequired;

pub use config::GetConfigOptionHandler;
pub use routes::{ListRoutesHandler, RouteCatalog};
pub use token::GetTokenHandler;
pub use uploads::UploadHandler;

/// Wrap `value` in the `{type, value}` envelope clients strip with
/// `strip_type_info`.
pub fn tagged(type_name: &str, value: impl Into<Value>) -> Value {
    json!({ "type": type_name, "value": value.into() })
}

/// Register the built-in handlers and freeze the registry.
pub fn bootstrap(config: &GatewayConfig) -> Result<Arc<Registry>, RegistryError> {
    let catalog: RouteCatalog = Arc::new(OnceLock::new());
    let default_max_execution_time = Duration::from_secs(config.api.default_max_execution_secs);

    let mut builder = RegistryBuilder::new(default_max_execution_time);
    builder
        .register(
            HttpMethod::Get,
            "/api/routes",
            Arc::new(ListRoutesHandler::new(Arc::clone(&catalog))),
        )?
        .register(
            HttpMethod::Get,
            "/api/config/{name}",
            Arc::new(GetConfigOptionHandler::new(config, Arc::new(ReasonRequired))),
        )?
        .register(HttpMethod::Get, "/api/users/me/token", Arc::new(GetTokenHandler))?
        .register(HttpMethod::Post, "/api/uploads/{*path}", Arc::new(UploadHandler))?;

    let registry = Arc::new(builder.build());
    routes::publish(&catalog, &registry);

    for route in registry.routes() {
        tracing::info!(
            method = %route.method(),
            template = %route.template().as_str(),
            handler = route.descriptor().name(),
            "API route"
        );
    }
    Ok(registry)
}
