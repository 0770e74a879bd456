//! Route listing.

use std::sync::{Arc, OnceLock};

use serde_json::Value;

use crate::binding::{ArgsObject, ArgsSchema, ValueType};
use crate::dispatch::handler::{ApiHandler, HandlerError};
use crate::handlers::tagged;
use crate::routing::{Registry, Route};
use crate::security::Token;

/// Snapshot of the route table, filled in once the registry is frozen.
pub type RouteCatalog = Arc<OnceLock<Vec<RouteEntry>>>;

/// One row of the route listing.
#[derive(Debug, Clone)]
pub struct RouteEntry {
    method: &'static str,
    template: String,
    handler: &'static str,
    args_type: Option<String>,
    fields: Vec<String>,
    bundles: Vec<String>,
}

impl RouteEntry {
    fn from_route(route: &Route) -> Self {
        let descriptor = route.descriptor();
        let schema = descriptor.args_schema();
        Self {
            method: route.method().as_str(),
            template: route.template().as_str().to_string(),
            handler: descriptor.name(),
            args_type: schema.map(|s| s.type_name().to_string()),
            fields: schema
                .map(|s| s.fields().iter().map(|f| f.name().to_string()).collect())
                .unwrap_or_default(),
            bundles: descriptor
                .additional_args_schema()
                .names()
                .map(str::to_string)
                .collect(),
        }
    }

    fn to_json(&self) -> Value {
        let strings = |items: &[String]| -> Value {
            tagged(
                "list",
                items.iter().map(|s| tagged("str", s.as_str())).collect::<Vec<_>>(),
            )
        };
        tagged(
            "ApiRoute",
            serde_json::json!({
                "method": tagged("str", self.method),
                "template": tagged("str", self.template.as_str()),
                "handler": tagged("str", self.handler),
                "args_type": self.args_type.as_deref().map(|t| tagged("str", t)),
                "fields": strings(&self.fields),
                "additional_args": strings(&self.bundles),
            }),
        )
    }
}

/// Fill `catalog` from the frozen registry. Later calls are ignored.
pub fn publish(catalog: &RouteCatalog, registry: &Registry) {
    let entries = registry.routes().iter().map(|r| RouteEntry::from_route(r)).collect();
    if catalog.set(entries).is_err() {
        tracing::warn!("Route catalog already published");
    }
}

/// `GET /api/routes`, optionally filtered by `method` and path `prefix`.
pub struct ListRoutesHandler {
    catalog: RouteCatalog,
}

impl ListRoutesHandler {
    pub fn new(catalog: RouteCatalog) -> Self {
        Self { catalog }
    }
}

impl ApiHandler for ListRoutesHandler {
    fn name(&self) -> &'static str {
        "ListRoutes"
    }

    fn args_schema(&self) -> Option<ArgsSchema> {
        Some(
            ArgsSchema::new("ApiListRoutesArgs")
                .with_field("method", ValueType::String)
                .with_field("prefix", ValueType::String),
        )
    }

    fn handle(&self, args: Option<ArgsObject>, _token: &Token) -> Result<Value, HandlerError> {
        let entries = self
            .catalog
            .get()
            .ok_or_else(|| HandlerError::failed("route catalog is not available yet"))?;

        let method = args.as_ref().and_then(|a| a.get_str("method"));
        let prefix = args.as_ref().and_then(|a| a.get_str("prefix"));

        let items: Vec<Value> = entries
            .iter()
            .filter(|e| method.map_or(true, |m| e.method.eq_ignore_ascii_case(m)))
            .filter(|e| prefix.map_or(true, |p| e.template.starts_with(p)))
            .map(RouteEntry::to_json)
            .collect();

        Ok(serde_json::json!({
            "items": tagged("list", items),
        }))
    }
}
