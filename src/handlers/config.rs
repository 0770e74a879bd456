//! Configuration option lookup.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value;

use crate::binding::{ArgsObject, ArgsSchema, ValueType};
use crate::config::GatewayConfig;
use crate::dispatch::handler::{ApiHandler, HandlerError};
use crate::handlers::tagged;
use crate::security::{AccessChecker, Token};

/// `GET /api/config/{name}`: one option by dotted name, e.g.
/// `listener.bind_address`.
pub struct GetConfigOptionHandler {
    options: BTreeMap<String, Value>,
    checker: Arc<dyn AccessChecker>,
}

impl GetConfigOptionHandler {
    pub fn new(config: &GatewayConfig, checker: Arc<dyn AccessChecker>) -> Self {
        let mut options = BTreeMap::new();
        match serde_json::to_value(config) {
            Ok(value) => flatten("", value, &mut options),
            Err(e) => tracing::error!(error = %e, "Failed to snapshot configuration"),
        }
        Self { options, checker }
    }

    /// Dotted option names, sorted.
    pub fn option_names(&self) -> impl Iterator<Item = &str> {
        self.options.keys().map(String::as_str)
    }
}

fn flatten(prefix: &str, value: Value, out: &mut BTreeMap<String, Value>) {
    match value {
        Value::Object(map) => {
            for (key, inner) in map {
                let name = if prefix.is_empty() {
                    key
                } else {
                    format!("{prefix}.{key}")
                };
                flatten(&name, inner, out);
            }
        }
        leaf => {
            out.insert(prefix.to_string(), leaf);
        }
    }
}

fn type_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "none",
        Value::Bool(_) => "bool",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "int",
        Value::String(_) => "str",
        Value::Array(_) => "list",
        Value::Object(_) => "dict",
    }
}

impl ApiHandler for GetConfigOptionHandler {
    fn name(&self) -> &'static str {
        "GetConfigOption"
    }

    fn args_schema(&self) -> Option<ArgsSchema> {
        Some(ArgsSchema::new("ApiGetConfigOptionArgs").with_field("name", ValueType::String))
    }

    fn handle(&self, args: Option<ArgsObject>, token: &Token) -> Result<Value, HandlerError> {
        let name = args
            .as_ref()
            .and_then(|a| a.get_str("name"))
            .ok_or_else(|| HandlerError::failed("option name is required"))?;

        self.checker.check(token, &format!("config/{name}"))?;

        let value = self
            .options
            .get(name)
            .ok_or_else(|| HandlerError::failed(format!("unknown config option '{name}'")))?;

        Ok(tagged(
            "ApiConfigOption",
            serde_json::json!({
                "name": tagged("str", name),
                "current": tagged(type_of(value), value.clone()),
            }),
        ))
    }
}
