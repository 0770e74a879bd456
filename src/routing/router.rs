//! Route registry and lookup.
//!
//! # Responsibilities
//! - Accept route registrations during a single bootstrap phase
//! - Reject duplicate (method, normalized template) pairs
//! - Reject handlers whose schema can never bind on the route
//! - Freeze into an immutable `Registry`
//! - Resolve (method, path) to exactly one route or an explicit not-found
//!
//! # Design Decisions
//! - Immutable after `build()` (thread-safe without locks)
//! - O(n) template scan (acceptable for typical route counts)
//! - No precedence between overlapping templates: an ambiguous path is
//!   reported as not found, never silently resolved

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use axum::http::Method;
use thiserror::Error;

use crate::dispatch::handler::{ApiHandler, HandlerDescriptor};
use crate::http::request::{HttpMethod, UnsupportedMethod};
use crate::routing::matcher::{PathTemplate, PathVars, TemplateError};

/// Registration failures. These are fatal at startup.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("duplicate route {method} {template}: conflicts with {existing}")]
    DuplicateRoute {
        method: HttpMethod,
        template: String,
        existing: String,
    },

    #[error("invalid route template '{template}': {source}")]
    InvalidTemplate {
        template: String,
        #[source]
        source: TemplateError,
    },

    #[error("route {template}: {source}")]
    UnsupportedMethod {
        template: String,
        #[source]
        source: UnsupportedMethod,
    },

    #[error("route {template}: handler {handler} declares additional args without an args schema")]
    AdditionalArgsWithoutSchema {
        template: String,
        handler: &'static str,
    },

    #[error("route {template}: path variable '{field}' targets list field of {handler}")]
    ListPathField {
        template: String,
        handler: &'static str,
        field: String,
    },
}

/// No route (or more than one) matched the request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("No API handler was found for ({path}) {method}")]
pub struct RouteNotFound {
    pub method: String,
    pub path: String,
}

/// A registered route.
#[derive(Debug)]
pub struct Route {
    method: HttpMethod,
    template: PathTemplate,
    descriptor: HandlerDescriptor,
}

impl Route {
    pub fn method(&self) -> HttpMethod {
        self.method
    }

    pub fn template(&self) -> &PathTemplate {
        &self.template
    }

    pub fn descriptor(&self) -> &HandlerDescriptor {
        &self.descriptor
    }
}

/// A resolved route plus its captured path variables.
#[derive(Debug, Clone)]
pub struct RouteMatch {
    pub route: Arc<Route>,
    pub path_vars: PathVars,
}

/// Single-writer builder for the route table.
#[derive(Debug)]
pub struct RegistryBuilder {
    routes: Vec<Arc<Route>>,
    keys: HashMap<(HttpMethod, String), usize>,
    default_max_execution_time: Duration,
}

impl RegistryBuilder {
    pub fn new(default_max_execution_time: Duration) -> Self {
        Self {
            routes: Vec::new(),
            keys: HashMap::new(),
            default_max_execution_time,
        }
    }

    /// Register with a method given by name, e.g. from a route table file.
    pub fn register_str(
        &mut self,
        method: &str,
        template: &str,
        handler: Arc<dyn ApiHandler>,
    ) -> Result<&mut Self, RegistryError> {
        let method = method
            .parse::<HttpMethod>()
            .map_err(|source| RegistryError::UnsupportedMethod {
                template: template.to_string(),
                source,
            })?;
        self.register(method, template, handler)
    }

    /// Register `handler` for `method` and `template`.
    pub fn register(
        &mut self,
        method: HttpMethod,
        template: &str,
        handler: Arc<dyn ApiHandler>,
    ) -> Result<&mut Self, RegistryError> {
        let template =
            PathTemplate::parse(template).map_err(|source| RegistryError::InvalidTemplate {
                template: template.to_string(),
                source,
            })?;

        let key = (method, template.normalized());
        if let Some(&existing) = self.keys.get(&key) {
            return Err(RegistryError::DuplicateRoute {
                method,
                template: template.as_str().to_string(),
                existing: self.routes[existing].template.as_str().to_string(),
            });
        }

        let descriptor = HandlerDescriptor::new(handler, self.default_max_execution_time);
        check_bindable(&template, &descriptor)?;
        tracing::debug!(
            method = %method,
            template = %template.as_str(),
            handler = descriptor.name(),
            "Route registered"
        );

        self.keys.insert(key, self.routes.len());
        self.routes.push(Arc::new(Route {
            method,
            template,
            descriptor,
        }));
        Ok(self)
    }

    /// Freeze the table.
    pub fn build(self) -> Registry {
        Registry {
            routes: self.routes,
        }
    }
}

/// Schema problems that would fail every request to the route.
fn check_bindable(
    template: &PathTemplate,
    descriptor: &HandlerDescriptor,
) -> Result<(), RegistryError> {
    let Some(schema) = descriptor.args_schema() else {
        if !descriptor.additional_args_schema().is_empty() {
            return Err(RegistryError::AdditionalArgsWithoutSchema {
                template: template.as_str().to_string(),
                handler: descriptor.name(),
            });
        }
        return Ok(());
    };

    for var in template.variables() {
        let unsettable = schema
            .field(var)
            .is_some_and(|field| field.from_path() && !field.settable_from_string());
        if unsettable {
            return Err(RegistryError::ListPathField {
                template: template.as_str().to_string(),
                handler: descriptor.name(),
                field: var.to_string(),
            });
        }
    }
    Ok(())
}

/// Immutable route table shared by every request.
#[derive(Debug)]
pub struct Registry {
    routes: Vec<Arc<Route>>,
}

impl Registry {
    /// Resolve a request to exactly one route.
    pub fn match_route(&self, method: &Method, path: &str) -> Result<RouteMatch, RouteNotFound> {
        let not_found = || RouteNotFound {
            method: method.to_string(),
            path: path.to_string(),
        };

        let method = HttpMethod::try_from(method).map_err(|_| not_found())?;

        let mut candidates = self
            .routes
            .iter()
            .filter(|route| route.method == method)
            .filter_map(|route| {
                route.template.matches(path).map(|path_vars| RouteMatch {
                    route: Arc::clone(route),
                    path_vars,
                })
            });

        let first = candidates.next().ok_or_else(not_found)?;
        if let Some(second) = candidates.next() {
            tracing::warn!(
                method = %method,
                path = %path,
                first = %first.route.template.as_str(),
                second = %second.route.template.as_str(),
                "Ambiguous route match"
            );
            return Err(not_found());
        }
        Ok(first)
    }

    /// Routes in registration order.
    pub fn routes(&self) -> &[Arc<Route>] {
        &self.routes
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
