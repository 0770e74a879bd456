//! Argument binding subsystem.
//!
//! # Data Flow
//! ```text
//! RouteMatch (descriptor + path variables) + ApiRequest
//!     → binder.rs (method-specific resolution order)
//!     → args.rs (set fields by name through the schema table)
//!     → value.rs (coerce string / bytes / JSON into typed values)
//!     → ArgsObject handed to the dispatcher
//! ```
//!
//! # Design Decisions
//! - Schemas are static tables built at registration, never reflected on
//! - Every malformed input is a `BindError`; nothing panics on client data
//! - Additional-args bundles are a fixed two-level schema, resolved in one
//!   pass over the query keys

pub mod args;
pub mod binder;
pub mod schema;
pub mod value;

use thiserror::Error;

pub use args::{AdditionalArgsBundle, ArgsObject};
pub use binder::{bind, PARAMS_FIELD};
pub use schema::{AdditionalArgsSchema, ArgsSchema, FieldDescriptor};
pub use value::{CoercionError, Value, ValueType};

/// Malformed client input found while building an arguments object.
#[derive(Debug, Error)]
pub enum BindError {
    /// The schema declares no field of that name.
    #[error("{type_name} has no field '{field}'")]
    UnknownField { type_name: String, field: String },

    /// The raw value could not be coerced into the field's type.
    #[error("cannot set field '{field}': {source}")]
    Coercion {
        field: String,
        #[source]
        source: CoercionError,
    },

    /// A list field was given a single string.
    #[error("field '{field}' of type {value_type} cannot be set from a string")]
    NotSettableFromString { field: String, value_type: String },

    /// The body (or `_params_` part) is not valid JSON.
    #[error("{0}")]
    Json(#[from] serde_json::Error),

    /// The body parsed, but not into a JSON object.
    #[error("expected a JSON object, got {0}")]
    NotAnObject(&'static str),

    /// A multipart request lacked the JSON-encoded `_params_` part.
    #[error("multipart request is missing the '{}' field", PARAMS_FIELD)]
    MissingParams,

    /// The transport failed to read the body.
    #[error("failed to read request body: {0}")]
    Body(String),

    /// The body is larger than the configured limit.
    #[error("request body exceeds the limit of {limit} bytes")]
    BodyTooLarge { limit: usize },
}

impl BindError {
    pub(crate) fn coercion(field: &str, source: CoercionError) -> Self {
        Self::Coercion {
            field: field.to_string(),
            source,
        }
    }
}
