//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (single writer):
//!     RegistryBuilder::register(method, template, handler)
//!     → matcher.rs (compile template, normalize for duplicate check)
//!     → HandlerDescriptor snapshot of the handler's schemas
//!     → build() → immutable Registry, shared via Arc
//!
//! Incoming Request (method, path)
//!     → router.rs (scan routes for the method)
//!     → matcher.rs (segment walk, capture path variables)
//!     → Return: exactly one RouteMatch or RouteNotFound
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - No regex in hot path
//! - Deterministic: same input always matches same route
//! - Overlaps are a registration concern; matching never tie-breaks

pub mod matcher;
pub mod router;

pub use matcher::{PathTemplate, PathVars, TemplateError};
pub use router::{Registry, RegistryBuilder, RegistryError, Route, RouteMatch, RouteNotFound};
