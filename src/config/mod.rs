//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → GatewayConfig (validated, immutable)
//!     → shared with the token factory, server and observability
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; the route table is fixed at startup too
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{
    ApiConfig, GatewayConfig, ListenerConfig, LogFormat, ObservabilityConfig, MAX_EXECUTION_SECS,
};
