//! Typed HTTP-to-RPC API gateway library.

pub mod binding;
pub mod config;
pub mod dispatch;
pub mod handlers;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;
pub mod security;

pub use config::schema::GatewayConfig;
pub use dispatch::Dispatcher;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
