//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Upper bound for `api.default_max_execution_secs` (one year).
pub const MAX_EXECUTION_SECS: u64 = 365 * 24 * 60 * 60;

/// Root configuration for the API gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address, body limits).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Dispatch settings: token derivation and debug toggles.
    pub api: ApiConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8000").
    pub bind_address: String,

    /// Maximum request body size in bytes (JSON and multipart alike).
    pub max_body_size: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8000".to_string(),
            max_body_size: 8 * 1024 * 1024, // 8MB
        }
    }
}

/// Timeout configuration for the transport.
///
/// Handlers are never cancelled; only body collection is bounded.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Time allowed to receive a POST body, in seconds.
    pub body_read_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { body_read_secs: 60 }
    }
}

/// Settings consumed by the token factory and the dispatcher.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Label stamped on every token as the originating process.
    pub process_label: String,

    /// Header carrying the (URL-encoded) justification reason on POST.
    pub reason_header: String,

    /// Query parameter carrying the justification reason on GET.
    pub reason_query_param: String,

    /// Header set by a fronting authenticating proxy with the username.
    pub identity_header: Option<String>,

    /// Header toggling type-info stripping of successful payloads.
    pub strip_type_info_header: String,

    /// Expiry horizon for handlers that do not declare their own.
    /// At most [`MAX_EXECUTION_SECS`].
    pub default_max_execution_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            process_label: "ApiGateway".to_string(),
            reason_header: "x-api-reason".to_string(),
            reason_query_param: "reason".to_string(),
            identity_header: None,
            strip_type_info_header: "x-strip-type-info".to_string(),
            default_max_execution_secs: 20,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines for development.
    #[default]
    Pretty,
    /// One JSON object per event, for log aggregation.
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GatewayConfig::default();
        assert_eq!(config.api.reason_header, "x-api-reason");
        assert_eq!(config.api.reason_query_param, "reason");
        assert_eq!(config.api.default_max_execution_secs, 20);
        assert!(config.api.identity_header.is_none());
        assert!(!config.observability.metrics_enabled);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: GatewayConfig = toml::from_str(
            r#"
            [api]
            process_label = "AdminUI"
            identity_header = "x-remote-user"

            [observability]
            log_format = "json"
            "#,
        )
        .unwrap();

        assert_eq!(config.api.process_label, "AdminUI");
        assert_eq!(config.api.identity_header.as_deref(), Some("x-remote-user"));
        assert_eq!(config.api.reason_header, "x-api-reason");
        assert_eq!(config.observability.log_format, LogFormat::Json);
        assert_eq!(config.listener.bind_address, "0.0.0.0:8000");
    }
}
