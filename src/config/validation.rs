//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, body limit > 0, bounded expiry)
//! - Validate addresses and header names before the server binds
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use axum::http::HeaderName;
use thiserror::Error;

use crate::config::schema::{GatewayConfig, MAX_EXECUTION_SECS};

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field}: invalid socket address '{value}'")]
    InvalidAddress { field: &'static str, value: String },

    #[error("{field}: must be greater than zero")]
    Zero { field: &'static str },

    #[error("{field}: invalid header name '{value}'")]
    InvalidHeader { field: &'static str, value: String },

    #[error("{field}: must not be empty")]
    Empty { field: &'static str },

    #[error("{field}: {value} exceeds the maximum of {max}")]
    TooLarge {
        field: &'static str,
        value: u64,
        max: u64,
    },
}

/// Check a configuration, collecting every problem found.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_address(&mut errors, "listener.bind_address", &config.listener.bind_address);
    if config.observability.metrics_enabled {
        check_address(
            &mut errors,
            "observability.metrics_address",
            &config.observability.metrics_address,
        );
    }

    if config.listener.max_body_size == 0 {
        errors.push(ValidationError::Zero { field: "listener.max_body_size" });
    }
    if config.timeouts.body_read_secs == 0 {
        errors.push(ValidationError::Zero { field: "timeouts.body_read_secs" });
    }
    match config.api.default_max_execution_secs {
        0 => errors.push(ValidationError::Zero { field: "api.default_max_execution_secs" }),
        secs if secs > MAX_EXECUTION_SECS => errors.push(ValidationError::TooLarge {
            field: "api.default_max_execution_secs",
            value: secs,
            max: MAX_EXECUTION_SECS,
        }),
        _ => {}
    }

    check_header(&mut errors, "api.reason_header", &config.api.reason_header);
    check_header(&mut errors, "api.strip_type_info_header", &config.api.strip_type_info_header);
    if let Some(identity) = &config.api.identity_header {
        check_header(&mut errors, "api.identity_header", identity);
    }

    if config.api.reason_query_param.is_empty() {
        errors.push(ValidationError::Empty { field: "api.reason_query_param" });
    }
    if config.api.process_label.is_empty() {
        errors.push(ValidationError::Empty { field: "api.process_label" });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_address(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field,
            value: value.to_string(),
        });
    }
}

fn check_header(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if HeaderName::from_bytes(value.as_bytes()).is_err() {
        errors.push(ValidationError::InvalidHeader {
            field,
            value: value.to_string(),
        });
    }
}
