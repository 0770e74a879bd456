//! Per-request authorization context.
//!
//! # Responsibilities
//! - Assemble identity, justification reason, process label, expiry and
//!   source addresses into a `Token`
//!
//! # Design Decisions
//! - No authorization decision is made here; checkers consume the token
//! - Absent inputs are omitted, never errors
//! - The reason is opaque text: only percent-decoded, never validated
//! - Expiry saturates instead of overflowing for oversized horizons

use std::net::SocketAddr;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use axum::http::HeaderMap;
use serde_json::json;

use crate::config::{ApiConfig, MAX_EXECUTION_SECS};
use crate::http::request::{HttpMethod, QueryParams};

const X_FORWARDED_FOR: &str = "x-forwarded-for";

/// Authorization context handed to handlers and access checkers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// Authenticated username, when a fronting proxy supplied one.
    pub username: Option<String>,
    /// Caller-supplied justification.
    pub reason: String,
    /// Label of the process that issued the token.
    pub process: String,
    /// Point after which access checkers should refuse the token.
    pub expiry: SystemTime,
    /// Direct peer first, then any forwarded-for chain.
    pub source_ips: Vec<String>,
}

impl Token {
    pub fn is_expired(&self) -> bool {
        SystemTime::now() >= self.expiry
    }

    /// Expiry as whole seconds since the Unix epoch.
    pub fn expiry_unix_secs(&self) -> u64 {
        self.expiry
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs()
    }

    pub fn to_json(&self) -> serde_json::Value {
        json!({
            "username": self.username,
            "reason": self.reason,
            "process": self.process,
            "expiry": self.expiry_unix_secs(),
            "source_ips": self.source_ips,
        })
    }
}

/// Derives tokens from request metadata.
#[derive(Debug, Clone)]
pub struct TokenFactory {
    process_label: String,
    reason_header: String,
    reason_query_param: String,
    identity_header: Option<String>,
}

impl TokenFactory {
    pub fn new(config: &ApiConfig) -> Self {
        Self {
            process_label: config.process_label.clone(),
            reason_header: config.reason_header.to_ascii_lowercase(),
            reason_query_param: config.reason_query_param.clone(),
            identity_header: config.identity_header.as_ref().map(|h| h.to_ascii_lowercase()),
        }
    }

    /// Build the token for one request.
    ///
    /// GET requests carry the reason as a query parameter; POST requests
    /// carry it URL-encoded in a header.
    pub fn derive(
        &self,
        method: HttpMethod,
        headers: &HeaderMap,
        query: &QueryParams,
        remote_addr: Option<SocketAddr>,
        max_execution_time: Duration,
    ) -> Token {
        let reason = match method {
            HttpMethod::Get => query.get(&self.reason_query_param).unwrap_or_default().to_string(),
            HttpMethod::Post => headers
                .get(self.reason_header.as_str())
                .map(|raw| {
                    let decoded = urlencoding::decode_binary(raw.as_bytes());
                    String::from_utf8_lossy(&decoded).into_owned()
                })
                .unwrap_or_default(),
        };

        let username = self
            .identity_header
            .as_deref()
            .and_then(|name| headers.get(name))
            .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
            .filter(|user| !user.is_empty());

        let mut source_ips = Vec::new();
        if let Some(addr) = remote_addr {
            source_ips.push(addr.ip().to_string());
        }
        if let Some(forwarded) = forwarded_for(headers) {
            source_ips.push(forwarded);
        }

        Token {
            username,
            reason,
            process: self.process_label.clone(),
            expiry: expiry_after(SystemTime::now(), max_execution_time),
            source_ips,
        }
    }
}

/// Every `X-Forwarded-For` header, in arrival order, as one chain.
fn forwarded_for(headers: &HeaderMap) -> Option<String> {
    let chain = headers
        .get_all(X_FORWARDED_FOR)
        .iter()
        .map(|v| String::from_utf8_lossy(v.as_bytes()).trim().to_string())
        .filter(|v| !v.is_empty())
        .collect::<Vec<_>>();
    (!chain.is_empty()).then(|| chain.join(", "))
}

fn expiry_after(now: SystemTime, horizon: Duration) -> SystemTime {
    now.checked_add(horizon)
        .or_else(|| now.checked_add(Duration::from_secs(MAX_EXECUTION_SECS)))
        .unwrap_or(now)
}
