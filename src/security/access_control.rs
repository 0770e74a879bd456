//! Access-control collaborator interface.
//!
//! Checkers evaluate a [`Token`] against a subject and either allow the call
//! or raise [`AccessDenied`]. Handlers propagate the denial with `?`; the
//! dispatcher turns it into a 403.

use thiserror::Error;

use crate::security::token::Token;

/// A checker refused access to `subject`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct AccessDenied {
    pub message: String,
    /// Identifier of the resource that denied access.
    pub subject: String,
}

impl AccessDenied {
    pub fn new(message: impl Into<String>, subject: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            subject: subject.into(),
        }
    }
}

/// Decides whether a token may access a subject.
pub trait AccessChecker: Send + Sync {
    fn check(&self, token: &Token, subject: &str) -> Result<(), AccessDenied>;
}

/// Allows unexpired tokens that carry a justification reason.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReasonRequired;

impl AccessChecker for ReasonRequired {
    fn check(&self, token: &Token, subject: &str) -> Result<(), AccessDenied> {
        if token.is_expired() {
            return Err(AccessDenied::new("token expired", subject));
        }
        if token.reason.trim().is_empty() {
            return Err(AccessDenied::new("a reason is required", subject));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, SystemTime};

    fn token(reason: &str, expiry: SystemTime) -> Token {
        Token {
            username: Some("alice".into()),
            reason: reason.into(),
            process: "ApiGateway".into(),
            expiry,
            source_ips: Vec::new(),
        }
    }

    #[test]
    fn test_reason_required() {
        let later = SystemTime::now() + Duration::from_secs(60);
        assert!(ReasonRequired.check(&token("incident 7", later), "config/x").is_ok());

        let denied = ReasonRequired.check(&token("  ", later), "config/x").unwrap_err();
        assert_eq!(denied.subject, "config/x");
        assert_eq!(denied.to_string(), "a reason is required");
    }

    #[test]
    fn test_expired_token_denied() {
        let earlier = SystemTime::now() - Duration::from_secs(1);
        let denied = ReasonRequired.check(&token("why", earlier), "config/x").unwrap_err();
        assert_eq!(denied.message, "token expired");
    }
}
