//! Token echo, for debugging authorization context.

use serde_json::Value;

use crate::binding::ArgsObject;
use crate::dispatch::handler::{ApiHandler, HandlerError};
use crate::handlers::tagged;
use crate::security::Token;

/// `GET /api/users/me/token`
#[derive(Debug, Clone, Copy, Default)]
pub struct GetTokenHandler;

impl ApiHandler for GetTokenHandler {
    fn name(&self) -> &'static str {
        "GetToken"
    }

    fn handle(&self, _args: Option<ArgsObject>, token: &Token) -> Result<Value, HandlerError> {
        Ok(tagged("ApiToken", token.to_json()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::response::strip_type_info;
    use std::time::{Duration, UNIX_EPOCH};

    #[test]
    fn test_echoes_token() {
        let token = Token {
            username: Some("alice".into()),
            reason: "ticket 7".into(),
            process: "ApiGateway".into(),
            expiry: UNIX_EPOCH + Duration::from_secs(1_700_000_000),
            source_ips: vec!["10.0.0.1".into(), "203.0.113.9".into()],
        };
        let payload = strip_type_info(GetTokenHandler.handle(None, &token).unwrap());
        assert_eq!(payload["username"], "alice");
        assert_eq!(payload["reason"], "ticket 7");
        assert_eq!(payload["expiry"], 1_700_000_000u64);
        assert_eq!(payload["source_ips"], serde_json::json!(["10.0.0.1", "203.0.113.9"]));
    }
}
