//! Handler collaborator interface and the descriptor built from it.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::binding::{AdditionalArgsSchema, ArgsObject, ArgsSchema};
use crate::security::{AccessDenied, Token};

/// Failure raised by a handler's business logic.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// An access checker refused the call.
    #[error("{message}")]
    AccessDenied { message: String, subject: String },

    /// Anything else; the text is shown to the client.
    #[error("{0}")]
    Failed(String),
}

impl HandlerError {
    pub fn failed(message: impl fmt::Display) -> Self {
        Self::Failed(message.to_string())
    }
}

impl From<AccessDenied> for HandlerError {
    fn from(denied: AccessDenied) -> Self {
        Self::AccessDenied {
            message: denied.message,
            subject: denied.subject,
        }
    }
}

/// A typed API call reachable through the gateway.
///
/// Implementations declare their argument schema once; the registry snapshots
/// it at registration time.
pub trait ApiHandler: Send + Sync {
    /// Name used in logs and metrics.
    fn name(&self) -> &'static str;

    /// Schema of the arguments object, or `None` to receive no arguments.
    fn args_schema(&self) -> Option<ArgsSchema> {
        None
    }

    /// Bundles reachable through `<bundle>.<field>` query keys.
    fn additional_args_schema(&self) -> AdditionalArgsSchema {
        AdditionalArgsSchema::default()
    }

    /// Overrides the configured default token lifetime.
    fn max_execution_time(&self) -> Option<Duration> {
        None
    }

    fn handle(
        &self,
        args: Option<ArgsObject>,
        token: &Token,
    ) -> Result<serde_json::Value, HandlerError>;
}

/// Immutable schema and execution policy of a registered handler.
#[derive(Clone)]
pub struct HandlerDescriptor {
    name: &'static str,
    args_schema: Option<Arc<ArgsSchema>>,
    additional_args_schema: Arc<AdditionalArgsSchema>,
    max_execution_time: Duration,
    handler: Arc<dyn ApiHandler>,
}

impl HandlerDescriptor {
    pub fn new(handler: Arc<dyn ApiHandler>, default_max_execution_time: Duration) -> Self {
        Self {
            name: handler.name(),
            args_schema: handler.args_schema().map(Arc::new),
            additional_args_schema: Arc::new(handler.additional_args_schema()),
            max_execution_time: handler
                .max_execution_time()
                .unwrap_or(default_max_execution_time),
            handler,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn args_schema(&self) -> Option<&Arc<ArgsSchema>> {
        self.args_schema.as_ref()
    }

    pub fn additional_args_schema(&self) -> &AdditionalArgsSchema {
        &self.additional_args_schema
    }

    pub fn max_execution_time(&self) -> Duration {
        self.max_execution_time
    }

    pub fn invoke(
        &self,
        args: Option<ArgsObject>,
        token: &Token,
    ) -> Result<serde_json::Value, HandlerError> {
        self.handler.handle(args, token)
    }
}

impl fmt::Debug for HandlerDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerDescriptor")
            .field("name", &self.name)
            .field("args_schema", &self.args_schema.as_ref().map(|s| s.type_name()))
            .field(
                "additional_args",
                &self.additional_args_schema.names().collect::<Vec<_>>(),
            )
            .field("max_execution_time", &self.max_execution_time)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::ValueType;
    use crate::security::ReasonRequired;
    use crate::security::AccessChecker;
    use std::time::SystemTime;

    struct SlowHandler;

    impl ApiHandler for SlowHandler {
        fn name(&self) -> &'static str {
            "SlowHandler"
        }

        fn args_schema(&self) -> Option<ArgsSchema> {
            Some(ArgsSchema::new("SlowArgs").with_field("id", ValueType::Integer))
        }

        fn max_execution_time(&self) -> Option<Duration> {
            Some(Duration::from_secs(300))
        }

        fn handle(
            &self,
            _args: Option<ArgsObject>,
            token: &Token,
        ) -> Result<serde_json::Value, HandlerError> {
            ReasonRequired.check(token, "slow")?;
            Ok(serde_json::Value::Null)
        }
    }

    #[test]
    fn test_descriptor_snapshots_handler() {
        let descriptor = HandlerDescriptor::new(Arc::new(SlowHandler), Duration::from_secs(20));
        assert_eq!(descriptor.name(), "SlowHandler");
        assert_eq!(descriptor.max_execution_time(), Duration::from_secs(300));
        assert_eq!(descriptor.args_schema().unwrap().type_name(), "SlowArgs");
        assert!(descriptor.additional_args_schema().is_empty());
    }

    #[test]
    fn test_access_denied_converts() {
        let descriptor = HandlerDescriptor::new(Arc::new(SlowHandler), Duration::from_secs(20));
        let token = Token {
            username: None,
            reason: String::new(),
            process: "test".into(),
            expiry: SystemTime::now() + Duration::from_secs(5),
            source_ips: Vec::new(),
        };

        match descriptor.invoke(None, &token) {
            Err(HandlerError::AccessDenied { subject, .. }) => assert_eq!(subject, "slow"),
            other => panic!("expected access denied, got {:?}", other),
        }
    }
}
