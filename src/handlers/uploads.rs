//! Multipart upload intake.

use std::time::Duration;

use serde_json::{json, Value};

use crate::binding::{ArgsObject, ArgsSchema, FieldDescriptor, ValueType};
use crate::dispatch::handler::{ApiHandler, HandlerError};
use crate::handlers::tagged;
use crate::security::Token;

/// `POST /api/uploads/{*path}`: accepts one file and reports what was bound.
///
/// The file arrives as a multipart part named `file`; the remaining arguments
/// travel in the `_params_` JSON part.
#[derive(Debug, Clone, Copy, Default)]
pub struct UploadHandler;

impl ApiHandler for UploadHandler {
    fn name(&self) -> &'static str {
        "Upload"
    }

    fn args_schema(&self) -> Option<ArgsSchema> {
        Some(
            ArgsSchema::new("ApiUploadArgs")
                .with_field("path", ValueType::String)
                .with_descriptor(
                    FieldDescriptor::new("description", ValueType::String).not_from_path(),
                )
                .with_descriptor(FieldDescriptor::new("file", ValueType::Bytes).not_from_path())
                .with_descriptor(
                    FieldDescriptor::new("overwrite", ValueType::Bool).not_from_path(),
                ),
        )
    }

    fn max_execution_time(&self) -> Option<Duration> {
        Some(Duration::from_secs(300))
    }

    fn handle(&self, args: Option<ArgsObject>, token: &Token) -> Result<Value, HandlerError> {
        let args = args.ok_or_else(|| HandlerError::failed("upload arguments are required"))?;
        let path = args
            .get_str("path")
            .ok_or_else(|| HandlerError::failed("upload path is required"))?;
        let file = args
            .get_bytes("file")
            .ok_or_else(|| HandlerError::failed("no file was uploaded"))?;

        tracing::info!(
            path = %path,
            size = file.len(),
            username = ?token.username,
            "Upload received"
        );

        Ok(tagged(
            "ApiUploadResult",
            json!({
                "path": tagged("str", path),
                "size": tagged("int", file.len()),
                "description": args.get_str("description").map(|d| tagged("str", d)),
                "overwrite": tagged("bool", args.get_bool("overwrite").unwrap_or(false)),
            }),
        ))
    }
}
