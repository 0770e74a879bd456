//! Builds typed arguments objects from request input.
//!
//! # Resolution Order
//! - GET: path variable, then query parameter, per declared field; then
//!   `<bundle>.<field>` query keys into additional-args bundles
//! - POST: path variables, then the body (`multipart/form-data` with a
//!   `_params_` JSON part plus raw file parts, or a plain JSON object)

use std::sync::Arc;

use serde_json::Value as Json;

use crate::binding::args::{AdditionalArgsBundle, ArgsObject};
use crate::binding::schema::{AdditionalArgsSchema, ArgsSchema};
use crate::binding::BindError;
use crate::dispatch::handler::HandlerDescriptor;
use crate::http::request::{FormPart, HttpMethod, QueryParams, RequestBody};
use crate::routing::PathVars;

/// Multipart part holding the JSON-encoded arguments.
pub const PARAMS_FIELD: &str = "_params_";

/// Bind request input to the descriptor's argument schema.
///
/// Returns `Ok(None)` when the handler declares no arguments.
pub fn bind(
    descriptor: &HandlerDescriptor,
    method: HttpMethod,
    path_vars: &PathVars,
    query: &QueryParams,
    body: &RequestBody,
) -> Result<Option<ArgsObject>, BindError> {
    let Some(schema) = descriptor.args_schema() else {
        return Ok(None);
    };

    let mut args = ArgsObject::new(Arc::clone(schema));
    match method {
        HttpMethod::Get => {
            bind_fields(&mut args, schema, path_vars, Some(query))?;
            let extra = descriptor.additional_args_schema();
            if !extra.is_empty() {
                args.set_additional_args(fill_additional_args(query, extra)?);
            }
        }
        HttpMethod::Post => {
            bind_fields(&mut args, schema, path_vars, None)?;
            bind_body(&mut args, body)?;
        }
    }
    Ok(Some(args))
}

fn bind_fields(
    args: &mut ArgsObject,
    schema: &ArgsSchema,
    path_vars: &PathVars,
    query: Option<&QueryParams>,
) -> Result<(), BindError> {
    for field in schema.fields() {
        let from_path = field
            .from_path()
            .then(|| path_vars.get(field.name()).map(String::as_str))
            .flatten();
        let raw = from_path.or_else(|| query.and_then(|q| q.get(field.name())));
        if let Some(raw) = raw {
            args.set_from_str(field.name(), raw)?;
        }
    }
    Ok(())
}

/// Route `<bundle>.<field>` query keys into their bundles, creating each
/// bundle on first use. Keys naming an undeclared bundle are dropped.
fn fill_additional_args(
    query: &QueryParams,
    extra: &AdditionalArgsSchema,
) -> Result<Vec<AdditionalArgsBundle>, BindError> {
    let mut bundles: Vec<AdditionalArgsBundle> = Vec::new();

    for (key, value) in query.iter() {
        let Some((bundle_name, field)) = key.split_once('.') else {
            continue;
        };
        let Some(schema) = extra.get(bundle_name) else {
            continue;
        };

        let slot = match bundles.iter().position(|b| b.name == bundle_name) {
            Some(slot) => slot,
            None => {
                bundles.push(AdditionalArgsBundle {
                    name: bundle_name.to_string(),
                    type_name: schema.type_name().to_string(),
                    args: ArgsObject::new(Arc::clone(schema)),
                });
                bundles.len() - 1
            }
        };
        bundles[slot].args.set_from_str(field, value)?;
    }

    Ok(bundles)
}

fn bind_body(args: &mut ArgsObject, body: &RequestBody) -> Result<(), BindError> {
    match body {
        RequestBody::Empty => Ok(()),
        RequestBody::Raw(bytes) => {
            if bytes.iter().all(u8::is_ascii_whitespace) {
                return Ok(());
            }
            let payload: Json = serde_json::from_slice(bytes)?;
            apply_mapping(args, &payload)
        }
        RequestBody::Multipart(parts) => bind_multipart(args, parts),
    }
}

fn bind_multipart(args: &mut ArgsObject, parts: &[FormPart]) -> Result<(), BindError> {
    let params = parts
        .iter()
        .find(|part| part.name == PARAMS_FIELD)
        .ok_or(BindError::MissingParams)?;
    let payload: Json = serde_json::from_slice(&params.data)?;
    apply_mapping(args, &payload)?;

    for part in parts.iter().filter(|part| part.name != PARAMS_FIELD) {
        args.set_from_bytes(&part.name, part.data.to_vec())?;
    }
    Ok(())
}

/// `null` and `{}` mean "no additional fields".
fn apply_mapping(args: &mut ArgsObject, payload: &Json) -> Result<(), BindError> {
    match payload {
        Json::Null => Ok(()),
        Json::Object(mapping) => args.update_from_json(mapping),
        Json::Array(_) => Err(BindError::NotAnObject("an array")),
        Json::String(_) => Err(BindError::NotAnObject("a string")),
        Json::Number(_) => Err(BindError::NotAnObject("a number")),
        Json::Bool(_) => Err(BindError::NotAnObject("a boolean")),
    }
}
