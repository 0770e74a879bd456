//! Per-request arguments objects.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::{Map, Value as Json};

use crate::binding::schema::{ArgsSchema, FieldDescriptor};
use crate::binding::value::Value;
use crate::binding::BindError;

/// Typed arguments instantiated from a handler's schema.
///
/// Only fields declared by the schema can be set; unset fields are simply
/// absent.
#[derive(Debug, Clone)]
pub struct ArgsObject {
    schema: Arc<ArgsSchema>,
    values: BTreeMap<String, Value>,
    additional_args: Vec<AdditionalArgsBundle>,
}

/// A named bundle of extra arguments routed from `<bundle>.<field>` keys.
#[derive(Debug, Clone)]
pub struct AdditionalArgsBundle {
    pub name: String,
    pub type_name: String,
    pub args: ArgsObject,
}

impl ArgsObject {
    pub fn new(schema: Arc<ArgsSchema>) -> Self {
        Self {
            schema,
            values: BTreeMap::new(),
            additional_args: Vec::new(),
        }
    }

    pub fn type_name(&self) -> &str {
        self.schema.type_name()
    }

    pub fn schema(&self) -> &ArgsSchema {
        &self.schema
    }

    fn descriptor(&self, name: &str) -> Result<&FieldDescriptor, BindError> {
        self.schema.field(name).ok_or_else(|| BindError::UnknownField {
            type_name: self.schema.type_name().to_string(),
            field: name.to_string(),
        })
    }

    /// Set a field from a raw string (path variable, query parameter).
    pub fn set_from_str(&mut self, name: &str, raw: &str) -> Result<(), BindError> {
        let descriptor = self.descriptor(name)?;
        if !descriptor.settable_from_string() {
            return Err(BindError::NotSettableFromString {
                field: name.to_string(),
                value_type: descriptor.value_type().to_string(),
            });
        }
        let value = descriptor
            .value_type()
            .parse_str(raw)
            .map_err(|source| BindError::coercion(name, source))?;
        self.values.insert(name.to_string(), value);
        Ok(())
    }

    /// Set a field from the raw contents of an uploaded part.
    pub fn set_from_bytes(&mut self, name: &str, raw: Vec<u8>) -> Result<(), BindError> {
        let value = self
            .descriptor(name)?
            .value_type()
            .parse_bytes(raw)
            .map_err(|source| BindError::coercion(name, source))?;
        self.values.insert(name.to_string(), value);
        Ok(())
    }

    /// Set every key of a JSON mapping. Unknown keys are rejected; `null`
    /// leaves a field unset.
    pub fn update_from_json(&mut self, mapping: &Map<String, Json>) -> Result<(), BindError> {
        for (name, json) in mapping {
            let descriptor = self.descriptor(name)?;
            if json.is_null() {
                continue;
            }
            let value = descriptor
                .value_type()
                .from_json(json)
                .map_err(|source| BindError::coercion(name, source))?;
            self.values.insert(name.clone(), value);
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn is_set(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    pub fn get_i64(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(Value::as_i64)
    }

    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(Value::as_bool)
    }

    pub fn get_bytes(&self, name: &str) -> Option<&[u8]> {
        self.get(name).and_then(Value::as_bytes)
    }

    /// Number of fields currently set.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Bundles in the order they were first referenced by the request.
    pub fn additional_args(&self) -> &[AdditionalArgsBundle] {
        &self.additional_args
    }

    pub fn additional_args_named(&self, name: &str) -> Option<&AdditionalArgsBundle> {
        self.additional_args.iter().find(|bundle| bundle.name == name)
    }

    pub(crate) fn set_additional_args(&mut self, bundles: Vec<AdditionalArgsBundle>) {
        self.additional_args = bundles;
    }

    /// Set fields as a JSON object; bundles go under `additional_args`.
    pub fn to_json(&self) -> Json {
        let mut object: Map<String, Json> = self
            .values
            .iter()
            .map(|(name, value)| (name.clone(), value.to_json()))
            .collect();

        if !self.additional_args.is_empty() {
            let bundles = self
                .additional_args
                .iter()
                .map(|bundle| {
                    serde_json::json!({
                        "name": bundle.name,
                        "type": bundle.type_name,
                        "args": bundle.args.to_json(),
                    })
                })
                .collect();
            object.insert("additional_args".to_string(), Json::Array(bundles));
        }

        Json::Object(object)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::value::ValueType;
    use serde_json::json;

    fn schema() -> Arc<ArgsSchema> {
        Arc::new(
            ArgsSchema::new("TestArgs")
                .with_field("foo", ValueType::Integer)
                .with_field("bar", ValueType::String)
                .with_field("tags", ValueType::List(Box::new(ValueType::String)))
                .with_field("blob", ValueType::Bytes),
        )
    }

    #[test]
    fn test_set_from_str() {
        let mut args = ArgsObject::new(schema());
        args.set_from_str("foo", "1").unwrap();
        args.set_from_str("bar", "2").unwrap();

        assert_eq!(args.get_i64("foo"), Some(1));
        assert_eq!(args.get_str("bar"), Some("2"));
        assert!(!args.is_set("blob"));
        assert_eq!(args.len(), 2);
    }

    #[test]
    fn test_unknown_field() {
        let mut args = ArgsObject::new(schema());
        let err = args.set_from_str("nope", "1").unwrap_err();
        assert_eq!(err.to_string(), "TestArgs has no field 'nope'");
    }

    #[test]
    fn test_list_field_rejects_string() {
        let mut args = ArgsObject::new(schema());
        assert!(matches!(
            args.set_from_str("tags", "a"),
            Err(BindError::NotSettableFromString { .. })
        ));
    }

    #[test]
    fn test_update_from_json() {
        let mut args = ArgsObject::new(schema());
        let payload = json!({"foo": 5, "tags": ["a", "b"], "bar": null});
        args.update_from_json(payload.as_object().unwrap()).unwrap();

        assert_eq!(args.get_i64("foo"), Some(5));
        assert!(!args.is_set("bar"));
        assert_eq!(args.to_json(), json!({"foo": 5, "tags": ["a", "b"]}));
    }

    #[test]
    fn test_update_from_json_type_mismatch() {
        let mut args = ArgsObject::new(schema());
        let payload = json!({"foo": "five"});
        let err = args.update_from_json(payload.as_object().unwrap()).unwrap_err();
        assert_eq!(err.to_string(), "cannot set field 'foo': expected integer, got 'five'");
    }

    #[test]
    fn test_set_from_bytes() {
        let mut args = ArgsObject::new(schema());
        args.set_from_bytes("blob", vec![1, 2, 3]).unwrap();
        assert_eq!(args.get_bytes("blob"), Some(&[1u8, 2, 3][..]));
    }
}
