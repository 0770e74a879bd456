//! Static argument schemas declared by handlers.
//!
//! A schema is a field-descriptor table built once, when the handler is
//! registered, and consulted by name at bind time.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::binding::value::ValueType;

/// Describes one settable field of an arguments object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    name: String,
    value_type: ValueType,
    from_path: bool,
}

impl FieldDescriptor {
    /// A field that path variables and request input may both populate.
    pub fn new(name: impl Into<String>, value_type: ValueType) -> Self {
        Self {
            name: name.into(),
            value_type,
            from_path: true,
        }
    }

    /// Ignore path variables of the same name for this field.
    pub fn not_from_path(mut self) -> Self {
        self.from_path = false;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value_type(&self) -> &ValueType {
        &self.value_type
    }

    pub fn from_path(&self) -> bool {
        self.from_path
    }

    pub fn settable_from_string(&self) -> bool {
        self.value_type.settable_from_string()
    }
}

/// Ordered set of field descriptors with a name index.
#[derive(Debug, Clone, Default)]
pub struct ArgsSchema {
    type_name: String,
    fields: Vec<FieldDescriptor>,
    index: HashMap<String, usize>,
}

impl ArgsSchema {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            fields: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Add a field of the given type. Redeclaring a name replaces it in place.
    pub fn with_field(self, name: impl Into<String>, value_type: ValueType) -> Self {
        self.with_descriptor(FieldDescriptor::new(name, value_type))
    }

    pub fn with_descriptor(mut self, descriptor: FieldDescriptor) -> Self {
        match self.index.get(descriptor.name()) {
            Some(&slot) => self.fields[slot] = descriptor,
            None => {
                self.index.insert(descriptor.name().to_string(), self.fields.len());
                self.fields.push(descriptor);
            }
        }
        self
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.index.get(name).map(|&slot| &self.fields[slot])
    }

    /// Fields in declaration order.
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }
}

/// Bundle name → schema of that bundle's nested arguments.
///
/// Query keys of the form `<bundle>.<field>` are routed through this table.
#[derive(Debug, Clone, Default)]
pub struct AdditionalArgsSchema {
    bundles: BTreeMap<String, Arc<ArgsSchema>>,
}

impl AdditionalArgsSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bundle(mut self, name: impl Into<String>, schema: ArgsSchema) -> Self {
        self.bundles.insert(name.into(), Arc::new(schema));
        self
    }

    pub fn get(&self, name: &str) -> Option<&Arc<ArgsSchema>> {
        self.bundles.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.bundles.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.bundles.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fields_keep_declaration_order() {
        let schema = ArgsSchema::new("ApiListArgs")
            .with_field("offset", ValueType::Integer)
            .with_field("count", ValueType::Integer)
            .with_field("filter", ValueType::String);

        let names: Vec<_> = schema.fields().iter().map(FieldDescriptor::name).collect();
        assert_eq!(names, ["offset", "count", "filter"]);
        assert_eq!(schema.field("count").unwrap().value_type(), &ValueType::Integer);
        assert!(schema.field("missing").is_none());
    }

    #[test]
    fn test_redeclaring_replaces() {
        let schema = ArgsSchema::new("Args")
            .with_field("id", ValueType::Integer)
            .with_descriptor(FieldDescriptor::new("id", ValueType::String).not_from_path());

        assert_eq!(schema.fields().len(), 1);
        let id = schema.field("id").unwrap();
        assert_eq!(id.value_type(), &ValueType::String);
        assert!(!id.from_path());
    }

    #[test]
    fn test_additional_args_lookup() {
        let extra = AdditionalArgsSchema::new().with_bundle(
            "extra",
            ArgsSchema::new("ExtraArgs").with_field("field1", ValueType::String),
        );

        assert!(!extra.is_empty());
        assert_eq!(extra.get("extra").unwrap().type_name(), "ExtraArgs");
        assert!(extra.get("unknown").is_none());
        assert_eq!(extra.names().collect::<Vec<_>>(), ["extra"]);
    }
}
