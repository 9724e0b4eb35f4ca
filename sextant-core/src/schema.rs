//! Schema - Define type schemas for resources and data sources
//!
//! Providers define a schema for each resource type. The schema drives
//! configuration validation, the differ (force-new and computed attributes)
//! and the schema-guided expansion of flat state records.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use crate::resource::Value;

/// Validation hook for a custom attribute type.
/// Receives the attribute key and the value being checked.
pub type ValidateFn = fn(&str, &Value) -> Result<(), String>;

/// Validation hook over a whole resource block
pub type ResourceValidateFn = fn(&HashMap<String, Value>) -> Result<(), String>;

/// Attribute type
#[derive(Debug, Clone)]
pub enum AttributeType {
    /// String
    String,
    /// Integer
    Int,
    /// Boolean
    Bool,
    /// Enum (list of allowed values)
    Enum(Vec<String>),
    /// Custom type (with validation function)
    Custom {
        name: String,
        base: Box<AttributeType>,
        validate: ValidateFn,
    },
    /// List
    List(Box<AttributeType>),
    /// Map with string keys
    Map(Box<AttributeType>),
    /// Nested block with its own attributes (e.g. one entry of `targets`)
    Block(Vec<AttributeSchema>),
}

impl AttributeType {
    /// Check if a value conforms to this type. `key` is the attribute path
    /// used in error messages.
    pub fn validate(&self, key: &str, value: &Value) -> Result<(), TypeError> {
        match (self, value) {
            (AttributeType::String, Value::String(_)) => Ok(()),
            (AttributeType::Int, Value::Int(_)) => Ok(()),
            (AttributeType::Bool, Value::Bool(_)) => Ok(()),

            (AttributeType::Enum(variants), Value::String(s)) => {
                if variants.iter().any(|v| v == s) {
                    Ok(())
                } else {
                    Err(TypeError::InvalidEnumVariant {
                        name: key.to_string(),
                        value: s.clone(),
                        expected: variants.clone(),
                    })
                }
            }

            (AttributeType::Custom { validate, base, .. }, v) => {
                base.validate(key, v)?;
                validate(key, v).map_err(|message| TypeError::ValidationFailed { message })
            }

            (AttributeType::List(inner), Value::List(items)) => {
                for (i, item) in items.iter().enumerate() {
                    inner
                        .validate(&format!("{}.{}", key, i), item)
                        .map_err(|e| TypeError::ListItemError {
                            index: i,
                            inner: Box::new(e),
                        })?;
                }
                Ok(())
            }

            (AttributeType::Map(inner), Value::Map(map)) => {
                for (k, v) in map {
                    inner
                        .validate(&format!("{}.{}", key, k), v)
                        .map_err(|e| TypeError::MapValueError {
                            key: k.clone(),
                            inner: Box::new(e),
                        })?;
                }
                Ok(())
            }

            (AttributeType::Block(fields), Value::Map(map)) => {
                for field in fields {
                    if field.required && !map.contains_key(&field.name) {
                        return Err(TypeError::MissingRequired {
                            name: format!("{}.{}", key, field.name),
                        });
                    }
                }
                for (k, v) in map {
                    let path = format!("{}.{}", key, k);
                    match fields.iter().find(|f| &f.name == k) {
                        Some(field) => field.attr_type.validate(&path, v)?,
                        None => return Err(TypeError::UnknownAttribute { name: path }),
                    }
                }
                Ok(())
            }

            _ => Err(TypeError::TypeMismatch {
                name: key.to_string(),
                expected: self.type_name(),
                got: value.type_name(),
            }),
        }
    }

    pub fn type_name(&self) -> String {
        match self {
            AttributeType::String => "String".to_string(),
            AttributeType::Int => "Int".to_string(),
            AttributeType::Bool => "Bool".to_string(),
            AttributeType::Enum(variants) => format!("Enum({})", variants.join(" | ")),
            AttributeType::Custom { name, .. } => name.clone(),
            AttributeType::List(inner) => format!("List<{}>", inner.type_name()),
            AttributeType::Map(inner) => format!("Map<{}>", inner.type_name()),
            AttributeType::Block(fields) => {
                let names: Vec<&str> = fields.iter().map(|f| f.name.as_str()).collect();
                format!("Block{{{}}}", names.join(", "))
            }
        }
    }

    /// The type a custom type is built on, or the type itself
    pub fn base(&self) -> &AttributeType {
        match self {
            AttributeType::Custom { base, .. } => base.base(),
            other => other,
        }
    }
}

impl fmt::Display for AttributeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.type_name())
    }
}

/// Type error
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TypeError {
    #[error("Type mismatch for '{name}': expected {expected}, got {got}")]
    TypeMismatch {
        name: String,
        expected: String,
        got: String,
    },

    #[error("Invalid value '{value}' for '{name}', expected one of: {}", expected.join(", "))]
    InvalidEnumVariant {
        name: String,
        value: String,
        expected: Vec<String>,
    },

    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },

    #[error("Required attribute '{name}' is missing")]
    MissingRequired { name: String },

    #[error("Unknown attribute '{name}'")]
    UnknownAttribute { name: String },

    #[error("'{name}' conflicts with '{other}'")]
    Conflict { name: String, other: String },

    #[error("Exactly one of {} must be set", names.join(", "))]
    ExactlyOneOf { names: Vec<String> },

    #[error("invalid configuration: {message}")]
    InvalidConfiguration { message: String },

    #[error("List item at index {index}: {inner}")]
    ListItemError { index: usize, inner: Box<TypeError> },

    #[error("Map value for key '{key}': {inner}")]
    MapValueError { key: String, inner: Box<TypeError> },
}

impl Value {
    fn type_name(&self) -> String {
        match self {
            Value::String(_) => "String".to_string(),
            Value::Int(_) => "Int".to_string(),
            Value::Bool(_) => "Bool".to_string(),
            Value::List(_) => "List".to_string(),
            Value::Map(_) => "Map".to_string(),
        }
    }
}

/// Attribute schema
#[derive(Debug, Clone)]
pub struct AttributeSchema {
    pub name: String,
    pub attr_type: AttributeType,
    pub required: bool,
    /// Set by the provider; may also be configured unless the attribute is required
    pub computed: bool,
    /// Value must not be printed
    pub sensitive: bool,
    /// Changing this attribute replaces the resource
    pub force_new: bool,
    pub default: Option<Value>,
    pub description: Option<String>,
    /// Attributes that may not be set together with this one
    pub conflicts_with: Vec<String>,
}

impl AttributeSchema {
    pub fn new(name: impl Into<String>, attr_type: AttributeType) -> Self {
        Self {
            name: name.into(),
            attr_type,
            required: false,
            computed: false,
            sensitive: false,
            force_new: false,
            default: None,
            description: None,
            conflicts_with: Vec::new(),
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn computed(mut self) -> Self {
        self.computed = true;
        self
    }

    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }

    pub fn force_new(mut self) -> Self {
        self.force_new = true;
        self
    }

    pub fn with_default(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    pub fn conflicts_with(mut self, other: impl Into<String>) -> Self {
        self.conflicts_with.push(other.into());
        self
    }
}

/// Resource or data source schema
#[derive(Debug, Clone)]
pub struct ResourceSchema {
    pub resource_type: String,
    pub attributes: BTreeMap<String, AttributeSchema>,
    pub description: Option<String>,
    /// Version of the persisted state layout
    pub version: u32,
    pub data_source: bool,
    /// Groups of attributes of which exactly one must be set
    pub exactly_one_of: Vec<Vec<String>>,
    pub validator: Option<ResourceValidateFn>,
}

impl ResourceSchema {
    pub fn new(resource_type: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            attributes: BTreeMap::new(),
            description: None,
            version: 0,
            data_source: false,
            exactly_one_of: Vec::new(),
            validator: None,
        }
    }

    pub fn data_source(resource_type: impl Into<String>) -> Self {
        let mut schema = Self::new(resource_type);
        schema.data_source = true;
        schema
    }

    pub fn attribute(mut self, schema: AttributeSchema) -> Self {
        self.attributes.insert(schema.name.clone(), schema);
        self
    }

    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    pub fn with_version(mut self, version: u32) -> Self {
        self.version = version;
        self
    }

    pub fn exactly_one_of(mut self, names: &[&str]) -> Self {
        self.exactly_one_of
            .push(names.iter().map(|n| n.to_string()).collect());
        self
    }

    pub fn with_validator(mut self, validator: ResourceValidateFn) -> Self {
        self.validator = Some(validator);
        self
    }

    /// Names of attributes whose change forces replacement
    pub fn force_new_attributes(&self) -> Vec<&str> {
        self.attributes
            .values()
            .filter(|a| a.force_new)
            .map(|a| a.name.as_str())
            .collect()
    }

    pub fn is_sensitive(&self, name: &str) -> bool {
        self.attributes.get(name).is_some_and(|a| a.sensitive)
    }

    /// Fill in declared defaults for attributes that are not set
    pub fn apply_defaults(&self, attributes: &mut HashMap<String, Value>) {
        for (name, schema) in &self.attributes {
            if let Some(default) = &schema.default
                && !attributes.contains_key(name)
            {
                attributes.insert(name.clone(), default.clone());
            }
        }
    }

    /// Validate resource attributes
    pub fn validate(&self, attributes: &HashMap<String, Value>) -> Result<(), Vec<TypeError>> {
        let mut errors = Vec::new();

        // Check required attributes
        for (name, schema) in &self.attributes {
            if schema.required && !attributes.contains_key(name) && schema.default.is_none() {
                errors.push(TypeError::MissingRequired { name: name.clone() });
            }
        }

        // Type check each attribute
        let mut names: Vec<&String> = attributes.keys().collect();
        names.sort();
        for name in names {
            let value = &attributes[name];
            match self.attributes.get(name) {
                Some(schema) => {
                    if let Err(e) = schema.attr_type.validate(name, value) {
                        errors.push(e);
                    }
                    for other in &schema.conflicts_with {
                        if attributes.contains_key(other) && name < other {
                            errors.push(TypeError::Conflict {
                                name: name.clone(),
                                other: other.clone(),
                            });
                        }
                    }
                }
                None => errors.push(TypeError::UnknownAttribute { name: name.clone() }),
            }
        }

        for group in &self.exactly_one_of {
            let set = group.iter().filter(|n| attributes.contains_key(*n)).count();
            if set != 1 {
                errors.push(TypeError::ExactlyOneOf {
                    names: group.clone(),
                });
            }
        }

        if errors.is_empty()
            && let Some(validator) = self.validator
            && let Err(message) = validator(attributes)
        {
            errors.push(TypeError::InvalidConfiguration { message });
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Helper functions for common types
pub mod types {
    use super::*;

    /// Positive integer type
    pub fn positive_int() -> AttributeType {
        AttributeType::Custom {
            name: "PositiveInt".to_string(),
            base: Box::new(AttributeType::Int),
            validate: |key, value| match value {
                Value::Int(n) if *n > 0 => Ok(()),
                Value::Int(_) => Err(format!("{} must be positive", key)),
                _ => Err(format!("{} must be an integer", key)),
            },
        }
    }

    /// List of strings
    pub fn string_list() -> AttributeType {
        AttributeType::List(Box::new(AttributeType::String))
    }

    /// Resource tags (e.g. `{ "Environment": "production" }`)
    pub fn tags() -> AttributeType {
        AttributeType::Map(Box::new(AttributeType::String))
    }

    /// Enum built from a static list of values
    pub fn enum_of(values: &[&str]) -> AttributeType {
        AttributeType::Enum(values.iter().map(|v| v.to_string()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_string_type() {
        let t = AttributeType::String;
        assert!(t.validate("name", &Value::String("hello".to_string())).is_ok());
        assert!(t.validate("name", &Value::Int(42)).is_err());
    }

    #[test]
    fn validate_enum_type() {
        let t = types::enum_of(&["String", "SecureString"]);
        assert!(t.validate("type", &Value::String("String".to_string())).is_ok());
        let err = t
            .validate("type", &Value::String("Binary".to_string()))
            .unwrap_err();
        assert!(err.to_string().contains("'type'"));
        assert!(err.to_string().contains("String, SecureString"));
    }

    #[test]
    fn validate_positive_int() {
        let t = types::positive_int();
        assert!(t.validate("n", &Value::Int(1)).is_ok());
        assert!(t.validate("n", &Value::Int(0)).is_err());
        assert!(t.validate("n", &Value::Int(-1)).is_err());
        assert!(t.validate("n", &Value::Bool(true)).is_err());
    }

    #[test]
    fn validate_block_fields() {
        let target = AttributeType::Block(vec![
            AttributeSchema::new("key", AttributeType::String).required(),
            AttributeSchema::new("values", types::string_list()).required(),
        ]);
        let list = AttributeType::List(Box::new(target));

        let ok = Value::List(vec![Value::Map(HashMap::from([
            ("key".to_string(), Value::String("InstanceIds".to_string())),
            ("values".to_string(), Value::string_list(["i-1"])),
        ]))]);
        assert!(list.validate("targets", &ok).is_ok());

        let missing = Value::List(vec![Value::Map(HashMap::from([(
            "key".to_string(),
            Value::String("InstanceIds".to_string()),
        )]))]);
        let err = list.validate("targets", &missing).unwrap_err();
        assert!(err.to_string().contains("targets.0.values"));

        let unknown = Value::List(vec![Value::Map(HashMap::from([
            ("key".to_string(), Value::String("k".to_string())),
            ("values".to_string(), Value::string_list(["v"])),
            ("extra".to_string(), Value::Bool(true)),
        ]))]);
        assert!(list.validate("targets", &unknown).is_err());
    }

    #[test]
    fn validate_resource_schema() {
        let schema = ResourceSchema::new("resource")
            .attribute(AttributeSchema::new("name", AttributeType::String).required())
            .attribute(AttributeSchema::new("count", types::positive_int()))
            .attribute(AttributeSchema::new("enabled", AttributeType::Bool));

        let mut attrs = HashMap::new();
        attrs.insert("name".to_string(), Value::String("my-resource".to_string()));
        attrs.insert("count".to_string(), Value::Int(5));
        attrs.insert("enabled".to_string(), Value::Bool(true));

        assert!(schema.validate(&attrs).is_ok());
    }

    #[test]
    fn missing_required_attribute() {
        let schema = ResourceSchema::new("ssm_document")
            .attribute(AttributeSchema::new("name", AttributeType::String).required());

        let result = schema.validate(&HashMap::new());
        assert_eq!(
            result.unwrap_err(),
            vec![TypeError::MissingRequired {
                name: "name".to_string()
            }]
        );
    }

    #[test]
    fn unknown_attribute_is_rejected() {
        let schema = ResourceSchema::new("ssm_document")
            .attribute(AttributeSchema::new("name", AttributeType::String));

        let attrs = HashMap::from([("nmae".to_string(), Value::String("x".to_string()))]);
        let errors = schema.validate(&attrs).unwrap_err();
        assert!(matches!(&errors[0], TypeError::UnknownAttribute { name } if name == "nmae"));
    }

    #[test]
    fn conflicting_and_exactly_one_of() {
        let schema = ResourceSchema::new("ssm_parameter")
            .attribute(AttributeSchema::new("value", AttributeType::String).conflicts_with("insecure_value"))
            .attribute(
                AttributeSchema::new("insecure_value", AttributeType::String)
                    .conflicts_with("value"),
            )
            .exactly_one_of(&["value", "insecure_value"]);

        let both = HashMap::from([
            ("value".to_string(), Value::String("a".to_string())),
            ("insecure_value".to_string(), Value::String("b".to_string())),
        ]);
        let errors = schema.validate(&both).unwrap_err();
        // One conflict (reported once) plus the exactly-one-of violation
        assert_eq!(errors.len(), 2);

        let neither = HashMap::new();
        assert!(matches!(
            schema.validate(&neither).unwrap_err()[0],
            TypeError::ExactlyOneOf { .. }
        ));

        let one = HashMap::from([("value".to_string(), Value::String("a".to_string()))]);
        assert!(schema.validate(&one).is_ok());
    }

    #[test]
    fn resource_validator_runs_after_attribute_checks() {
        let schema = ResourceSchema::new("thing")
            .attribute(AttributeSchema::new("a", AttributeType::String))
            .with_validator(|attrs| {
                if attrs.contains_key("a") {
                    Err("a is not allowed here".to_string())
                } else {
                    Ok(())
                }
            });

        let attrs = HashMap::from([("a".to_string(), Value::String("x".to_string()))]);
        let errors = schema.validate(&attrs).unwrap_err();
        assert_eq!(
            errors[0].to_string(),
            "invalid configuration: a is not allowed here"
        );
    }

    #[test]
    fn defaults_are_applied_only_when_missing() {
        let schema = ResourceSchema::new("ssm_parameter")
            .attribute(
                AttributeSchema::new("tier", AttributeType::String)
                    .with_default(Value::String("Standard".to_string())),
            )
            .attribute(
                AttributeSchema::new("data_type", AttributeType::String)
                    .with_default(Value::String("text".to_string())),
            );

        let mut attrs =
            HashMap::from([("tier".to_string(), Value::String("Advanced".to_string()))]);
        schema.apply_defaults(&mut attrs);

        assert_eq!(attrs["tier"], Value::String("Advanced".to_string()));
        assert_eq!(attrs["data_type"], Value::String("text".to_string()));
    }
}
