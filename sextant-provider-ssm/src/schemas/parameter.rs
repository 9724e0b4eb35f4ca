//! ssm_parameter schema

use std::collections::HashMap;

use sextant_core::resource::Value;
use sextant_core::schema::{AttributeSchema, AttributeType, ResourceSchema, types};

use crate::types as ssm_types;

pub const RESOURCE_TYPE: &str = "ssm_parameter";

pub fn schema() -> ResourceSchema {
    ResourceSchema::new(RESOURCE_TYPE)
        .with_description("A parameter in SSM Parameter Store")
        .attribute(
            AttributeSchema::new("name", ssm_types::parameter_name())
                .required()
                .force_new()
                .with_description("Parameter name, optionally a path such as /app/db/host"),
        )
        .attribute(AttributeSchema::new("type", ssm_types::parameter_type()).required())
        .attribute(
            AttributeSchema::new("value", AttributeType::String)
                .sensitive()
                .conflicts_with("insecure_value"),
        )
        .attribute(
            AttributeSchema::new("insecure_value", AttributeType::String)
                .conflicts_with("value")
                .with_description("Value stored in state in plain text; not for SecureString"),
        )
        .attribute(AttributeSchema::new(
            "description",
            ssm_types::parameter_description(),
        ))
        .attribute(
            AttributeSchema::new("tier", ssm_types::parameter_tier())
                .with_default(Value::String("Standard".to_string())),
        )
        .attribute(
            AttributeSchema::new("key_id", AttributeType::String)
                .with_description("KMS key for SecureString values"),
        )
        .attribute(
            AttributeSchema::new("data_type", ssm_types::parameter_data_type())
                .with_default(Value::String("text".to_string()))
                .force_new(),
        )
        .attribute(AttributeSchema::new("allowed_pattern", AttributeType::String))
        .attribute(
            AttributeSchema::new("overwrite", AttributeType::Bool)
                .with_description("Take over a parameter that already exists"),
        )
        .attribute(AttributeSchema::new("tags", types::tags()))
        .attribute(AttributeSchema::new("arn", AttributeType::String).computed())
        .attribute(AttributeSchema::new("version", AttributeType::Int).computed())
        .exactly_one_of(&["value", "insecure_value"])
        .with_validator(validate_parameter)
}

fn validate_parameter(attributes: &HashMap<String, Value>) -> Result<(), String> {
    let secure = attributes.get("type").and_then(Value::as_str) == Some("SecureString");
    if secure && attributes.contains_key("insecure_value") {
        return Err("insecure_value cannot be used with type SecureString; use value".to_string());
    }
    Ok(())
}

/// Whether PutParameter should overwrite an existing parameter
///
/// An explicit `overwrite` wins. Otherwise only updates of a parameter this
/// configuration already manages overwrite.
pub fn should_update_parameter(is_new: bool, overwrite: Option<bool>) -> bool {
    overwrite.unwrap_or(!is_new)
}
