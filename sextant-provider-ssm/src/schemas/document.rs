//! ssm_document schema

use std::collections::HashMap;

use sextant_core::resource::Value;
use sextant_core::schema::{AttributeSchema, AttributeType, ResourceSchema, types};

use crate::types as ssm_types;

pub const RESOURCE_TYPE: &str = "ssm_document";

pub fn schema() -> ResourceSchema {
    ResourceSchema::new(RESOURCE_TYPE)
        .with_description("An SSM document (command, automation, session, ...)")
        .attribute(
            AttributeSchema::new("name", ssm_types::ssm_name())
                .required()
                .force_new(),
        )
        .attribute(AttributeSchema::new("content", AttributeType::String).required())
        .attribute(
            AttributeSchema::new("document_format", ssm_types::document_format())
                .with_default(Value::String("JSON".to_string())),
        )
        .attribute(
            AttributeSchema::new("document_type", ssm_types::document_type())
                .required()
                .force_new(),
        )
        .attribute(
            AttributeSchema::new("target_type", AttributeType::String)
                .with_description("Resource type the document runs against, e.g. /AWS::EC2::Instance"),
        )
        .attribute(AttributeSchema::new("version_name", AttributeType::String))
        .attribute(
            AttributeSchema::new(
                "permissions",
                AttributeType::Block(vec![
                    AttributeSchema::new("type", ssm_types::document_permission_type()).required(),
                    AttributeSchema::new("account_ids", AttributeType::String)
                        .required()
                        .with_description("Comma separated account IDs, or All"),
                ]),
            )
            .with_description("Share the document with other accounts"),
        )
        .attribute(AttributeSchema::new("tags", types::tags()))
        .attribute(AttributeSchema::new("arn", AttributeType::String).computed())
        .attribute(AttributeSchema::new("created_date", AttributeType::String).computed())
        .attribute(AttributeSchema::new("default_version", AttributeType::String).computed())
        .attribute(AttributeSchema::new("latest_version", AttributeType::String).computed())
        .attribute(AttributeSchema::new("document_version", AttributeType::String).computed())
        .attribute(AttributeSchema::new("description", AttributeType::String).computed())
        .attribute(AttributeSchema::new("hash", AttributeType::String).computed())
        .attribute(AttributeSchema::new("hash_type", AttributeType::String).computed())
        .attribute(AttributeSchema::new("owner", AttributeType::String).computed())
        .attribute(AttributeSchema::new("status", AttributeType::String).computed())
        .attribute(AttributeSchema::new("schema_version", AttributeType::String).computed())
        .attribute(AttributeSchema::new("platform_types", types::string_list()).computed())
        .with_validator(validate_document)
}

/// JSON documents must carry parseable content
fn validate_document(attributes: &HashMap<String, Value>) -> Result<(), String> {
    let format = attributes
        .get("document_format")
        .and_then(Value::as_str)
        .unwrap_or("JSON");

    if format == "JSON"
        && let Some(content) = attributes.get("content").and_then(Value::as_str)
        && let Err(e) = serde_json::from_str::<serde_json::Value>(content)
    {
        return Err(format!("content is not valid JSON: {}", e));
    }

    Ok(())
}

/// Account IDs from the `permissions.account_ids` comma list
pub fn permission_account_ids(permissions: Option<&Value>) -> Vec<String> {
    permissions
        .and_then(Value::as_map)
        .and_then(|p| p.get("account_ids"))
        .and_then(Value::as_str)
        .map(|ids| {
            ids.split(',')
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}
