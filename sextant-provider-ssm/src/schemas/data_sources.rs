//! Data source schemas

use sextant_core::resource::Value;
use sextant_core::schema::{AttributeSchema, AttributeType, ResourceSchema, types};

use super::patch_baseline::{approval_rule_block, patch_filter_block};
use crate::types as ssm_types;

pub const PARAMETER: &str = "ssm_parameter";
pub const PARAMETERS_BY_PATH: &str = "ssm_parameters_by_path";
pub const DOCUMENT: &str = "ssm_document";
pub const PATCH_BASELINE: &str = "ssm_patch_baseline";
pub const INSTANCES: &str = "ssm_instances";

pub fn parameter() -> ResourceSchema {
    ResourceSchema::data_source(PARAMETER)
        .with_description("Look up a single parameter")
        .attribute(AttributeSchema::new("name", ssm_types::parameter_name()).required())
        .attribute(
            AttributeSchema::new("with_decryption", AttributeType::Bool)
                .with_default(Value::Bool(true)),
        )
        .attribute(AttributeSchema::new("arn", AttributeType::String).computed())
        .attribute(AttributeSchema::new("type", AttributeType::String).computed())
        .attribute(
            AttributeSchema::new("value", AttributeType::String)
                .computed()
                .sensitive(),
        )
        .attribute(AttributeSchema::new("insecure_value", AttributeType::String).computed())
        .attribute(AttributeSchema::new("version", AttributeType::Int).computed())
}

pub fn parameters_by_path() -> ResourceSchema {
    ResourceSchema::data_source(PARAMETERS_BY_PATH)
        .with_description("List the parameters below a hierarchy path")
        .attribute(AttributeSchema::new("path", ssm_types::parameter_path()).required())
        .attribute(
            AttributeSchema::new("with_decryption", AttributeType::Bool)
                .with_default(Value::Bool(true)),
        )
        .attribute(
            AttributeSchema::new("recursive", AttributeType::Bool)
                .with_default(Value::Bool(false)),
        )
        .attribute(AttributeSchema::new("arns", types::string_list()).computed())
        .attribute(AttributeSchema::new("names", types::string_list()).computed())
        .attribute(AttributeSchema::new("types", types::string_list()).computed())
        .attribute(
            AttributeSchema::new("values", types::string_list())
                .computed()
                .sensitive(),
        )
}

pub fn document() -> ResourceSchema {
    ResourceSchema::data_source(DOCUMENT)
        .with_description("Fetch the content of an SSM document")
        .attribute(AttributeSchema::new("name", AttributeType::String).required())
        .attribute(
            AttributeSchema::new("document_format", ssm_types::document_format())
                .with_default(Value::String("JSON".to_string())),
        )
        .attribute(AttributeSchema::new("document_version", AttributeType::String))
        .attribute(AttributeSchema::new("arn", AttributeType::String).computed())
        .attribute(AttributeSchema::new("content", AttributeType::String).computed())
        .attribute(AttributeSchema::new("document_type", AttributeType::String).computed())
}

pub fn patch_baseline() -> ResourceSchema {
    ResourceSchema::data_source(PATCH_BASELINE)
        .with_description("Find exactly one patch baseline by owner and name")
        .attribute(
            AttributeSchema::new("owner", AttributeType::String)
                .required()
                .with_description("Self, AWS or All"),
        )
        .attribute(AttributeSchema::new("name_prefix", AttributeType::String))
        .attribute(AttributeSchema::new("default_baseline", AttributeType::Bool))
        .attribute(AttributeSchema::new(
            "operating_system",
            ssm_types::operating_system(),
        ))
        .attribute(AttributeSchema::new("id", AttributeType::String).computed())
        .attribute(AttributeSchema::new("name", AttributeType::String).computed())
        .attribute(AttributeSchema::new("description", AttributeType::String).computed())
        .attribute(
            AttributeSchema::new(
                "global_filter",
                AttributeType::List(Box::new(patch_filter_block())),
            )
            .computed(),
        )
        .attribute(
            AttributeSchema::new(
                "approval_rule",
                AttributeType::List(Box::new(approval_rule_block())),
            )
            .computed(),
        )
        .attribute(
            AttributeSchema::new("approved_patches_compliance_level", AttributeType::String)
                .computed(),
        )
        .attribute(
            AttributeSchema::new("approved_patches_enable_non_security", AttributeType::Bool)
                .computed(),
        )
        .attribute(AttributeSchema::new("approved_patches", types::string_list()).computed())
        .attribute(AttributeSchema::new("rejected_patches", types::string_list()).computed())
        .attribute(
            AttributeSchema::new("rejected_patches_action", AttributeType::String).computed(),
        )
}

fn instance_filter_block() -> AttributeType {
    AttributeType::Block(vec![
        AttributeSchema::new("name", AttributeType::String)
            .required()
            .with_description("e.g. PlatformTypes, tag:Environment"),
        AttributeSchema::new("values", types::string_list()).required(),
    ])
}

pub fn instances() -> ResourceSchema {
    ResourceSchema::data_source(INSTANCES)
        .with_description("IDs of managed instances matching the filters")
        .attribute(AttributeSchema::new(
            "filter",
            AttributeType::List(Box::new(instance_filter_block())),
        ))
        .attribute(AttributeSchema::new("ids", types::string_list()).computed())
}
