//! ssm_association schema

use sextant_core::schema::{AttributeSchema, AttributeType, ResourceSchema, types};

use crate::types as ssm_types;

pub const RESOURCE_TYPE: &str = "ssm_association";

/// v1 identifies associations by association ID rather than document name
pub const SCHEMA_VERSION: u32 = 1;

pub fn target_block() -> AttributeType {
    AttributeType::Block(vec![
        AttributeSchema::new("key", AttributeType::String).required(),
        AttributeSchema::new("values", types::string_list()).required(),
    ])
}

fn output_location_block() -> AttributeType {
    AttributeType::Block(vec![
        AttributeSchema::new("s3_bucket_name", AttributeType::String).required(),
        AttributeSchema::new("s3_key_prefix", AttributeType::String),
        AttributeSchema::new("s3_region", ssm_types::aws_region()),
    ])
}

pub fn schema() -> ResourceSchema {
    ResourceSchema::new(RESOURCE_TYPE)
        .with_description("Binds an SSM document to a set of targets")
        .with_version(SCHEMA_VERSION)
        .attribute(
            AttributeSchema::new("name", AttributeType::String)
                .required()
                .with_description("Name of the document to apply"),
        )
        .attribute(AttributeSchema::new("association_name", ssm_types::ssm_name()))
        .attribute(
            AttributeSchema::new("instance_id", AttributeType::String)
                .force_new()
                .conflicts_with("targets"),
        )
        .attribute(AttributeSchema::new("document_version", AttributeType::String))
        .attribute(AttributeSchema::new("schedule_expression", AttributeType::String))
        .attribute(AttributeSchema::new(
            "parameters",
            AttributeType::Map(Box::new(AttributeType::String)),
        ))
        .attribute(
            AttributeSchema::new("targets", AttributeType::List(Box::new(target_block())))
                .conflicts_with("instance_id"),
        )
        .attribute(AttributeSchema::new(
            "output_location",
            AttributeType::List(Box::new(output_location_block())),
        ))
        .attribute(AttributeSchema::new(
            "compliance_severity",
            ssm_types::association_compliance_severity(),
        ))
        .attribute(AttributeSchema::new("max_concurrency", AttributeType::String))
        .attribute(AttributeSchema::new("max_errors", AttributeType::String))
        .attribute(AttributeSchema::new(
            "automation_target_parameter_name",
            AttributeType::String,
        ))
        .attribute(AttributeSchema::new(
            "apply_only_at_cron_interval",
            AttributeType::Bool,
        ))
        .attribute(AttributeSchema::new(
            "sync_compliance",
            ssm_types::sync_compliance(),
        ))
        .attribute(
            AttributeSchema::new("wait_for_success_timeout_seconds", types::positive_int())
                .with_description("Wait for the association to report Success after create"),
        )
        .attribute(AttributeSchema::new("association_id", AttributeType::String).computed())
        .attribute(AttributeSchema::new("arn", AttributeType::String).computed())
}
