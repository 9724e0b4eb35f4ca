//! ssm_service_setting schema

use sextant_core::schema::{AttributeSchema, AttributeType, ResourceSchema};

pub const RESOURCE_TYPE: &str = "ssm_service_setting";

pub fn schema() -> ResourceSchema {
    ResourceSchema::new(RESOURCE_TYPE)
        .with_description("An account-level SSM service setting; deleting resets it to default")
        .attribute(
            AttributeSchema::new("setting_id", AttributeType::String)
                .required()
                .force_new()
                .with_description("Setting ID or ARN, e.g. /ssm/parameter-store/high-throughput-enabled"),
        )
        .attribute(AttributeSchema::new("setting_value", AttributeType::String).required())
        .attribute(AttributeSchema::new("arn", AttributeType::String).computed())
        .attribute(AttributeSchema::new("status", AttributeType::String).computed())
}
