//! ssm_patch_group schema

use sextant_core::schema::{AttributeSchema, AttributeType, ResourceSchema};

pub const RESOURCE_TYPE: &str = "ssm_patch_group";

/// v1 identifies registrations as `<patch_group>,<baseline_id>`
pub const SCHEMA_VERSION: u32 = 1;

pub fn schema() -> ResourceSchema {
    ResourceSchema::new(RESOURCE_TYPE)
        .with_description("Registers a patch baseline for a patch group")
        .with_version(SCHEMA_VERSION)
        .attribute(
            AttributeSchema::new("patch_group", AttributeType::String)
                .required()
                .force_new(),
        )
        .attribute(
            AttributeSchema::new("baseline_id", AttributeType::String)
                .required()
                .force_new(),
        )
}
