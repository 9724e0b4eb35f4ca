//! ssm_patch_baseline schema

use std::collections::HashMap;

use sextant_core::resource::Value;
use sextant_core::schema::{AttributeSchema, AttributeType, ResourceSchema, types};

use crate::types as ssm_types;

pub const RESOURCE_TYPE: &str = "ssm_patch_baseline";

pub fn patch_filter_block() -> AttributeType {
    AttributeType::Block(vec![
        AttributeSchema::new("key", ssm_types::patch_filter_key()).required(),
        AttributeSchema::new("values", types::string_list()).required(),
    ])
}

pub fn approval_rule_block() -> AttributeType {
    AttributeType::Block(vec![
        AttributeSchema::new("approve_after_days", ssm_types::approve_after_days()),
        AttributeSchema::new("approve_until_date", AttributeType::String)
            .with_description("YYYY-MM-DD"),
        AttributeSchema::new("compliance_level", ssm_types::patch_compliance_level()),
        AttributeSchema::new("enable_non_security", AttributeType::Bool),
        AttributeSchema::new(
            "patch_filter",
            AttributeType::List(Box::new(patch_filter_block())),
        )
        .required(),
    ])
}

pub fn schema() -> ResourceSchema {
    ResourceSchema::new(RESOURCE_TYPE)
        .with_description("Rules deciding which patches are approved for instances")
        .attribute(AttributeSchema::new("name", ssm_types::ssm_name()).required())
        .attribute(AttributeSchema::new("description", AttributeType::String))
        .attribute(
            AttributeSchema::new("operating_system", ssm_types::operating_system())
                .with_default(Value::String("WINDOWS".to_string()))
                .force_new(),
        )
        .attribute(AttributeSchema::new("approved_patches", types::string_list()))
        .attribute(AttributeSchema::new("rejected_patches", types::string_list()))
        .attribute(
            AttributeSchema::new(
                "approved_patches_compliance_level",
                ssm_types::patch_compliance_level(),
            )
            .with_default(Value::String("UNSPECIFIED".to_string())),
        )
        .attribute(AttributeSchema::new(
            "approved_patches_enable_non_security",
            AttributeType::Bool,
        ))
        .attribute(AttributeSchema::new(
            "rejected_patches_action",
            ssm_types::patch_action(),
        ))
        .attribute(AttributeSchema::new(
            "global_filter",
            AttributeType::List(Box::new(patch_filter_block())),
        ))
        .attribute(AttributeSchema::new(
            "approval_rule",
            AttributeType::List(Box::new(approval_rule_block())),
        ))
        .attribute(AttributeSchema::new("tags", types::tags()))
        .attribute(AttributeSchema::new("arn", AttributeType::String).computed())
        .with_validator(validate_approval_rules)
}

/// An approval rule sets either a delay or a cut-off date, not both
fn validate_approval_rules(attributes: &HashMap<String, Value>) -> Result<(), String> {
    let rules = attributes
        .get("approval_rule")
        .and_then(Value::as_list)
        .unwrap_or_default();

    for (i, rule) in rules.iter().enumerate() {
        let Some(rule) = rule.as_map() else { continue };
        if rule.contains_key("approve_after_days") && rule.contains_key("approve_until_date") {
            return Err(format!(
                "approval_rule.{}: approve_after_days and approve_until_date are mutually exclusive",
                i
            ));
        }
    }
    Ok(())
}
