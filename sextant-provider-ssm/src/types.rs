//! SSM-specific attribute types

use sextant_core::resource::Value;
use sextant_core::schema::{AttributeType, types};

use crate::validation;

/// Turn a validator's message list into a single result
fn to_result(errors: Vec<String>) -> Result<(), String> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors.join("; "))
    }
}

/// Document, association and patch baseline names
pub fn ssm_name() -> AttributeType {
    AttributeType::Custom {
        name: "SsmName".to_string(),
        base: Box::new(AttributeType::String),
        validate: |key, value| {
            to_result(validation::validate_ssm_name(value.as_str().unwrap_or_default(), key))
        },
    }
}

pub fn parameter_name() -> AttributeType {
    AttributeType::Custom {
        name: "ParameterName".to_string(),
        base: Box::new(AttributeType::String),
        validate: |key, value| {
            to_result(validation::validate_parameter_name(
                value.as_str().unwrap_or_default(),
                key,
            ))
        },
    }
}

pub fn parameter_description() -> AttributeType {
    AttributeType::Custom {
        name: "ParameterDescription".to_string(),
        base: Box::new(AttributeType::String),
        validate: |key, value| {
            to_result(validation::validate_parameter_description(
                value.as_str().unwrap_or_default(),
                key,
            ))
        },
    }
}

pub fn parameter_path() -> AttributeType {
    AttributeType::Custom {
        name: "ParameterPath".to_string(),
        base: Box::new(AttributeType::String),
        validate: |key, value| {
            to_result(validation::validate_parameter_path(
                value.as_str().unwrap_or_default(),
                key,
            ))
        },
    }
}

pub fn approve_after_days() -> AttributeType {
    AttributeType::Custom {
        name: "ApproveAfterDays".to_string(),
        base: Box::new(AttributeType::Int),
        validate: |key, value| {
            to_result(validation::validate_approve_after_days(
                value.as_int().unwrap_or_default(),
                key,
            ))
        },
    }
}

pub fn aws_region() -> AttributeType {
    AttributeType::Custom {
        name: "Region".to_string(),
        base: Box::new(AttributeType::String),
        validate: |key, value| match value {
            Value::String(s) => to_result(validation::validate_region(s, key)),
            _ => Err(format!("{} must be a string", key)),
        },
    }
}

pub fn parameter_type() -> AttributeType {
    types::enum_of(&["String", "StringList", "SecureString"])
}

pub fn parameter_tier() -> AttributeType {
    types::enum_of(&["Standard", "Advanced", "Intelligent-Tiering"])
}

pub fn parameter_data_type() -> AttributeType {
    types::enum_of(&["text", "aws:ec2:image", "aws:ssm:integration"])
}

pub fn document_format() -> AttributeType {
    types::enum_of(&["JSON", "YAML", "TEXT"])
}

pub fn document_type() -> AttributeType {
    types::enum_of(&[
        "Command",
        "Policy",
        "Automation",
        "Session",
        "Package",
        "ApplicationConfiguration",
        "ApplicationConfigurationSchema",
        "DeploymentStrategy",
        "ChangeCalendar",
        "Automation.ChangeTemplate",
        "ProblemAnalysis",
        "ProblemAnalysisTemplate",
    ])
}

pub fn document_permission_type() -> AttributeType {
    types::enum_of(&["Share"])
}

pub fn operating_system() -> AttributeType {
    types::enum_of(&[
        "WINDOWS",
        "AMAZON_LINUX",
        "AMAZON_LINUX_2",
        "AMAZON_LINUX_2022",
        "AMAZON_LINUX_2023",
        "UBUNTU",
        "REDHAT_ENTERPRISE_LINUX",
        "SUSE",
        "CENTOS",
        "ORACLE_LINUX",
        "DEBIAN",
        "MACOS",
        "RASPBIAN",
        "ROCKY_LINUX",
        "ALMA_LINUX",
    ])
}

pub fn patch_compliance_level() -> AttributeType {
    types::enum_of(&[
        "CRITICAL",
        "HIGH",
        "MEDIUM",
        "LOW",
        "INFORMATIONAL",
        "UNSPECIFIED",
    ])
}

pub fn association_compliance_severity() -> AttributeType {
    types::enum_of(&["CRITICAL", "HIGH", "MEDIUM", "LOW", "UNSPECIFIED"])
}

pub fn patch_action() -> AttributeType {
    types::enum_of(&["ALLOW_AS_DEPENDENCY", "BLOCK"])
}

pub fn sync_compliance() -> AttributeType {
    types::enum_of(&["AUTO", "MANUAL"])
}

pub fn patch_filter_key() -> AttributeType {
    types::enum_of(&[
        "ARCH",
        "ADVISORY_ID",
        "BUGZILLA_ID",
        "PATCH_SET",
        "PRODUCT",
        "PRODUCT_FAMILY",
        "CLASSIFICATION",
        "CVE_ID",
        "EPOCH",
        "MSRC_SEVERITY",
        "NAME",
        "PATCH_ID",
        "SECTION",
        "PRIORITY",
        "REPOSITORY",
        "RELEASE",
        "SEVERITY",
        "SECURITY",
        "VERSION",
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(v: &str) -> Value {
        Value::String(v.to_string())
    }

    #[test]
    fn ssm_name_type_runs_validator() {
        let t = ssm_name();
        assert!(t.validate("name", &s("my-document")).is_ok());

        let err = t.validate("name", &s("no spaces")).unwrap_err().to_string();
        assert!(err.contains("\"name\""));
        assert!(err.contains("\"no spaces\""));
    }

    #[test]
    fn ssm_name_type_rejects_non_string_before_validating() {
        let err = ssm_name().validate("name", &Value::Int(3)).unwrap_err();
        assert!(matches!(
            err,
            sextant_core::schema::TypeError::TypeMismatch { .. }
        ));
    }

    #[test]
    fn approve_after_days_type() {
        let t = approve_after_days();
        assert!(t.validate("approve_after_days", &Value::Int(7)).is_ok());
        assert!(t.validate("approve_after_days", &Value::Int(400)).is_err());
    }

    #[test]
    fn region_type() {
        assert!(aws_region().validate("region", &s("us-west-2")).is_ok());
        assert!(aws_region().validate("region", &s("us-west-2a")).is_err());
    }

    #[test]
    fn enum_types() {
        assert!(parameter_type().validate("type", &s("SecureString")).is_ok());
        assert!(parameter_type().validate("type", &s("securestring")).is_err());
        assert!(parameter_tier().validate("tier", &s("Intelligent-Tiering")).is_ok());
        assert!(sync_compliance().validate("sync_compliance", &s("MANUAL")).is_ok());
        assert!(operating_system().validate("operating_system", &s("BEOS")).is_err());
    }
}
