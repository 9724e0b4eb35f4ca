//! Attribute validators for SSM names and values
//!
//! Each validator takes the value and the attribute key it came from and
//! returns every problem found as a user-facing message. An empty list means
//! the value is acceptable.

use std::sync::LazyLock;

use regex::Regex;

static SSM_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9_.\-]{3,128}$").expect("SSM name pattern is a valid regex")
});

/// Validate a document, association or patch baseline name.
///
/// Names are 3 to 128 characters from `[a-zA-Z0-9_.-]`.
pub fn validate_ssm_name(value: &str, key: &str) -> Vec<String> {
    if SSM_NAME.is_match(value) {
        return Vec::new();
    }

    vec![format!(
        "Only alphanumeric characters, hyphens, dots & underscores allowed in {:?}: {:?} \
         (Must satisfy regular expression pattern: ^[a-zA-Z0-9_\\-.]{{3,128}}$)",
        key, value
    )]
}

/// Parameter names are 1 to 2048 characters
pub fn validate_parameter_name(value: &str, key: &str) -> Vec<String> {
    let len = value.chars().count();
    if (1..=2048).contains(&len) {
        Vec::new()
    } else {
        vec![format!(
            "{:?} must be between 1 and 2048 characters, got {}",
            key, len
        )]
    }
}

pub fn validate_parameter_description(value: &str, key: &str) -> Vec<String> {
    let len = value.chars().count();
    if len <= 1024 {
        Vec::new()
    } else {
        vec![format!(
            "{:?} cannot be longer than 1024 characters, got {}",
            key, len
        )]
    }
}

/// Hierarchy paths for `GetParametersByPath` start at the root
pub fn validate_parameter_path(value: &str, key: &str) -> Vec<String> {
    let mut errors = Vec::new();
    if !value.starts_with('/') {
        errors.push(format!("{:?} must start with \"/\": {:?}", key, value));
    }
    if value.chars().count() > 2048 {
        errors.push(format!("{:?} cannot be longer than 2048 characters", key));
    }
    errors
}

pub fn validate_approve_after_days(value: i64, key: &str) -> Vec<String> {
    if (0..=360).contains(&value) {
        Vec::new()
    } else {
        vec![format!(
            "{:?} must be between 0 and 360 days, got {}",
            key, value
        )]
    }
}

/// `<area>-<qualifiers>-<number>`, e.g. `us-west-2`, `us-gov-east-1`, `us-isob-east-1`
static REGION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z]{2}(-[a-z]+)+-[0-9]{1,2}$").expect("region pattern is a valid regex")
});

pub fn validate_region(value: &str, key: &str) -> Vec<String> {
    if REGION.is_match(value) {
        Vec::new()
    } else {
        vec![format!(
            "Invalid region {:?} in {:?}, expected a region name such as \"us-west-2\"",
            value, key
        )]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALLOWED: &str = "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789_.-";

    #[test]
    fn ssm_name_accepts_allowed_characters_at_every_length() {
        let alphabet: Vec<char> = ALLOWED.chars().collect();
        for len in 3..=128 {
            let value: String = (0..len).map(|i| alphabet[(i * 7 + len) % alphabet.len()]).collect();
            assert!(
                validate_ssm_name(&value, "name").is_empty(),
                "{} should be valid",
                value
            );
        }
    }

    #[test]
    fn ssm_name_accepts_typical_names() {
        for value in ["abc", "My_Document-1.0", "AWS-RunShellScript", "a.b", "---"] {
            assert!(validate_ssm_name(value, "name").is_empty(), "{}", value);
        }
    }

    #[test]
    fn ssm_name_rejects_bad_lengths() {
        let too_long = "a".repeat(129);
        for value in ["", "a", "ab", too_long.as_str()] {
            assert_eq!(validate_ssm_name(value, "name").len(), 1, "{:?}", value);
        }
    }

    #[test]
    fn ssm_name_rejects_disallowed_characters() {
        for value in ["has space", "slash/name", "colon:name", "tab\tname", "caf\u{e9}s", "name\n"] {
            assert!(!validate_ssm_name(value, "name").is_empty(), "{:?}", value);
        }
    }

    #[test]
    fn ssm_name_message_names_key_and_value() {
        let errors = validate_ssm_name("bad name", "association_name");
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("\"association_name\""));
        assert!(errors[0].contains("\"bad name\""));
        assert!(errors[0].contains("{3,128}"));
    }

    #[test]
    fn parameter_name_length() {
        assert!(validate_parameter_name("/app/db/host", "name").is_empty());
        assert_eq!(validate_parameter_name("", "name").len(), 1);
        assert_eq!(validate_parameter_name(&"a".repeat(2049), "name").len(), 1);
        assert!(validate_parameter_name(&"a".repeat(2048), "name").is_empty());
    }

    #[test]
    fn parameter_description_length() {
        assert!(validate_parameter_description("", "description").is_empty());
        assert!(validate_parameter_description(&"d".repeat(1024), "description").is_empty());
        assert_eq!(
            validate_parameter_description(&"d".repeat(1025), "description").len(),
            1
        );
    }

    #[test]
    fn parameter_path_must_be_rooted() {
        assert!(validate_parameter_path("/", "path").is_empty());
        assert!(validate_parameter_path("/app/prod", "path").is_empty());
        let errors = validate_parameter_path("app/prod", "path");
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("must start with"));
    }

    #[test]
    fn approve_after_days_range() {
        assert!(validate_approve_after_days(0, "approve_after_days").is_empty());
        assert!(validate_approve_after_days(360, "approve_after_days").is_empty());
        assert_eq!(validate_approve_after_days(361, "approve_after_days").len(), 1);
        assert_eq!(validate_approve_after_days(-1, "approve_after_days").len(), 1);
    }

    #[test]
    fn region_format() {
        for region in [
            "us-west-2",
            "ap-southeast-3",
            "me-central-1",
            "il-central-1",
            "cn-northwest-1",
            "us-gov-west-1",
            "us-iso-east-1",
            "us-isob-east-1",
        ] {
            assert!(validate_region(region, "region").is_empty(), "{}", region);
        }
        for region in ["ap-northeast-1a", "mars-1", "US-WEST-2", "us-west", ""] {
            let errors = validate_region(region, "region");
            assert_eq!(errors.len(), 1, "{}", region);
            assert!(errors[0].contains("Invalid region"));
        }
    }
}
