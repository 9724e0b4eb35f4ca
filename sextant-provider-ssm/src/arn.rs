//! ARN construction for SSM resources the API does not return ARNs for

/// The AWS partition a region belongs to
pub fn partition_for_region(region: &str) -> &'static str {
    if region.starts_with("cn-") {
        "aws-cn"
    } else if region.starts_with("us-gov-") {
        "aws-us-gov"
    } else if region.starts_with("us-iso-") {
        "aws-iso"
    } else if region.starts_with("us-isob-") {
        "aws-iso-b"
    } else {
        "aws"
    }
}

/// Where ARNs for this provider point
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArnContext {
    pub partition: String,
    pub region: String,
    pub account_id: String,
}

impl ArnContext {
    pub fn new(region: impl Into<String>, account_id: impl Into<String>) -> Self {
        let region = region.into();
        Self {
            partition: partition_for_region(&region).to_string(),
            region,
            account_id: account_id.into(),
        }
    }

    /// `arn:<partition>:ssm:<region>:<account>:<resource>`
    pub fn ssm(&self, resource: &str) -> String {
        format!(
            "arn:{}:ssm:{}:{}:{}",
            self.partition, self.region, self.account_id, resource
        )
    }

    /// Parameter names may or may not start with `/`
    pub fn parameter(&self, name: &str) -> String {
        let name = name.strip_prefix('/').unwrap_or(name);
        self.ssm(&format!("parameter/{}", name))
    }

    /// AWS-owned documents are identified by name alone
    pub fn document(&self, name: &str) -> String {
        if name.starts_with("AWS-") {
            name.to_string()
        } else {
            self.ssm(&format!("document/{}", name))
        }
    }

    pub fn association(&self, association_id: &str) -> String {
        self.ssm(&format!("association/{}", association_id))
    }

    pub fn patch_baseline(&self, baseline_id: &str) -> String {
        self.ssm(&format!("patchbaseline/{}", baseline_id))
    }
}
