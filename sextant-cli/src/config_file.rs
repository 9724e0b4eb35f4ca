//! JSON configuration files
//!
//! ```json
//! {
//!   "provider": { "region": "us-west-2" },
//!   "resources": [
//!     { "type": "ssm_parameter", "name": "db_host", "attributes": { "name": "/app/db", "type": "String", "value": "db.internal" } }
//!   ],
//!   "data": [
//!     { "type": "ssm_parameter", "name": "token", "attributes": { "name": "/app/token" } }
//!   ]
//! }
//! ```

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use sextant_core::resource::{Resource, Value};
use sextant_provider_ssm::ProviderConfig;
use sextant_provider_ssm::resource_types::{find_data_source_type, find_resource_type};

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawConfig {
    provider: ProviderConfig,
    resources: Vec<RawBlock>,
    data: Vec<RawBlock>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawBlock {
    #[serde(rename = "type")]
    resource_type: String,
    name: String,
    #[serde(default)]
    attributes: serde_json::Map<String, serde_json::Value>,
}

impl RawBlock {
    fn into_resource(self, data_source: bool) -> Resource {
        let base = if data_source {
            Resource::data(self.resource_type, self.name)
        } else {
            Resource::new(self.resource_type, self.name)
        };
        self.attributes
            .iter()
            .fold(base, |resource, (key, value)| {
                resource.with_attribute(key.clone(), Value::from_json(value))
            })
    }
}

/// A parsed configuration file
#[derive(Debug, Default)]
pub struct ConfigFile {
    pub provider: ProviderConfig,
    pub resources: Vec<Resource>,
    pub data: Vec<Resource>,
}

impl ConfigFile {
    pub fn load(path: &Path) -> Result<Self, String> {
        let content = fs::read_to_string(path)
            .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
        Self::parse(&content).map_err(|e| format!("{}: {}", path.display(), e))
    }

    pub fn parse(content: &str) -> Result<Self, String> {
        let raw: RawConfig =
            serde_json::from_str(content).map_err(|e| format!("Parse error: {}", e))?;

        Ok(Self {
            provider: raw.provider,
            resources: raw
                .resources
                .into_iter()
                .map(|block| block.into_resource(false))
                .collect(),
            data: raw
                .data
                .into_iter()
                .map(|block| block.into_resource(true))
                .collect(),
        })
    }

    /// Check every block against its schema. Returns one message per problem.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        let mut seen = HashSet::new();

        for (resource, data_source) in self
            .resources
            .iter()
            .map(|r| (r, false))
            .chain(self.data.iter().map(|d| (d, true)))
        {
            let kind = if data_source { "data" } else { "resource" };
            if !seen.insert((data_source, resource.id.clone())) {
                errors.push(format!("{} {}: declared more than once", kind, resource.id));
                continue;
            }

            let found = if data_source {
                find_data_source_type(&resource.id.resource_type)
            } else {
                find_resource_type(&resource.id.resource_type)
            };
            let Some(resource_type) = found else {
                errors.push(format!(
                    "{} {}: unknown type '{}'",
                    kind, resource.id, resource.id.resource_type
                ));
                continue;
            };

            let schema = resource_type.schema();
            let mut attributes = resource.attributes.clone();
            schema.apply_defaults(&mut attributes);
            if let Err(type_errors) = schema.validate(&attributes) {
                errors.extend(
                    type_errors
                        .into_iter()
                        .map(|e| format!("{} {}: {}", kind, resource.id, e)),
                );
            }
        }

        errors
    }
}
