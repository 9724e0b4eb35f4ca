//! State file structures for persisting resource state

use serde::{Deserialize, Serialize};

use sextant_core::flatmap::{self, FlatState};
use sextant_core::resource::{State, Value};
use sextant_core::schema::ResourceSchema;
use sextant_core::upgrade::StateRecord;

/// The main state file structure that persists to the backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateFile {
    /// State file format version
    pub version: u32,
    /// Monotonically increasing number for each state modification
    pub serial: u64,
    /// Unique identifier for this state lineage (prevents accidental overwrites)
    pub lineage: String,
    /// Version of Sextant that last modified this state
    pub sextant_version: String,
    /// All managed resources and their current state
    pub resources: Vec<ResourceState>,
}

impl StateFile {
    /// Current state file format version
    pub const CURRENT_VERSION: u32 = 1;

    /// Create a new empty state file
    pub fn new() -> Self {
        Self {
            version: Self::CURRENT_VERSION,
            serial: 0,
            lineage: uuid::Uuid::new_v4().to_string(),
            sextant_version: env!("CARGO_PKG_VERSION").to_string(),
            resources: Vec::new(),
        }
    }

    /// Increment serial and update the writer version for a new state write
    pub fn increment_serial(&mut self) {
        self.serial += 1;
        self.sextant_version = env!("CARGO_PKG_VERSION").to_string();
    }

    /// Find a resource by type and name
    pub fn find_resource(&self, resource_type: &str, name: &str) -> Option<&ResourceState> {
        self.resources
            .iter()
            .find(|r| r.resource_type == resource_type && r.name == name)
    }

    /// Add or update a resource in the state
    pub fn upsert_resource(&mut self, resource: ResourceState) {
        match self
            .resources
            .iter_mut()
            .find(|r| r.resource_type == resource.resource_type && r.name == resource.name)
        {
            Some(existing) => *existing = resource,
            None => self.resources.push(resource),
        }
    }

    /// Remove a resource from the state
    pub fn remove_resource(&mut self, resource_type: &str, name: &str) -> Option<ResourceState> {
        let pos = self
            .resources
            .iter()
            .position(|r| r.resource_type == resource_type && r.name == name)?;
        Some(self.resources.remove(pos))
    }
}

impl Default for StateFile {
    fn default() -> Self {
        Self::new()
    }
}

/// State of a single managed resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceState {
    /// Resource type (e.g., "ssm_parameter")
    pub resource_type: String,
    /// Block name from configuration
    pub name: String,
    /// Provider name (e.g., "ssm")
    pub provider: String,
    /// Schema version the attributes were written with
    #[serde(default)]
    pub schema_version: u32,
    /// Flat attributes, including `id`
    pub attributes: FlatState,
}

impl ResourceState {
    /// Create a new resource state
    pub fn new(
        resource_type: impl Into<String>,
        name: impl Into<String>,
        provider: impl Into<String>,
    ) -> Self {
        Self {
            resource_type: resource_type.into(),
            name: name.into(),
            provider: provider.into(),
            schema_version: 0,
            attributes: FlatState::new(),
        }
    }

    /// Capture a provider state under the given schema version
    pub fn from_state(state: &State, provider: &str, schema_version: u32) -> Self {
        let mut attributes = flatmap::flatten(&state.attributes);
        if let Some(identifier) = &state.identifier {
            attributes.insert("id".to_string(), identifier.clone());
        }

        Self {
            resource_type: state.id.resource_type.clone(),
            name: state.id.name.clone(),
            provider: provider.to_string(),
            schema_version,
            attributes,
        }
    }

    /// Set an attribute value
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn id(&self) -> Option<&str> {
        self.attributes.get("id").map(String::as_str)
    }

    /// The versioned record handed to state upgraders
    pub fn record(&self) -> StateRecord {
        StateRecord::new(self.schema_version, self.attributes.clone())
    }

    /// Typed attributes decoded with the resource schema
    pub fn typed_attributes(
        &self,
        schema: &ResourceSchema,
    ) -> std::collections::HashMap<String, Value> {
        flatmap::expand(&self.attributes, schema)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sextant_core::resource::ResourceId;
    use sextant_core::schema::{AttributeSchema, AttributeType};
    use std::collections::HashMap;

    #[test]
    fn test_state_file_new() {
        let state = StateFile::new();
        assert_eq!(state.version, StateFile::CURRENT_VERSION);
        assert_eq!(state.serial, 0);
        assert!(!state.lineage.is_empty());
        assert!(state.resources.is_empty());
    }

    #[test]
    fn test_state_file_upsert_and_remove() {
        let mut state = StateFile::new();

        state.upsert_resource(
            ResourceState::new("ssm_parameter", "db_host", "ssm").with_attribute("value", "a"),
        );
        state.upsert_resource(
            ResourceState::new("ssm_parameter", "db_host", "ssm").with_attribute("value", "b"),
        );
        assert_eq!(state.resources.len(), 1);
        assert_eq!(
            state
                .find_resource("ssm_parameter", "db_host")
                .and_then(|r| r.attributes.get("value"))
                .map(String::as_str),
            Some("b")
        );

        assert!(state.remove_resource("ssm_parameter", "db_host").is_some());
        assert!(state.remove_resource("ssm_parameter", "db_host").is_none());
        assert!(state.resources.is_empty());
    }

    #[test]
    fn test_resource_state_from_provider_state() {
        let state = State::existing(
            ResourceId::new("ssm_association", "test"),
            HashMap::from([
                ("name".to_string(), Value::String("doc".to_string())),
                (
                    "parameters".to_string(),
                    Value::Map(HashMap::from([(
                        "Directory".to_string(),
                        Value::String("/tmp".to_string()),
                    )])),
                ),
            ]),
        )
        .with_identifier("assoc-123");

        let resource = ResourceState::from_state(&state, "ssm", 1);

        assert_eq!(resource.schema_version, 1);
        assert_eq!(resource.id(), Some("assoc-123"));
        assert_eq!(resource.attributes["parameters.%"], "1");
        assert_eq!(resource.attributes["parameters.Directory"], "/tmp");

        let schema = ResourceSchema::new("ssm_association")
            .attribute(AttributeSchema::new("name", AttributeType::String))
            .attribute(AttributeSchema::new(
                "parameters",
                AttributeType::Map(Box::new(AttributeType::String)),
            ));
        let typed = resource.typed_attributes(&schema);
        assert_eq!(typed["id"], Value::String("assoc-123".to_string()));
        assert_eq!(typed["parameters"], state.attributes["parameters"]);
    }

    #[test]
    fn test_missing_schema_version_defaults_to_zero() {
        let json = r#"{
            "resource_type": "ssm_patch_group",
            "name": "pg",
            "provider": "ssm",
            "attributes": {"id": "testgroup"}
        }"#;
        let resource: ResourceState = serde_json::from_str(json).unwrap();
        assert_eq!(resource.schema_version, 0);
        assert_eq!(resource.record().id(), Some("testgroup"));
    }

    #[test]
    fn test_state_file_serialization() {
        let mut state = StateFile::new();
        state.upsert_resource(
            ResourceState::new("ssm_document", "doc", "ssm")
                .with_attribute("id", "my-doc")
                .with_attribute("document_format", "JSON"),
        );

        let json = serde_json::to_string_pretty(&state).unwrap();
        let deserialized: StateFile = serde_json::from_str(&json).unwrap();

        assert_eq!(deserialized.serial, state.serial);
        assert_eq!(deserialized.lineage, state.lineage);
        assert_eq!(deserialized.resources, state.resources);
    }
}
