//! Sextant SSM Provider
//!
//! AWS Systems Manager Provider implementation.
//!
//! ## Module Structure
//!
//! - `provider` - SsmProvider construction and dispatch
//! - `resources` - CRUD for each managed resource type
//! - `data_sources` - Read-only lookups
//! - `schemas` - Attribute schemas for resources and data sources
//! - `resource_types` - ResourceType definitions wiring schemas to upgraders
//! - `migrate` - State upgraders for older persisted layouts
//! - `validation` / `types` - Value validators and custom attribute types

pub mod arn;
pub mod config;
pub mod data_sources;
pub mod ids;
pub mod migrate;
pub mod provider;
pub mod resource_types;
pub mod resources;
pub mod schemas;
pub mod tags;
pub mod types;
pub mod validation;

// Re-export main types
pub use config::{ConfigError, ProviderConfig};
pub use provider::SsmProvider;
pub use resource_types::{data_source_types, resource_types};
pub use validation::validate_ssm_name;

use sextant_core::provider::{BoxFuture, Provider, ProviderError, ProviderResult, ResourceType};
use sextant_core::resource::{Resource, ResourceId, State};

use resource_types::find_data_source_type;

// =============================================================================
// Provider Trait Implementation
// =============================================================================

impl Provider for SsmProvider {
    fn name(&self) -> &'static str {
        "ssm"
    }

    fn resource_types(&self) -> Vec<Box<dyn ResourceType>> {
        resource_types()
    }

    fn data_source_types(&self) -> Vec<Box<dyn ResourceType>> {
        data_source_types()
    }

    fn read(
        &self,
        id: &ResourceId,
        identifier: Option<&str>,
    ) -> BoxFuture<'_, ProviderResult<State>> {
        let id = id.clone();
        let identifier = identifier.map(|s| s.to_string());
        Box::pin(async move { self.read_resource(&id, identifier.as_deref()).await })
    }

    fn create(&self, resource: &Resource) -> BoxFuture<'_, ProviderResult<State>> {
        let resource = resource.clone();
        Box::pin(async move { self.create_resource(&resource).await })
    }

    fn update(
        &self,
        id: &ResourceId,
        identifier: &str,
        from: &State,
        to: &Resource,
    ) -> BoxFuture<'_, ProviderResult<State>> {
        let id = id.clone();
        let identifier = identifier.to_string();
        let from = from.clone();
        let to = to.clone();
        Box::pin(async move { self.update_resource(&id, &identifier, &from, &to).await })
    }

    fn delete(&self, id: &ResourceId, identifier: &str) -> BoxFuture<'_, ProviderResult<()>> {
        let id = id.clone();
        let identifier = identifier.to_string();
        Box::pin(async move { self.delete_resource(&id, &identifier).await })
    }

    fn read_data_source(&self, query: &Resource) -> BoxFuture<'_, ProviderResult<State>> {
        let query = query.clone();
        Box::pin(async move {
            let query = prepare_query(query)?;
            self.query_data_source(&query).await
        })
    }
}

/// Fill in defaults and validate a data source query block
fn prepare_query(mut query: Resource) -> ProviderResult<Resource> {
    let data_source = find_data_source_type(&query.id.resource_type)
        .ok_or_else(|| ProviderError::unknown_type(&query.id))?;
    let schema = data_source.schema();

    schema.apply_defaults(&mut query.attributes);
    schema.validate(&query.attributes).map_err(|errors| {
        let messages: Vec<String> = errors.iter().map(ToString::to_string).collect();
        ProviderError::new(format!("Invalid query: {}", messages.join("; ")))
            .for_resource(query.id.clone())
    })?;

    Ok(query)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sextant_core::resource::Value;

    #[test]
    fn query_defaults_are_applied() {
        let query = Resource::data("ssm_parameter", "db")
            .with_attribute("name", Value::String("/app/db/host".to_string()));
        let prepared = prepare_query(query).unwrap();
        assert_eq!(prepared.get_bool("with_decryption"), Some(true));
    }

    #[test]
    fn invalid_query_is_rejected_before_any_call() {
        let query = Resource::data("ssm_parameters_by_path", "app")
            .with_attribute("path", Value::String("app".to_string()));
        let err = prepare_query(query).unwrap_err();
        assert!(err.to_string().starts_with("[ssm_parameters_by_path.app] Invalid query"));
    }

    #[test]
    fn unknown_data_source_is_rejected() {
        let err = prepare_query(Resource::data("ssm_widget", "w")).unwrap_err();
        assert!(err.to_string().contains("Unknown resource type"));
    }
}
