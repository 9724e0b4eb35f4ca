//! SSM Provider implementation
//!
//! Holds the SSM client and the ARN context and routes each resource type to
//! its implementation in `resources` / `data_sources`.

use aws_sdk_ssm::Client as SsmClient;
use aws_sdk_ssm::error::{BuildError, DisplayErrorContext, SdkError};
use sextant_core::provider::{ProviderError, ProviderResult};
use sextant_core::resource::{Resource, ResourceId, State};

use crate::arn::ArnContext;
use crate::config::ProviderConfig;
use crate::resource_types::find_resource_type;
use crate::schemas::{
    association, data_sources, document, parameter, patch_baseline, patch_group, service_setting,
};

/// AWS Systems Manager Provider
pub struct SsmProvider {
    pub(crate) client: SsmClient,
    pub(crate) arns: ArnContext,
}

impl SsmProvider {
    /// Create a provider from configuration
    ///
    /// Resolves the account ID through STS when it is not configured.
    pub async fn new(config: &ProviderConfig) -> ProviderResult<Self> {
        config.validate().map_err(|e| {
            ProviderError::new(format!("Invalid provider configuration: {}", e)).with_cause(e)
        })?;

        let sdk_config = config.load_sdk_config().await;
        let region = sdk_config
            .region()
            .map(|r| r.as_ref().to_string())
            .ok_or_else(|| {
                ProviderError::new("No AWS region configured (set --region or AWS_REGION)")
            })?;

        let account_id = match &config.account_id {
            Some(id) => id.clone(),
            None => resolve_account_id(&sdk_config).await?,
        };

        log::debug!("ssm provider ready in {} for account {}", region, account_id);

        Ok(Self::with_client(
            SsmClient::new(&sdk_config),
            ArnContext::new(region, account_id),
        ))
    }

    /// Create with a specific client (for testing)
    pub fn with_client(client: SsmClient, arns: ArnContext) -> Self {
        Self { client, arns }
    }

    pub fn client(&self) -> &SsmClient {
        &self.client
    }

    pub fn region(&self) -> &str {
        &self.arns.region
    }

    // =========================================================================
    // Dispatch
    // =========================================================================

    pub async fn read_resource(
        &self,
        id: &ResourceId,
        identifier: Option<&str>,
    ) -> ProviderResult<State> {
        // Nothing has been created for this block yet
        let Some(identifier) = identifier else {
            return Ok(State::not_found(id.clone()));
        };

        match id.resource_type.as_str() {
            parameter::RESOURCE_TYPE => self.read_parameter(id, identifier, None).await,
            document::RESOURCE_TYPE => self.read_document(id, identifier).await,
            association::RESOURCE_TYPE => self.read_association(id, identifier).await,
            patch_baseline::RESOURCE_TYPE => self.read_patch_baseline(id, identifier).await,
            patch_group::RESOURCE_TYPE => self.read_patch_group(id, identifier).await,
            service_setting::RESOURCE_TYPE => self.read_service_setting(id, identifier).await,
            _ => Err(ProviderError::unknown_type(id)),
        }
    }

    pub async fn create_resource(&self, resource: &Resource) -> ProviderResult<State> {
        let id = &resource.id;
        log::info!("creating {}", id);
        let resource = &with_schema_defaults(resource);

        match id.resource_type.as_str() {
            parameter::RESOURCE_TYPE => self.create_parameter(resource).await,
            document::RESOURCE_TYPE => self.create_document(resource).await,
            association::RESOURCE_TYPE => self.create_association(resource).await,
            patch_baseline::RESOURCE_TYPE => self.create_patch_baseline(resource).await,
            patch_group::RESOURCE_TYPE => self.create_patch_group(resource).await,
            service_setting::RESOURCE_TYPE => self.create_service_setting(resource).await,
            _ => Err(ProviderError::unknown_type(id)),
        }
    }

    pub async fn update_resource(
        &self,
        id: &ResourceId,
        identifier: &str,
        from: &State,
        to: &Resource,
    ) -> ProviderResult<State> {
        log::info!("updating {} ({})", id, identifier);
        let to = &with_schema_defaults(to);

        match id.resource_type.as_str() {
            parameter::RESOURCE_TYPE => self.update_parameter(id, identifier, from, to).await,
            document::RESOURCE_TYPE => self.update_document(id, identifier, from, to).await,
            association::RESOURCE_TYPE => self.update_association(id, identifier, to).await,
            patch_baseline::RESOURCE_TYPE => {
                self.update_patch_baseline(id, identifier, from, to).await
            }
            patch_group::RESOURCE_TYPE => Err(ProviderError::new(
                "Patch group registrations cannot be updated in place; replace the resource",
            )
            .for_resource(id.clone())),
            service_setting::RESOURCE_TYPE => self.update_service_setting(id, identifier, to).await,
            _ => Err(ProviderError::unknown_type(id)),
        }
    }

    pub async fn delete_resource(&self, id: &ResourceId, identifier: &str) -> ProviderResult<()> {
        log::info!("deleting {} ({})", id, identifier);

        match id.resource_type.as_str() {
            parameter::RESOURCE_TYPE => self.delete_parameter(id, identifier).await,
            document::RESOURCE_TYPE => self.delete_document(id, identifier).await,
            association::RESOURCE_TYPE => self.delete_association(id, identifier).await,
            patch_baseline::RESOURCE_TYPE => self.delete_patch_baseline(id, identifier).await,
            patch_group::RESOURCE_TYPE => self.delete_patch_group(id, identifier).await,
            service_setting::RESOURCE_TYPE => self.delete_service_setting(id, identifier).await,
            _ => Err(ProviderError::unknown_type(id)),
        }
    }

    pub async fn query_data_source(&self, query: &Resource) -> ProviderResult<State> {
        let id = &query.id;
        log::debug!("reading data source {}", id);

        match id.resource_type.as_str() {
            data_sources::PARAMETER => self.query_parameter(query).await,
            data_sources::PARAMETERS_BY_PATH => self.query_parameters_by_path(query).await,
            data_sources::DOCUMENT => self.query_document(query).await,
            data_sources::PATCH_BASELINE => self.query_patch_baseline(query).await,
            data_sources::INSTANCES => self.query_instances(query).await,
            _ => Err(ProviderError::unknown_type(id)),
        }
    }
}

/// The resource with declared defaults filled in, so unset attributes
/// compare equal to what the API reports
fn with_schema_defaults(resource: &Resource) -> Resource {
    let mut resource = resource.clone();
    if let Some(resource_type) = find_resource_type(&resource.id.resource_type) {
        resource_type
            .schema()
            .apply_defaults(&mut resource.attributes);
    }
    resource
}

/// Look up the caller's account ID (needed for ARNs)
async fn resolve_account_id(sdk_config: &aws_config::SdkConfig) -> ProviderResult<String> {
    let sts = aws_sdk_sts::Client::new(sdk_config);
    let identity = sts.get_caller_identity().send().await.map_err(|e| {
        ProviderError::new(format!(
            "Failed to resolve AWS account ID: {}",
            DisplayErrorContext(&e)
        ))
        .with_cause(e)
    })?;

    identity
        .account()
        .map(str::to_string)
        .ok_or_else(|| ProviderError::new("GetCallerIdentity returned no account ID"))
}

// =============================================================================
// Error helpers
// =============================================================================

/// Wrap a failed API call, naming the action and the resource
pub(crate) fn api_error<E>(id: &ResourceId, action: &str, err: SdkError<E>) -> ProviderError
where
    E: std::error::Error + Send + Sync + 'static,
{
    ProviderError::new(format!("{} failed: {}", action, DisplayErrorContext(&err)))
        .for_resource(id.clone())
        .with_cause(err)
}

pub(crate) fn build_error(id: &ResourceId, err: BuildError) -> ProviderError {
    ProviderError::new(format!("Invalid request: {}", err))
        .for_resource(id.clone())
        .with_cause(err)
}

/// A required string attribute of the desired resource
pub(crate) fn required_str<'a>(resource: &'a Resource, key: &str) -> ProviderResult<&'a str> {
    resource.get_str(key).ok_or_else(|| {
        ProviderError::new(format!("Required attribute '{}' is missing", key))
            .for_resource(resource.id.clone())
    })
}

/// Whether a failed call reports the given service error
pub(crate) fn is_service_error<E>(err: &SdkError<E>, check: impl FnOnce(&E) -> bool) -> bool {
    err.as_service_error().is_some_and(check)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sextant_core::resource::Value;

    fn test_provider() -> SsmProvider {
        let config = aws_sdk_ssm::Config::builder()
            .behavior_version(aws_sdk_ssm::config::BehaviorVersion::latest())
            .region(aws_sdk_ssm::config::Region::new("us-west-2"))
            .build();
        SsmProvider::with_client(
            SsmClient::from_conf(config),
            ArnContext::new("us-west-2", "123456789012"),
        )
    }

    #[tokio::test]
    async fn read_without_identifier_is_not_found() {
        let provider = test_provider();
        let id = ResourceId::new("ssm_parameter", "db_host");
        let state = provider.read_resource(&id, None).await.unwrap();
        assert!(!state.exists);
    }

    #[tokio::test]
    async fn unknown_type_is_an_error() {
        let provider = test_provider();
        let id = ResourceId::new("ssm_widget", "w");
        let err = provider.read_resource(&id, Some("x")).await.unwrap_err();
        assert_eq!(err.to_string(), "[ssm_widget.w] Unknown resource type: ssm_widget");

        let query = Resource::data("ssm_widget", "w");
        assert!(provider.query_data_source(&query).await.is_err());
    }

    #[tokio::test]
    async fn patch_group_cannot_be_updated() {
        let provider = test_provider();
        let id = ResourceId::new("ssm_patch_group", "pg");
        let to = Resource::new("ssm_patch_group", "pg")
            .with_attribute("patch_group", Value::String("g".to_string()));
        let from = State::not_found(id.clone());
        let err = provider
            .update_resource(&id, "g,pb-1", &from, &to)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("replace"));
    }

    #[test]
    fn defaults_are_filled_before_calls() {
        let resource = Resource::new("ssm_parameter", "p")
            .with_attribute("name", Value::String("p".to_string()));
        let filled = with_schema_defaults(&resource);
        assert_eq!(filled.get_str("tier"), Some("Standard"));
        assert_eq!(filled.get_str("data_type"), Some("text"));
        assert!(filled.attributes.get("value").is_none());
    }

    #[test]
    fn required_str_names_missing_attribute() {
        let resource = Resource::new("ssm_document", "doc");
        let err = required_str(&resource, "content").unwrap_err();
        assert_eq!(
            err.to_string(),
            "[ssm_document.doc] Required attribute 'content' is missing"
        );
    }
}
