//! ssm_parameter

use std::collections::HashMap;

use aws_sdk_ssm::operation::put_parameter::builders::PutParameterFluentBuilder;
use aws_sdk_ssm::types::{
    Parameter, ParameterMetadata, ParameterStringFilter, ParameterTier, ParameterType,
    ResourceTypeForTagging,
};
use sextant_core::provider::{ProviderError, ProviderResult};
use sextant_core::resource::{Resource, ResourceId, State, Value};

use crate::provider::{SsmProvider, api_error, build_error, is_service_error, required_str};
use crate::schemas::parameter::should_update_parameter;
use crate::tags::{tags_from_value, to_sdk_tags};

/// Attributes that PutParameter sends
const PUT_ATTRIBUTES: &[&str] = &[
    "type",
    "value",
    "insecure_value",
    "description",
    "tier",
    "key_id",
    "allowed_pattern",
];

const INTELLIGENT_TIERING: &str = "Intelligent-Tiering";

impl SsmProvider {
    pub(crate) async fn read_parameter(
        &self,
        id: &ResourceId,
        name: &str,
        desired: Option<&Resource>,
    ) -> ProviderResult<State> {
        let output = match self
            .client
            .get_parameter()
            .name(name)
            .with_decryption(true)
            .send()
            .await
        {
            Ok(output) => output,
            Err(e) if is_service_error(&e, |e| e.is_parameter_not_found()) => {
                log::debug!("{}: parameter {} not found", id, name);
                return Ok(State::not_found(id.clone()));
            }
            Err(e) => return Err(api_error(id, "GetParameter", e)),
        };
        let Some(parameter) = output.parameter() else {
            return Ok(State::not_found(id.clone()));
        };

        // GetParameter leaves out description, tier and the KMS key
        let filter = ParameterStringFilter::builder()
            .key("Name")
            .option("Equals")
            .values(name)
            .build()
            .map_err(|e| build_error(id, e))?;
        let described = self
            .client
            .describe_parameters()
            .parameter_filters(filter)
            .send()
            .await
            .map_err(|e| api_error(id, "DescribeParameters", e))?;

        let insecure = desired.is_some_and(|d| d.attributes.contains_key("insecure_value"));
        let mut attributes = parameter_attributes(parameter, described.parameters().first(), insecure);

        attributes.insert(
            "tags".to_string(),
            self.read_tags(id, ResourceTypeForTagging::Parameter, name)
                .await?,
        );

        // The API reports the tier it picked, not the policy
        if let Some(desired) = desired
            && desired.get_str("tier") == Some(INTELLIGENT_TIERING)
        {
            attributes.insert(
                "tier".to_string(),
                Value::String(INTELLIGENT_TIERING.to_string()),
            );
        }

        let mut state = State::existing(id.clone(), attributes).with_identifier(name);
        if let Some(desired) = desired {
            state = state.with_config_attributes(desired, &["overwrite"]);
        }
        Ok(state)
    }

    pub(crate) async fn create_parameter(&self, resource: &Resource) -> ProviderResult<State> {
        let id = &resource.id;
        let name = required_str(resource, "name")?;
        let overwrite = should_update_parameter(true, resource.get_bool("overwrite"));
        let tags = tags_from_value(resource.attributes.get("tags"));

        let mut request = self.put_parameter_request(resource, name)?.overwrite(overwrite);
        // PutParameter rejects tags together with overwrite
        if !overwrite && !tags.is_empty() {
            let sdk_tags = to_sdk_tags(tags.clone()).map_err(|e| build_error(id, e))?;
            request = request.set_tags(Some(sdk_tags));
        }

        request.send().await.map_err(|e| api_error(id, "PutParameter", e))?;

        if overwrite {
            self.sync_tags(
                id,
                ResourceTypeForTagging::Parameter,
                name,
                &HashMap::new(),
                &tags,
            )
            .await?;
        }

        self.read_parameter(id, name, Some(resource)).await
    }

    pub(crate) async fn update_parameter(
        &self,
        id: &ResourceId,
        name: &str,
        from: &State,
        to: &Resource,
    ) -> ProviderResult<State> {
        let changed = PUT_ATTRIBUTES
            .iter()
            .any(|key| from.attributes.get(*key) != to.attributes.get(*key));

        if changed {
            let overwrite = should_update_parameter(false, to.get_bool("overwrite"));
            self.put_parameter_request(to, name)?
                .overwrite(overwrite)
                .send()
                .await
                .map_err(|e| api_error(id, "PutParameter", e))?;
        }

        self.sync_tags(
            id,
            ResourceTypeForTagging::Parameter,
            name,
            &tags_from_value(from.attributes.get("tags")),
            &tags_from_value(to.attributes.get("tags")),
        )
        .await?;

        self.read_parameter(id, name, Some(to)).await
    }

    pub(crate) async fn delete_parameter(&self, id: &ResourceId, name: &str) -> ProviderResult<()> {
        match self.client.delete_parameter().name(name).send().await {
            Ok(_) => Ok(()),
            Err(e) if is_service_error(&e, |e| e.is_parameter_not_found()) => Ok(()),
            Err(e) => Err(api_error(id, "DeleteParameter", e)),
        }
    }

    fn put_parameter_request(
        &self,
        resource: &Resource,
        name: &str,
    ) -> ProviderResult<PutParameterFluentBuilder> {
        let value = resource
            .get_str("value")
            .or_else(|| resource.get_str("insecure_value"))
            .ok_or_else(|| {
                ProviderError::new("One of 'value' or 'insecure_value' must be set")
                    .for_resource(resource.id.clone())
            })?;

        Ok(self
            .client
            .put_parameter()
            .name(name)
            .r#type(ParameterType::from(required_str(resource, "type")?))
            .value(value)
            .set_description(resource.get_str("description").map(String::from))
            .set_tier(resource.get_str("tier").map(ParameterTier::from))
            .set_key_id(resource.get_str("key_id").map(String::from))
            .set_allowed_pattern(resource.get_str("allowed_pattern").map(String::from))
            .set_data_type(resource.get_str("data_type").map(String::from)))
    }
}

/// State attributes of a parameter
///
/// The value lands in `insecure_value` only when the configuration uses it
/// and the parameter is not a SecureString.
pub fn parameter_attributes(
    parameter: &Parameter,
    metadata: Option<&ParameterMetadata>,
    insecure: bool,
) -> HashMap<String, Value> {
    let mut attributes = HashMap::new();
    let mut put = |key: &str, value: Option<&str>| {
        if let Some(v) = value {
            attributes.insert(key.to_string(), Value::String(v.to_string()));
        }
    };

    put("name", parameter.name());
    put("arn", parameter.arn());
    put("data_type", parameter.data_type());

    let kind = parameter.r#type().map(ParameterType::as_str);
    put("type", kind);

    let value_key = if insecure && kind != Some("SecureString") {
        "insecure_value"
    } else {
        "value"
    };
    put(value_key, parameter.value());

    if let Some(metadata) = metadata {
        put("description", metadata.description());
        put("tier", metadata.tier().map(ParameterTier::as_str));
        put("key_id", metadata.key_id());
        put("allowed_pattern", metadata.allowed_pattern());
    }

    attributes.insert("version".to_string(), Value::Int(parameter.version()));
    attributes
}
