//! ssm_service_setting
//!
//! Service settings always exist; "deleting" one resets it to the AWS default.

use std::collections::HashMap;

use aws_sdk_ssm::types::ServiceSetting;
use sextant_core::provider::ProviderResult;
use sextant_core::resource::{Resource, ResourceId, State, Value};

use crate::provider::{SsmProvider, api_error, is_service_error, required_str};

impl SsmProvider {
    pub(crate) async fn read_service_setting(
        &self,
        id: &ResourceId,
        setting_id: &str,
    ) -> ProviderResult<State> {
        let output = match self
            .client
            .get_service_setting()
            .setting_id(setting_id)
            .send()
            .await
        {
            Ok(output) => output,
            Err(e) if is_service_error(&e, |e| e.is_service_setting_not_found()) => {
                return Ok(State::not_found(id.clone()));
            }
            Err(e) => return Err(api_error(id, "GetServiceSetting", e)),
        };
        let Some(setting) = output.service_setting() else {
            return Ok(State::not_found(id.clone()));
        };

        let attributes = service_setting_attributes(setting_id, setting);
        Ok(State::existing(id.clone(), attributes).with_identifier(setting_id))
    }

    pub(crate) async fn create_service_setting(
        &self,
        resource: &Resource,
    ) -> ProviderResult<State> {
        let setting_id = required_str(resource, "setting_id")?;
        self.put_service_setting(&resource.id, setting_id, resource)
            .await
    }

    pub(crate) async fn update_service_setting(
        &self,
        id: &ResourceId,
        setting_id: &str,
        to: &Resource,
    ) -> ProviderResult<State> {
        self.put_service_setting(id, setting_id, to).await
    }

    async fn put_service_setting(
        &self,
        id: &ResourceId,
        setting_id: &str,
        resource: &Resource,
    ) -> ProviderResult<State> {
        self.client
            .update_service_setting()
            .setting_id(setting_id)
            .setting_value(required_str(resource, "setting_value")?)
            .send()
            .await
            .map_err(|e| api_error(id, "UpdateServiceSetting", e))?;

        self.read_service_setting(id, setting_id).await
    }

    pub(crate) async fn delete_service_setting(
        &self,
        id: &ResourceId,
        setting_id: &str,
    ) -> ProviderResult<()> {
        log::info!("{}: resetting {} to its default", id, setting_id);
        self.client
            .reset_service_setting()
            .setting_id(setting_id)
            .send()
            .await
            .map_err(|e| api_error(id, "ResetServiceSetting", e))?;
        Ok(())
    }
}

/// `setting_id` keeps the form it was configured with (ID or ARN)
fn service_setting_attributes(setting_id: &str, setting: &ServiceSetting) -> HashMap<String, Value> {
    let mut attributes = HashMap::from([(
        "setting_id".to_string(),
        Value::String(setting_id.to_string()),
    )]);
    for (key, value) in [
        ("setting_value", setting.setting_value()),
        ("arn", setting.arn()),
        ("status", setting.status()),
    ] {
        if let Some(v) = value {
            attributes.insert(key.to_string(), Value::String(v.to_string()));
        }
    }
    attributes
}
