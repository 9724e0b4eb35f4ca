//! ssm_patch_group

use std::collections::HashMap;

use aws_sdk_ssm::types::PatchGroupPatchBaselineMapping;
use sextant_core::provider::{ProviderError, ProviderResult};
use sextant_core::resource::{Resource, ResourceId, State, Value};

use crate::ids::{InvalidIdError, parse_patch_group_id, patch_group_id};
use crate::provider::{SsmProvider, api_error, is_service_error, required_str};

impl SsmProvider {
    pub(crate) async fn read_patch_group(
        &self,
        id: &ResourceId,
        identifier: &str,
    ) -> ProviderResult<State> {
        let (patch_group, baseline_id) =
            parse_patch_group_id(identifier).map_err(|e| invalid_id(id, e))?;

        let mut next_token: Option<String> = None;
        loop {
            let output = self
                .client
                .describe_patch_groups()
                .set_next_token(next_token.take())
                .send()
                .await
                .map_err(|e| api_error(id, "DescribePatchGroups", e))?;

            if output
                .mappings()
                .iter()
                .any(|m| is_registration(m, patch_group, baseline_id))
            {
                let attributes = HashMap::from([
                    (
                        "patch_group".to_string(),
                        Value::String(patch_group.to_string()),
                    ),
                    (
                        "baseline_id".to_string(),
                        Value::String(baseline_id.to_string()),
                    ),
                ]);
                return Ok(State::existing(id.clone(), attributes).with_identifier(identifier));
            }

            match output.next_token() {
                Some(token) => next_token = Some(token.to_string()),
                None => break,
            }
        }

        Ok(State::not_found(id.clone()))
    }

    pub(crate) async fn create_patch_group(&self, resource: &Resource) -> ProviderResult<State> {
        let id = &resource.id;
        let patch_group = required_str(resource, "patch_group")?;
        let baseline_id = required_str(resource, "baseline_id")?;

        self.client
            .register_patch_baseline_for_patch_group()
            .baseline_id(baseline_id)
            .patch_group(patch_group)
            .send()
            .await
            .map_err(|e| api_error(id, "RegisterPatchBaselineForPatchGroup", e))?;

        let identifier = patch_group_id(patch_group, baseline_id);
        let attributes = HashMap::from([
            (
                "patch_group".to_string(),
                Value::String(patch_group.to_string()),
            ),
            (
                "baseline_id".to_string(),
                Value::String(baseline_id.to_string()),
            ),
        ]);
        Ok(State::existing(id.clone(), attributes).with_identifier(identifier))
    }

    pub(crate) async fn delete_patch_group(
        &self,
        id: &ResourceId,
        identifier: &str,
    ) -> ProviderResult<()> {
        let (patch_group, baseline_id) =
            parse_patch_group_id(identifier).map_err(|e| invalid_id(id, e))?;

        match self
            .client
            .deregister_patch_baseline_for_patch_group()
            .baseline_id(baseline_id)
            .patch_group(patch_group)
            .send()
            .await
        {
            Ok(_) => Ok(()),
            Err(e) if is_service_error(&e, |e| e.is_invalid_resource_id()) => Ok(()),
            Err(e) => Err(api_error(id, "DeregisterPatchBaselineForPatchGroup", e)),
        }
    }
}

fn is_registration(
    mapping: &PatchGroupPatchBaselineMapping,
    patch_group: &str,
    baseline_id: &str,
) -> bool {
    mapping.patch_group() == Some(patch_group)
        && mapping
            .baseline_identity()
            .and_then(|b| b.baseline_id())
            == Some(baseline_id)
}

fn invalid_id(id: &ResourceId, err: InvalidIdError) -> ProviderError {
    ProviderError::new(err.to_string())
        .for_resource(id.clone())
        .with_cause(err)
}
