//! ssm_patch_baseline

use std::collections::HashMap;

use aws_sdk_ssm::error::BuildError;
use aws_sdk_ssm::operation::get_patch_baseline::GetPatchBaselineOutput;
use aws_sdk_ssm::types::{
    OperatingSystem, PatchAction, PatchComplianceLevel, PatchFilter, PatchFilterGroup,
    PatchFilterKey, PatchRule, PatchRuleGroup, ResourceTypeForTagging,
};
use sextant_core::provider::{ProviderError, ProviderResult};
use sextant_core::resource::{Resource, ResourceId, State, Value};

use super::{block_str, blocks, string_items};
use crate::arn::ArnContext;
use crate::provider::{SsmProvider, api_error, build_error, is_service_error, required_str};
use crate::tags::{tags_from_value, to_sdk_tags};

impl SsmProvider {
    pub(crate) async fn read_patch_baseline(
        &self,
        id: &ResourceId,
        baseline_id: &str,
    ) -> ProviderResult<State> {
        let Some(output) = self.get_patch_baseline(id, baseline_id).await? else {
            return Ok(State::not_found(id.clone()));
        };

        let mut attributes = patch_baseline_attributes(&output, &self.arns);
        attributes.insert(
            "tags".to_string(),
            self.read_tags(id, ResourceTypeForTagging::PatchBaseline, baseline_id)
                .await?,
        );

        Ok(State::existing(id.clone(), attributes).with_identifier(baseline_id))
    }

    /// GetPatchBaseline, `None` when the baseline does not exist
    pub(crate) async fn get_patch_baseline(
        &self,
        id: &ResourceId,
        baseline_id: &str,
    ) -> ProviderResult<Option<GetPatchBaselineOutput>> {
        match self
            .client
            .get_patch_baseline()
            .baseline_id(baseline_id)
            .send()
            .await
        {
            Ok(output) => Ok(Some(output)),
            Err(e)
                if is_service_error(&e, |e| {
                    e.is_does_not_exist_exception() || e.is_invalid_resource_id()
                }) =>
            {
                Ok(None)
            }
            Err(e) => Err(api_error(id, "GetPatchBaseline", e)),
        }
    }

    pub(crate) async fn create_patch_baseline(
        &self,
        resource: &Resource,
    ) -> ProviderResult<State> {
        let id = &resource.id;
        let attrs = &resource.attributes;

        let global_filters = patch_filter_group_from_value(attrs.get("global_filter"))
            .map_err(|e| build_error(id, e))?;
        let approval_rules = patch_rule_group_from_value(attrs.get("approval_rule"))
            .map_err(|e| build_error(id, e))?;

        let tags = tags_from_value(attrs.get("tags"));
        let sdk_tags = if tags.is_empty() {
            None
        } else {
            Some(to_sdk_tags(tags).map_err(|e| build_error(id, e))?)
        };

        let output = self
            .client
            .create_patch_baseline()
            .name(required_str(resource, "name")?)
            .set_description(resource.get_str("description").map(String::from))
            .set_operating_system(resource.get_str("operating_system").map(OperatingSystem::from))
            .set_approved_patches(string_items(attrs.get("approved_patches")))
            .set_rejected_patches(string_items(attrs.get("rejected_patches")))
            .set_approved_patches_compliance_level(
                resource
                    .get_str("approved_patches_compliance_level")
                    .map(PatchComplianceLevel::from),
            )
            .set_approved_patches_enable_non_security(
                resource.get_bool("approved_patches_enable_non_security"),
            )
            .set_rejected_patches_action(
                resource.get_str("rejected_patches_action").map(PatchAction::from),
            )
            .set_global_filters((!global_filters.patch_filters().is_empty()).then_some(global_filters))
            .set_approval_rules((!approval_rules.patch_rules().is_empty()).then_some(approval_rules))
            .set_tags(sdk_tags)
            .send()
            .await
            .map_err(|e| api_error(id, "CreatePatchBaseline", e))?;

        let baseline_id = output.baseline_id().ok_or_else(|| {
            ProviderError::new("CreatePatchBaseline returned no baseline ID").for_resource(id.clone())
        })?;
        log::info!("{}: created patch baseline {}", id, baseline_id);

        self.read_patch_baseline(id, baseline_id).await
    }

    pub(crate) async fn update_patch_baseline(
        &self,
        id: &ResourceId,
        baseline_id: &str,
        from: &State,
        to: &Resource,
    ) -> ProviderResult<State> {
        let attrs = &to.attributes;

        let global_filters = patch_filter_group_from_value(attrs.get("global_filter"))
            .map_err(|e| build_error(id, e))?;
        let approval_rules = patch_rule_group_from_value(attrs.get("approval_rule"))
            .map_err(|e| build_error(id, e))?;

        // Empty lists and groups clear what was configured before
        self.client
            .update_patch_baseline()
            .baseline_id(baseline_id)
            .name(required_str(to, "name")?)
            .set_description(to.get_str("description").map(String::from))
            .set_approved_patches(Some(string_items(attrs.get("approved_patches")).unwrap_or_default()))
            .set_rejected_patches(Some(string_items(attrs.get("rejected_patches")).unwrap_or_default()))
            .set_approved_patches_compliance_level(
                to.get_str("approved_patches_compliance_level")
                    .map(PatchComplianceLevel::from),
            )
            .set_approved_patches_enable_non_security(
                to.get_bool("approved_patches_enable_non_security"),
            )
            .set_rejected_patches_action(to.get_str("rejected_patches_action").map(PatchAction::from))
            .global_filters(global_filters)
            .approval_rules(approval_rules)
            .send()
            .await
            .map_err(|e| api_error(id, "UpdatePatchBaseline", e))?;

        self.sync_tags(
            id,
            ResourceTypeForTagging::PatchBaseline,
            baseline_id,
            &tags_from_value(from.attributes.get("tags")),
            &tags_from_value(attrs.get("tags")),
        )
        .await?;

        self.read_patch_baseline(id, baseline_id).await
    }

    pub(crate) async fn delete_patch_baseline(
        &self,
        id: &ResourceId,
        baseline_id: &str,
    ) -> ProviderResult<()> {
        let Some(output) = self.get_patch_baseline(id, baseline_id).await? else {
            return Ok(());
        };

        // A baseline still registered for a patch group cannot be deleted
        for patch_group in output.patch_groups() {
            log::info!(
                "{}: deregistering {} from patch group {}",
                id,
                baseline_id,
                patch_group
            );
            self.client
                .deregister_patch_baseline_for_patch_group()
                .baseline_id(baseline_id)
                .patch_group(patch_group)
                .send()
                .await
                .map_err(|e| api_error(id, "DeregisterPatchBaselineForPatchGroup", e))?;
        }

        self.client
            .delete_patch_baseline()
            .baseline_id(baseline_id)
            .send()
            .await
            .map_err(|e| api_error(id, "DeletePatchBaseline", e))?;
        Ok(())
    }
}

/// Build a filter group from a list of `{key, values}` blocks
pub fn patch_filter_group_from_value(value: Option<&Value>) -> Result<PatchFilterGroup, BuildError> {
    let filters = blocks(value)
        .into_iter()
        .map(|block| {
            PatchFilter::builder()
                .set_key(block_str(block, "key").map(PatchFilterKey::from))
                .set_values(string_items(block.get("values")))
                .build()
        })
        .collect::<Result<Vec<_>, _>>()?;

    PatchFilterGroup::builder()
        .set_patch_filters(Some(filters))
        .build()
}

/// Build a rule group from a list of `approval_rule` blocks
pub fn patch_rule_group_from_value(value: Option<&Value>) -> Result<PatchRuleGroup, BuildError> {
    let rules = blocks(value)
        .into_iter()
        .map(|block| {
            let filters = patch_filter_group_from_value(block.get("patch_filter"))?;
            Ok(PatchRule::builder()
                .patch_filter_group(filters)
                .set_approve_after_days(
                    block
                        .get("approve_after_days")
                        .and_then(Value::as_int)
                        .map(|days| days.clamp(0, 360) as i32),
                )
                .set_approve_until_date(block_str(block, "approve_until_date").map(String::from))
                .set_compliance_level(
                    block_str(block, "compliance_level").map(PatchComplianceLevel::from),
                )
                .set_enable_non_security(block.get("enable_non_security").and_then(Value::as_bool))
                .build())
        })
        .collect::<Result<Vec<_>, BuildError>>()?;

    PatchRuleGroup::builder().set_patch_rules(Some(rules)).build()
}

pub fn global_filters_to_value(group: Option<&PatchFilterGroup>) -> Value {
    Value::List(
        group
            .map(|g| g.patch_filters().iter().map(patch_filter_to_value).collect())
            .unwrap_or_default(),
    )
}

fn patch_filter_to_value(filter: &PatchFilter) -> Value {
    Value::Map(HashMap::from([
        (
            "key".to_string(),
            Value::String(filter.key().as_str().to_string()),
        ),
        (
            "values".to_string(),
            Value::string_list(filter.values().iter().cloned()),
        ),
    ]))
}

pub fn approval_rules_to_value(group: Option<&PatchRuleGroup>) -> Value {
    let rules = group.map(|g| g.patch_rules()).unwrap_or_default();
    Value::List(
        rules
            .iter()
            .map(|rule| {
                let mut block = HashMap::from([(
                    "patch_filter".to_string(),
                    global_filters_to_value(rule.patch_filter_group()),
                )]);
                if let Some(days) = rule.approve_after_days() {
                    block.insert("approve_after_days".to_string(), Value::Int(days as i64));
                }
                if let Some(date) = rule.approve_until_date() {
                    block.insert(
                        "approve_until_date".to_string(),
                        Value::String(date.to_string()),
                    );
                }
                if let Some(level) = rule.compliance_level() {
                    block.insert(
                        "compliance_level".to_string(),
                        Value::String(level.as_str().to_string()),
                    );
                }
                if let Some(enabled) = rule.enable_non_security() {
                    block.insert("enable_non_security".to_string(), Value::Bool(enabled));
                }
                Value::Map(block)
            })
            .collect(),
    )
}

/// State attributes GetPatchBaseline reports
pub fn patch_baseline_attributes(
    output: &GetPatchBaselineOutput,
    arns: &ArnContext,
) -> HashMap<String, Value> {
    let mut attributes = HashMap::new();
    let mut put = |key: &str, value: Option<&str>| {
        if let Some(v) = value {
            attributes.insert(key.to_string(), Value::String(v.to_string()));
        }
    };

    let baseline_id = output.baseline_id();
    put("arn", baseline_id.map(|b| arns.patch_baseline(b)).as_deref());
    put("name", output.name());
    put("description", output.description());
    put(
        "operating_system",
        output.operating_system().map(|o| o.as_str()),
    );
    put(
        "approved_patches_compliance_level",
        output.approved_patches_compliance_level().map(|l| l.as_str()),
    );
    put(
        "rejected_patches_action",
        output.rejected_patches_action().map(|a| a.as_str()),
    );

    if let Some(enabled) = output.approved_patches_enable_non_security() {
        attributes.insert(
            "approved_patches_enable_non_security".to_string(),
            Value::Bool(enabled),
        );
    }
    attributes.insert(
        "approved_patches".to_string(),
        Value::string_list(output.approved_patches().iter().cloned()),
    );
    attributes.insert(
        "rejected_patches".to_string(),
        Value::string_list(output.rejected_patches().iter().cloned()),
    );
    attributes.insert(
        "global_filter".to_string(),
        global_filters_to_value(output.global_filters()),
    );
    attributes.insert(
        "approval_rule".to_string(),
        approval_rules_to_value(output.approval_rules()),
    );
    attributes
}
