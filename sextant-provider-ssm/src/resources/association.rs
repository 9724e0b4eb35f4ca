//! ssm_association

use std::collections::HashMap;
use std::time::Duration;

use aws_sdk_ssm::types::{
    AssociationComplianceSeverity, AssociationDescription, AssociationSyncCompliance,
    InstanceAssociationOutputLocation, S3OutputLocation, Target,
};
use sextant_core::provider::{ProviderError, ProviderResult};
use sextant_core::resource::{Resource, ResourceId, State, Value};

use super::{block_str, blocks, string_items};
use crate::arn::ArnContext;
use crate::provider::{SsmProvider, api_error, is_service_error, required_str};

const POLL_DELAY: Duration = Duration::from_secs(5);

impl SsmProvider {
    pub(crate) async fn read_association(
        &self,
        id: &ResourceId,
        association_id: &str,
    ) -> ProviderResult<State> {
        let output = match self
            .client
            .describe_association()
            .association_id(association_id)
            .send()
            .await
        {
            Ok(output) => output,
            Err(e) if is_service_error(&e, |e| e.is_association_does_not_exist()) => {
                return Ok(State::not_found(id.clone()));
            }
            Err(e) => return Err(api_error(id, "DescribeAssociation", e)),
        };
        let Some(description) = output.association_description() else {
            return Ok(State::not_found(id.clone()));
        };

        let attributes = association_attributes(description, &self.arns);
        Ok(State::existing(id.clone(), attributes).with_identifier(association_id))
    }

    pub(crate) async fn create_association(&self, resource: &Resource) -> ProviderResult<State> {
        let id = &resource.id;
        let attrs = &resource.attributes;

        let output = self
            .client
            .create_association()
            .name(required_str(resource, "name")?)
            .set_association_name(resource.get_str("association_name").map(String::from))
            .set_instance_id(resource.get_str("instance_id").map(String::from))
            .set_document_version(resource.get_str("document_version").map(String::from))
            .set_schedule_expression(resource.get_str("schedule_expression").map(String::from))
            .set_parameters(association_request_parameters(attrs.get("parameters")))
            .set_targets(targets_from_value(attrs.get("targets")))
            .set_output_location(output_location_from_value(attrs.get("output_location")))
            .set_compliance_severity(
                resource
                    .get_str("compliance_severity")
                    .map(AssociationComplianceSeverity::from),
            )
            .set_max_concurrency(resource.get_str("max_concurrency").map(String::from))
            .set_max_errors(resource.get_str("max_errors").map(String::from))
            .set_automation_target_parameter_name(
                resource
                    .get_str("automation_target_parameter_name")
                    .map(String::from),
            )
            .set_apply_only_at_cron_interval(resource.get_bool("apply_only_at_cron_interval"))
            .set_sync_compliance(
                resource
                    .get_str("sync_compliance")
                    .map(AssociationSyncCompliance::from),
            )
            .send()
            .await
            .map_err(|e| api_error(id, "CreateAssociation", e))?;

        let association_id = output
            .association_description()
            .and_then(|d| d.association_id())
            .ok_or_else(|| {
                ProviderError::new("CreateAssociation returned no association ID")
                    .for_resource(id.clone())
            })?
            .to_string();
        log::info!("{}: created association {}", id, association_id);

        if let Some(seconds) = resource.get_int("wait_for_success_timeout_seconds") {
            let timeout = Duration::from_secs(seconds.max(0) as u64);
            self.wait_for_association_success(id, &association_id, timeout)
                .await?;
        }

        let state = self.read_association(id, &association_id).await?;
        Ok(state.with_config_attributes(resource, &["wait_for_success_timeout_seconds"]))
    }

    pub(crate) async fn update_association(
        &self,
        id: &ResourceId,
        association_id: &str,
        to: &Resource,
    ) -> ProviderResult<State> {
        let attrs = &to.attributes;

        // UpdateAssociation replaces every field; unset ones are cleared
        self.client
            .update_association()
            .association_id(association_id)
            .name(required_str(to, "name")?)
            .set_association_name(to.get_str("association_name").map(String::from))
            .set_document_version(to.get_str("document_version").map(String::from))
            .set_schedule_expression(to.get_str("schedule_expression").map(String::from))
            .set_parameters(association_request_parameters(attrs.get("parameters")))
            .set_targets(targets_from_value(attrs.get("targets")))
            .set_output_location(output_location_from_value(attrs.get("output_location")))
            .set_compliance_severity(
                to.get_str("compliance_severity")
                    .map(AssociationComplianceSeverity::from),
            )
            .set_max_concurrency(to.get_str("max_concurrency").map(String::from))
            .set_max_errors(to.get_str("max_errors").map(String::from))
            .set_automation_target_parameter_name(
                to.get_str("automation_target_parameter_name")
                    .map(String::from),
            )
            .set_apply_only_at_cron_interval(to.get_bool("apply_only_at_cron_interval"))
            .set_sync_compliance(
                to.get_str("sync_compliance")
                    .map(AssociationSyncCompliance::from),
            )
            .send()
            .await
            .map_err(|e| api_error(id, "UpdateAssociation", e))?;

        let state = self.read_association(id, association_id).await?;
        Ok(state.with_config_attributes(to, &["wait_for_success_timeout_seconds"]))
    }

    pub(crate) async fn delete_association(
        &self,
        id: &ResourceId,
        association_id: &str,
    ) -> ProviderResult<()> {
        match self
            .client
            .delete_association()
            .association_id(association_id)
            .send()
            .await
        {
            Ok(_) => Ok(()),
            Err(e) if is_service_error(&e, |e| e.is_association_does_not_exist()) => Ok(()),
            Err(e) => Err(api_error(id, "DeleteAssociation", e)),
        }
    }

    /// Poll the association overview until it reports Success
    async fn wait_for_association_success(
        &self,
        id: &ResourceId,
        association_id: &str,
        timeout: Duration,
    ) -> ProviderResult<()> {
        let max_attempts = timeout.as_secs().div_ceil(POLL_DELAY.as_secs()).max(1);

        for attempt in 0..max_attempts {
            let output = self
                .client
                .describe_association()
                .association_id(association_id)
                .send()
                .await
                .map_err(|e| api_error(id, "DescribeAssociation", e))?;

            let overview = output
                .association_description()
                .and_then(|d| d.overview());
            let status = overview.and_then(|o| o.status());

            match status {
                Some("Success") => return Ok(()),
                Some("Failed") => {
                    let detail = overview
                        .and_then(|o| o.detailed_status())
                        .unwrap_or("no details");
                    return Err(ProviderError::new(format!(
                        "Association {} failed: {}",
                        association_id, detail
                    ))
                    .for_resource(id.clone()));
                }
                _ => {
                    log::debug!(
                        "{}: association {} is {} (attempt {}/{})",
                        id,
                        association_id,
                        status.unwrap_or("Pending"),
                        attempt + 1,
                        max_attempts
                    );
                    tokio::time::sleep(POLL_DELAY).await;
                }
            }
        }

        Err(ProviderError::new(format!(
            "Timed out after {}s waiting for association {} to succeed",
            timeout.as_secs(),
            association_id
        ))
        .for_resource(id.clone()))
    }
}

/// The `parameters` map as the API expects it, one value per key
pub fn association_request_parameters(
    value: Option<&Value>,
) -> Option<HashMap<String, Vec<String>>> {
    let map = value.and_then(Value::as_map)?;
    Some(
        map.iter()
            .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), vec![s.to_string()])))
            .collect(),
    )
}

fn targets_from_value(value: Option<&Value>) -> Option<Vec<Target>> {
    let targets: Vec<Target> = blocks(value)
        .into_iter()
        .map(|block| {
            Target::builder()
                .set_key(block_str(block, "key").map(String::from))
                .set_values(string_items(block.get("values")))
                .build()
        })
        .collect();
    (!targets.is_empty()).then_some(targets)
}

fn output_location_from_value(value: Option<&Value>) -> Option<InstanceAssociationOutputLocation> {
    let block = blocks(value).into_iter().next()?;
    let s3 = S3OutputLocation::builder()
        .set_output_s3_bucket_name(block_str(block, "s3_bucket_name").map(String::from))
        .set_output_s3_key_prefix(block_str(block, "s3_key_prefix").map(String::from))
        .set_output_s3_region(block_str(block, "s3_region").map(String::from))
        .build();
    Some(
        InstanceAssociationOutputLocation::builder()
            .s3_location(s3)
            .build(),
    )
}

/// State attributes of an association
///
/// `parameters`, `targets` and `output_location` are always present so an
/// empty configuration compares equal to an empty API response.
pub fn association_attributes(
    description: &AssociationDescription,
    arns: &ArnContext,
) -> HashMap<String, Value> {
    let mut attributes = HashMap::new();
    let mut put = |key: &str, value: Option<&str>| {
        if let Some(v) = value {
            attributes.insert(key.to_string(), Value::String(v.to_string()));
        }
    };

    let association_id = description.association_id();
    put("association_id", association_id);
    put("arn", association_id.map(|a| arns.association(a)).as_deref());
    put("name", description.name());
    put("association_name", description.association_name());
    put("instance_id", description.instance_id());
    put("document_version", description.document_version());
    put("schedule_expression", description.schedule_expression());
    put("max_concurrency", description.max_concurrency());
    put("max_errors", description.max_errors());
    put(
        "automation_target_parameter_name",
        description.automation_target_parameter_name(),
    );
    put(
        "compliance_severity",
        description.compliance_severity().map(|c| c.as_str()),
    );
    put("sync_compliance", description.sync_compliance().map(|s| s.as_str()));

    attributes.insert(
        "apply_only_at_cron_interval".to_string(),
        Value::Bool(description.apply_only_at_cron_interval()),
    );

    let parameters = description
        .parameters()
        .map(|params| {
            params
                .iter()
                .map(|(k, v)| (k.clone(), Value::String(v.join(","))))
                .collect()
        })
        .unwrap_or_default();
    attributes.insert("parameters".to_string(), Value::Map(parameters));

    let targets = description
        .targets()
        .iter()
        .map(|t| {
            Value::Map(HashMap::from([
                (
                    "key".to_string(),
                    Value::String(t.key().unwrap_or_default().to_string()),
                ),
                ("values".to_string(), Value::string_list(t.values().iter().cloned())),
            ]))
        })
        .collect();
    attributes.insert("targets".to_string(), Value::List(targets));

    let output_location = description
        .output_location()
        .and_then(|o| o.s3_location())
        .map(|s3| {
            let mut block = HashMap::new();
            let mut set = |key: &str, value: Option<&str>| {
                if let Some(v) = value {
                    block.insert(key.to_string(), Value::String(v.to_string()));
                }
            };
            set("s3_bucket_name", s3.output_s3_bucket_name());
            set("s3_key_prefix", s3.output_s3_key_prefix());
            set("s3_region", s3.output_s3_region());
            vec![Value::Map(block)]
        })
        .unwrap_or_default();
    attributes.insert("output_location".to_string(), Value::List(output_location));

    attributes
}
