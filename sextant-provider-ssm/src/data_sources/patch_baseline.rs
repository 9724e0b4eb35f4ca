//! ssm_patch_baseline data source

use aws_sdk_ssm::types::{PatchBaselineIdentity, PatchOrchestratorFilter};
use sextant_core::provider::{ProviderError, ProviderResult};
use sextant_core::resource::{Resource, State, Value};

use super::not_found;
use crate::provider::{SsmProvider, api_error, required_str};
use crate::resources::patch_baseline_attributes;

impl SsmProvider {
    pub(crate) async fn query_patch_baseline(&self, query: &Resource) -> ProviderResult<State> {
        let id = &query.id;
        let owner = required_str(query, "owner")?;

        let mut filters = vec![
            PatchOrchestratorFilter::builder()
                .key("OWNER")
                .values(owner)
                .build(),
        ];
        if let Some(prefix) = query.get_str("name_prefix") {
            filters.push(
                PatchOrchestratorFilter::builder()
                    .key("NAME_PREFIX")
                    .values(prefix)
                    .build(),
            );
        }

        let mut identities: Vec<PatchBaselineIdentity> = Vec::new();
        let mut next_token: Option<String> = None;
        loop {
            let output = self
                .client
                .describe_patch_baselines()
                .set_filters(Some(filters.clone()))
                .set_next_token(next_token.take())
                .send()
                .await
                .map_err(|e| api_error(id, "DescribePatchBaselines", e))?;

            identities.extend(output.baseline_identities().iter().cloned());

            match output.next_token() {
                Some(token) => next_token = Some(token.to_string()),
                None => break,
            }
        }

        let selected = select_patch_baseline(
            &identities,
            query.get_bool("default_baseline"),
            query.get_str("operating_system"),
        )
        .map_err(|message| ProviderError::new(message).for_resource(id.clone()))?;

        let baseline_id = selected.baseline_id().unwrap_or_default().to_string();
        let Some(output) = self.get_patch_baseline(id, &baseline_id).await? else {
            return Err(not_found(query, &format!("Patch baseline {}", baseline_id)));
        };

        let mut attributes = patch_baseline_attributes(&output, &self.arns);
        attributes.insert("id".to_string(), Value::String(baseline_id.clone()));
        attributes.insert("owner".to_string(), Value::String(owner.to_string()));
        attributes.insert(
            "default_baseline".to_string(),
            Value::Bool(selected.default_baseline()),
        );
        if let Some(prefix) = query.get_str("name_prefix") {
            attributes.insert("name_prefix".to_string(), Value::String(prefix.to_string()));
        }

        Ok(State::existing(id.clone(), attributes).with_identifier(baseline_id))
    }
}

/// Narrow the baselines a query matched to exactly one
pub fn select_patch_baseline<'a>(
    identities: &'a [PatchBaselineIdentity],
    default_baseline: Option<bool>,
    operating_system: Option<&str>,
) -> Result<&'a PatchBaselineIdentity, String> {
    let mut matches = identities.iter().filter(|identity| {
        default_baseline.is_none_or(|d| identity.default_baseline() == d)
            && operating_system
                .is_none_or(|os| identity.operating_system().map(|o| o.as_str()) == Some(os))
    });

    match (matches.next(), matches.next()) {
        (Some(identity), None) => Ok(identity),
        (None, _) => {
            Err("Your query returned no results. Please change your search criteria and try again."
                .to_string())
        }
        (Some(_), Some(_)) => Err(
            "Your query returned more than one result. Please try a more specific search criteria."
                .to_string(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_ssm::types::OperatingSystem;

    fn identity(id: &str, os: OperatingSystem, default: bool) -> PatchBaselineIdentity {
        PatchBaselineIdentity::builder()
            .baseline_id(id)
            .baseline_name(format!("{}-name", id))
            .operating_system(os)
            .default_baseline(default)
            .build()
    }

    fn baselines() -> Vec<PatchBaselineIdentity> {
        vec![
            identity("pb-win", OperatingSystem::Windows, true),
            identity("pb-al2", OperatingSystem::AmazonLinux2, true),
            identity("pb-al2-custom", OperatingSystem::AmazonLinux2, false),
        ]
    }

    #[test]
    fn filters_by_default_and_operating_system() {
        let found = baselines();
        let selected = select_patch_baseline(&found, Some(true), Some("AMAZON_LINUX_2")).unwrap();
        assert_eq!(selected.baseline_id(), Some("pb-al2"));
    }

    #[test]
    fn more_than_one_result_is_an_error() {
        let found = baselines();
        let err = select_patch_baseline(&found, None, Some("AMAZON_LINUX_2")).unwrap_err();
        assert!(err.contains("more than one result"));
    }

    #[test]
    fn no_results_is_an_error() {
        let err = select_patch_baseline(&[], None, None).unwrap_err();
        assert!(err.contains("no results"));

        let found = baselines();
        let err = select_patch_baseline(&found, Some(false), Some("WINDOWS")).unwrap_err();
        assert!(err.contains("no results"));
    }
}
