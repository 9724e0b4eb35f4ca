//! Resource CRUD against the SSM API
//!
//! Each submodule adds `read_*`, `create_*`, `update_*` and `delete_*`
//! methods to [`SsmProvider`](crate::SsmProvider) for one resource type.

mod association;
mod document;
mod parameter;
mod patch_baseline;
mod patch_group;
mod service_setting;

pub use association::{association_attributes, association_request_parameters};
pub use document::document_attributes;
pub use parameter::parameter_attributes;
pub use patch_baseline::{
    approval_rules_to_value, global_filters_to_value, patch_baseline_attributes,
    patch_filter_group_from_value, patch_rule_group_from_value,
};

use std::collections::HashMap;

use aws_sdk_ssm::types::ResourceTypeForTagging;
use sextant_core::provider::ProviderResult;
use sextant_core::resource::{ResourceId, Value};

use crate::provider::{SsmProvider, api_error, build_error};
use crate::tags::{diff_tags, tags_to_value, to_sdk_tags};

impl SsmProvider {
    /// Current tags of a taggable SSM resource as a `tags` map value
    pub(crate) async fn read_tags(
        &self,
        id: &ResourceId,
        resource_type: ResourceTypeForTagging,
        resource_id: &str,
    ) -> ProviderResult<Value> {
        let output = self
            .client
            .list_tags_for_resource()
            .resource_type(resource_type)
            .resource_id(resource_id)
            .send()
            .await
            .map_err(|e| api_error(id, "ListTagsForResource", e))?;

        Ok(tags_to_value(output.tag_list()))
    }

    /// Apply tag changes between two `tags` maps
    pub(crate) async fn sync_tags(
        &self,
        id: &ResourceId,
        resource_type: ResourceTypeForTagging,
        resource_id: &str,
        old: &HashMap<String, String>,
        new: &HashMap<String, String>,
    ) -> ProviderResult<()> {
        let changes = diff_tags(old, new);
        if changes.is_empty() {
            return Ok(());
        }

        if !changes.remove.is_empty() {
            log::debug!("{}: removing tags {:?}", id, changes.remove);
            self.client
                .remove_tags_from_resource()
                .resource_type(resource_type.clone())
                .resource_id(resource_id)
                .set_tag_keys(Some(changes.remove))
                .send()
                .await
                .map_err(|e| api_error(id, "RemoveTagsFromResource", e))?;
        }

        if !changes.upsert.is_empty() {
            let tags = to_sdk_tags(changes.upsert).map_err(|e| build_error(id, e))?;
            self.client
                .add_tags_to_resource()
                .resource_type(resource_type)
                .resource_id(resource_id)
                .set_tags(Some(tags))
                .send()
                .await
                .map_err(|e| api_error(id, "AddTagsToResource", e))?;
        }

        Ok(())
    }
}

/// String items of a list attribute, `None` when unset
pub(crate) fn string_items(value: Option<&Value>) -> Option<Vec<String>> {
    value.map(Value::to_string_vec)
}

/// The map entries of a list-of-blocks attribute
pub(crate) fn blocks(value: Option<&Value>) -> Vec<&HashMap<String, Value>> {
    value
        .and_then(Value::as_list)
        .map(|items| items.iter().filter_map(Value::as_map).collect())
        .unwrap_or_default()
}

pub(crate) fn block_str<'a>(block: &'a HashMap<String, Value>, key: &str) -> Option<&'a str> {
    block.get(key).and_then(Value::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocks_skip_non_map_items() {
        let value = Value::List(vec![
            Value::Map(HashMap::from([(
                "key".to_string(),
                Value::String("tag:Env".to_string()),
            )])),
            Value::String("stray".to_string()),
        ]);
        let found = blocks(Some(&value));
        assert_eq!(found.len(), 1);
        assert_eq!(block_str(found[0], "key"), Some("tag:Env"));
        assert!(blocks(None).is_empty());
    }

    #[test]
    fn string_items_keep_order() {
        let value = Value::string_list(["KB1", "KB2"]);
        assert_eq!(
            string_items(Some(&value)),
            Some(vec!["KB1".to_string(), "KB2".to_string()])
        );
        assert_eq!(string_items(None), None);
    }
}
