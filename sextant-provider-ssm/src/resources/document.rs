//! ssm_document

use std::collections::{BTreeSet, HashMap};

use aws_sdk_ssm::primitives::DateTimeFormat;
use aws_sdk_ssm::types::{
    DocumentDescription, DocumentFormat, DocumentPermissionType, DocumentType,
    ResourceTypeForTagging,
};
use sextant_core::provider::ProviderResult;
use sextant_core::resource::{Resource, ResourceId, State, Value};

use crate::arn::ArnContext;
use crate::provider::{SsmProvider, api_error, build_error, is_service_error, required_str};
use crate::schemas::document::permission_account_ids;
use crate::tags::{tags_from_value, to_sdk_tags};

/// ModifyDocumentPermission accepts at most this many account IDs per call
const PERMISSION_BATCH: usize = 20;

/// Changing any of these publishes a new document version
const VERSIONED_ATTRIBUTES: &[&str] = &["content", "document_format", "target_type", "version_name"];

/// Account IDs to share with and to stop sharing with, batched per call
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct PermissionChanges {
    pub add: Vec<Vec<String>>,
    pub remove: Vec<Vec<String>>,
}

impl PermissionChanges {
    pub(crate) fn is_empty(&self) -> bool {
        self.add.is_empty() && self.remove.is_empty()
    }
}

/// Set difference between two sharing lists. Order and duplicates are ignored.
pub(crate) fn permission_changes(old: &[String], new: &[String]) -> PermissionChanges {
    let old: BTreeSet<&String> = old.iter().collect();
    let new: BTreeSet<&String> = new.iter().collect();

    let batches = |ids: Vec<&String>| -> Vec<Vec<String>> {
        ids.chunks(PERMISSION_BATCH)
            .map(|chunk| chunk.iter().map(|id| (*id).clone()).collect())
            .collect()
    };

    PermissionChanges {
        add: batches(new.difference(&old).copied().collect()),
        remove: batches(old.difference(&new).copied().collect()),
    }
}

impl SsmProvider {
    pub(crate) async fn read_document(
        &self,
        id: &ResourceId,
        name: &str,
    ) -> ProviderResult<State> {
        self.read_document_as(id, name, None).await
    }

    async fn read_document_as(
        &self,
        id: &ResourceId,
        name: &str,
        desired: Option<&Resource>,
    ) -> ProviderResult<State> {
        let described = match self.client.describe_document().name(name).send().await {
            Ok(output) => output,
            Err(e) if is_service_error(&e, |e| e.is_invalid_document()) => {
                return Ok(State::not_found(id.clone()));
            }
            Err(e) => return Err(api_error(id, "DescribeDocument", e)),
        };
        let Some(description) = described.document() else {
            return Ok(State::not_found(id.clone()));
        };

        let mut attributes = document_attributes(description, &self.arns);

        let content = self
            .client
            .get_document()
            .name(name)
            .set_document_format(description.document_format().cloned())
            .send()
            .await
            .map_err(|e| api_error(id, "GetDocument", e))?;
        if let Some(content) = content.content() {
            attributes.insert("content".to_string(), Value::String(content.to_string()));
        }

        let shared = self.document_account_ids(id, name).await?;
        if !shared.is_empty() {
            let configured = desired.map(|d| permission_account_ids(d.attributes.get("permissions")));
            let account_ids = match configured {
                // Keep the configured spelling when it names the same accounts
                Some(ids) if ids.iter().cloned().collect::<BTreeSet<_>>() == shared => {
                    ids.join(",")
                }
                _ => shared.into_iter().collect::<Vec<_>>().join(","),
            };
            attributes.insert(
                "permissions".to_string(),
                Value::Map(HashMap::from([
                    ("type".to_string(), Value::String("Share".to_string())),
                    ("account_ids".to_string(), Value::String(account_ids)),
                ])),
            );
        }

        attributes.insert(
            "tags".to_string(),
            self.read_tags(id, ResourceTypeForTagging::Document, name)
                .await?,
        );

        Ok(State::existing(id.clone(), attributes).with_identifier(name))
    }

    pub(crate) async fn create_document(&self, resource: &Resource) -> ProviderResult<State> {
        let id = &resource.id;
        let name = required_str(resource, "name")?;

        let tags = tags_from_value(resource.attributes.get("tags"));
        let sdk_tags = if tags.is_empty() {
            None
        } else {
            Some(to_sdk_tags(tags).map_err(|e| build_error(id, e))?)
        };

        self.client
            .create_document()
            .name(name)
            .content(required_str(resource, "content")?)
            .document_type(DocumentType::from(required_str(resource, "document_type")?))
            .set_document_format(resource.get_str("document_format").map(DocumentFormat::from))
            .set_target_type(resource.get_str("target_type").map(String::from))
            .set_version_name(resource.get_str("version_name").map(String::from))
            .set_tags(sdk_tags)
            .send()
            .await
            .map_err(|e| api_error(id, "CreateDocument", e))?;

        let account_ids = permission_account_ids(resource.attributes.get("permissions"));
        self.modify_document_permission(id, name, &permission_changes(&[], &account_ids))
            .await?;

        self.read_document_as(id, name, Some(resource)).await
    }

    pub(crate) async fn update_document(
        &self,
        id: &ResourceId,
        name: &str,
        from: &State,
        to: &Resource,
    ) -> ProviderResult<State> {
        let changed = VERSIONED_ATTRIBUTES
            .iter()
            .any(|key| from.attributes.get(*key) != to.attributes.get(*key));

        if changed {
            let updated = self
                .client
                .update_document()
                .name(name)
                .document_version("$LATEST")
                .content(required_str(to, "content")?)
                .set_document_format(to.get_str("document_format").map(DocumentFormat::from))
                .set_target_type(to.get_str("target_type").map(String::from))
                .set_version_name(to.get_str("version_name").map(String::from))
                .send()
                .await
                .map_err(|e| api_error(id, "UpdateDocument", e))?;

            if let Some(version) = updated
                .document_description()
                .and_then(|d| d.document_version())
            {
                log::info!("{}: publishing document version {}", id, version);
                self.client
                    .update_document_default_version()
                    .name(name)
                    .document_version(version)
                    .send()
                    .await
                    .map_err(|e| api_error(id, "UpdateDocumentDefaultVersion", e))?;
            }
        }

        let old_ids = permission_account_ids(from.attributes.get("permissions"));
        let new_ids = permission_account_ids(to.attributes.get("permissions"));
        self.modify_document_permission(id, name, &permission_changes(&old_ids, &new_ids))
            .await?;

        self.sync_tags(
            id,
            ResourceTypeForTagging::Document,
            name,
            &tags_from_value(from.attributes.get("tags")),
            &tags_from_value(to.attributes.get("tags")),
        )
        .await?;

        self.read_document_as(id, name, Some(to)).await
    }

    pub(crate) async fn delete_document(&self, id: &ResourceId, name: &str) -> ProviderResult<()> {
        // Shared documents must be unshared before deletion
        let shared: Vec<String> = self.document_account_ids(id, name).await?.into_iter().collect();
        self.modify_document_permission(id, name, &permission_changes(&shared, &[]))
            .await?;

        match self.client.delete_document().name(name).send().await {
            Ok(_) => Ok(()),
            Err(e) if is_service_error(&e, |e| e.is_invalid_document()) => Ok(()),
            Err(e) => Err(api_error(id, "DeleteDocument", e)),
        }
    }

    async fn document_account_ids(
        &self,
        id: &ResourceId,
        name: &str,
    ) -> ProviderResult<BTreeSet<String>> {
        match self
            .client
            .describe_document_permission()
            .name(name)
            .permission_type(DocumentPermissionType::Share)
            .send()
            .await
        {
            Ok(output) => Ok(output.account_ids().iter().cloned().collect()),
            Err(e) if is_service_error(&e, |e| e.is_invalid_document()) => Ok(BTreeSet::new()),
            Err(e) => Err(api_error(id, "DescribeDocumentPermission", e)),
        }
    }

    async fn modify_document_permission(
        &self,
        id: &ResourceId,
        name: &str,
        changes: &PermissionChanges,
    ) -> ProviderResult<()> {
        if changes.is_empty() {
            return Ok(());
        }
        for chunk in &changes.add {
            self.client
                .modify_document_permission()
                .name(name)
                .permission_type(DocumentPermissionType::Share)
                .set_account_ids_to_add(Some(chunk.clone()))
                .send()
                .await
                .map_err(|e| api_error(id, "ModifyDocumentPermission", e))?;
        }
        for chunk in &changes.remove {
            self.client
                .modify_document_permission()
                .name(name)
                .permission_type(DocumentPermissionType::Share)
                .set_account_ids_to_remove(Some(chunk.clone()))
                .send()
                .await
                .map_err(|e| api_error(id, "ModifyDocumentPermission", e))?;
        }
        Ok(())
    }
}

/// State attributes DescribeDocument reports
pub fn document_attributes(
    description: &DocumentDescription,
    arns: &ArnContext,
) -> HashMap<String, Value> {
    let mut attributes = HashMap::new();
    let mut put = |key: &str, value: Option<&str>| {
        if let Some(v) = value {
            attributes.insert(key.to_string(), Value::String(v.to_string()));
        }
    };

    let name = description.name();
    put("name", name);
    put("document_type", description.document_type().map(DocumentType::as_str));
    put("document_format", description.document_format().map(DocumentFormat::as_str));
    put("target_type", description.target_type());
    put("version_name", description.version_name());
    put("default_version", description.default_version());
    put("latest_version", description.latest_version());
    put("document_version", description.document_version());
    put("description", description.description());
    put("hash", description.hash());
    put("hash_type", description.hash_type().map(|h| h.as_str()));
    put("owner", description.owner());
    put("status", description.status().map(|s| s.as_str()));
    put("schema_version", description.schema_version());
    put("arn", name.map(|n| arns.document(n)).as_deref());

    let created = description
        .created_date()
        .and_then(|d| d.fmt(DateTimeFormat::DateTime).ok());
    put("created_date", created.as_deref());

    attributes.insert(
        "platform_types".to_string(),
        Value::string_list(description.platform_types().iter().map(|p| p.as_str())),
    );
    attributes
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_ssm::types::{DocumentStatus, PlatformType};

    fn arns() -> ArnContext {
        ArnContext::new("us-west-2", "123456789012")
    }

    #[test]
    fn attributes_from_description() {
        let description = DocumentDescription::builder()
            .name("test_document-1")
            .document_type(DocumentType::Command)
            .document_format(DocumentFormat::Json)
            .status(DocumentStatus::Active)
            .schema_version("2.2")
            .default_version("1")
            .latest_version("1")
            .platform_types(PlatformType::Linux)
            .build();

        let attrs = document_attributes(&description, &arns());
        assert_eq!(
            attrs["arn"],
            Value::String(
                "arn:aws:ssm:us-west-2:123456789012:document/test_document-1".to_string()
            )
        );
        assert_eq!(attrs["document_type"], Value::String("Command".to_string()));
        assert_eq!(attrs["status"], Value::String("Active".to_string()));
        assert_eq!(attrs["platform_types"], Value::string_list(["Linux"]));
        assert!(!attrs.contains_key("created_date"));
    }

    fn ids(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn permission_reorder_is_not_a_change() {
        let changes = permission_changes(
            &ids(&["111111111111", "222222222222"]),
            &ids(&["222222222222", "111111111111", "111111111111"]),
        );
        assert!(changes.is_empty());
    }

    #[test]
    fn permission_additions_and_removals() {
        let changes = permission_changes(
            &ids(&["111111111111", "222222222222"]),
            &ids(&["222222222222", "333333333333"]),
        );
        assert_eq!(
            changes,
            PermissionChanges {
                add: vec![ids(&["333333333333"])],
                remove: vec![ids(&["111111111111"])],
            }
        );
    }

    #[test]
    fn permissions_are_batched_by_twenty() {
        let many: Vec<String> = (0..45).map(|i| format!("{:012}", i)).collect();

        let changes = permission_changes(&[], &many);
        let sizes: Vec<usize> = changes.add.iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![20, 20, 5]);
        assert_eq!(changes.add.concat(), many);
        assert!(changes.remove.is_empty());

        let unshare = permission_changes(&many, &[]);
        assert_eq!(unshare.remove.len(), 3);
        assert!(unshare.add.is_empty());
    }

    #[test]
    fn aws_owned_documents_use_their_name_as_arn() {
        let description = DocumentDescription::builder()
            .name("AWS-RunShellScript")
            .build();
        let attrs = document_attributes(&description, &arns());
        assert_eq!(attrs["arn"], Value::String("AWS-RunShellScript".to_string()));
    }
}
