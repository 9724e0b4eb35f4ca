//! Bring every resource in a state file up to its type's current schema version

use thiserror::Error;

use sextant_core::provider::ResourceType;
use sextant_core::upgrade::{MigrationError, upgrade_record};

use crate::state::StateFile;

#[derive(Debug, Error)]
pub enum UpgradeError {
    #[error("state contains {resource_type}.{name} but no such resource type is registered")]
    UnknownResourceType { resource_type: String, name: String },

    #[error("failed to upgrade {resource_type}.{name}: {source}")]
    Migration {
        resource_type: String,
        name: String,
        #[source]
        source: MigrationError,
    },
}

/// One resource that moved to a newer schema version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpgradedResource {
    pub resource_type: String,
    pub name: String,
    pub from_version: u32,
    pub to_version: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpgradeReport {
    pub upgraded: Vec<UpgradedResource>,
    pub unchanged: usize,
}

impl UpgradeReport {
    pub fn is_empty(&self) -> bool {
        self.upgraded.is_empty()
    }
}

/// Upgrade all resources in `state` using the upgraders registered on `types`.
///
/// Every record is upgraded before any is written back. If one fails, the
/// error is returned and `state` is left untouched.
pub fn upgrade_state(
    state: &mut StateFile,
    types: &[Box<dyn ResourceType>],
) -> Result<UpgradeReport, UpgradeError> {
    let mut staged = Vec::with_capacity(state.resources.len());
    let mut report = UpgradeReport::default();

    for (index, resource) in state.resources.iter().enumerate() {
        let resource_type = types
            .iter()
            .find(|t| t.name() == resource.resource_type)
            .ok_or_else(|| UpgradeError::UnknownResourceType {
                resource_type: resource.resource_type.clone(),
                name: resource.name.clone(),
            })?;

        let target = resource_type.schema_version();
        if resource.schema_version == target {
            report.unchanged += 1;
            continue;
        }

        let upgraded = upgrade_record(
            &resource.record(),
            target,
            &resource_type.state_upgraders(),
        )
        .map_err(|source| UpgradeError::Migration {
            resource_type: resource.resource_type.clone(),
            name: resource.name.clone(),
            source,
        })?;

        report.upgraded.push(UpgradedResource {
            resource_type: resource.resource_type.clone(),
            name: resource.name.clone(),
            from_version: resource.schema_version,
            to_version: upgraded.schema_version,
        });
        staged.push((index, upgraded));
    }

    for (index, record) in staged {
        let resource = &mut state.resources[index];
        log::info!(
            "upgraded {}.{} state from schema version {} to {}",
            resource.resource_type,
            resource.name,
            resource.schema_version,
            record.schema_version
        );
        resource.schema_version = record.schema_version;
        resource.attributes = record.attributes;
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::ResourceState;
    use sextant_core::flatmap::FlatState;
    use sextant_core::schema::ResourceSchema;
    use sextant_core::upgrade::{StateUpgrader, require};

    struct Composite;

    fn join_id(mut attrs: FlatState) -> Result<FlatState, MigrationError> {
        let id = format!("{},{}", require(&attrs, "a")?, require(&attrs, "b")?);
        attrs.insert("id".to_string(), id);
        Ok(attrs)
    }

    impl ResourceType for Composite {
        fn name(&self) -> &'static str {
            "composite"
        }

        fn schema(&self) -> ResourceSchema {
            ResourceSchema::new("composite").with_version(1)
        }

        fn state_upgraders(&self) -> Vec<StateUpgrader> {
            vec![StateUpgrader::new(0, join_id)]
        }
    }

    struct Plain;

    impl ResourceType for Plain {
        fn name(&self) -> &'static str {
            "plain"
        }

        fn schema(&self) -> ResourceSchema {
            ResourceSchema::new("plain")
        }
    }

    fn registry() -> Vec<Box<dyn ResourceType>> {
        vec![Box::new(Composite), Box::new(Plain)]
    }

    #[test]
    fn upgrades_old_records_and_reports() {
        let mut state = StateFile::new();
        state.upsert_resource(
            ResourceState::new("composite", "c", "test")
                .with_attribute("id", "x")
                .with_attribute("a", "x")
                .with_attribute("b", "y"),
        );
        state.upsert_resource(ResourceState::new("plain", "p", "test").with_attribute("id", "p1"));

        let report = upgrade_state(&mut state, &registry()).unwrap();

        assert_eq!(report.unchanged, 1);
        assert_eq!(
            report.upgraded,
            vec![UpgradedResource {
                resource_type: "composite".to_string(),
                name: "c".to_string(),
                from_version: 0,
                to_version: 1,
            }]
        );
        let upgraded = state.find_resource("composite", "c").unwrap();
        assert_eq!(upgraded.schema_version, 1);
        assert_eq!(upgraded.id(), Some("x,y"));
    }

    #[test]
    fn second_run_is_a_no_op() {
        let mut state = StateFile::new();
        state.upsert_resource(
            ResourceState::new("composite", "c", "test")
                .with_attribute("a", "x")
                .with_attribute("b", "y"),
        );

        upgrade_state(&mut state, &registry()).unwrap();
        let before = state.resources.clone();
        let report = upgrade_state(&mut state, &registry()).unwrap();

        assert!(report.is_empty());
        assert_eq!(state.resources, before);
    }

    #[test]
    fn failure_leaves_state_untouched() {
        let mut state = StateFile::new();
        state.upsert_resource(
            ResourceState::new("composite", "good", "test")
                .with_attribute("a", "x")
                .with_attribute("b", "y"),
        );
        state.upsert_resource(ResourceState::new("composite", "bad", "test").with_attribute("a", "x"));
        let before = state.resources.clone();

        let err = upgrade_state(&mut state, &registry()).unwrap_err();

        assert_eq!(
            err.to_string(),
            "failed to upgrade composite.bad: state record is missing required attribute 'b'"
        );
        assert_eq!(state.resources, before);
    }

    #[test]
    fn unknown_type_is_an_error() {
        let mut state = StateFile::new();
        state.upsert_resource(ResourceState::new("mystery", "m", "test"));

        let err = upgrade_state(&mut state, &registry()).unwrap_err();
        assert!(matches!(err, UpgradeError::UnknownResourceType { .. }));
    }
}
