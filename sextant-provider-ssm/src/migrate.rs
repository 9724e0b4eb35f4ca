//! State upgraders for SSM resources whose persisted layout changed
//!
//! - `ssm_association` v0 stored the document name as `id`. From v1 the
//!   identifier is the association ID.
//! - `ssm_patch_group` v0 stored the patch group name as `id`. From v1 the
//!   identifier is `<patch_group>,<baseline_id>`.

use sextant_core::flatmap::FlatState;
use sextant_core::upgrade::{MigrationError, StateUpgrader, require};

use crate::ids;

/// Migrate an association record written under `version`
pub fn migrate_association_state(
    version: u32,
    attributes: FlatState,
) -> Result<FlatState, MigrationError> {
    match version {
        0 => {
            log::info!("found ssm_association state v0; migrating to v1");
            migrate_association_state_v0(attributes)
        }
        other => Err(MigrationError::UnexpectedVersion(other)),
    }
}

fn migrate_association_state_v0(mut attributes: FlatState) -> Result<FlatState, MigrationError> {
    let association_id = require(&attributes, "association_id")?.to_string();
    attributes.insert("id".to_string(), association_id);
    Ok(attributes)
}

pub fn upgrade_patch_group_state_v0(
    mut attributes: FlatState,
) -> Result<FlatState, MigrationError> {
    let id = ids::patch_group_id(
        require(&attributes, "patch_group")?,
        require(&attributes, "baseline_id")?,
    );
    attributes.insert("id".to_string(), id);
    Ok(attributes)
}

pub fn association_upgraders() -> Vec<StateUpgrader> {
    vec![StateUpgrader::new(0, |attributes| {
        migrate_association_state(0, attributes)
    })]
}

pub fn patch_group_upgraders() -> Vec<StateUpgrader> {
    vec![StateUpgrader::new(0, upgrade_patch_group_state_v0)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use sextant_core::upgrade::{StateRecord, upgrade_record};

    fn flat(pairs: &[(&str, &str)]) -> FlatState {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn patch_group_v0_gets_composite_id() {
        let v0 = flat(&[
            ("id", "testgroup"),
            ("baseline_id", "pb-12345"),
            ("patch_group", "testgroup"),
        ]);

        let v1 = upgrade_patch_group_state_v0(v0).unwrap();

        assert_eq!(
            v1,
            flat(&[
                ("id", "testgroup,pb-12345"),
                ("baseline_id", "pb-12345"),
                ("patch_group", "testgroup"),
            ])
        );
    }

    #[test]
    fn patch_group_upgrade_is_idempotent() {
        let v0 = flat(&[
            ("id", "testgroup"),
            ("baseline_id", "pb-12345"),
            ("patch_group", "testgroup"),
        ]);
        let once = upgrade_patch_group_state_v0(v0).unwrap();
        let twice = upgrade_patch_group_state_v0(once.clone()).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn patch_group_upgrade_requires_both_parts() {
        let err = upgrade_patch_group_state_v0(flat(&[("patch_group", "g")])).unwrap_err();
        assert_eq!(err, MigrationError::MissingAttribute("baseline_id".to_string()));

        let err = upgrade_patch_group_state_v0(flat(&[("baseline_id", "pb-1")])).unwrap_err();
        assert_eq!(err, MigrationError::MissingAttribute("patch_group".to_string()));
    }

    #[test]
    fn association_v0_id_is_association_id() {
        let v0 = flat(&[
            ("id", "AWS-RunShellScript"),
            ("association_id", "fb03b7e2-0d6a-4a79-9d9c-6b3b5f5c0b1e"),
            ("name", "AWS-RunShellScript"),
            ("targets.#", "1"),
        ]);

        let v1 = migrate_association_state(0, v0.clone()).unwrap();

        assert_eq!(v1["id"], v0["association_id"]);
        assert_eq!(v1["name"], "AWS-RunShellScript");
        assert_eq!(v1["targets.#"], "1");
        assert_eq!(v1.len(), v0.len());
    }

    #[test]
    fn association_migration_is_idempotent() {
        let v0 = flat(&[("id", "doc"), ("association_id", "assoc-1")]);
        let once = migrate_association_state(0, v0).unwrap();
        let twice = migrate_association_state(0, once.clone()).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn association_migration_rejects_unknown_versions() {
        let attrs = flat(&[("association_id", "assoc-1")]);
        for version in [1, 2, 7] {
            assert_eq!(
                migrate_association_state(version, attrs.clone()).unwrap_err(),
                MigrationError::UnexpectedVersion(version)
            );
        }
    }

    #[test]
    fn association_migration_requires_association_id() {
        let err = migrate_association_state(0, flat(&[("id", "doc")])).unwrap_err();
        assert_eq!(err, MigrationError::MissingAttribute("association_id".to_string()));
    }

    #[test]
    fn upgrader_tables_drive_the_chain() {
        let record = StateRecord::new(0, flat(&[("id", "doc"), ("association_id", "assoc-1")]));
        let upgraded = upgrade_record(&record, 1, &association_upgraders()).unwrap();
        assert_eq!(upgraded.schema_version, 1);
        assert_eq!(upgraded.id(), Some("assoc-1"));

        let record = StateRecord::new(
            0,
            flat(&[("id", "g"), ("patch_group", "g"), ("baseline_id", "pb-1")]),
        );
        let upgraded = upgrade_record(&record, 1, &patch_group_upgraders()).unwrap();
        assert_eq!(upgraded.id(), Some("g,pb-1"));
    }
}
