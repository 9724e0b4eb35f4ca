//! Upgrade - Schema version migration of persisted state records
//!
//! Each resource type carries a schema version. When the layout of its
//! persisted state changes, the version is bumped and an upgrader from the
//! previous version is registered. Loading older state runs the upgraders
//! in order until the record reaches the current version.

use thiserror::Error;

use crate::flatmap::FlatState;

/// Errors raised while migrating a state record
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MigrationError {
    /// The record lacks an attribute the migration reads
    #[error("state record is missing required attribute '{0}'")]
    MissingAttribute(String),

    /// A migration was asked to handle a version it does not know
    #[error("unexpected schema version {0}")]
    UnexpectedVersion(u32),

    /// No upgrader is registered for an intermediate version
    #[error("no state upgrader from schema version {from} (target {target})")]
    NoUpgradePath { from: u32, target: u32 },

    /// The record was written by a newer schema than this provider knows
    #[error("state schema version {found} is newer than supported version {supported}")]
    FutureVersion { found: u32, supported: u32 },
}

/// A persisted resource: flat attributes tagged with a schema version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateRecord {
    pub schema_version: u32,
    pub attributes: FlatState,
}

impl StateRecord {
    pub fn new(schema_version: u32, attributes: FlatState) -> Self {
        Self {
            schema_version,
            attributes,
        }
    }

    /// The record's identifier (`id` attribute)
    pub fn id(&self) -> Option<&str> {
        self.attributes.get("id").map(String::as_str)
    }
}

/// Read an attribute a migration depends on
pub fn require<'a>(attributes: &'a FlatState, key: &str) -> Result<&'a str, MigrationError> {
    attributes
        .get(key)
        .map(String::as_str)
        .ok_or_else(|| MigrationError::MissingAttribute(key.to_string()))
}

/// Rewrites a record from `version` to `version + 1`
#[derive(Debug, Clone, Copy)]
pub struct StateUpgrader {
    pub version: u32,
    pub upgrade: fn(FlatState) -> Result<FlatState, MigrationError>,
}

impl StateUpgrader {
    pub const fn new(
        version: u32,
        upgrade: fn(FlatState) -> Result<FlatState, MigrationError>,
    ) -> Self {
        Self { version, upgrade }
    }
}

/// Bring a record up to `target_version`.
///
/// Upgraders run one version at a time. Any failure aborts the whole upgrade
/// and is returned unchanged; the caller's record is not modified.
pub fn upgrade_record(
    record: &StateRecord,
    target_version: u32,
    upgraders: &[StateUpgrader],
) -> Result<StateRecord, MigrationError> {
    if record.schema_version > target_version {
        return Err(MigrationError::FutureVersion {
            found: record.schema_version,
            supported: target_version,
        });
    }

    let mut version = record.schema_version;
    let mut attributes = record.attributes.clone();

    while version < target_version {
        let upgrader = upgraders
            .iter()
            .find(|u| u.version == version)
            .ok_or(MigrationError::NoUpgradePath {
                from: version,
                target: target_version,
            })?;

        log::debug!("upgrading state record from schema version {}", version);
        attributes = (upgrader.upgrade)(attributes)?;
        version += 1;
    }

    Ok(StateRecord::new(version, attributes))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn add_marker(mut attrs: FlatState) -> Result<FlatState, MigrationError> {
        let count = attrs.len();
        attrs.insert(format!("step_{}", count), "done".to_string());
        Ok(attrs)
    }

    fn needs_name(attrs: FlatState) -> Result<FlatState, MigrationError> {
        require(&attrs, "name")?;
        Ok(attrs)
    }

    fn record(version: u32) -> StateRecord {
        StateRecord::new(
            version,
            FlatState::from([("id".to_string(), "abc".to_string())]),
        )
    }

    #[test]
    fn upgrades_run_in_order() {
        let upgraders = [StateUpgrader::new(1, add_marker), StateUpgrader::new(0, add_marker)];

        let upgraded = upgrade_record(&record(0), 2, &upgraders).unwrap();

        assert_eq!(upgraded.schema_version, 2);
        assert_eq!(upgraded.attributes.get("step_1").map(String::as_str), Some("done"));
        assert_eq!(upgraded.attributes.get("step_2").map(String::as_str), Some("done"));
        assert_eq!(upgraded.id(), Some("abc"));
    }

    #[test]
    fn current_record_is_returned_as_is() {
        let upgraded = upgrade_record(&record(1), 1, &[]).unwrap();
        assert_eq!(upgraded, record(1));
    }

    #[test]
    fn missing_upgrader_is_an_error() {
        let upgraders = [StateUpgrader::new(0, add_marker)];
        let err = upgrade_record(&record(0), 2, &upgraders).unwrap_err();
        assert_eq!(err, MigrationError::NoUpgradePath { from: 1, target: 2 });
    }

    #[test]
    fn newer_record_is_rejected() {
        let err = upgrade_record(&record(3), 1, &[]).unwrap_err();
        assert_eq!(
            err,
            MigrationError::FutureVersion {
                found: 3,
                supported: 1
            }
        );
    }

    #[test]
    fn failing_upgrader_aborts_and_surfaces_error() {
        let upgraders = [StateUpgrader::new(0, needs_name)];
        let original = record(0);

        let err = upgrade_record(&original, 1, &upgraders).unwrap_err();

        assert_eq!(err, MigrationError::MissingAttribute("name".to_string()));
        assert_eq!(
            err.to_string(),
            "state record is missing required attribute 'name'"
        );
        assert_eq!(original.schema_version, 0);
    }
}
