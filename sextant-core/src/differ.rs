//! Differ - Compare desired state with current state
//!
//! Decides whether a declared resource needs to be created, updated in place,
//! replaced (a force-new attribute changed) or left alone.

use std::collections::HashMap;

use crate::resource::{Resource, ResourceId, State, Value};
use crate::schema::ResourceSchema;

/// Result of a diff operation
#[derive(Debug, Clone, PartialEq)]
pub enum Diff {
    /// Resource does not exist -> needs creation
    Create(Resource),
    /// Resource exists with differences -> needs update
    Update {
        id: ResourceId,
        from: State,
        to: Resource,
        changed_attributes: Vec<String>,
    },
    /// A force-new attribute changed -> delete and create
    Replace {
        id: ResourceId,
        from: State,
        to: Resource,
        changed_attributes: Vec<String>,
        forced_by: Vec<String>,
    },
    /// Resource exists with no differences -> no action needed
    NoChange(ResourceId),
}

impl Diff {
    /// Returns whether this Diff involves a change
    pub fn is_change(&self) -> bool {
        !matches!(self, Diff::NoChange(_))
    }
}

/// Compare desired state with current state to compute a Diff
pub fn diff(desired: &Resource, current: &State, schema: &ResourceSchema) -> Diff {
    if !current.exists {
        return Diff::Create(desired.clone());
    }

    let mut desired_attrs = desired.attributes.clone();
    schema.apply_defaults(&mut desired_attrs);

    let changed = find_changed_attributes(&desired_attrs, &current.attributes);

    if changed.is_empty() {
        return Diff::NoChange(desired.id.clone());
    }

    let forced_by: Vec<String> = changed
        .iter()
        .filter(|name| schema.attributes.get(*name).is_some_and(|a| a.force_new))
        .cloned()
        .collect();

    if forced_by.is_empty() {
        Diff::Update {
            id: desired.id.clone(),
            from: current.clone(),
            to: desired.clone(),
            changed_attributes: changed,
        }
    } else {
        Diff::Replace {
            id: desired.id.clone(),
            from: current.clone(),
            to: desired.clone(),
            changed_attributes: changed,
            forced_by,
        }
    }
}

/// Find changed attributes between desired and current state
fn find_changed_attributes(
    desired: &HashMap<String, Value>,
    current: &HashMap<String, Value>,
) -> Vec<String> {
    let mut changed: Vec<String> = desired
        .iter()
        .filter(|(key, desired_value)| current.get(*key) != Some(*desired_value))
        .map(|(key, _)| key.clone())
        .collect();
    changed.sort();
    changed
}
