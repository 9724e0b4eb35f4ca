//! Composite resource identifiers

use thiserror::Error;

const SEPARATOR: char = ',';

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unexpected format for ID ({id}), expected PATCH_GROUP,BASELINE_ID")]
pub struct InvalidIdError {
    pub id: String,
}

/// `<patch_group>,<baseline_id>`
pub fn patch_group_id(patch_group: &str, baseline_id: &str) -> String {
    format!("{}{}{}", patch_group, SEPARATOR, baseline_id)
}

/// Split a patch group ID into `(patch_group, baseline_id)`.
///
/// Exactly two non-empty parts are required.
pub fn parse_patch_group_id(id: &str) -> Result<(&str, &str), InvalidIdError> {
    let mut parts = id.split(SEPARATOR);
    match (parts.next(), parts.next(), parts.next()) {
        (Some(group), Some(baseline), None) if !group.is_empty() && !baseline.is_empty() => {
            Ok((group, baseline))
        }
        _ => Err(InvalidIdError { id: id.to_string() }),
    }
}
