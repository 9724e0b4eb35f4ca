//! Tag conversion and diffing

use std::collections::HashMap;

use aws_sdk_ssm::types::Tag;
use sextant_core::resource::Value;

/// Tags to set and tag keys to remove to go from `old` to `new`
#[derive(Debug, Default, PartialEq, Eq)]
pub struct TagDiff {
    pub upsert: Vec<(String, String)>,
    pub remove: Vec<String>,
}

impl TagDiff {
    pub fn is_empty(&self) -> bool {
        self.upsert.is_empty() && self.remove.is_empty()
    }
}

/// Read a `tags` map attribute. Non-string values are ignored.
pub fn tags_from_value(value: Option<&Value>) -> HashMap<String, String> {
    value
        .and_then(Value::as_map)
        .map(|map| {
            map.iter()
                .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
                .collect()
        })
        .unwrap_or_default()
}

pub fn tags_to_value(tags: &[Tag]) -> Value {
    Value::Map(
        tags.iter()
            .map(|t| (t.key().to_string(), Value::String(t.value().to_string())))
            .collect(),
    )
}

pub fn diff_tags(old: &HashMap<String, String>, new: &HashMap<String, String>) -> TagDiff {
    let mut upsert: Vec<(String, String)> = new
        .iter()
        .filter(|(k, v)| old.get(*k) != Some(*v))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    upsert.sort();

    let mut remove: Vec<String> = old.keys().filter(|k| !new.contains_key(*k)).cloned().collect();
    remove.sort();

    TagDiff { upsert, remove }
}

/// Build SDK tags, sorted by key for stable requests
pub fn to_sdk_tags(
    tags: impl IntoIterator<Item = (String, String)>,
) -> Result<Vec<Tag>, aws_sdk_ssm::error::BuildError> {
    let mut pairs: Vec<(String, String)> = tags.into_iter().collect();
    pairs.sort();
    pairs
        .into_iter()
        .map(|(key, value)| Tag::builder().key(key).value(value).build())
        .collect()
}
