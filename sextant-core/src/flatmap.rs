//! Flatmap - Flat string encoding of resource attributes
//!
//! Persisted state stores each resource as a flat `key -> string` record.
//! Lists are written as `key.#` plus `key.<index>` entries, maps and blocks as
//! `key.%` plus `key.<name>` entries:
//!
//! ```text
//! targets.#          = 1
//! targets.0.key      = InstanceIds
//! targets.0.values.# = 1
//! targets.0.values.0 = i-0123
//! parameters.%       = 0
//! ```

use std::collections::{BTreeMap, HashMap};

use crate::resource::Value;
use crate::schema::{AttributeType, ResourceSchema};

/// A flat attribute record
pub type FlatState = BTreeMap<String, String>;

/// Flatten a set of attributes into a flat record
pub fn flatten(attributes: &HashMap<String, Value>) -> FlatState {
    let mut flat = FlatState::new();
    for (key, value) in attributes {
        flatten_value(key, value, &mut flat);
    }
    flat
}

fn flatten_value(prefix: &str, value: &Value, flat: &mut FlatState) {
    match value {
        Value::String(s) => {
            flat.insert(prefix.to_string(), s.clone());
        }
        Value::Int(n) => {
            flat.insert(prefix.to_string(), n.to_string());
        }
        Value::Bool(b) => {
            flat.insert(prefix.to_string(), b.to_string());
        }
        Value::List(items) => {
            flat.insert(format!("{}.#", prefix), items.len().to_string());
            for (i, item) in items.iter().enumerate() {
                flatten_value(&format!("{}.{}", prefix, i), item, flat);
            }
        }
        Value::Map(map) => {
            flat.insert(format!("{}.%", prefix), map.len().to_string());
            for (k, v) in map {
                flatten_value(&format!("{}.{}", prefix, k), v, flat);
            }
        }
    }
}

/// Rebuild typed attributes from a flat record.
///
/// Attributes declared in the schema are decoded with their declared type.
/// Undeclared top-level keys (such as `id`) are kept as strings; undeclared
/// nested keys are dropped.
pub fn expand(flat: &FlatState, schema: &ResourceSchema) -> HashMap<String, Value> {
    let mut attributes = HashMap::new();

    for (name, attr) in &schema.attributes {
        if let Some(value) = expand_value(flat, name, &attr.attr_type) {
            attributes.insert(name.clone(), value);
        }
    }

    for (key, value) in flat {
        if !key.contains('.') && !attributes.contains_key(key) {
            attributes.insert(key.clone(), Value::String(value.clone()));
        }
    }

    attributes
}

fn expand_value(flat: &FlatState, key: &str, attr_type: &AttributeType) -> Option<Value> {
    match attr_type.base() {
        AttributeType::Int => flat
            .get(key)
            .map(|s| s.parse().map(Value::Int).unwrap_or(Value::String(s.clone()))),
        AttributeType::Bool => flat.get(key).map(|s| match s.as_str() {
            "true" => Value::Bool(true),
            "false" => Value::Bool(false),
            _ => Value::String(s.clone()),
        }),
        AttributeType::String | AttributeType::Enum(_) => {
            flat.get(key).map(|s| Value::String(s.clone()))
        }
        // `base()` never returns a custom type
        AttributeType::Custom { .. } => None,
        AttributeType::List(inner) => {
            let count: usize = flat.get(&format!("{}.#", key))?.parse().ok()?;
            let items = (0..count)
                .filter_map(|i| expand_value(flat, &format!("{}.{}", key, i), inner))
                .collect();
            Some(Value::List(items))
        }
        AttributeType::Map(inner) => {
            let prefix = format!("{}.", key);
            let count_key = format!("{}.%", key);
            let has_entries = flat.contains_key(&count_key)
                || flat.keys().any(|k| k.starts_with(&prefix));
            if !has_entries {
                return None;
            }
            let mut map = HashMap::new();
            let scalar = !matches!(
                inner.base(),
                AttributeType::List(_) | AttributeType::Map(_) | AttributeType::Block(_)
            );
            for sub in map_keys(flat, &prefix, scalar) {
                if let Some(v) = expand_value(flat, &format!("{}{}", prefix, sub), inner) {
                    map.insert(sub, v);
                }
            }
            Some(Value::Map(map))
        }
        AttributeType::Block(fields) => {
            let mut map = HashMap::new();
            for field in fields {
                let path = format!("{}.{}", key, field.name);
                if let Some(v) = expand_value(flat, &path, &field.attr_type) {
                    map.insert(field.name.clone(), v);
                }
            }
            let prefix = format!("{}.", key);
            if map.is_empty() && !flat.keys().any(|k| k.starts_with(&prefix)) {
                None
            } else {
                Some(Value::Map(map))
            }
        }
    }
}

/// Distinct map keys below `prefix`, ignoring the `%` count entry. Keys of
/// scalar maps may contain dots; keys of nested maps end at the first dot.
fn map_keys(flat: &FlatState, prefix: &str, scalar: bool) -> Vec<String> {
    let mut keys: Vec<String> = Vec::new();
    for key in flat.keys() {
        let Some(rest) = key.strip_prefix(prefix) else {
            continue;
        };
        if rest == "%" {
            continue;
        }
        let sub = if scalar {
            rest
        } else {
            rest.split('.').next().unwrap_or(rest)
        };
        if !keys.iter().any(|k| k == sub) {
            keys.push(sub.to_string());
        }
    }
    keys
}
