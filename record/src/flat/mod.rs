//! Conversion between flat, dotted-path params and nested JSON trees
//!
//! `{"address.city": "Oslo", "tags.0": "a"}` and
//! `{"address": {"city": "Oslo"}, "tags": ["a"]}` describe the same record.
//! Numeric segments address array elements. Empty objects and arrays are kept
//! as leaves so that both directions are exact inverses. Arrays are dense: an
//! index may overwrite an element or append one, never leave a gap.

mod params;

use std::cmp::Ordering;

use serde_json::{Map, Value};
use tracing::debug;

pub use self::params::{contains_path, get, remove_path, select_params, set};
use crate::constants::PATH_DELIMITER;

/// Flat mapping from dotted path to leaf value
pub type Params = Map<String, Value>;

/// Flatten a nested value into dotted-path params
///
/// Scalars at the root have no path and produce an empty mapping.
#[must_use]
pub fn flatten(nested: &Value) -> Params {
    let mut flat = Params::new();
    match nested {
        Value::Object(map) if !map.is_empty() => {
            for (key, value) in map {
                flatten_into(&mut flat, key.clone(), value);
            }
        }
        Value::Array(items) if !items.is_empty() => {
            for (index, value) in items.iter().enumerate() {
                flatten_into(&mut flat, index.to_string(), value);
            }
        }
        _ => {}
    }
    flat
}

/// Flatten `value` into `flat` with every key prefixed by `prefix`
pub(crate) fn flatten_into(flat: &mut Params, prefix: String, value: &Value) {
    match value {
        Value::Object(map) if !map.is_empty() => {
            for (key, child) in map {
                flatten_into(flat, join(&prefix, key), child);
            }
        }
        Value::Array(items) if !items.is_empty() => {
            for (index, child) in items.iter().enumerate() {
                flatten_into(flat, join(&prefix, &index.to_string()), child);
            }
        }
        leaf => {
            flat.insert(prefix, leaf.clone());
        }
    }
}

/// Rebuild the nested tree described by flat params
///
/// The root is always an object. Keys that contradict an earlier key (a
/// scalar and a nested key under the same prefix) are skipped, as are keys
/// whose array index lies past the end of the array built so far.
#[must_use]
pub fn unflatten(flat: &Params) -> Value {
    let mut root = Value::Object(Map::new());
    for (key, value) in flat {
        let segments: Vec<&str> = key.split(PATH_DELIMITER).collect();
        if !insert_at(&mut root, &segments, value.clone()) {
            debug!("unflatten: skipping key '{key}' that conflicts with an earlier key or array");
        }
    }
    root
}

/// Join a path prefix and a segment
pub(crate) fn join(prefix: &str, segment: &str) -> String {
    if prefix.is_empty() {
        segment.to_string()
    } else {
        format!("{prefix}{PATH_DELIMITER}{segment}")
    }
}

fn empty_container_for(next_segment: &str) -> Value {
    if next_segment.parse::<usize>().is_ok() {
        Value::Array(Vec::new())
    } else {
        Value::Object(Map::new())
    }
}

/// Walk `segments` from `node`, creating containers on the way, and place `value`
///
/// Returns `false`, leaving `node` untouched, when the path runs through a
/// leaf, uses a non-numeric segment on an array, or would leave an array gap.
fn insert_at(node: &mut Value, segments: &[&str], value: Value) -> bool {
    let Some((head, rest)) = segments.split_first() else {
        return false;
    };
    let Some(next) = rest.first() else {
        return place(node, head, value);
    };

    match child_mut(node, head) {
        Some(child) if matches!(child, Value::Object(_) | Value::Array(_)) => {
            insert_at(child, rest, value)
        }
        Some(_) => false,
        None => {
            let mut container = empty_container_for(next);
            insert_at(&mut container, rest, value) && place(node, head, container)
        }
    }
}

fn child_mut<'a>(node: &'a mut Value, segment: &str) -> Option<&'a mut Value> {
    match node {
        Value::Object(map) => map.get_mut(segment),
        Value::Array(items) => segment
            .parse::<usize>()
            .ok()
            .and_then(|index| items.get_mut(index)),
        _ => None,
    }
}

/// Store `value` under `segment`; array indices overwrite or append
fn place(node: &mut Value, segment: &str, value: Value) -> bool {
    match node {
        Value::Object(map) => {
            map.insert(segment.to_string(), value);
            true
        }
        Value::Array(items) => {
            let Ok(index) = segment.parse::<usize>() else {
                return false;
            };
            match index.cmp(&items.len()) {
                Ordering::Less => {
                    items[index] = value;
                    true
                }
                Ordering::Equal => {
                    items.push(value);
                    true
                }
                Ordering::Greater => false,
            }
        }
        _ => false,
    }
}
