//! Path-scoped reads and writes over flat params
//!
//! Every function here is pure: the input mapping is left untouched and a new
//! one is returned.

use serde_json::Value;

use super::{Params, flatten_into, join, unflatten};
use crate::constants::PATH_DELIMITER;

/// True when `key` equals `path` or lives underneath it
fn is_at_or_under(key: &str, path: &str) -> bool {
    key.strip_prefix(path)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with(PATH_DELIMITER))
}

/// True when `key` is a strict ancestor of `path`
fn is_ancestor_of(key: &str, path: &str) -> bool {
    path.strip_prefix(key)
        .is_some_and(|rest| rest.starts_with(PATH_DELIMITER))
}

/// Convert a dotted path into a JSON pointer
fn to_pointer(path: &str) -> String {
    path.split(PATH_DELIMITER)
        .map(|segment| segment.replace('~', "~0").replace('/', "~1"))
        .fold(String::new(), |mut pointer, segment| {
            pointer.push('/');
            pointer.push_str(&segment);
            pointer
        })
}

/// Read the value at `path`
///
/// A leaf is returned as stored. A path with keys beneath it is rebuilt into
/// the nested object or array it describes.
#[must_use]
pub fn get(params: &Params, path: &str) -> Option<Value> {
    if let Some(value) = params.get(path) {
        return Some(value.clone());
    }

    let subtree: Params = params
        .iter()
        .filter(|(key, _)| is_at_or_under(key, path))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();
    if subtree.is_empty() {
        return None;
    }

    unflatten(&subtree).pointer(&to_pointer(path)).cloned()
}

/// Whether `path` is present, either as a leaf or as a parent of other keys
#[must_use]
pub fn contains_path(params: &Params, path: &str) -> bool {
    params.keys().any(|key| is_at_or_under(key, path))
}

/// Replace whatever lives at `path` with `value`
///
/// Keys under `path` are dropped first. An ancestor stored as a leaf is
/// dropped as well, since the new value turns it into a container.
#[must_use]
pub fn set(params: &Params, path: &str, value: &Value) -> Params {
    let mut next: Params = params
        .iter()
        .filter(|(key, _)| !is_at_or_under(key, path) && !is_ancestor_of(key, path))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();
    flatten_into(&mut next, path.to_string(), value);
    next
}

/// Remove `path` and everything beneath it
///
/// When the last segment indexes an array, later siblings move down one slot
/// so the array stays dense.
#[must_use]
pub fn remove_path(params: &Params, path: &str) -> Params {
    let removed_slot = path
        .rsplit_once(PATH_DELIMITER)
        .and_then(|(parent, last)| last.parse::<usize>().ok().map(|index| (parent, index)));

    let mut next = Params::new();
    for (key, value) in params {
        if is_at_or_under(key, path) {
            continue;
        }
        let key = removed_slot
            .and_then(|(parent, index)| shift_sibling(key, parent, index))
            .unwrap_or_else(|| key.clone());
        next.insert(key, value.clone());
    }
    next
}

/// Rename `key` if it belongs to an array element of `parent` past `removed`
fn shift_sibling(key: &str, parent: &str, removed: usize) -> Option<String> {
    let rest = key
        .strip_prefix(parent)?
        .strip_prefix(PATH_DELIMITER)?;
    let (segment, tail) = match rest.split_once(PATH_DELIMITER) {
        Some((segment, tail)) => (segment, Some(tail)),
        None => (rest, None),
    };
    let index = segment.parse::<usize>().ok()?;
    if index <= removed {
        return None;
    }

    let shifted = join(parent, &(index - 1).to_string());
    Some(tail.map_or_else(|| shifted.clone(), |tail| join(&shifted, tail)))
}

/// Keep only keys at or under one of `properties`
#[must_use]
pub fn select_params<S: AsRef<str>>(params: &Params, properties: &[S]) -> Params {
    params
        .iter()
        .filter(|(key, _)| {
            properties
                .iter()
                .any(|property| is_at_or_under(key, property.as_ref()))
        })
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::flat::flatten;

    fn params(value: &Value) -> Params {
        flatten(value)
    }

    #[test]
    fn test_get_leaf_and_subtree() {
        let flat = params(&json!({
            "name": "Alice",
            "address": {"city": "Oslo", "zip": 150},
            "tags": ["a", "b"]
        }));

        assert_eq!(get(&flat, "name"), Some(json!("Alice")));
        assert_eq!(
            get(&flat, "address"),
            Some(json!({"city": "Oslo", "zip": 150}))
        );
        assert_eq!(get(&flat, "tags"), Some(json!(["a", "b"])));
        assert_eq!(get(&flat, "tags.1"), Some(json!("b")));
        assert_eq!(get(&flat, "missing"), None);
    }

    #[test]
    fn test_get_does_not_match_sibling_with_shared_prefix() {
        let flat = params(&json!({"name": "Alice", "nameSuffix": "Jr"}));
        assert!(contains_path(&flat, "name"));
        assert_eq!(get(&flat, "nameSuffix"), Some(json!("Jr")));
        assert!(!contains_path(&flat, "nam"));
    }

    #[test]
    fn test_set_replaces_subtree() {
        let flat = params(&json!({"address": {"city": "Oslo", "zip": 150}, "name": "Alice"}));
        let next = set(&flat, "address", &json!({"city": "Bergen"}));

        assert_eq!(unflatten(&next), json!({"name": "Alice", "address": {"city": "Bergen"}}));
        // input untouched
        assert_eq!(flat.get("address.zip"), Some(&json!(150)));
    }

    #[test]
    fn test_set_over_leaf_ancestor() {
        let flat = params(&json!({"meta": {}}));
        let next = set(&flat, "meta.source", &json!("import"));
        assert_eq!(unflatten(&next), json!({"meta": {"source": "import"}}));
    }

    #[test]
    fn test_remove_path_drops_descendants() {
        let flat = params(&json!({"address": {"city": "Oslo"}, "name": "Alice"}));
        let next = remove_path(&flat, "address");
        assert_eq!(unflatten(&next), json!({"name": "Alice"}));
    }

    #[test]
    fn test_remove_array_element_keeps_array_dense() {
        let flat = params(&json!({
            "tags": ["a", "b", "c"],
            "roles": [{"name": "x"}, {"name": "y"}, {"name": "z"}]
        }));

        let next = remove_path(&flat, "tags.0");
        let next = remove_path(&next, "roles.1");

        assert_eq!(
            unflatten(&next),
            json!({"tags": ["b", "c"], "roles": [{"name": "x"}, {"name": "z"}]})
        );
        assert_eq!(flatten(&unflatten(&next)), next);
    }

    #[test]
    fn test_remove_missing_path_is_noop() {
        let flat = params(&json!({"name": "Alice"}));
        assert_eq!(remove_path(&flat, "email"), flat);
    }

    #[test]
    fn test_select_params() {
        let flat = params(&json!({
            "name": "Alice",
            "address": {"city": "Oslo"},
            "password": "secret"
        }));

        let selected = select_params(&flat, &["name", "address"]);
        assert_eq!(unflatten(&selected), json!({"name": "Alice", "address": {"city": "Oslo"}}));
    }

    #[test]
    fn test_pointer_escaping() {
        assert_eq!(to_pointer("a.b/c.0"), "/a/b~1c/0");
    }
}
