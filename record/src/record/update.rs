//! Pure record transitions: initialize, replace and edit

use std::num::FpCategory;
use std::sync::Arc;

use error_stack::Report;
use serde_json::Value;

use super::Record;
use crate::error::{Error, Result};
use crate::flat;

/// A change handed to the record by a field component
#[derive(Debug, Clone, PartialEq)]
pub enum RecordChange {
    /// Set (or clear, for falsy values) a single param path
    Edit {
        /// Dotted param path
        path:     String,
        /// New value; `null`, `false`, `0` and `""` clear the path
        value:    Value,
        /// Sub-record resolved for a reference field
        resolved: Option<Record>,
    },
    /// The component handed back a whole record
    Replace(Record),
}

impl RecordChange {
    /// Edit a single path
    pub fn edit(path: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Edit {
            path:     path.into(),
            value:    value.into(),
            resolved: None,
        }
    }

    /// Clear a single path
    pub fn clear(path: impl Into<String>) -> Self {
        Self::edit(path, Value::Null)
    }

    /// Replace the whole record
    #[must_use]
    pub const fn replace(record: Record) -> Self {
        Self::Replace(record)
    }

    /// Attach the sub-record a reference value resolves to
    ///
    /// Has no effect on `Replace`.
    #[must_use]
    pub fn with_resolved(self, record: Record) -> Self {
        match self {
            Self::Edit { path, value, .. } => Self::Edit {
                path,
                value,
                resolved: Some(record),
            },
            replace @ Self::Replace(_) => replace,
        }
    }

    /// Classify an untyped change
    ///
    /// Without an explicit `value`, an object carrying `params` is a whole
    /// record. A string is always a path; a missing value then means clear.
    ///
    /// # Errors
    /// Returns `InvalidArgument` when `target` is neither a path nor a record.
    pub fn infer(target: Value, value: Option<Value>, resolved: Option<Record>) -> Result<Self> {
        match (target, value) {
            (Value::String(path), value) => Ok(Self::Edit {
                path,
                value: value.unwrap_or(Value::Null),
                resolved,
            }),
            (Value::Object(map), None) if map.contains_key("params") => {
                serde_json::from_value(Value::Object(map))
                    .map(Self::Replace)
                    .map_err(|e| Report::new(Error::invalid("record", e)))
            }
            (other, _) => Err(Report::new(Error::invalid(
                "record change",
                format!("expected a param path or a record, got {other}"),
            ))),
        }
    }
}

/// Build the starting record; absent data yields an empty, unsaved record
#[must_use]
pub fn initialize(initial: Option<Record>) -> Record {
    initial.unwrap_or_default()
}

/// Build the starting record from untyped JSON
///
/// Missing `params`, `errors` and `populated` default to empty mappings.
///
/// # Errors
/// Returns `InvalidArgument` when `initial` is not a record-shaped object.
pub fn initialize_from_value(initial: Value) -> Result<Record> {
    if initial.is_null() {
        return Ok(Record::default());
    }
    serde_json::from_value(initial).map_err(|e| Report::new(Error::invalid("initial record", e)))
}

/// The owning context switched to another record
#[must_use]
pub fn replace(_current: &Record, incoming: Record) -> Record {
    incoming
}

/// A component handed back a whole record; it becomes the state verbatim
#[must_use]
pub fn apply_whole_record_replacement(_current: &Record, replacement: Record) -> Record {
    replacement
}

/// Values that clear a field instead of being stored
#[must_use]
pub fn is_cleared(value: &Value) -> bool {
    match value {
        Value::Null | Value::Bool(false) => true,
        Value::Number(number) => number
            .as_f64()
            .is_some_and(|n| n.classify() == FpCategory::Zero),
        Value::String(text) => text.is_empty(),
        _ => false,
    }
}

/// Apply a single path edit
///
/// `populated` keeps its identity unless an entry is added or pruned.
#[must_use]
pub fn apply_field_edit(
    current: &Record,
    path: &str,
    value: &Value,
    resolved: Option<Record>,
) -> Record {
    let cleared = is_cleared(value);
    let params = if cleared {
        flat::remove_path(&current.params, path)
    } else {
        flat::set(&current.params, path, value)
    };

    let mut populated = None;
    if cleared {
        if current.populated.contains_key(path) {
            let mut copy = (*current.populated).clone();
            copy.remove(path);
            populated = Some(copy);
        }
    } else if let Some(record) = resolved {
        populated
            .get_or_insert_with(|| (*current.populated).clone())
            .insert(path.to_string(), record);
    }

    let stale: Vec<String> = populated
        .as_ref()
        .unwrap_or_else(|| &*current.populated)
        .keys()
        .filter(|key| !flat::contains_path(&params, key))
        .cloned()
        .collect();
    if !stale.is_empty() {
        let copy = populated.get_or_insert_with(|| (*current.populated).clone());
        for key in &stale {
            copy.remove(key);
        }
    }

    Record {
        id: current.id.clone(),
        title: current.title.clone(),
        params,
        errors: current.errors.clone(),
        populated: populated.map_or_else(|| Arc::clone(&current.populated), Arc::new),
        base_error: current.base_error.clone(),
    }
}

/// Apply any change to `current`
#[must_use]
pub fn apply_change(current: &Record, change: RecordChange) -> Record {
    match change {
        RecordChange::Edit {
            path,
            value,
            resolved,
        } => apply_field_edit(current, &path, &value, resolved),
        RecordChange::Replace(record) => apply_whole_record_replacement(current, record),
    }
}
