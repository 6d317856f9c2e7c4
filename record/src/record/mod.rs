//! The editable record and the operations that evolve it
//!
//! A [`Record`] is never mutated in place. Edits, replacements and server merges
//! all produce a new value, and [`RecordState`] swaps the current snapshot.

mod merge;
mod options;
mod state;
mod update;

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize};

pub use self::merge::merge;
pub use self::options::RecordOptions;
pub use self::state::RecordState;
pub use self::update::{
    RecordChange, apply_change, apply_field_edit, apply_whole_record_replacement, initialize,
    initialize_from_value, is_cleared, replace,
};
use crate::flat::Params;

/// Validation errors keyed by param path
pub type Errors = BTreeMap<String, PropertyError>;

/// Resolved sub-records keyed by the param path that references them
///
/// Shared so that an edit which does not touch `populated` hands back the very
/// same map, and `Arc::ptr_eq` tells callers nothing changed.
pub type Populated = Arc<BTreeMap<String, Record>>;

/// A server-reported problem with one field, or with the record as a whole
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyError {
    /// Human readable description
    pub message: String,
    /// Machine readable error kind, when the server sends one
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind:    Option<String>,
}

/// A record being created or edited
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    /// Server identifier, `None` until the record is persisted
    #[serde(
        default,
        deserialize_with = "deserialize_record_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub id:         Option<String>,
    /// Display title
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title:      Option<String>,
    /// Field values, flattened to dotted paths
    #[serde(default)]
    pub params:     Params,
    /// Per-field validation errors from the last server response
    #[serde(default)]
    pub errors:     Errors,
    /// Sub-records resolved for reference fields
    #[serde(default)]
    pub populated:  Populated,
    /// Record level validation error from the last server response
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_error: Option<PropertyError>,
}

impl Record {
    /// Build an unsaved record from flat params
    #[must_use]
    pub fn with_params(params: Params) -> Self {
        Self {
            params,
            ..Self::default()
        }
    }

    /// Set the identifier
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Whether the server already knows this record
    #[must_use]
    pub const fn is_persisted(&self) -> bool {
        self.id.is_some()
    }

    /// Read the value at a param path, rebuilding nested values as needed
    #[must_use]
    pub fn param(&self, path: &str) -> Option<serde_json::Value> {
        crate::flat::get(&self.params, path)
    }

    /// The error reported for a param path, if any
    #[must_use]
    pub fn error(&self, path: &str) -> Option<&PropertyError> {
        self.errors.get(path)
    }
}

/// Deserialize a record id sent either as a string or as a number
fn deserialize_record_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    use std::fmt;

    use serde::de::{self, Visitor};

    struct RecordIdVisitor;

    impl<'de> Visitor<'de> for RecordIdVisitor {
        type Value = Option<String>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a record id as string, number or null")
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Some(value.to_string()))
        }

        fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Some(value.to_string()))
        }

        fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Some(value.to_string()))
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(None)
        }

        fn visit_none<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(None)
        }

        fn visit_some<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
        where
            D: Deserializer<'de>,
        {
            deserializer.deserialize_any(self)
        }
    }

    deserializer.deserialize_any(RecordIdVisitor)
}
