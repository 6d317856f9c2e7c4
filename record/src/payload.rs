//! Encoding of a record into the text fields of a multipart form

use serde_json::Value;

use crate::constants::{FORM_VALUE_EMPTY_ARRAY, FORM_VALUE_EMPTY_OBJECT, FORM_VALUE_NULL};
use crate::flat::Params;
use crate::record::Record;

/// One named text field of the form body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormField {
    /// Field name, the param path
    pub name:  String,
    /// Encoded value
    pub value: String,
}

/// Ordered form fields ready to be sent as `multipart/form-data`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormPayload {
    fields: Vec<FormField>,
}

impl FormPayload {
    /// Set `name`, overwriting an existing field in place or appending a new one
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.fields.iter_mut().find(|field| field.name == name) {
            Some(field) => field.value = value,
            None => self.fields.push(FormField { name, value }),
        }
    }

    /// Overlay caller supplied fields, replacing any with the same name
    pub fn overlay(&mut self, custom_fields: &Params) {
        for (name, value) in custom_fields {
            self.set(name.clone(), encode_value(value));
        }
    }

    /// Value of a field
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|field| field.name == name)
            .map(|field| field.value.as_str())
    }

    /// Fields in send order
    #[must_use]
    pub fn fields(&self) -> &[FormField] {
        &self.fields
    }

    /// Number of fields
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether there are no fields
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Total size of all field values in bytes
    #[must_use]
    pub fn content_length(&self) -> u64 {
        self.fields
            .iter()
            .map(|field| field.value.len() as u64)
            .sum()
    }
}

/// Encode a single param value as form text
fn encode_value(value: &Value) -> String {
    match value {
        Value::Null => FORM_VALUE_NULL.to_string(),
        Value::String(text) => text.clone(),
        Value::Array(items) if items.is_empty() => FORM_VALUE_EMPTY_ARRAY.to_string(),
        Value::Object(map) if map.is_empty() => FORM_VALUE_EMPTY_OBJECT.to_string(),
        other => other.to_string(),
    }
}

/// Encode the record's params as form fields
///
/// `populated` and `errors` are display data and are not sent.
#[must_use]
pub fn record_to_form_payload(record: &Record) -> FormPayload {
    FormPayload {
        fields: record
            .params
            .iter()
            .map(|(name, value)| FormField {
                name:  name.clone(),
                value: encode_value(value),
            })
            .collect(),
    }
}
