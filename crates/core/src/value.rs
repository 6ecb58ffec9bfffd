//! Write-time field values and payloads
//!
//! This module defines:
//! - `FieldValue`: a literal JSON value or an opaque write sentinel that the
//!   underlying datastore interprets as an atomic instruction at write time
//! - `Payload`: the ordered field-name → `FieldValue` map carried by a write
//!
//! ## Sentinels
//!
//! `increment`, `array_union`, `array_remove`, `delete_field`, and
//! `server_timestamp` are never stored literally. They are instructions
//! resolved by the backend against the document's current state.

use serde_json::{Map, Number, Value as Json};
use std::collections::BTreeMap;

/// A value written to one document field
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Store this JSON value literally
    Set(Json),
    /// Resolve to the storage service's current time at write time
    ServerTimestamp,
    /// Remove the field from the document
    Delete,
    /// Add to the field's current numeric value; a non-numeric or missing
    /// field becomes the operand
    Increment(Number),
    /// Append each element not already present; a non-array field becomes
    /// the operand array
    ArrayUnion(Vec<Json>),
    /// Remove every occurrence of each element; a non-array field becomes
    /// an empty array
    ArrayRemove(Vec<Json>),
}

/// Sentinel: atomic numeric increment
pub fn increment(n: impl Into<Number>) -> FieldValue {
    FieldValue::Increment(n.into())
}

/// Sentinel: atomic array union
pub fn array_union(items: impl IntoIterator<Item = Json>) -> FieldValue {
    FieldValue::ArrayUnion(items.into_iter().collect())
}

/// Sentinel: atomic array element removal
pub fn array_remove(items: impl IntoIterator<Item = Json>) -> FieldValue {
    FieldValue::ArrayRemove(items.into_iter().collect())
}

/// Sentinel: field deletion
pub fn delete_field() -> FieldValue {
    FieldValue::Delete
}

/// Sentinel: server-side timestamp
pub fn server_timestamp() -> FieldValue {
    FieldValue::ServerTimestamp
}

/// Ordered write payload for one document
///
/// Field names are unique; later writes to the same field win. Built either
/// from a JSON object (every field becomes `Set`) or incrementally via the
/// chaining methods when sentinels are needed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Payload {
    fields: BTreeMap<String, FieldValue>,
}

impl Payload {
    /// Empty payload
    pub fn new() -> Self {
        Payload::default()
    }

    /// Set a field to a literal JSON value
    pub fn set(mut self, field: impl Into<String>, value: impl Into<Json>) -> Self {
        self.fields.insert(field.into(), FieldValue::Set(value.into()));
        self
    }

    /// Set a field to any `FieldValue` (literal or sentinel)
    pub fn field(mut self, field: impl Into<String>, value: FieldValue) -> Self {
        self.fields.insert(field.into(), value);
        self
    }

    /// Insert a field in place (non-chaining form)
    pub fn insert(&mut self, field: impl Into<String>, value: FieldValue) {
        self.fields.insert(field.into(), value);
    }

    /// Insert a field only when absent
    pub fn insert_if_absent(&mut self, field: impl Into<String>, value: FieldValue) {
        self.fields.entry(field.into()).or_insert(value);
    }

    /// Remove a field from the payload, returning its value if present
    pub fn remove(&mut self, field: &str) -> Option<FieldValue> {
        self.fields.remove(field)
    }

    /// True when no fields are present
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Number of fields
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the payload carries the named field
    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// Borrow a field's value
    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    /// Iterate fields in name order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &FieldValue)> {
        self.fields.iter()
    }

    /// The literal (non-sentinel) portion of the payload as a JSON map
    ///
    /// Sentinel fields are skipped: their resolved values are only known to
    /// the backend.
    pub fn literal_fields(&self) -> Map<String, Json> {
        let mut map = Map::new();
        for (name, value) in &self.fields {
            if let FieldValue::Set(json) = value {
                map.insert(name.clone(), json.clone());
            }
        }
        map
    }
}

impl From<Map<String, Json>> for Payload {
    fn from(map: Map<String, Json>) -> Self {
        let mut payload = Payload::new();
        for (name, value) in map {
            payload.insert(name, FieldValue::Set(value));
        }
        payload
    }
}

impl From<Json> for Payload {
    /// A JSON object becomes a payload of literal fields; any other JSON
    /// value becomes an empty payload
    fn from(value: Json) -> Self {
        match value {
            Json::Object(map) => Payload::from(map),
            _ => Payload::new(),
        }
    }
}

impl IntoIterator for Payload {
    type Item = (String, FieldValue);
    type IntoIter = std::collections::btree_map::IntoIter<String, FieldValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}
