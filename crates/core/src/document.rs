//! Read-side document representation
//!
//! A `Document` is what the datastore hands back for one stored record: the
//! normalized id plus the stored field map. The id lives in the storage path,
//! never in the field map itself.

use serde_json::{Map, Value as Json};

/// One document as returned by the datastore
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Normalized (string-form) document id
    pub id: String,
    /// Stored fields; never contains an `id` key
    pub data: Map<String, Json>,
}

impl Document {
    /// Build a document from its id and field map
    pub fn new(id: impl Into<String>, data: Map<String, Json>) -> Self {
        Document {
            id: id.into(),
            data,
        }
    }

    /// The plain JSON object shape: stored fields with `id` merged in
    pub fn into_json(self) -> Json {
        let mut map = self.data;
        map.insert("id".to_string(), Json::String(self.id));
        Json::Object(map)
    }

    /// Borrowing variant of [`Document::into_json`]
    pub fn to_json(&self) -> Json {
        self.clone().into_json()
    }

    /// Borrow one field's value
    pub fn get(&self, field: &str) -> Option<&Json> {
        self.data.get(field)
    }
}
