//! Attribute container
//!
//! Holds one record's field values: the `current` working set, the
//! `original` snapshot taken at load/save time, the `exists` flag, and the
//! optional id. Dirtiness is deep structural inequality between `current`
//! and `original`; `original` only moves on a successful load or save.
//!
//! Pure in-memory state. Nothing here touches storage.

use loam_core::DocId;
use serde_json::{Map, Value as Json};

/// Field state of one record
#[derive(Debug, Clone, Default)]
pub struct Attributes {
    current: Map<String, Json>,
    original: Map<String, Json>,
    exists: bool,
    id: Option<DocId>,
}

impl Attributes {
    /// Empty, unsaved attribute set
    pub fn new() -> Self {
        Attributes::default()
    }

    /// Attribute set for a record loaded from storage
    ///
    /// `original` is snapshotted from the loaded fields and `exists` is set.
    pub fn loaded(id: DocId, fields: Map<String, Json>) -> Self {
        Attributes {
            current: fields.clone(),
            original: fields,
            exists: true,
            id: Some(id),
        }
    }

    /// The record's id, if assigned
    pub fn id(&self) -> Option<&DocId> {
        self.id.as_ref()
    }

    /// Assign the record's id
    pub fn set_id(&mut self, id: DocId) {
        self.id = Some(id);
    }

    /// Has this record been persisted?
    pub fn exists(&self) -> bool {
        self.exists
    }

    /// Mark the record persisted or not
    pub fn set_exists(&mut self, exists: bool) {
        self.exists = exists;
    }

    /// Borrow one field
    pub fn get(&self, field: &str) -> Option<&Json> {
        self.current.get(field)
    }

    /// Set one field
    pub fn set(&mut self, field: impl Into<String>, value: impl Into<Json>) {
        self.current.insert(field.into(), value.into());
    }

    /// Merge fields into `current`, last write wins per field
    ///
    /// Unspecified fields are untouched. An `id` entry is routed to the id
    /// slot instead of the field map (and only when no id is assigned yet;
    /// an assigned id is never overridden by fill).
    pub fn fill(&mut self, partial: Json) {
        let Json::Object(map) = partial else {
            return;
        };
        for (field, value) in map {
            if field == "id" {
                if self.id.is_none() {
                    match value {
                        Json::String(s) => self.id = Some(DocId::Str(s)),
                        Json::Number(n) => self.id = n.as_i64().map(DocId::Int),
                        _ => {}
                    }
                }
                continue;
            }
            self.current.insert(field, value);
        }
    }

    /// Deep structural inequality between `current` and `original`
    pub fn is_dirty(&self) -> bool {
        self.current != self.original
    }

    /// Snapshot `current` into `original`; call after a successful save
    pub fn sync_original(&mut self) {
        self.original = self.current.clone();
    }

    /// Replace both maps with freshly loaded fields
    pub fn replace(&mut self, fields: Map<String, Json>) {
        self.current = fields.clone();
        self.original = fields;
    }

    /// Borrow the current field map
    pub fn current(&self) -> &Map<String, Json> {
        &self.current
    }

    /// The plain-object shape: `current` with the id merged in when assigned
    pub fn to_object(&self) -> Json {
        let mut map = self.current.clone();
        if let Some(id) = &self.id {
            map.insert(
                "id".to_string(),
                match id {
                    DocId::Int(n) => Json::from(*n),
                    DocId::Str(s) => Json::String(s.clone()),
                },
            );
        }
        Json::Object(map)
    }
}
