//! Document ids and storage paths
//!
//! This module defines:
//! - `DocId`: document identifier, string or numeric
//! - `CollectionPath`: slash-joined path addressing a collection or
//!   subcollection (odd number of segments)
//! - `DocumentPath`: a collection path plus a document id (even segments)
//!
//! ## Id normalization
//!
//! A numeric-looking id is always normalized to its string form before being
//! used as a storage path segment. The in-memory `DocId` may stay numeric for
//! ergonomic reasons; `DocId::Int(42)` and `DocId::Str("42")` address the
//! same stored document.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Separator between path segments
pub const PATH_SEPARATOR: char = '/';

/// Document identifier: string or numeric
///
/// The id is positional in the storage path, not a field of the stored
/// payload. Both variants render to the same path segment when their string
/// forms agree.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DocId {
    /// Numeric id, kept numeric in memory
    Int(i64),
    /// String id
    Str(String),
}

impl DocId {
    /// Mint a fresh id (hyphen-less UUID v4, the client-side minting scheme)
    pub fn generate() -> DocId {
        DocId::Str(uuid::Uuid::new_v4().simple().to_string())
    }

    /// The normalized string form used as a storage path segment
    pub fn as_path_segment(&self) -> String {
        match self {
            DocId::Int(n) => n.to_string(),
            DocId::Str(s) => s.clone(),
        }
    }

    /// Validate the id for use in a path: non-empty, no separator
    pub fn validate(&self) -> Result<()> {
        let segment = self.as_path_segment();
        if segment.is_empty() {
            return Err(Error::invalid_argument("document id must not be empty"));
        }
        if segment.contains(PATH_SEPARATOR) {
            return Err(Error::invalid_argument(format!(
                "document id {segment:?} must not contain '/'"
            )));
        }
        Ok(())
    }
}

impl fmt::Display for DocId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocId::Int(n) => write!(f, "{n}"),
            DocId::Str(s) => write!(f, "{s}"),
        }
    }
}

impl From<i64> for DocId {
    fn from(n: i64) -> Self {
        DocId::Int(n)
    }
}

impl From<i32> for DocId {
    fn from(n: i32) -> Self {
        DocId::Int(i64::from(n))
    }
}

impl From<u32> for DocId {
    fn from(n: u32) -> Self {
        DocId::Int(i64::from(n))
    }
}

impl From<&str> for DocId {
    fn from(s: &str) -> Self {
        DocId::Str(s.to_string())
    }
}

impl From<String> for DocId {
    fn from(s: String) -> Self {
        DocId::Str(s)
    }
}

impl From<&DocId> for DocId {
    fn from(id: &DocId) -> Self {
        id.clone()
    }
}

/// Validate one collection-name segment
fn validate_segment(segment: &str) -> Result<()> {
    if segment.is_empty() {
        return Err(Error::invalid_argument("path segment must not be empty"));
    }
    if segment.contains(PATH_SEPARATOR) {
        return Err(Error::invalid_argument(format!(
            "path segment {segment:?} must not contain '/'"
        )));
    }
    Ok(())
}

/// Path to a collection or subcollection
///
/// Stored as alternating `collection/id` pairs ending in a collection name:
/// `users`, `users/42/orders`, ...
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CollectionPath {
    segments: Vec<String>,
}

impl CollectionPath {
    /// Root-level collection
    pub fn root(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        validate_segment(&name)?;
        Ok(CollectionPath {
            segments: vec![name],
        })
    }

    /// Name of the collection (last segment)
    pub fn name(&self) -> &str {
        self.segments
            .last()
            .map(String::as_str)
            .unwrap_or_default()
    }

    /// Path to a document in this collection
    ///
    /// The id is normalized to its string form here; this is the only place
    /// ids cross the storage-path boundary.
    pub fn doc(&self, id: &DocId) -> Result<DocumentPath> {
        id.validate()?;
        Ok(DocumentPath {
            collection: self.clone(),
            id: id.as_path_segment(),
        })
    }

    /// Number of path segments
    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    /// Slash-joined path string
    pub fn as_string(&self) -> String {
        self.segments.join("/")
    }
}

impl fmt::Display for CollectionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_string())
    }
}

/// Path to a single document
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentPath {
    collection: CollectionPath,
    id: String,
}

impl DocumentPath {
    /// The collection this document lives in
    pub fn collection(&self) -> &CollectionPath {
        &self.collection
    }

    /// The normalized (string-form) document id
    pub fn id(&self) -> &str {
        &self.id
    }

    /// A subcollection rooted at this document:
    /// `<collection>/<id>/<name>`
    pub fn subcollection(&self, name: impl Into<String>) -> Result<CollectionPath> {
        let name = name.into();
        validate_segment(&name)?;
        let mut segments = self.collection.segments.clone();
        segments.push(self.id.clone());
        segments.push(name);
        Ok(CollectionPath { segments })
    }

    /// Slash-joined path string
    pub fn as_string(&self) -> String {
        format!("{}/{}", self.collection.as_string(), self.id)
    }
}

impl fmt::Display for DocumentPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_string())
    }
}
