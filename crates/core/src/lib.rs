//! Core types for Loam
//!
//! This crate defines the foundational types used throughout the system:
//! - DocId: document identifier (string or numeric, string-normalized at the
//!   path boundary)
//! - CollectionPath / DocumentPath: slash-joined storage paths
//! - FieldValue / Payload: write-time field values and sentinels
//! - Document: read-side document representation
//! - Filter / OrderBy / QuerySpec: query constraint types
//! - Config: adapter configuration (timestamps, soft deletes)
//! - Error: error type hierarchy

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod document;
pub mod error;
pub mod path;
pub mod query;
pub mod value;

// Re-export commonly used types
pub use config::{Config, CREATED_AT_FIELD, DELETED_AT_FIELD, UPDATED_AT_FIELD};
pub use document::Document;
pub use error::{Error, Result};
pub use path::{CollectionPath, DocId, DocumentPath, PATH_SEPARATOR};
pub use query::{CursorBound, Direction, Filter, FilterOp, OrderBy, QuerySpec};
pub use value::{
    array_remove, array_union, delete_field, increment, server_timestamp, FieldValue, Payload,
};
