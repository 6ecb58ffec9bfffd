//! Loam - fluent document-store toolkit
//!
//! Loam is a convenience layer over a pluggable document datastore: a fluent
//! query builder, an active-record style model surface, and helpers for
//! pagination, transactions, batched writes, and live listeners.
//!
//! # Quick Start
//!
//! ```ignore
//! use loamdb::prelude::*;
//! use serde_json::json;
//!
//! // An isolated client over the embedded in-process store
//! let client = Client::in_memory();
//! let users = client.collection("users")?;
//!
//! // Create, query, paginate
//! users.create(json!({"name": "Alice", "status": "active"}), None).await?;
//! let active = users
//!     .where_field("status", FilterOp::Eq, json!("active"))
//!     .order_by("name", Direction::Asc)
//!     .get()
//!     .await?;
//! ```
//!
//! # Architecture
//!
//! All storage, indexing, and consistency behavior lives behind the
//! [`Datastore`] seam. The api layer assembles constraint objects and write
//! descriptors and forwards them; swapping in a hosted document database
//! means implementing [`Datastore`] over its client, nothing more.

// Re-export the public API
pub use loam_api::*;
pub use loam_core::{
    array_remove, array_union, delete_field, increment, server_timestamp, CollectionPath, Config,
    CursorBound, Direction, DocId, Document, DocumentPath, Error, FieldValue, Filter, FilterOp,
    OrderBy, Payload, QuerySpec, Result, CREATED_AT_FIELD, DELETED_AT_FIELD, UPDATED_AT_FIELD,
};
pub use loam_storage::{Datastore, MemoryStore, WriteOp, MAX_BATCH_OPS};

/// Convenient single-import surface
pub mod prelude {
    pub use crate::{
        array_remove, array_union, delete_field, increment, server_timestamp, Client,
        CollectionRef, Config, CursorPageRequest, Datastore, Direction, DocId, Error, FieldValue,
        FilterOp, ListenerHandle, MemoryStore, PageRequest, Payload, QueryBuilder, Record, Result,
        SimplePageRequest, WriteContext,
    };
}
