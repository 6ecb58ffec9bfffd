//! Storage seam for Loam
//!
//! This crate defines the boundary to the document database that actually
//! holds data:
//! - `Datastore`: the async client abstraction every upper layer talks to
//! - `WriteOp`: the write descriptors replayed by atomic and batch commits
//! - `MemoryStore`: a complete in-process implementation, used by tests and
//!   as an embedded default
//! - query evaluation helpers shared by in-process backends
//!
//! Swapping in a hosted backend means implementing `Datastore` over that
//! service's client; nothing above this crate changes.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod datastore;
pub mod eval;
pub mod memory;

pub use datastore::{
    Datastore, DocumentSubscription, QuerySubscription, WriteOp, MAX_BATCH_OPS,
};
pub use memory::MemoryStore;
