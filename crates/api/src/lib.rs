//! Convenience layer over a document datastore
//!
//! This crate is the public surface of Loam:
//! - [`Client`]: explicit handle carrying the datastore and configuration
//! - [`CollectionRef`]: per-collection operations (find, load, create,
//!   update, destroy, listen, subcollections)
//! - [`Record`]: active-record instance with dirty tracking
//! - [`QueryBuilder`]: fluent constraint accumulation with read, write,
//!   pagination, and listener terminals
//! - [`WriteContext`]: queued transaction/batch writes replayed in order
//!
//! Everything here assembles constraints and write descriptors and forwards
//! them to the datastore seam; storage, indexing, and consistency are the
//! backend's problem.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod attributes;
pub mod builder;
pub mod client;
pub mod collection;
pub mod listen;
pub mod paginate;
pub mod record;
pub mod txn;
mod write;

pub use attributes::Attributes;
pub use builder::QueryBuilder;
pub use client::Client;
pub use collection::CollectionRef;
pub use listen::ListenerHandle;
pub use paginate::{
    CursorPage, CursorPageRequest, Page, PageMeta, PageRequest, SimplePage, SimplePageRequest,
    DEFAULT_PER_PAGE,
};
pub use record::Record;
pub use txn::WriteContext;
