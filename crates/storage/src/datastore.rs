//! Datastore seam
//!
//! This trait is the boundary between the convenience layer and the
//! document-database client that actually stores data. Everything above it
//! assembles constraint objects and write descriptors; everything below it
//! owns storage, indexing, consistency, and the network.
//!
//! ## Contract
//!
//! - `commit_atomic` is all-or-nothing: a failed precondition leaves no
//!   write applied.
//! - `commit_batch` is one round trip but NOT atomic: a failure aborts the
//!   remaining operations while earlier ones in the same call stay applied.
//! - Both commits refuse more than [`MAX_BATCH_OPS`] operations.
//! - Listeners push the current state on subscribe, then once per relevant
//!   change, until the subscription is dropped.

use async_trait::async_trait;
use loam_core::{Document, DocumentPath, Payload, QuerySpec, Result};
use tokio::sync::mpsc;

/// Operation ceiling for a single atomic or batch commit
pub const MAX_BATCH_OPS: usize = 500;

/// One write descriptor replayed by a commit
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOp {
    /// Create the document; fails with `AlreadyExists` if present
    Create {
        /// Target document
        path: DocumentPath,
        /// Fields to write
        data: Payload,
    },
    /// Write the document whether or not it exists, replacing its fields
    Set {
        /// Target document
        path: DocumentPath,
        /// Fields to write
        data: Payload,
    },
    /// Merge fields into an existing document; fails with
    /// `PreconditionFailed` if absent
    Update {
        /// Target document
        path: DocumentPath,
        /// Fields to merge
        data: Payload,
    },
    /// Delete the document; succeeds even when absent
    Delete {
        /// Target document
        path: DocumentPath,
    },
}

impl WriteOp {
    /// The document path this operation targets
    pub fn path(&self) -> &DocumentPath {
        match self {
            WriteOp::Create { path, .. }
            | WriteOp::Set { path, .. }
            | WriteOp::Update { path, .. }
            | WriteOp::Delete { path } => path,
        }
    }
}

/// Push channel for one watched document
///
/// Each received item is the document's current state (`None` after delete),
/// or the transport error that interrupted the subscription.
pub struct DocumentSubscription {
    receiver: mpsc::Receiver<Result<Option<Document>>>,
}

impl DocumentSubscription {
    /// Wrap a receiver end
    pub fn new(receiver: mpsc::Receiver<Result<Option<Document>>>) -> Self {
        DocumentSubscription { receiver }
    }

    /// Next snapshot, or `None` when the subscription ended
    pub async fn recv(&mut self) -> Option<Result<Option<Document>>> {
        self.receiver.recv().await
    }
}

/// Push channel for one watched query
///
/// Each received item is the full current result set (not a diff), or the
/// transport error that interrupted the subscription.
pub struct QuerySubscription {
    receiver: mpsc::Receiver<Result<Vec<Document>>>,
}

impl QuerySubscription {
    /// Wrap a receiver end
    pub fn new(receiver: mpsc::Receiver<Result<Vec<Document>>>) -> Self {
        QuerySubscription { receiver }
    }

    /// Next snapshot, or `None` when the subscription ended
    pub async fn recv(&mut self) -> Option<Result<Vec<Document>>> {
        self.receiver.recv().await
    }
}

/// Document-database client abstraction
///
/// Implementations must be safe to share across tasks (`Send + Sync`); the
/// client handle holds one behind an `Arc` for the life of the process.
#[async_trait]
pub trait Datastore: Send + Sync {
    /// Read one document
    ///
    /// Returns `None` when the document does not exist.
    async fn get(&self, path: &DocumentPath) -> Result<Option<Document>>;

    /// Execute a read plan and return the matching documents in query order
    async fn run_query(&self, query: &QuerySpec) -> Result<Vec<Document>>;

    /// Server-side count of the documents a read plan matches
    ///
    /// Ignores the plan's row limit.
    async fn count(&self, query: &QuerySpec) -> Result<u64>;

    /// Apply operations atomically, in order
    ///
    /// Nothing is applied if any operation's precondition fails.
    async fn commit_atomic(&self, ops: Vec<WriteOp>) -> Result<()>;

    /// Apply operations in order as one round trip, stopping at the first
    /// failure
    ///
    /// Operations applied before the failure stay applied. Returns the
    /// number of operations applied.
    async fn commit_batch(&self, ops: Vec<WriteOp>) -> Result<usize>;

    /// Subscribe to one document's state
    async fn listen_document(&self, path: DocumentPath) -> Result<DocumentSubscription>;

    /// Subscribe to a read plan's result set
    async fn listen_query(&self, query: QuerySpec) -> Result<QuerySubscription>;
}
