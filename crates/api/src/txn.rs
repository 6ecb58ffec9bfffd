//! Transaction and batch write contexts
//!
//! A `WriteContext` is a queue of pending operations. Queuing performs no
//! I/O; the whole queue replays in enqueue order when the driver commits:
//! atomically for [`Client::transaction`], as one non-atomic round trip for
//! [`Client::batch`].
//!
//! ## The read-position caveat
//!
//! The driver runs the caller's closure to completion, collecting
//! operations, and only then opens the real commit. Every read the closure
//! performs therefore happens OUTSIDE the atomic boundary: a record loaded
//! inside the closure can be modified concurrently before the replay, and
//! this layer will not detect it. The commit's own preconditions (create on
//! existing, update on missing) are still checked atomically. Retrying on
//! conflict is the caller's responsibility; this contract is deliberate and
//! documented rather than silently tightened.

use crate::client::Client;
use crate::collection::CollectionRef;
use crate::record::Record;
use crate::write::{self, WriteKind};
use loam_core::{DocId, Error, Payload, QuerySpec, Result};
use loam_storage::{Datastore, WriteOp};
use parking_lot::Mutex;
use std::future::Future;
use std::sync::Arc;
use tracing::debug;

/// Queue of pending create/update/delete operations
///
/// Passed to both `transaction` and `batch` closures. Cloning shares the
/// same queue; the queue is owned exclusively by one driver invocation for
/// its lifetime.
#[derive(Clone)]
pub struct WriteContext {
    client: Client,
    ops: Arc<Mutex<Vec<WriteOp>>>,
}

impl WriteContext {
    pub(crate) fn new(client: Client) -> Self {
        WriteContext {
            client,
            ops: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn enqueue(&self, op: WriteOp) {
        self.ops.lock().push(op);
    }

    /// Number of operations queued so far
    pub fn op_count(&self) -> usize {
        self.ops.lock().len()
    }

    pub(crate) fn take_ops(&self) -> Vec<WriteOp> {
        std::mem::take(&mut *self.ops.lock())
    }

    /// Queue the creation of an unsaved record
    ///
    /// Mints an id when none is assigned, and marks the record existing at
    /// queue time (the within-transaction create transition). No I/O.
    pub fn create(&self, record: &mut Record) -> Result<()> {
        if record.exists() {
            return Err(Error::invalid_state("record is already persisted"));
        }
        let collection = record.collection().clone();
        let (id, op, _) = write::build_create(
            self.client.config(),
            &collection,
            record.payload(),
            record.id().cloned(),
        )?;
        self.enqueue(op);
        let attrs = record.attrs_mut();
        attrs.set_id(id);
        attrs.set_exists(true);
        attrs.sync_original();
        Ok(())
    }

    /// Queue a create by collection and optional id
    ///
    /// Returns the id the document will have after the commit.
    pub fn create_in(
        &self,
        collection: &CollectionRef,
        data: impl Into<Payload>,
        custom_id: Option<DocId>,
    ) -> Result<DocId> {
        let (id, op, _) = write::build_create(
            self.client.config(),
            collection.path(),
            data.into(),
            custom_id,
        )?;
        self.enqueue(op);
        Ok(id)
    }

    /// Queue an update of a loaded record's current fields
    pub fn update(&self, record: &Record) -> Result<()> {
        write::require(
            record.exists() && record.id().is_some(),
            "update requires a persisted record with an id",
        )?;
        let path = record.document_path()?;
        let data = write::prepare_payload(
            self.client.config(),
            record.payload(),
            WriteKind::Update,
        );
        self.enqueue(WriteOp::Update { path, data });
        Ok(())
    }

    /// Queue an update by collection and id
    pub fn update_by_id(
        &self,
        collection: &CollectionRef,
        id: impl Into<DocId>,
        data: impl Into<Payload>,
    ) -> Result<()> {
        let op = write::build_update(
            self.client.config(),
            collection.path(),
            &id.into(),
            data.into(),
        )?;
        self.enqueue(op);
        Ok(())
    }

    /// Queue the deletion of a loaded record
    pub fn delete(&self, record: &Record) -> Result<()> {
        let path = record.document_path()?;
        self.enqueue(WriteOp::Delete { path });
        Ok(())
    }

    /// Queue a deletion by collection and id
    pub fn delete_by_id(&self, collection: &CollectionRef, id: impl Into<DocId>) -> Result<()> {
        let path = collection.path().doc(&id.into())?;
        self.enqueue(WriteOp::Delete { path });
        Ok(())
    }

    /// Queue the deletion of every child in one of a record's
    /// subcollections
    ///
    /// The child id list is snapshotted NOW, at queue time: children added
    /// between this call and the commit are not included. Returns the number
    /// of deletes queued.
    pub async fn delete_subcollection(
        &self,
        record: &Record,
        name: impl Into<String>,
    ) -> Result<usize> {
        let path = record.document_path()?.subcollection(name)?;
        let children = self
            .client
            .store()
            .run_query(&QuerySpec::all(path.clone()))
            .await?;
        let count = children.len();
        for child in children {
            let child_path = path.doc(&DocId::from(child.id.as_str()))?;
            self.enqueue(WriteOp::Delete { path: child_path });
        }
        debug!(path = %path, count, "delete_subcollection queued");
        Ok(count)
    }

    /// Queue a record's cascading deletion: named subcollections first,
    /// the parent last
    ///
    /// The ordering keeps query results from orphaning mid-flight. Caller
    /// logic that must run first (the before-delete hook) is ordinary code
    /// preceding this call.
    pub async fn delete_cascade(
        &self,
        record: &Record,
        subcollections: &[&str],
    ) -> Result<()> {
        for name in subcollections {
            self.delete_subcollection(record, *name).await?;
        }
        self.delete(record)
    }
}

impl Client {
    /// Run a closure that queues operations, then replay them atomically
    ///
    /// The closure's return value is returned on success. A closure error
    /// aborts before any I/O: nothing is committed. See the module docs for
    /// the read-position caveat.
    pub async fn transaction<F, Fut, R>(&self, f: F) -> Result<R>
    where
        F: FnOnce(WriteContext) -> Fut,
        Fut: Future<Output = Result<R>>,
    {
        let ctx = WriteContext::new(self.clone());
        let result = f(ctx.clone()).await?;
        let ops = ctx.take_ops();
        if !ops.is_empty() {
            debug!(ops = ops.len(), "transaction replay");
            self.store().commit_atomic(ops).await?;
        }
        Ok(result)
    }

    /// Run a closure that queues operations, then replay them as one batch
    /// round trip
    ///
    /// Batches are not atomic the way transactions are: a failed operation
    /// aborts the remainder, but operations already applied in the same
    /// round trip stay applied. This surfaces the delegated-to primitive's
    /// behavior faithfully rather than masking it.
    pub async fn batch<F, Fut>(&self, f: F) -> Result<()>
    where
        F: FnOnce(WriteContext) -> Fut,
        Fut: Future<Output = Result<()>>,
    {
        let ctx = WriteContext::new(self.clone());
        f(ctx.clone()).await?;
        let ops = ctx.take_ops();
        if !ops.is_empty() {
            debug!(ops = ops.len(), "batch replay");
            self.store().commit_batch(ops).await?;
        }
        Ok(())
    }
}
