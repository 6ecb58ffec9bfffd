//! Collection reference
//!
//! The per-collection surface: lookups, creation, direct updates, deletes,
//! live listeners, and the entry points into the constraint builder. A
//! `CollectionRef` addresses either a root collection or a subcollection;
//! every operation behaves identically at any depth.

use crate::builder::QueryBuilder;
use crate::client::Client;
use crate::listen::{spawn_document_listener, ListenerHandle};
use crate::record::Record;
use crate::write;
use loam_core::{
    CollectionPath, Direction, DocId, Error, FilterOp, Payload, Result,
};
use loam_storage::{Datastore, WriteOp};
use serde::de::DeserializeOwned;
use serde_json::Value as Json;
use tracing::debug;

/// Reference to one collection or subcollection
#[derive(Clone)]
pub struct CollectionRef {
    client: Client,
    path: CollectionPath,
}

impl CollectionRef {
    pub(crate) fn new(client: Client, path: CollectionPath) -> Self {
        CollectionRef { client, path }
    }

    /// The collection's path
    pub fn path(&self) -> &CollectionPath {
        &self.path
    }

    /// The collection's name (last path segment)
    pub fn name(&self) -> &str {
        self.path.name()
    }

    /// The owning client
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// An empty constraint builder over this collection
    pub fn query(&self) -> QueryBuilder {
        QueryBuilder::new(self.client.clone(), self.path.clone())
    }

    /// Start a builder with one filter predicate
    pub fn where_field(
        &self,
        field: impl Into<String>,
        op: FilterOp,
        value: impl Into<Json>,
    ) -> QueryBuilder {
        self.query().where_field(field, op, value)
    }

    /// Start a builder with an `in` predicate
    pub fn where_in(
        &self,
        field: impl Into<String>,
        values: impl IntoIterator<Item = Json>,
    ) -> QueryBuilder {
        self.query().where_in(field, values)
    }

    /// Start a builder with a `not-in` predicate
    pub fn where_not_in(
        &self,
        field: impl Into<String>,
        values: impl IntoIterator<Item = Json>,
    ) -> QueryBuilder {
        self.query().where_not_in(field, values)
    }

    /// Start a builder with one sort key
    pub fn order_by(&self, field: impl Into<String>, direction: Direction) -> QueryBuilder {
        self.query().order_by(field, direction)
    }

    /// Start a builder with a row limit
    pub fn limit(&self, limit: usize) -> QueryBuilder {
        self.query().limit(limit)
    }

    /// Unconditioned read of the entire collection
    ///
    /// No implicit limit; the caller owns the scale question.
    pub async fn all(&self) -> Result<Vec<Json>> {
        self.query().get().await
    }

    /// Read-only lookup by id; never constructs a record
    pub async fn find(&self, id: impl Into<DocId>) -> Result<Option<Json>> {
        let path = self.path.doc(&id.into())?;
        Ok(self
            .client
            .store()
            .get(&path)
            .await?
            .map(|doc| doc.into_json()))
    }

    /// As [`CollectionRef::find`], but raises `NotFound` when absent
    pub async fn find_or_fail(&self, id: impl Into<DocId>) -> Result<Json> {
        let id = id.into();
        self.find(id.clone())
            .await?
            .ok_or_else(|| Error::not_found(format!("{}/{id}", self.path)))
    }

    /// Typed lookup by id
    pub async fn find_as<T: DeserializeOwned>(&self, id: impl Into<DocId>) -> Result<Option<T>> {
        match self.find(id).await? {
            Some(json) => Ok(Some(serde_json::from_value(json)?)),
            None => Ok(None),
        }
    }

    /// Lookup wrapped in a record ready for update/delete
    pub async fn load(&self, id: impl Into<DocId>) -> Result<Option<Record>> {
        let path = self.path.doc(&id.into())?;
        Ok(self.client.store().get(&path).await?.map(|doc| {
            Record::from_document(self.client.clone(), self.path.clone(), doc)
        }))
    }

    /// An unsaved record holding the given fields
    pub fn record(&self, data: Json) -> Record {
        Record::new_unsaved(self.client.clone(), self.path.clone(), data)
    }

    /// Create and persist a record
    ///
    /// A pre-assigned id (the `custom_id` argument or an `id` field embedded
    /// in the data) keeps set-if-absent-or-overwrite semantics; otherwise a
    /// fresh id is minted. One network write.
    pub async fn create(
        &self,
        data: impl Into<Payload>,
        custom_id: Option<DocId>,
    ) -> Result<Record> {
        let (id, op, payload) =
            write::build_create(self.client.config(), &self.path, data.into(), custom_id)?;
        debug!(path = %op.path(), "create");
        self.client.store().commit_atomic(vec![op]).await?;
        Ok(Record::created(
            self.client.clone(),
            self.path.clone(),
            id,
            payload,
        ))
    }

    /// Write directly to storage by id, without a prior read
    ///
    /// Strips any `id` field from the payload and stamps the update time.
    /// Fails with the storage layer's precondition error when the target
    /// does not exist; nothing is pre-checked here.
    pub async fn update(&self, id: impl Into<DocId>, data: impl Into<Payload>) -> Result<()> {
        let op = write::build_update(self.client.config(), &self.path, &id.into(), data.into())?;
        debug!(path = %op.path(), "update");
        self.client.store().commit_atomic(vec![op]).await
    }

    /// Read the record, then delete or soft-delete it
    ///
    /// Silently no-ops when the record does not exist
    /// (read-then-maybe-delete, not delete-if-exists).
    pub async fn destroy(&self, id: impl Into<DocId>) -> Result<()> {
        let id = id.into();
        let path = self.path.doc(&id)?;
        if self.client.store().get(&path).await?.is_none() {
            return Ok(());
        }
        let op = if self.client.config().soft_deletes {
            write::build_soft_delete(self.client.config(), &self.path, &id)?
        } else {
            WriteOp::Delete { path: path.clone() }
        };
        debug!(path = %path, soft = self.client.config().soft_deletes, "destroy");
        self.client.store().commit_atomic(vec![op]).await
    }

    /// The subcollection `<thisCollection>/<parent_id>/<name>`
    pub fn subcollection(
        &self,
        parent_id: impl Into<DocId>,
        name: impl Into<String>,
    ) -> Result<CollectionRef> {
        let path = self.path.doc(&parent_id.into())?.subcollection(name)?;
        Ok(CollectionRef::new(self.client.clone(), path))
    }

    /// Live subscription to one document
    ///
    /// The callback receives the plain payload, or `None` on delete (and on
    /// swallowed transport errors). Runs until the returned handle's
    /// `unsubscribe` is called.
    pub async fn listen<F>(&self, id: impl Into<DocId>, callback: F) -> Result<ListenerHandle>
    where
        F: FnMut(Option<Json>) + Send + 'static,
    {
        let path = self.path.doc(&id.into())?;
        let subscription = self.client.store().listen_document(path).await?;
        Ok(spawn_document_listener(subscription, callback))
    }
}
