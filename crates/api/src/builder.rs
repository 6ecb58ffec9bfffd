//! Constraint builder
//!
//! Accumulates filter/order/limit constraints and renders them into reads,
//! writes, live subscriptions, and the three pagination shapes. Accumulation
//! is pure: nothing touches the network until a terminal method runs.
//!
//! Cloning a builder copies the constraint list by value; two clones never
//! share state. Rendering (`spec()`) happens fresh per execution, so a
//! builder can be reused.
//!
//! There is exactly one fetch primitive, [`QueryBuilder::fetch_documents`];
//! `get`, `get_records`, and `get_as` are independent formatting adapters
//! over it.

use crate::client::Client;
use crate::listen::{spawn_query_listener, ListenerHandle};
use crate::record::Record;
use crate::write;
use loam_core::{
    CollectionPath, Direction, DocId, Document, Error, Filter, FilterOp, OrderBy, Payload,
    QuerySpec, Result,
};
use loam_storage::{Datastore, WriteOp, MAX_BATCH_OPS};
use serde::de::DeserializeOwned;
use serde_json::Value as Json;
use tracing::debug;

/// An unexecuted read/write plan over one collection or subcollection
#[derive(Clone)]
pub struct QueryBuilder {
    client: Client,
    path: CollectionPath,
    filters: Vec<Filter>,
    orders: Vec<OrderBy>,
    limit: Option<usize>,
}

impl QueryBuilder {
    pub(crate) fn new(client: Client, path: CollectionPath) -> Self {
        QueryBuilder {
            client,
            path,
            filters: Vec::new(),
            orders: Vec::new(),
            limit: None,
        }
    }

    /// The target collection path
    pub fn path(&self) -> &CollectionPath {
        &self.path
    }

    pub(crate) fn client(&self) -> &Client {
        &self.client
    }

    pub(crate) fn orders(&self) -> &[OrderBy] {
        &self.orders
    }

    // ------------------------------------------------------------------
    // Accumulators
    // ------------------------------------------------------------------

    /// Add a filter predicate
    pub fn where_field(
        mut self,
        field: impl Into<String>,
        op: FilterOp,
        value: impl Into<Json>,
    ) -> Self {
        self.filters.push(Filter::new(field, op, value));
        self
    }

    /// Add an `in` predicate
    pub fn where_in(
        self,
        field: impl Into<String>,
        values: impl IntoIterator<Item = Json>,
    ) -> Self {
        let operand: Vec<Json> = values.into_iter().collect();
        self.where_field(field, FilterOp::In, Json::Array(operand))
    }

    /// Add a `not-in` predicate
    pub fn where_not_in(
        self,
        field: impl Into<String>,
        values: impl IntoIterator<Item = Json>,
    ) -> Self {
        let operand: Vec<Json> = values.into_iter().collect();
        self.where_field(field, FilterOp::NotIn, Json::Array(operand))
    }

    /// Add a sort key
    pub fn order_by(mut self, field: impl Into<String>, direction: Direction) -> Self {
        self.orders.push(OrderBy::new(field, direction));
        self
    }

    /// Cap the number of rows returned
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Render the accumulated constraints into a read plan
    pub(crate) fn spec(&self) -> QuerySpec {
        let mut spec = QuerySpec::all(self.path.clone());
        spec.filters = self.filters.clone();
        spec.orders = self.orders.clone();
        spec.limit = self.limit;
        spec
    }

    // ------------------------------------------------------------------
    // Read terminals
    // ------------------------------------------------------------------

    /// The single fetch primitive behind every read terminal
    pub async fn fetch_documents(&self) -> Result<Vec<Document>> {
        self.client.store().run_query(&self.spec()).await
    }

    /// Execute and return plain payloads, each with its id merged in
    pub async fn get(&self) -> Result<Vec<Json>> {
        Ok(self
            .fetch_documents()
            .await?
            .into_iter()
            .map(Document::into_json)
            .collect())
    }

    /// Execute and return records ready for update/delete
    pub async fn get_records(&self) -> Result<Vec<Record>> {
        Ok(self
            .fetch_documents()
            .await?
            .into_iter()
            .map(|doc| Record::from_document(self.client.clone(), self.path.clone(), doc))
            .collect())
    }

    /// Execute and deserialize each payload into a typed value
    pub async fn get_as<T: DeserializeOwned>(&self) -> Result<Vec<T>> {
        self.fetch_documents()
            .await?
            .into_iter()
            .map(|doc| serde_json::from_value(doc.into_json()).map_err(Error::from))
            .collect()
    }

    /// First matching payload, via an injected limit of 1
    pub async fn first(&self) -> Result<Option<Json>> {
        let mut spec = self.spec();
        spec.limit = Some(1);
        let docs = self.client.store().run_query(&spec).await?;
        Ok(docs.into_iter().next().map(Document::into_json))
    }

    /// As [`QueryBuilder::first`], but raises `NotFound` on an empty result
    pub async fn first_or_fail(&self) -> Result<Json> {
        self.first()
            .await?
            .ok_or_else(|| Error::not_found(format!("no match in {}", self.path)))
    }

    /// Direct lookup by id under the target path
    ///
    /// Independent of the accumulated constraints: filters apply to
    /// `get`/`paginate`, never to `find`.
    pub async fn find(&self, id: impl Into<DocId>) -> Result<Option<Json>> {
        let path = self.path.doc(&id.into())?;
        Ok(self
            .client
            .store()
            .get(&path)
            .await?
            .map(Document::into_json))
    }

    /// Server-side count of the filtered set
    pub async fn count(&self) -> Result<u64> {
        self.client.store().count(&self.spec()).await
    }

    /// Does the filtered set contain anything?
    pub async fn exists(&self) -> Result<bool> {
        Ok(self.count().await? > 0)
    }

    // ------------------------------------------------------------------
    // Write terminals (bypass the record instance path)
    // ------------------------------------------------------------------

    /// Create a record directly under the target path
    pub async fn create(
        &self,
        data: impl Into<Payload>,
        custom_id: Option<DocId>,
    ) -> Result<Record> {
        let (id, op, payload) =
            write::build_create(self.client.config(), &self.path, data.into(), custom_id)?;
        debug!(path = %op.path(), "builder create");
        self.client.store().commit_atomic(vec![op]).await?;
        Ok(Record::created(
            self.client.clone(),
            self.path.clone(),
            id,
            payload,
        ))
    }

    /// Update a document by id directly under the target path
    pub async fn update(&self, id: impl Into<DocId>, data: impl Into<Payload>) -> Result<()> {
        let op = write::build_update(self.client.config(), &self.path, &id.into(), data.into())?;
        debug!(path = %op.path(), "builder update");
        self.client.store().commit_atomic(vec![op]).await
    }

    /// Read-then-maybe-delete by id directly under the target path
    pub async fn destroy(&self, id: impl Into<DocId>) -> Result<()> {
        let id = id.into();
        let path = self.path.doc(&id)?;
        if self.client.store().get(&path).await?.is_none() {
            return Ok(());
        }
        let op = if self.client.config().soft_deletes {
            write::build_soft_delete(self.client.config(), &self.path, &id)?
        } else {
            WriteOp::Delete { path }
        };
        self.client.store().commit_atomic(vec![op]).await
    }

    /// Delete every matching document in sequential chunks of at most 500
    ///
    /// Re-fetches the matching set, then issues one batch round trip per
    /// chunk. Not atomic across chunks: a failure partway through leaves
    /// earlier chunks deleted, and the error reports nothing about which ids
    /// survived. Returns the total number deleted.
    pub async fn delete_all(&self) -> Result<u64> {
        let docs = self.fetch_documents().await?;
        let mut deleted = 0u64;
        for chunk in docs.chunks(MAX_BATCH_OPS) {
            let ops = chunk
                .iter()
                .map(|doc| {
                    Ok(WriteOp::Delete {
                        path: self.path.doc(&DocId::from(doc.id.as_str()))?,
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            self.client.store().commit_batch(ops).await?;
            deleted += chunk.len() as u64;
        }
        debug!(path = %self.path, deleted, "delete_all");
        Ok(deleted)
    }

    // ------------------------------------------------------------------
    // Live subscription
    // ------------------------------------------------------------------

    /// Live subscription over the constrained query
    ///
    /// The callback receives the full current result set (not a diff) on
    /// every change; transport errors collapse to an empty-set invocation.
    pub async fn listen<F>(&self, callback: F) -> Result<ListenerHandle>
    where
        F: FnMut(Vec<Json>) + Send + 'static,
    {
        let subscription = self.client.store().listen_query(self.spec()).await?;
        Ok(spawn_query_listener(subscription, callback))
    }
}
