//! Active-record instance
//!
//! A `Record` wraps one attribute container and knows the collection it
//! belongs to. It moves through a simple lifecycle:
//!
//! ```text
//! {unsaved} --create/save--> {existing} --delete--> {deleted}
//!                 {existing} --update/save--> {existing}
//! ```
//!
//! Instance-level writes require a persisted id and `exists`; anything else
//! raises `InvalidState`.

use crate::attributes::Attributes;
use crate::client::Client;
use crate::collection::CollectionRef;
use crate::write::{self, WriteKind};
use loam_core::{
    CollectionPath, DocId, Document, DocumentPath, Error, Payload, Result,
};
use loam_storage::{Datastore, WriteOp};
use serde::de::DeserializeOwned;
use serde_json::Value as Json;
use tracing::debug;

/// One addressable item in a named collection
#[derive(Debug, Clone)]
pub struct Record {
    client: Client,
    collection: CollectionPath,
    attrs: Attributes,
}

impl Record {
    /// A new, unsaved record holding the given fields
    pub(crate) fn new_unsaved(client: Client, collection: CollectionPath, data: Json) -> Self {
        let mut attrs = Attributes::new();
        attrs.fill(data);
        Record {
            client,
            collection,
            attrs,
        }
    }

    /// A record materialized from a loaded document (`exists` set, clean)
    pub(crate) fn from_document(
        client: Client,
        collection: CollectionPath,
        doc: Document,
    ) -> Self {
        Record {
            client,
            collection,
            attrs: Attributes::loaded(DocId::Str(doc.id), doc.data),
        }
    }

    /// A record freshly persisted by a create
    pub(crate) fn created(
        client: Client,
        collection: CollectionPath,
        id: DocId,
        data: Payload,
    ) -> Self {
        let mut attrs = Attributes::new();
        attrs.fill(Json::Object(data.literal_fields()));
        attrs.set_id(id);
        attrs.set_exists(true);
        attrs.sync_original();
        Record {
            client,
            collection,
            attrs,
        }
    }

    /// The record's id, if assigned
    pub fn id(&self) -> Option<&DocId> {
        self.attrs.id()
    }

    /// Has this record been persisted?
    pub fn exists(&self) -> bool {
        self.attrs.exists()
    }

    /// The collection path this record belongs to
    pub fn collection(&self) -> &CollectionPath {
        &self.collection
    }

    /// Borrow one field
    pub fn get(&self, field: &str) -> Option<&Json> {
        self.attrs.get(field)
    }

    /// Set one field in memory
    pub fn set(&mut self, field: impl Into<String>, value: impl Into<Json>) {
        self.attrs.set(field, value);
    }

    /// Merge fields in memory, last write wins per field
    pub fn fill(&mut self, data: Json) {
        self.attrs.fill(data);
    }

    /// Unsaved local modifications?
    pub fn is_dirty(&self) -> bool {
        self.attrs.is_dirty()
    }

    /// The plain-object shape with the id merged in
    pub fn to_object(&self) -> Json {
        self.attrs.to_object()
    }

    /// Deserialize the plain-object shape into a typed value
    pub fn to_typed<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_value(self.to_object())?)
    }

    /// Storage path of this record; `InvalidState` when no id is assigned
    pub fn document_path(&self) -> Result<DocumentPath> {
        let id = self
            .attrs
            .id()
            .ok_or_else(|| Error::invalid_state("record has no id"))?;
        self.collection.doc(id)
    }

    /// Attribute access for the transaction context
    pub(crate) fn attrs_mut(&mut self) -> &mut Attributes {
        &mut self.attrs
    }

    /// The current fields as a write payload
    pub(crate) fn payload(&self) -> Payload {
        Payload::from(self.attrs.current().clone())
    }

    /// Persist the record: create when unsaved, update when existing
    pub async fn save(&mut self) -> Result<()> {
        if self.exists() {
            write::require(self.attrs.id().is_some(), "record has no id")?;
            let path = self.document_path()?;
            let data = write::prepare_payload(
                self.client.config(),
                self.payload(),
                WriteKind::Update,
            );
            debug!(path = %path, "record update");
            self.client
                .store()
                .commit_atomic(vec![WriteOp::Update { path, data }])
                .await?;
        } else {
            let id = self
                .attrs
                .id()
                .cloned()
                .unwrap_or_else(DocId::generate);
            let path = self.collection.doc(&id)?;
            let data = write::prepare_payload(
                self.client.config(),
                self.payload(),
                WriteKind::Create,
            );
            debug!(path = %path, "record create");
            self.client
                .store()
                .commit_atomic(vec![WriteOp::Set { path, data }])
                .await?;
            self.attrs.set_id(id);
            self.attrs.set_exists(true);
        }
        self.attrs.sync_original();
        Ok(())
    }

    /// Merge fields and persist; requires a persisted record
    pub async fn update(&mut self, data: Json) -> Result<()> {
        write::require(
            self.exists() && self.attrs.id().is_some(),
            "update requires a persisted record with an id",
        )?;
        self.fill(data);
        self.save().await
    }

    /// Delete (or soft-delete) the record; requires a persisted record
    ///
    /// With soft deletes enabled the document stays in storage with
    /// `deletedAt` stamped, and `exists` stays true; otherwise the document
    /// is removed and the record becomes terminal.
    pub async fn delete(&mut self) -> Result<()> {
        write::require(
            self.exists() && self.attrs.id().is_some(),
            "delete requires a persisted record with an id",
        )?;
        let config = self.client.config();
        let path = self.document_path()?;
        if config.soft_deletes {
            let id = DocId::from(path.id());
            let op = write::build_soft_delete(config, &self.collection, &id)?;
            debug!(path = %path, "record soft delete");
            self.client.store().commit_atomic(vec![op]).await?;
        } else {
            debug!(path = %path, "record delete");
            self.client
                .store()
                .commit_atomic(vec![WriteOp::Delete { path }])
                .await?;
            self.attrs.set_exists(false);
        }
        Ok(())
    }

    /// Re-read by id and replace local state; `InvalidState` when no id
    ///
    /// A record deleted out from under us comes back with `exists` unset and
    /// local fields untouched.
    pub async fn refresh(&mut self) -> Result<()> {
        let path = self.document_path()?;
        match self.client.store().get(&path).await? {
            Some(doc) => {
                self.attrs.replace(doc.data);
                self.attrs.set_exists(true);
            }
            None => self.attrs.set_exists(false),
        }
        Ok(())
    }

    /// A subcollection rooted at this record; requires a populated id
    pub fn subcollection(&self, name: impl Into<String>) -> Result<CollectionRef> {
        let path = self.document_path()?.subcollection(name)?;
        Ok(CollectionRef::new(self.client.clone(), path))
    }
}
