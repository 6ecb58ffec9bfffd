//! Write preparation shared by the collection, builder, record, and
//! transaction paths
//!
//! Every write payload passes through here exactly once before reaching the
//! datastore: the `id` field is stripped (ids are positional in the storage
//! path, never part of the payload), and `createdAt`/`updatedAt` server
//! timestamps are injected when the configuration asks for them. Explicitly
//! supplied stamp fields are left alone.

use loam_core::{
    server_timestamp, CollectionPath, Config, DocId, Error, FieldValue, Payload, Result,
    CREATED_AT_FIELD, UPDATED_AT_FIELD,
};
use loam_storage::WriteOp;
use serde_json::Value as Json;

/// Which stamps a write receives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WriteKind {
    /// First persistence of a record
    Create,
    /// Mutation of an existing record
    Update,
}

/// Strip the id field and inject timestamp stamps per configuration
pub(crate) fn prepare_payload(config: Config, mut payload: Payload, kind: WriteKind) -> Payload {
    payload.remove("id");
    if config.timestamps {
        if kind == WriteKind::Create {
            payload.insert_if_absent(CREATED_AT_FIELD, server_timestamp());
        }
        payload.insert_if_absent(UPDATED_AT_FIELD, server_timestamp());
    }
    payload
}

/// Pull an embedded `id` field out of a payload, if one is present
///
/// The field is removed either way; only string and integer ids are honored.
pub(crate) fn extract_embedded_id(payload: &mut Payload) -> Option<DocId> {
    match payload.remove("id") {
        Some(FieldValue::Set(Json::String(s))) => Some(DocId::Str(s)),
        Some(FieldValue::Set(Json::Number(n))) => n.as_i64().map(DocId::Int),
        _ => None,
    }
}

/// Assemble the create write for a collection
///
/// A pre-assigned id (custom argument, or embedded in the payload) keeps
/// set-if-absent-or-overwrite semantics so re-running the same create is
/// idempotent; otherwise a fresh id is minted client-side. Returns the id,
/// the write descriptor, and the literal fields for the in-memory record.
pub(crate) fn build_create(
    config: Config,
    collection: &CollectionPath,
    data: Payload,
    custom_id: Option<DocId>,
) -> Result<(DocId, WriteOp, Payload)> {
    let mut payload = data;
    let embedded = extract_embedded_id(&mut payload);
    let id = custom_id.or(embedded).unwrap_or_else(DocId::generate);
    let path = collection.doc(&id)?;
    let prepared = prepare_payload(config, payload.clone(), WriteKind::Create);
    Ok((id, WriteOp::Set { path, data: prepared }, payload))
}

/// Assemble the direct-update write for a collection
///
/// No prior read: a missing target surfaces as the storage layer's
/// precondition failure at commit time.
pub(crate) fn build_update(
    config: Config,
    collection: &CollectionPath,
    id: &DocId,
    data: Payload,
) -> Result<WriteOp> {
    let path = collection.doc(id)?;
    let prepared = prepare_payload(config, data, WriteKind::Update);
    Ok(WriteOp::Update { path, data: prepared })
}

/// The write used in place of a delete when soft deletes are enabled
pub(crate) fn build_soft_delete(
    config: Config,
    collection: &CollectionPath,
    id: &DocId,
) -> Result<WriteOp> {
    let payload = Payload::new().field(loam_core::DELETED_AT_FIELD, server_timestamp());
    build_update(config, collection, id, payload)
}

/// Fail with `InvalidState` unless the record-side preconditions hold
pub(crate) fn require(condition: bool, what: &str) -> Result<()> {
    if condition {
        Ok(())
    } else {
        Err(Error::invalid_state(what.to_string()))
    }
}
