//! MemoryStore: in-process Datastore implementation
//!
//! ## Design: single map behind a lock
//!
//! Documents live in one `RwLock<BTreeMap<collection path, BTreeMap<id,
//! fields>>>`. Commits take the write lock once, so atomic commits are
//! trivially serialized; there is no versioning or conflict machinery to
//! maintain because the lock is the isolation.
//!
//! ## Change notification
//!
//! Every commit broadcasts the set of touched collection paths. Listener
//! tasks recompute their snapshot when a touched path matches theirs, and
//! only push downstream when the snapshot actually changed.
//!
//! ## Sentinel resolution
//!
//! Write sentinels (`ServerTimestamp`, `Increment`, `ArrayUnion`,
//! `ArrayRemove`, `Delete`) resolve here, against the document's current
//! fields, at apply time. Timestamps are RFC 3339 strings so they order
//! correctly under string comparison.

use crate::datastore::{
    Datastore, DocumentSubscription, QuerySubscription, WriteOp, MAX_BATCH_OPS,
};
use crate::eval::apply_query;
use async_trait::async_trait;
use chrono::Utc;
use loam_core::{
    Document, DocumentPath, Error, FieldValue, Payload, QuerySpec, Result,
};
use parking_lot::RwLock;
use serde_json::{Map, Value as Json};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, trace};

/// Broadcast capacity for change events; a lagged listener recomputes from
/// current state, so dropped events are harmless
const CHANGE_CHANNEL_CAPACITY: usize = 256;

/// Buffer size of each subscription's push channel
const SUBSCRIPTION_BUFFER: usize = 32;

type Fields = Map<String, Json>;
type Collection = BTreeMap<String, Fields>;

/// Collections touched by one commit
#[derive(Debug, Clone)]
struct ChangeEvent {
    collections: Arc<BTreeSet<String>>,
}

struct Inner {
    collections: RwLock<BTreeMap<String, Collection>>,
    changes: broadcast::Sender<ChangeEvent>,
}

/// In-process implementation of the [`Datastore`] contract
///
/// Complete enough to stand in for a hosted document database in tests and
/// embedded use: all ten filter operators, ordering with the id tiebreak,
/// cursor windows, native counts, atomic and batch commits with the
/// [`MAX_BATCH_OPS`] ceiling, and push-based listeners.
#[derive(Clone)]
pub struct MemoryStore {
    inner: Arc<Inner>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        MemoryStore {
            inner: Arc::new(Inner {
                collections: RwLock::new(BTreeMap::new()),
                changes,
            }),
        }
    }

    fn read_doc(&self, path: &DocumentPath) -> Option<Document> {
        let collections = self.inner.collections.read();
        collections
            .get(&path.collection().as_string())
            .and_then(|coll| coll.get(path.id()))
            .map(|fields| Document::new(path.id(), fields.clone()))
    }

    fn collection_docs(&self, query: &QuerySpec) -> Vec<Document> {
        let collections = self.inner.collections.read();
        collections
            .get(&query.collection.as_string())
            .map(|coll| {
                coll.iter()
                    .map(|(id, fields)| Document::new(id.clone(), fields.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn publish(&self, touched: BTreeSet<String>) {
        if touched.is_empty() {
            return;
        }
        // Send fails only when no listener is subscribed
        let _ = self.inner.changes.send(ChangeEvent {
            collections: Arc::new(touched),
        });
    }

    /// Validate one op's precondition against the current map
    fn check_precondition(
        collections: &BTreeMap<String, Collection>,
        op: &WriteOp,
    ) -> Result<()> {
        let path = op.path();
        let exists = collections
            .get(&path.collection().as_string())
            .is_some_and(|coll| coll.contains_key(path.id()));
        match op {
            WriteOp::Create { .. } if exists => {
                Err(Error::AlreadyExists(path.as_string()))
            }
            WriteOp::Update { .. } if !exists => {
                Err(Error::PreconditionFailed(format!(
                    "{} does not exist",
                    path.as_string()
                )))
            }
            _ => Ok(()),
        }
    }

    /// Apply one op to the map; preconditions must already hold
    fn apply(collections: &mut BTreeMap<String, Collection>, op: WriteOp) {
        let collection_key = op.path().collection().as_string();
        match op {
            WriteOp::Create { path, data } | WriteOp::Set { path, data } => {
                let coll = collections.entry(collection_key).or_default();
                let existing = coll.get(path.id());
                let fields = resolve_replacing(existing, data);
                coll.insert(path.id().to_string(), fields);
            }
            WriteOp::Update { path, data } => {
                let coll = collections.entry(collection_key).or_default();
                if let Some(fields) = coll.get_mut(path.id()) {
                    resolve_merging(fields, data);
                }
            }
            WriteOp::Delete { path } => {
                if let Some(coll) = collections.get_mut(&collection_key) {
                    coll.remove(path.id());
                }
            }
        }
    }
}

/// Resolve a payload into a full replacement field map
///
/// The result contains exactly the payload's fields; sentinels resolve
/// against the pre-existing document when there is one.
fn resolve_replacing(existing: Option<&Fields>, data: Payload) -> Fields {
    let mut fields = Fields::new();
    for (name, value) in data {
        let current = existing.and_then(|f| f.get(&name));
        if let Some(resolved) = resolve_field(current, value) {
            fields.insert(name, resolved);
        }
    }
    fields
}

/// Resolve a payload field-by-field onto an existing field map
fn resolve_merging(fields: &mut Fields, data: Payload) {
    for (name, value) in data {
        match resolve_field(fields.get(&name), value) {
            Some(resolved) => {
                fields.insert(name, resolved);
            }
            None => {
                fields.remove(&name);
            }
        }
    }
}

/// Resolve one field value; `None` means "remove the field"
fn resolve_field(current: Option<&Json>, value: FieldValue) -> Option<Json> {
    match value {
        FieldValue::Set(json) => Some(json),
        FieldValue::Delete => None,
        FieldValue::ServerTimestamp => Some(Json::String(Utc::now().to_rfc3339())),
        FieldValue::Increment(operand) => {
            let resolved = match current {
                Some(Json::Number(n)) => {
                    match (n.as_i64(), operand.as_i64()) {
                        (Some(a), Some(b)) => serde_json::Number::from(a.saturating_add(b)),
                        _ => {
                            let sum = n.as_f64().unwrap_or(0.0) + operand.as_f64().unwrap_or(0.0);
                            serde_json::Number::from_f64(sum).unwrap_or(operand)
                        }
                    }
                }
                // A non-numeric or missing field becomes the operand
                _ => operand,
            };
            Some(Json::Number(resolved))
        }
        FieldValue::ArrayUnion(items) => {
            let mut array = match current {
                Some(Json::Array(existing)) => existing.clone(),
                _ => Vec::new(),
            };
            for item in items {
                if !array.contains(&item) {
                    array.push(item);
                }
            }
            Some(Json::Array(array))
        }
        FieldValue::ArrayRemove(items) => {
            let array = match current {
                Some(Json::Array(existing)) => existing
                    .iter()
                    .filter(|v| !items.contains(v))
                    .cloned()
                    .collect(),
                _ => Vec::new(),
            };
            Some(Json::Array(array))
        }
    }
}

fn check_op_ceiling(ops: &[WriteOp]) -> Result<()> {
    if ops.len() > MAX_BATCH_OPS {
        return Err(Error::invalid_argument(format!(
            "commit of {} operations exceeds the {MAX_BATCH_OPS}-operation ceiling",
            ops.len()
        )));
    }
    Ok(())
}

#[async_trait]
impl Datastore for MemoryStore {
    async fn get(&self, path: &DocumentPath) -> Result<Option<Document>> {
        trace!(path = %path, "get");
        Ok(self.read_doc(path))
    }

    async fn run_query(&self, query: &QuerySpec) -> Result<Vec<Document>> {
        let docs = self.collection_docs(query);
        trace!(collection = %query.collection, candidates = docs.len(), "run_query");
        Ok(apply_query(docs, query))
    }

    async fn count(&self, query: &QuerySpec) -> Result<u64> {
        let mut unlimited = query.clone();
        unlimited.limit = None;
        unlimited.limit_to_last = false;
        let docs = self.collection_docs(&unlimited);
        Ok(apply_query(docs, &unlimited).len() as u64)
    }

    async fn commit_atomic(&self, ops: Vec<WriteOp>) -> Result<()> {
        check_op_ceiling(&ops)?;
        let mut touched = BTreeSet::new();
        {
            let mut collections = self.inner.collections.write();
            // Stage on a copy so a precondition failure anywhere leaves the
            // live map untouched; ops later in the commit see earlier ops'
            // effects, matching the transactional write-ordering contract
            let mut staged = collections.clone();
            for op in ops {
                Self::check_precondition(&staged, &op)?;
                touched.insert(op.path().collection().as_string());
                Self::apply(&mut staged, op);
            }
            *collections = staged;
        }
        debug!(collections = touched.len(), "commit_atomic applied");
        self.publish(touched);
        Ok(())
    }

    async fn commit_batch(&self, ops: Vec<WriteOp>) -> Result<usize> {
        check_op_ceiling(&ops)?;
        let total = ops.len();
        let mut touched = BTreeSet::new();
        let result = {
            let mut collections = self.inner.collections.write();
            let mut applied = 0usize;
            let mut failure = None;
            for op in ops {
                if let Err(e) = Self::check_precondition(&collections, &op) {
                    failure = Some(e);
                    break;
                }
                touched.insert(op.path().collection().as_string());
                Self::apply(&mut collections, op);
                applied += 1;
            }
            match failure {
                Some(e) => {
                    debug!(applied, total, "commit_batch aborted");
                    Err(e)
                }
                None => Ok(applied),
            }
        };
        // Writes applied before an abort stay applied; notify for them too
        self.publish(touched);
        result
    }

    async fn listen_document(&self, path: DocumentPath) -> Result<DocumentSubscription> {
        let (tx, rx) = mpsc::channel(SUBSCRIPTION_BUFFER);
        let store = self.clone();
        let mut changes = self.inner.changes.subscribe();
        tokio::spawn(async move {
            let collection_key = path.collection().as_string();
            let mut last = store.read_doc(&path);
            if tx.send(Ok(last.clone())).await.is_err() {
                return;
            }
            loop {
                match changes.recv().await {
                    Ok(event) => {
                        if !event.collections.contains(&collection_key) {
                            continue;
                        }
                    }
                    // Lagged: fall through and recompute from current state
                    Err(broadcast::error::RecvError::Lagged(_)) => {}
                    Err(broadcast::error::RecvError::Closed) => return,
                }
                let current = store.read_doc(&path);
                if current != last {
                    last = current.clone();
                    if tx.send(Ok(current)).await.is_err() {
                        return;
                    }
                }
            }
        });
        Ok(DocumentSubscription::new(rx))
    }

    async fn listen_query(&self, query: QuerySpec) -> Result<QuerySubscription> {
        let (tx, rx) = mpsc::channel(SUBSCRIPTION_BUFFER);
        let store = self.clone();
        let mut changes = self.inner.changes.subscribe();
        tokio::spawn(async move {
            let collection_key = query.collection.as_string();
            let snapshot = |store: &MemoryStore| {
                apply_query(store.collection_docs(&query), &query)
            };
            let mut last = snapshot(&store);
            if tx.send(Ok(last.clone())).await.is_err() {
                return;
            }
            loop {
                match changes.recv().await {
                    Ok(event) => {
                        if !event.collections.contains(&collection_key) {
                            continue;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(_)) => {}
                    Err(broadcast::error::RecvError::Closed) => return,
                }
                let current = snapshot(&store);
                if current != last {
                    last = current.clone();
                    if tx.send(Ok(current)).await.is_err() {
                        return;
                    }
                }
            }
        });
        Ok(QuerySubscription::new(rx))
    }
}
