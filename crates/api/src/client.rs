//! Client handle
//!
//! One explicit value holding the datastore handle and the adapter
//! configuration, injected into every component. Constructing several
//! isolated clients (each with its own backend) is ordinary usage, not a
//! special test mode.

use crate::collection::CollectionRef;
use loam_core::{CollectionPath, Config, Result};
use loam_storage::{Datastore, MemoryStore};
use std::sync::Arc;

/// Handle to one document store plus configuration
///
/// Cheap to clone; clones share the same backend connection.
#[derive(Clone)]
pub struct Client {
    store: Arc<dyn Datastore>,
    config: Config,
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Client {
    /// Wrap a datastore with the given configuration
    pub fn new(store: Arc<dyn Datastore>, config: Config) -> Self {
        Client { store, config }
    }

    /// Client over a fresh in-process store with default configuration
    pub fn in_memory() -> Self {
        Client::new(Arc::new(MemoryStore::new()), Config::default())
    }

    /// Client over a fresh in-process store with the given configuration
    pub fn in_memory_with(config: Config) -> Self {
        Client::new(Arc::new(MemoryStore::new()), config)
    }

    /// The adapter configuration
    pub fn config(&self) -> Config {
        self.config
    }

    /// The underlying datastore handle
    pub fn store(&self) -> &Arc<dyn Datastore> {
        &self.store
    }

    /// A reference to a root-level collection
    pub fn collection(&self, name: impl Into<String>) -> Result<CollectionRef> {
        Ok(CollectionRef::new(
            self.clone(),
            CollectionPath::root(name)?,
        ))
    }
}
