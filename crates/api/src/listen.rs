//! Live listener plumbing
//!
//! A listener registers a callback and returns immediately; the callback
//! fires on an independent schedule driven by the datastore's push channel,
//! starting with the current snapshot. Transport errors are swallowed into a
//! `None` / empty-set callback invocation rather than propagated. The
//! wrapped behavior hides transport failures from the caller, a known sharp
//! edge kept intact here.
//!
//! Dropping the handle does NOT cancel the subscription; it runs until
//! [`ListenerHandle::unsubscribe`] is called.

use loam_storage::{DocumentSubscription, QuerySubscription};
use serde_json::Value as Json;
use tokio::task::JoinHandle;
use tracing::debug;

/// Handle to one live subscription
pub struct ListenerHandle {
    task: JoinHandle<()>,
}

impl ListenerHandle {
    /// Detach the callback and end the subscription
    ///
    /// Does not cancel any in-flight network operation.
    pub fn unsubscribe(self) {
        self.task.abort();
        debug!("listener unsubscribed");
    }

    /// Whether the subscription is still delivering callbacks
    pub fn is_active(&self) -> bool {
        !self.task.is_finished()
    }
}

/// Pump a document subscription into a callback
pub(crate) fn spawn_document_listener<F>(
    mut subscription: DocumentSubscription,
    mut callback: F,
) -> ListenerHandle
where
    F: FnMut(Option<Json>) + Send + 'static,
{
    let task = tokio::spawn(async move {
        while let Some(event) = subscription.recv().await {
            match event {
                Ok(Some(doc)) => callback(Some(doc.into_json())),
                Ok(None) => callback(None),
                // Transport errors collapse to a null invocation
                Err(_) => callback(None),
            }
        }
    });
    ListenerHandle { task }
}

/// Pump a query subscription into a callback
pub(crate) fn spawn_query_listener<F>(
    mut subscription: QuerySubscription,
    mut callback: F,
) -> ListenerHandle
where
    F: FnMut(Vec<Json>) + Send + 'static,
{
    let task = tokio::spawn(async move {
        while let Some(event) = subscription.recv().await {
            match event {
                Ok(docs) => callback(docs.into_iter().map(|d| d.into_json()).collect()),
                // Transport errors collapse to an empty result set
                Err(_) => callback(Vec::new()),
            }
        }
    });
    ListenerHandle { task }
}
