//! In-memory draft store shared by all request handlers.
//!
//! Every mutation goes through `with_draft`, which holds the write lock for the
//! duration of one closure, so concurrent edits to the same draft serialize.
//! Drafts not edited for longer than the store's TTL are treated as gone; they
//! are swept from the map whenever a new draft is created.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

use crate::composer::draft::{DocumentDraft, DraftError, DraftSettings};

#[derive(Clone)]
pub struct DraftStore {
    inner: Arc<RwLock<HashMap<Uuid, DocumentDraft>>>,
    ttl: Duration,
}

impl DraftStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: Arc::default(),
            ttl,
        }
    }

    fn is_expired(&self, draft: &DocumentDraft) -> bool {
        draft.last_touched().elapsed() > self.ttl
    }

    pub async fn create(&self, settings: DraftSettings) -> Result<DocumentDraft, DraftError> {
        let draft = DocumentDraft::new(settings)?;

        let mut drafts = self.inner.write().await;
        let before = drafts.len();
        drafts.retain(|_, d| !self.is_expired(d));
        let evicted = before - drafts.len();
        if evicted > 0 {
            info!(evicted, remaining = drafts.len(), "Expired drafts evicted");
        }

        drafts.insert(draft.id, draft.clone());
        Ok(draft)
    }

    /// Returns a snapshot; later edits are not reflected in it.
    pub async fn get(&self, id: Uuid) -> Result<DocumentDraft, DraftError> {
        self.inner
            .read()
            .await
            .get(&id)
            .filter(|d| !self.is_expired(d))
            .cloned()
            .ok_or(DraftError::NotFound(id))
    }

    pub async fn remove(&self, id: Uuid) -> Result<(), DraftError> {
        self.inner
            .write()
            .await
            .remove(&id)
            .filter(|d| !self.is_expired(d))
            .map(|_| ())
            .ok_or(DraftError::NotFound(id))
    }

    /// Runs `f` against the stored draft under the write lock and marks the
    /// draft as recently used.
    pub async fn with_draft<T, F>(&self, id: Uuid, f: F) -> Result<T, DraftError>
    where
        F: FnOnce(&mut DocumentDraft) -> Result<T, DraftError>,
    {
        let mut drafts = self.inner.write().await;
        if drafts.get(&id).is_some_and(|d| self.is_expired(d)) {
            drafts.remove(&id);
        }
        let draft = drafts.get_mut(&id).ok_or(DraftError::NotFound(id))?;
        draft.touch();
        f(draft)
    }

    /// Number of drafts held in memory, expired ones included until swept.
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }
}
