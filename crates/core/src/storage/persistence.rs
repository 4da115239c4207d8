use super::Storage;
use crate::domain::queue::{QueueItem, StoredQueueItem};
use crate::error::PersistenceError;
use std::sync::Arc;

/// Versioned key. Data under older keys is never read back.
pub const DEFAULT_QUEUE_KEY: &str = "swipr_queue_v2";

/// Durable boundary for the queue. Failures are logged here and never reach
/// the queue store; in-memory state stays authoritative.
#[derive(Clone)]
pub struct QueuePersistence {
    storage: Arc<dyn Storage>,
    key: String,
}

impl QueuePersistence {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self::with_key(storage, DEFAULT_QUEUE_KEY)
    }

    pub fn with_key(storage: Arc<dyn Storage>, key: impl Into<String>) -> Self {
        Self {
            storage,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn save(&self, items: &[QueueItem]) {
        if let Err(err) = self.try_save(items) {
            tracing::warn!(key = %self.key, error = %err, "queue save failed; keeping in-memory state");
        }
    }

    /// `None` when nothing is stored under the key or the payload cannot be read.
    pub fn load(&self) -> Option<Vec<StoredQueueItem>> {
        match self.try_load() {
            Ok(items) => items,
            Err(err) => {
                tracing::warn!(key = %self.key, error = %err, "queue load failed; starting from default");
                None
            }
        }
    }

    fn try_save(&self, items: &[QueueItem]) -> Result<(), PersistenceError> {
        let payload = serde_json::to_string(items).map_err(PersistenceError::Serialize)?;
        self.storage
            .set(&self.key, &payload)
            .map_err(PersistenceError::Storage)?;
        tracing::debug!(key = %self.key, items = items.len(), "queue saved");
        Ok(())
    }

    fn try_load(&self) -> Result<Option<Vec<StoredQueueItem>>, PersistenceError> {
        let Some(raw) = self.storage.get(&self.key).map_err(PersistenceError::Storage)? else {
            return Ok(None);
        };
        let items = serde_json::from_str::<Vec<StoredQueueItem>>(&raw)
            .map_err(PersistenceError::Malformed)?;
        Ok(Some(items))
    }
}

impl std::fmt::Debug for QueuePersistence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueuePersistence")
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}
