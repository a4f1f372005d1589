//! In-memory object store for tests and single-process play.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use emberfall_core::error::EngineError;
use emberfall_core::store::ObjectStore;

/// A `Mutex`-guarded map keyed by `(collection, id)`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    objects: Mutex<HashMap<(String, String), serde_json::Value>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn put(
        &self,
        collection: &str,
        id: &str,
        value: serde_json::Value,
    ) -> Result<(), EngineError> {
        self.objects
            .lock()
            .map_err(|e| EngineError::Store(format!("store mutex poisoned: {e}")))?
            .insert((collection.to_owned(), id.to_owned()), value);
        Ok(())
    }

    async fn get(
        &self,
        collection: &str,
        id: &str,
    ) -> Result<Option<serde_json::Value>, EngineError> {
        Ok(self
            .objects
            .lock()
            .map_err(|e| EngineError::Store(format!("store mutex poisoned: {e}")))?
            .get(&(collection.to_owned(), id.to_owned()))
            .cloned())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), EngineError> {
        self.objects
            .lock()
            .map_err(|e| EngineError::Store(format!("store mutex poisoned: {e}")))?
            .remove(&(collection.to_owned(), id.to_owned()));
        Ok(())
    }

    async fn list_all(&self, collection: &str) -> Result<Vec<serde_json::Value>, EngineError> {
        Ok(self
            .objects
            .lock()
            .map_err(|e| EngineError::Store(format!("store mutex poisoned: {e}")))?
            .iter()
            .filter(|((c, _), _)| c == collection)
            .map(|(_, v)| v.clone())
            .collect())
    }
}
