//! Best-effort background write queue.
//!
//! Diary persistence is not on the round's critical path: writes are
//! enqueued and a background worker applies them with bounded retry and
//! backoff. A write that still fails after the last attempt is logged and
//! dropped. Character and scene writes never go through this queue.

use std::sync::Arc;
use std::time::Duration;

use emberfall_core::store::ObjectStore;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Attempts per write before giving up.
const MAX_ATTEMPTS: u32 = 3;
/// Base backoff between attempts; multiplied by the attempt number.
const BACKOFF: Duration = Duration::from_millis(50);

#[derive(Debug)]
struct WriteJob {
    collection: String,
    id: String,
    value: serde_json::Value,
}

/// Handle for enqueuing best-effort writes.
pub struct WriteQueue {
    sender: mpsc::UnboundedSender<WriteJob>,
    worker: JoinHandle<()>,
}

impl WriteQueue {
    /// Spawns the background worker over the given store.
    #[must_use]
    pub fn spawn(store: Arc<dyn ObjectStore>) -> Self {
        let (sender, mut receiver) = mpsc::unbounded_channel::<WriteJob>();
        let worker = tokio::spawn(async move {
            while let Some(job) = receiver.recv().await {
                let mut attempt = 1;
                loop {
                    match store.put(&job.collection, &job.id, job.value.clone()).await {
                        Ok(()) => break,
                        Err(error) if attempt < MAX_ATTEMPTS => {
                            tracing::warn!(
                                collection = %job.collection,
                                id = %job.id,
                                attempt,
                                %error,
                                "background write failed, retrying"
                            );
                            tokio::time::sleep(BACKOFF * attempt).await;
                            attempt += 1;
                        }
                        Err(error) => {
                            tracing::error!(
                                collection = %job.collection,
                                id = %job.id,
                                %error,
                                "background write dropped after final attempt"
                            );
                            break;
                        }
                    }
                }
            }
        });
        Self { sender, worker }
    }

    /// Enqueues a write without waiting for it to land.
    pub fn enqueue(&self, collection: &str, id: &str, value: serde_json::Value) {
        let job = WriteJob {
            collection: collection.to_owned(),
            id: id.to_owned(),
            value,
        };
        if self.sender.send(job).is_err() {
            tracing::error!("write queue worker is gone; write dropped");
        }
    }

    /// Closes the queue and waits for pending writes to drain.
    ///
    /// # Panics
    ///
    /// Panics if the worker task panicked.
    pub async fn close_and_wait(self) {
        drop(self.sender);
        self.worker.await.expect("write queue worker panicked");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use emberfall_core::error::EngineError;
    use serde_json::json;
    use std::sync::Mutex;

    use crate::memory::MemoryStore;

    /// Fails the first `failures` puts, then delegates to a `MemoryStore`.
    struct FlakyStore {
        inner: MemoryStore,
        remaining_failures: Mutex<u32>,
    }

    impl FlakyStore {
        fn new(failures: u32) -> Self {
            Self {
                inner: MemoryStore::new(),
                remaining_failures: Mutex::new(failures),
            }
        }
    }

    #[async_trait]
    impl ObjectStore for FlakyStore {
        async fn put(
            &self,
            collection: &str,
            id: &str,
            value: serde_json::Value,
        ) -> Result<(), EngineError> {
            {
                let mut remaining = self.remaining_failures.lock().unwrap();
                if *remaining > 0 {
                    *remaining -= 1;
                    return Err(EngineError::Store("transient".to_owned()));
                }
            }
            self.inner.put(collection, id, value).await
        }

        async fn get(
            &self,
            collection: &str,
            id: &str,
        ) -> Result<Option<serde_json::Value>, EngineError> {
            self.inner.get(collection, id).await
        }

        async fn delete(&self, collection: &str, id: &str) -> Result<(), EngineError> {
            self.inner.delete(collection, id).await
        }

        async fn list_all(&self, collection: &str) -> Result<Vec<serde_json::Value>, EngineError> {
            self.inner.list_all(collection).await
        }
    }

    #[tokio::test]
    async fn test_enqueued_write_lands() {
        let store = Arc::new(MemoryStore::new());
        let queue = WriteQueue::spawn(store.clone());

        queue.enqueue("diary", "d1", json!({"round": 1}));
        queue.close_and_wait().await;

        assert!(store.get("diary", "d1").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_write_retries_through_transient_failures() {
        let store = Arc::new(FlakyStore::new(2));
        let queue = WriteQueue::spawn(store.clone());

        queue.enqueue("scenes", "s1", json!({"title": "Dawn"}));
        queue.close_and_wait().await;

        assert!(store.get("scenes", "s1").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_write_dropped_after_final_attempt() {
        let store = Arc::new(FlakyStore::new(10));
        let queue = WriteQueue::spawn(store.clone());

        queue.enqueue("scenes", "s2", json!({"title": "Dusk"}));
        queue.close_and_wait().await;

        assert!(store.get("scenes", "s2").await.unwrap().is_none());
    }
}
