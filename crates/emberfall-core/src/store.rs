//! Keyed object store abstraction.
//!
//! The engine persists whole objects keyed by `(collection, id)` with
//! last-write-wins semantics. There are no transactions across keys; a
//! single active session is assumed.

use async_trait::async_trait;

use crate::error::EngineError;

/// Collection name for persisted characters.
pub const CHARACTERS: &str = "characters";
/// Collection name for scene cache rows.
pub const SCENES: &str = "scenes";
/// Collection name for diary entries.
pub const DIARY: &str = "diary";
/// Collection name for equipment definitions.
pub const EQUIPMENT: &str = "equipment";

/// Repository trait for whole-object persistence.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Insert or overwrite the object stored under `(collection, id)`.
    async fn put(
        &self,
        collection: &str,
        id: &str,
        value: serde_json::Value,
    ) -> Result<(), EngineError>;

    /// Fetch the object stored under `(collection, id)`, if any.
    async fn get(&self, collection: &str, id: &str)
    -> Result<Option<serde_json::Value>, EngineError>;

    /// Delete the object stored under `(collection, id)`. Deleting a missing
    /// key is not an error.
    async fn delete(&self, collection: &str, id: &str) -> Result<(), EngineError>;

    /// List every object in `collection`, in unspecified order.
    async fn list_all(&self, collection: &str) -> Result<Vec<serde_json::Value>, EngineError>;
}
