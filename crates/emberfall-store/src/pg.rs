//! Postgres-backed object store.
//!
//! One `objects` table keyed by `(collection, id)` with a JSONB payload.
//! Writes are whole-object upserts, so the last writer wins; there are no
//! transactions across keys.

use async_trait::async_trait;
use emberfall_core::error::EngineError;
use emberfall_core::store::ObjectStore;
use sqlx::PgPool;
use sqlx::Row;

/// Object store over a Postgres connection pool.
#[derive(Debug, Clone)]
pub struct PgObjectStore {
    pool: PgPool,
}

impl PgObjectStore {
    /// Creates a store over the given pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn store_err(e: sqlx::Error) -> EngineError {
    EngineError::Store(e.to_string())
}

#[async_trait]
impl ObjectStore for PgObjectStore {
    async fn put(
        &self,
        collection: &str,
        id: &str,
        value: serde_json::Value,
    ) -> Result<(), EngineError> {
        sqlx::query(
            "INSERT INTO objects (collection, id, payload, updated_at)
             VALUES ($1, $2, $3, now())
             ON CONFLICT (collection, id)
             DO UPDATE SET payload = EXCLUDED.payload, updated_at = now()",
        )
        .bind(collection)
        .bind(id)
        .bind(value)
        .execute(&self.pool)
        .await
        .map_err(store_err)?;
        Ok(())
    }

    async fn get(
        &self,
        collection: &str,
        id: &str,
    ) -> Result<Option<serde_json::Value>, EngineError> {
        let row = sqlx::query("SELECT payload FROM objects WHERE collection = $1 AND id = $2")
            .bind(collection)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(store_err)?;
        row.map(|row| row.try_get("payload").map_err(store_err))
            .transpose()
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), EngineError> {
        sqlx::query("DELETE FROM objects WHERE collection = $1 AND id = $2")
            .bind(collection)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(store_err)?;
        Ok(())
    }

    async fn list_all(&self, collection: &str) -> Result<Vec<serde_json::Value>, EngineError> {
        let rows = sqlx::query(
            "SELECT payload FROM objects WHERE collection = $1 ORDER BY updated_at ASC",
        )
        .bind(collection)
        .fetch_all(&self.pool)
        .await
        .map_err(store_err)?;
        rows.into_iter()
            .map(|row| row.try_get("payload").map_err(store_err))
            .collect()
    }
}
