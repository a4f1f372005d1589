//! Routes for the diary: append-only round history.

use axum::extract::{Path, State};
use axum::{Json, Router, routing::get};
use emberfall_core::store::{DIARY, ObjectStore};
use emberfall_domain::diary::DiaryEntry;
use tracing::instrument;
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

/// Loads every diary entry, skipping unreadable rows, ordered by creation
/// timestamp.
async fn load_entries(state: &AppState) -> Result<Vec<DiaryEntry>, ApiError> {
    let rows = state.store.list_all(DIARY).await?;
    let mut entries: Vec<DiaryEntry> = rows
        .into_iter()
        .filter_map(|row| serde_json::from_value(row).ok())
        .collect();
    entries.sort_by_key(|entry| entry.created_at);
    Ok(entries)
}

/// GET /
#[instrument(skip(state))]
async fn list_diary(State(state): State<AppState>) -> Result<Json<Vec<DiaryEntry>>, ApiError> {
    Ok(Json(load_entries(&state).await?))
}

/// GET /location/{id}
#[instrument(skip(state), fields(location_id = %location_id))]
async fn list_diary_for_location(
    State(state): State<AppState>,
    Path(location_id): Path<Uuid>,
) -> Result<Json<Vec<DiaryEntry>>, ApiError> {
    let entries = load_entries(&state)
        .await?
        .into_iter()
        .filter(|entry| entry.location_id == location_id)
        .collect();
    Ok(Json(entries))
}

/// Returns the router for the diary surface.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_diary))
        .route("/location/{id}", get(list_diary_for_location))
}
