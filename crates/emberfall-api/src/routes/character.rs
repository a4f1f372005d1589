//! Routes for party and character management.

use axum::extract::{Path, State};
use axum::{Json, Router, routing::get, routing::post};
use emberfall_domain::character::{Character, EquipSlot};
use serde::Deserialize;
use tracing::instrument;
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

/// Request body naming one equipment definition.
#[derive(Debug, Deserialize)]
pub struct EquipmentRequest {
    /// The equipment definition to act on.
    pub equipment_id: Uuid,
}

/// Request body for POST /{id}/unequip.
#[derive(Debug, Deserialize)]
pub struct UnequipRequest {
    /// The slot to clear.
    pub slot: EquipSlot,
}

/// GET /
async fn list_party(State(state): State<AppState>) -> Json<Vec<Character>> {
    let engine = state.engine.lock().await;
    Json(engine.party().to_vec())
}

/// POST /{id}/equip
#[instrument(skip(state, request), fields(character_id = %character_id, equipment_id = %request.equipment_id))]
async fn equip(
    State(state): State<AppState>,
    Path(character_id): Path<Uuid>,
    Json(request): Json<EquipmentRequest>,
) -> Result<Json<Character>, ApiError> {
    let mut engine = state.engine.lock().await;
    let updated = engine.equip_item(character_id, request.equipment_id).await?;
    Ok(Json(updated))
}

/// POST /{id}/unequip
#[instrument(skip(state, request), fields(character_id = %character_id))]
async fn unequip(
    State(state): State<AppState>,
    Path(character_id): Path<Uuid>,
    Json(request): Json<UnequipRequest>,
) -> Result<Json<Character>, ApiError> {
    let mut engine = state.engine.lock().await;
    let updated = engine.unequip_slot(character_id, request.slot).await?;
    Ok(Json(updated))
}

/// POST /{id}/consume
#[instrument(skip(state, request), fields(character_id = %character_id, equipment_id = %request.equipment_id))]
async fn consume(
    State(state): State<AppState>,
    Path(character_id): Path<Uuid>,
    Json(request): Json<EquipmentRequest>,
) -> Result<Json<Character>, ApiError> {
    let mut engine = state.engine.lock().await;
    let updated = engine
        .consume_item(character_id, request.equipment_id)
        .await?;
    Ok(Json(updated))
}

/// POST /{id}/sell
#[instrument(skip(state, request), fields(character_id = %character_id, equipment_id = %request.equipment_id))]
async fn sell(
    State(state): State<AppState>,
    Path(character_id): Path<Uuid>,
    Json(request): Json<EquipmentRequest>,
) -> Result<Json<Character>, ApiError> {
    let mut engine = state.engine.lock().await;
    let updated = engine.sell_item(character_id, request.equipment_id).await?;
    Ok(Json(updated))
}

/// Returns the router for the character surface.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_party))
        .route("/{id}/equip", post(equip))
        .route("/{id}/unequip", post(unequip))
        .route("/{id}/consume", post(consume))
        .route("/{id}/sell", post(sell))
}
