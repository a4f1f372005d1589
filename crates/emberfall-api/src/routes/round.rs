//! Routes for the round surface.

use axum::extract::State;
use axum::{Json, Router, routing::get, routing::post};
use emberfall_domain::action::SubmittedAction;
use emberfall_domain::context::LocationInfo;
use emberfall_engine::{ClosedRound, RollResolution, RoundPhase, RoundPlan};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

/// Request body for POST /actions.
#[derive(Debug, Deserialize)]
pub struct SubmitActionsRequest {
    /// One submitted action (or skip) per party member.
    pub actions: Vec<SubmittedAction>,
}

/// Request body for POST /roll.
#[derive(Debug, Deserialize)]
pub struct SubmitRollRequest {
    /// The character rolling; must be the queue head.
    pub character_id: Uuid,
    /// The raw d20 face rolled.
    pub raw: u32,
}

/// Response body for GET /state.
#[derive(Debug, Serialize)]
pub struct RoundStateResponse {
    /// Current phase of the state machine.
    pub phase: RoundPhase,
    /// The party's current location.
    pub location: LocationInfo,
}

/// POST /actions
#[instrument(skip(state, request), fields(submitted = request.actions.len()))]
async fn submit_actions(
    State(state): State<AppState>,
    Json(request): Json<SubmitActionsRequest>,
) -> Result<Json<RoundPlan>, ApiError> {
    let mut engine = state.engine.lock().await;
    let plan = engine.submit_actions(request.actions).await?;
    info!(
        valid = plan.valid_actions.len(),
        invalid = plan.invalid_actions.len(),
        "actions submitted"
    );
    Ok(Json(plan))
}

/// POST /roll
#[instrument(skip(state, request), fields(character_id = %request.character_id, raw = request.raw))]
async fn submit_roll(
    State(state): State<AppState>,
    Json(request): Json<SubmitRollRequest>,
) -> Result<Json<RollResolution>, ApiError> {
    let mut engine = state.engine.lock().await;
    let resolution = engine.submit_roll(request.character_id, request.raw).await?;
    Ok(Json(resolution))
}

/// POST /close
#[instrument(skip(state))]
async fn close_round(State(state): State<AppState>) -> Result<Json<ClosedRound>, ApiError> {
    let mut engine = state.engine.lock().await;
    let closed = engine.close_round().await?;
    info!(diary_entry = %closed.diary_entry.id, "round closed");
    Ok(Json(closed))
}

/// POST /travel
#[instrument(skip(state, destination), fields(destination = %destination.name))]
async fn travel(
    State(state): State<AppState>,
    Json(destination): Json<LocationInfo>,
) -> Result<Json<RoundStateResponse>, ApiError> {
    let mut engine = state.engine.lock().await;
    engine.travel(destination).await?;
    Ok(Json(RoundStateResponse {
        phase: engine.phase(),
        location: engine.location().clone(),
    }))
}

/// GET /state
async fn round_state(State(state): State<AppState>) -> Json<RoundStateResponse> {
    let engine = state.engine.lock().await;
    Json(RoundStateResponse {
        phase: engine.phase(),
        location: engine.location().clone(),
    })
}

/// Returns the router for the round surface.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/actions", post(submit_actions))
        .route("/roll", post(submit_roll))
        .route("/close", post(close_round))
        .route("/travel", post(travel))
        .route("/state", get(round_state))
}
