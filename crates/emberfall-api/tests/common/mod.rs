//! Shared test helpers for API integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::TimeZone;
use emberfall_api::routes;
use emberfall_api::state::AppState;
use emberfall_domain::equipment::Equipment;
use emberfall_engine::TurnQueue;
use emberfall_store::MemoryStore;
use emberfall_test_support::{
    FixedClock, MockRng, ScriptedCompletions, sample_location, sample_party, sample_world,
};
use http_body_util::BodyExt;
use tower::ServiceExt;

/// Builds the full app router over an in-memory store and a scripted
/// completion client. Uses the same route structure as `main.rs`.
pub fn build_test_app(script: Vec<&str>) -> Router {
    build_test_app_with_store(script, Vec::new()).0
}

/// Variant exposing the backing store and letting tests seed the catalog.
pub fn build_test_app_with_store(
    script: Vec<&str>,
    catalog: Vec<Equipment>,
) -> (Router, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let completions = Arc::new(ScriptedCompletions::replying(script));
    let clock = Arc::new(FixedClock(
        chrono::Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap(),
    ));
    let engine = TurnQueue::new(
        store.clone(),
        completions,
        clock,
        Box::new(MockRng),
        sample_world(),
        sample_location(),
        catalog,
        sample_party(),
    );
    let app_state = AppState::new(engine, store.clone());

    let app = Router::new()
        .merge(routes::health::router())
        .nest("/api/v1/round", routes::round::router())
        .nest("/api/v1/characters", routes::character::router())
        .nest("/api/v1/diary", routes::diary::router())
        .with_state(app_state);
    (app, store)
}

/// Send a POST request with a JSON body and return the response.
pub async fn post_json(
    app: Router,
    uri: &str,
    body: &serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();

    (status, json)
}

/// Send a GET request and return the response.
pub async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();

    (status, json)
}
