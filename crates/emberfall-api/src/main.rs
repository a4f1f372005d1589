//! Emberfall API server entry point.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use emberfall_ai::OpenAiCompatClient;
use emberfall_content::SeedContent;
use emberfall_core::clock::SystemClock;
use emberfall_core::rng::ThreadRngDice;
use emberfall_core::store::{CHARACTERS, EQUIPMENT, ObjectStore};
use emberfall_domain::character::{ActionAttributes, Character};
use emberfall_domain::context::WorldInfo;
use emberfall_domain::equipment::Equipment;
use emberfall_engine::TurnQueue;
use emberfall_store::PgObjectStore;
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use emberfall_api::error::AppError;
use emberfall_api::{routes, state};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    tracing::info!("Starting Emberfall API server");

    let database_url = std::env::var("DATABASE_URL")
        .map_err(|_| AppError::Config("DATABASE_URL environment variable must be set".into()))?;
    let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port: u16 = std::env::var("PORT")
        .unwrap_or_else(|_| "3000".to_string())
        .parse()
        .map_err(|e| AppError::Config(format!("PORT must be a valid u16: {e}")))?;

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&database_url)
        .await?;
    let store: Arc<dyn ObjectStore> = Arc::new(PgObjectStore::new(pool));

    let seeds = SeedContent::bundled();
    let catalog = ensure_equipment(store.as_ref(), seeds.equipment).await?;
    let party = ensure_party(store.as_ref()).await?;
    let location = seeds
        .locations
        .into_iter()
        .next()
        .ok_or_else(|| AppError::Config("seed content defines no locations".into()))?;
    let world = WorldInfo {
        name: "The Emberfall Marches".to_string(),
        description: "Borderlands where old roads outlive the kingdoms that built them."
            .to_string(),
    };

    let engine = TurnQueue::new(
        store.clone(),
        Arc::new(OpenAiCompatClient::from_env()),
        Arc::new(SystemClock),
        Box::new(ThreadRngDice),
        world,
        location,
        catalog,
        party,
    );
    let app_state = state::AppState::new(engine, store);

    // TODO: Replace CorsLayer::permissive() with restricted origins for production.
    let app = Router::new()
        .merge(routes::health::router())
        .nest("/api/v1/round", routes::round::router())
        .nest("/api/v1/characters", routes::character::router())
        .nest("/api/v1/diary", routes::diary::router())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    let addr: SocketAddr = format!("{host}:{port}")
        .parse()
        .map_err(|e| AppError::Config(format!("invalid HOST:PORT combination: {e}")))?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Loads the equipment catalog, seeding the store on first boot so ids
/// stay stable across restarts.
async fn ensure_equipment(
    store: &dyn ObjectStore,
    seeds: Vec<Equipment>,
) -> Result<Vec<Equipment>, AppError> {
    let rows = store.list_all(EQUIPMENT).await?;
    if rows.is_empty() {
        tracing::info!(count = seeds.len(), "seeding equipment catalog");
        for definition in &seeds {
            let value = serde_json::to_value(definition)
                .map_err(|e| AppError::Config(format!("equipment serialization failed: {e}")))?;
            store.put(EQUIPMENT, &definition.id.to_string(), value).await?;
        }
        return Ok(seeds);
    }
    Ok(rows
        .into_iter()
        .filter_map(|row| serde_json::from_value(row).ok())
        .collect())
}

/// Loads the party, creating a starter party on first boot.
async fn ensure_party(store: &dyn ObjectStore) -> Result<Vec<Character>, AppError> {
    let rows = store.list_all(CHARACTERS).await?;
    if !rows.is_empty() {
        return Ok(rows
            .into_iter()
            .filter_map(|row| serde_json::from_value(row).ok())
            .collect());
    }

    tracing::info!("creating starter party");
    let party = vec![
        Character::new(
            "Maren",
            ActionAttributes {
                perception: 3,
                agility: 2,
                ..ActionAttributes::default()
            },
        ),
        Character::new(
            "Oswin",
            ActionAttributes {
                strength: 3,
                willpower: 1,
                ..ActionAttributes::default()
            },
        ),
    ];
    for character in &party {
        let value = serde_json::to_value(character)
            .map_err(|e| AppError::Config(format!("character serialization failed: {e}")))?;
        store.put(CHARACTERS, &character.id.to_string(), value).await?;
    }
    Ok(party)
}
