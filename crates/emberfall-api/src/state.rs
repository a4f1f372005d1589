//! Shared application state.

use std::sync::Arc;

use emberfall_core::store::ObjectStore;
use emberfall_engine::TurnQueue;
use tokio::sync::Mutex;

/// Application state shared across all request handlers.
///
/// The turn queue is the exclusive owner of party state, so the whole
/// engine sits behind one async mutex. Round operations are strictly
/// sequential, so the lock never contends in practice.
#[derive(Clone)]
pub struct AppState {
    /// The round state machine.
    pub engine: Arc<Mutex<TurnQueue>>,
    /// Direct store access for read-only surfaces (the diary).
    pub store: Arc<dyn ObjectStore>,
}

impl AppState {
    /// Create new application state.
    #[must_use]
    pub fn new(engine: TurnQueue, store: Arc<dyn ObjectStore>) -> Self {
        Self {
            engine: Arc::new(Mutex::new(engine)),
            store,
        }
    }
}
