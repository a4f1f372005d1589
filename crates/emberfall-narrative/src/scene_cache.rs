//! The scene cache: get-or-generate narration per location.
//!
//! A cached row is authoritative until explicitly invalidated (travel,
//! forced regeneration, or a round closing with new outcomes). Generation
//! failures never propagate: after the retry budget the fixed fallback
//! scene is substituted and cached like any other result.

use std::sync::Arc;
use std::time::Duration;

use emberfall_ai::{CompletionClient, CompletionRequest};
use emberfall_ai::payload::extract_object;
use emberfall_core::clock::Clock;
use emberfall_core::error::EngineError;
use emberfall_core::store::{ObjectStore, SCENES};
use emberfall_domain::context::NarrativeContext;
use emberfall_domain::scene::{Scene, SceneCacheRow};
use serde::Deserialize;
use uuid::Uuid;

/// Generation attempts before the fallback scene is substituted.
const GENERATION_ATTEMPTS: u32 = 2;
/// Token budget for scene generation.
const SCENE_MAX_TOKENS: u32 = 900;
/// Per-request timeout for scene generation.
const SCENE_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct SceneDraft {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    mood: Option<String>,
}

/// The scene cache over a store and a completion client.
pub struct SceneCache {
    store: Arc<dyn ObjectStore>,
    completions: Arc<dyn CompletionClient>,
    clock: Arc<dyn Clock>,
}

impl SceneCache {
    /// Creates a cache over the given collaborators.
    #[must_use]
    pub fn new(
        store: Arc<dyn ObjectStore>,
        completions: Arc<dyn CompletionClient>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            completions,
            clock,
        }
    }

    /// Returns the cached scene for the context's location, generating and
    /// caching one when no fresh row exists. The second tuple element is
    /// true when the scene came from the cache.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Store` only for store failures; generation
    /// failures are absorbed by the fallback scene.
    pub async fn get_or_generate(
        &self,
        context: &NarrativeContext,
        is_intro: bool,
    ) -> Result<(Scene, bool), EngineError> {
        let key = SceneCacheRow::key(context.location.id);
        if let Some(value) = self.store.get(SCENES, &key).await? {
            if let Ok(row) = serde_json::from_value::<SceneCacheRow>(value) {
                tracing::debug!(location = %context.location.id, "scene served from cache");
                return Ok((row.scene, true));
            }
            // An unreadable row is treated as absent and overwritten below.
            tracing::warn!(location = %context.location.id, "discarding unreadable scene row");
        }

        let scene = self.generate(context, is_intro, None).await;
        self.persist(context.location.id, &scene, Vec::new()).await?;
        Ok((scene, false))
    }

    /// Regenerates the scene after a round closes, feeding the round's
    /// outcomes into the narration and replacing the cached row. The row's
    /// action log carries over, extended with this round's lines.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Store` only for store failures.
    pub async fn regenerate_with_outcomes(
        &self,
        context: &NarrativeContext,
        outcomes_summary: &str,
        action_log: Vec<String>,
    ) -> Result<Scene, EngineError> {
        let mut log = self.cached_log(context.location.id).await?;
        log.extend(action_log);
        self.invalidate(context.location.id).await?;
        let scene = self.generate(context, false, Some(outcomes_summary)).await;
        self.persist(context.location.id, &scene, log).await?;
        Ok(scene)
    }

    /// Deletes the cache row for a location. Used before traveling away or
    /// before forced regeneration.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Store` on store failure.
    pub async fn invalidate(&self, location_id: Uuid) -> Result<(), EngineError> {
        self.store
            .delete(SCENES, &SceneCacheRow::key(location_id))
            .await
    }

    async fn generate(
        &self,
        context: &NarrativeContext,
        is_intro: bool,
        outcomes_summary: Option<&str>,
    ) -> Scene {
        let (system, user) = crate::prompts::scene(context, is_intro, outcomes_summary);
        for attempt in 1..=GENERATION_ATTEMPTS {
            let request = CompletionRequest {
                system: system.clone(),
                user: user.clone(),
                max_tokens: SCENE_MAX_TOKENS,
                timeout: SCENE_TIMEOUT,
            };
            match self.completions.complete(request).await {
                Ok(text) => match parse_scene(&text) {
                    Ok(scene) => return scene,
                    Err(error) => {
                        tracing::warn!(attempt, %error, "scene payload unusable");
                    }
                },
                Err(error) => {
                    tracing::warn!(attempt, %error, "scene generation failed");
                }
            }
        }
        tracing::info!(location = %context.location.id, "substituting fallback scene");
        Scene::fallback(&context.location.name)
    }

    async fn cached_log(&self, location_id: Uuid) -> Result<Vec<String>, EngineError> {
        let key = SceneCacheRow::key(location_id);
        Ok(self
            .store
            .get(SCENES, &key)
            .await?
            .and_then(|value| serde_json::from_value::<SceneCacheRow>(value).ok())
            .map(|row| row.action_log)
            .unwrap_or_default())
    }

    async fn persist(
        &self,
        location_id: Uuid,
        scene: &Scene,
        action_log: Vec<String>,
    ) -> Result<(), EngineError> {
        let mut row = SceneCacheRow {
            id: SceneCacheRow::key(location_id),
            location_id,
            scene: scene.clone(),
            action_log: Vec::new(),
            cached_at: self.clock.now(),
        };
        for line in action_log {
            row.push_log(line);
        }
        let value = serde_json::to_value(&row)
            .map_err(|e| EngineError::Store(format!("scene row serialization failed: {e}")))?;
        self.store.put(SCENES, &row.id, value).await
    }
}

fn parse_scene(text: &str) -> Result<Scene, EngineError> {
    let value = extract_object(text)?;
    let draft: SceneDraft = serde_json::from_value(value)
        .map_err(|e| EngineError::Parse(format!("scene shape mismatch: {e}")))?;
    let description = draft
        .description
        .filter(|d| !d.trim().is_empty())
        .ok_or_else(|| EngineError::Parse("scene description missing".to_owned()))?;
    Ok(Scene {
        title: draft.title.unwrap_or_else(|| "The Scene Unfolds".to_owned()),
        description,
        mood: draft.mood.unwrap_or_else(|| "neutral".to_owned()),
    })
}
