//! Scenes and the scene cache row.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How many recent action-log lines a cache row keeps.
pub const ACTION_LOG_LIMIT: usize = 12;

/// AI-authored narrative text describing the current state of a location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scene {
    /// Short scene title.
    pub title: String,
    /// Narrative body, with embedded semantic tags.
    pub description: String,
    /// Mood keyword used to steer later narration.
    pub mood: String,
}

impl Scene {
    /// The fixed scene substituted when generation fails. Generic enough to
    /// let any round proceed.
    #[must_use]
    pub fn fallback(location_name: &str) -> Self {
        Self {
            title: format!("Exploring {location_name}"),
            description: format!(
                "The party presses on through {location_name}. Shapes shift at \
                 the edge of the light, and every surface invites a closer look. \
                 Something here is worth finding."
            ),
            mood: "mysterious".to_owned(),
        }
    }
}

/// The cached narration for one location. At most one row exists per
/// location; the row is authoritative until explicitly invalidated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneCacheRow {
    /// Store key, `scene-{location_id}`.
    pub id: String,
    /// The location this scene narrates.
    pub location_id: Uuid,
    /// The last-served scene.
    pub scene: Scene,
    /// Truncated log of recent party actions at this location.
    #[serde(default)]
    pub action_log: Vec<String>,
    /// When the row was cached.
    pub cached_at: DateTime<Utc>,
}

impl SceneCacheRow {
    /// Builds the store key for a location's scene row.
    #[must_use]
    pub fn key(location_id: Uuid) -> String {
        format!("scene-{location_id}")
    }

    /// Appends an action-log line, keeping only the most recent
    /// `ACTION_LOG_LIMIT` lines.
    pub fn push_log(&mut self, line: String) {
        self.action_log.push(line);
        if self.action_log.len() > ACTION_LOG_LIMIT {
            let excess = self.action_log.len() - ACTION_LOG_LIMIT;
            self.action_log.drain(..excess);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_shape() {
        let id = Uuid::nil();
        assert_eq!(
            SceneCacheRow::key(id),
            "scene-00000000-0000-0000-0000-000000000000"
        );
    }

    #[test]
    fn test_fallback_scene_is_nonempty() {
        let scene = Scene::fallback("the Sunken Crypt");
        assert!(!scene.title.is_empty());
        assert!(scene.description.contains("the Sunken Crypt"));
    }

    #[test]
    fn test_push_log_truncates() {
        let mut row = SceneCacheRow {
            id: SceneCacheRow::key(Uuid::new_v4()),
            location_id: Uuid::new_v4(),
            scene: Scene::fallback("somewhere"),
            action_log: Vec::new(),
            cached_at: Utc::now(),
        };
        for i in 0..20 {
            row.push_log(format!("line {i}"));
        }
        assert_eq!(row.action_log.len(), ACTION_LOG_LIMIT);
        assert_eq!(row.action_log.last().unwrap(), "line 19");
    }
}
