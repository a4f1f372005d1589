//! The diary: append-only history of narrated rounds.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::outcome::{OutcomeTier, ResolvedOutcome};

/// One character's action and result inside a diary entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiaryAction {
    /// The acting character.
    pub character_id: Uuid,
    /// Character name at the time of the round.
    pub character_name: String,
    /// What the character attempted.
    pub description: String,
    /// The outcome tier rolled.
    pub tier: OutcomeTier,
    /// The narrated result.
    pub text: String,
}

/// An immutable historical record of one round. Append-only, ordered by
/// creation timestamp, never edited or deleted by the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiaryEntry {
    /// Unique identifier (and store key).
    pub id: Uuid,
    /// The location the round played out in.
    pub location_id: Uuid,
    /// Location name at the time of the round.
    pub location_name: String,
    /// Scene title when the round opened.
    pub scene_title: String,
    /// Scene description when the round opened.
    pub scene_description: String,
    /// Every character's action and outcome this round.
    pub actions: Vec<DiaryAction>,
    /// Creation timestamp; the diary's ordering key.
    pub created_at: DateTime<Utc>,
}

impl DiaryEntry {
    /// Builds an entry from a round's accumulated outcomes. The caller
    /// supplies action descriptions alongside each outcome because the
    /// `ResolvedOutcome` carries only the narrated text.
    #[must_use]
    pub fn from_round(
        location_id: Uuid,
        location_name: String,
        scene_title: String,
        scene_description: String,
        outcomes: &[(String, String, ResolvedOutcome)],
        created_at: DateTime<Utc>,
    ) -> Self {
        let actions = outcomes
            .iter()
            .map(|(name, description, outcome)| DiaryAction {
                character_id: outcome.character_id,
                character_name: name.clone(),
                description: description.clone(),
                tier: outcome.tier,
                text: outcome.text.clone(),
            })
            .collect();
        Self {
            id: Uuid::new_v4(),
            location_id,
            location_name,
            scene_title,
            scene_description,
            actions,
            created_at,
        }
    }
}
