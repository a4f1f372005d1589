//! The immutable narrative context assembled once per round.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::character::Character;
use crate::diary::DiaryEntry;
use crate::equipment::{Equipment, LootDescriptor};

/// Static world framing for prompts.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorldInfo {
    /// World name.
    pub name: String,
    /// One-paragraph world premise.
    pub description: String,
}

/// The location the party currently occupies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationInfo {
    /// Unique identifier.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Narrative description seed.
    pub description: String,
    /// Loot descriptors for the AI-failure fallback path.
    #[serde(default)]
    pub loot_table: Vec<LootDescriptor>,
}

/// An immutable snapshot of everything the stages need for one round.
///
/// The equipment map resolves every `equipment_id` the party owns so later
/// stages and narration never need extra lookups mid-flow.
#[derive(Debug, Clone)]
pub struct NarrativeContext {
    /// World framing.
    pub world: WorldInfo,
    /// Current location.
    pub location: LocationInfo,
    /// The party at round start.
    pub party: Vec<Character>,
    /// Every equipment definition any party member owns, by id.
    pub equipment: HashMap<Uuid, Equipment>,
    /// Recent diary entries, oldest first.
    pub history: Vec<DiaryEntry>,
}

impl NarrativeContext {
    /// Assembles the snapshot. Pure and side-effect-free: `content` is the
    /// full equipment catalog, filtered down to what the party owns;
    /// missing optional inputs default to empty collections.
    #[must_use]
    pub fn assemble(
        world: WorldInfo,
        location: LocationInfo,
        content: &[Equipment],
        party: Vec<Character>,
        history: Vec<DiaryEntry>,
    ) -> Self {
        let owned: std::collections::HashSet<Uuid> = party
            .iter()
            .flat_map(|character| character.inventory.iter().map(|item| item.equipment_id))
            .collect();
        let equipment = content
            .iter()
            .filter(|definition| owned.contains(&definition.id))
            .map(|definition| (definition.id, definition.clone()))
            .collect();
        Self {
            world,
            location,
            party,
            equipment,
            history,
        }
    }

    /// Finds a party member by id.
    #[must_use]
    pub fn member(&self, character_id: Uuid) -> Option<&Character> {
        self.party.iter().find(|c| c.id == character_id)
    }
}
