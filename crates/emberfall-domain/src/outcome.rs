//! Outcome tiers and per-character round results.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The five-tier outcome of a resolved check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutcomeTier {
    /// Natural 1.
    #[serde(rename = "critical-fail")]
    CriticalFail,
    /// Total below the partial band.
    #[serde(rename = "fail")]
    Fail,
    /// Total within 5 below the difficulty.
    #[serde(rename = "partial")]
    Partial,
    /// Total at or above the difficulty.
    #[serde(rename = "success")]
    Success,
    /// Natural 20.
    #[serde(rename = "critical")]
    Critical,
}

impl OutcomeTier {
    /// Whether this tier may yield loot or experience. Failures never do.
    #[must_use]
    pub fn rewards(self) -> bool {
        matches!(self, Self::Partial | Self::Success | Self::Critical)
    }
}

/// An item granted during a round, recorded for narration and the diary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrantedItem {
    /// The equipment definition granted.
    pub equipment_id: Uuid,
    /// Display name at grant time.
    pub name: String,
    /// Copies granted.
    pub quantity: u32,
}

/// The full result of one character's action in a round. Accumulated for
/// the duration of the round and folded into the diary entry at closure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedOutcome {
    /// The acting character.
    pub character_id: Uuid,
    /// The raw d20 roll.
    pub natural_roll: u32,
    /// Roll plus modifier.
    pub total: i32,
    /// Difficulty the total was compared against.
    pub difficulty: u8,
    /// Outcome tier.
    pub tier: OutcomeTier,
    /// Narrated outcome text.
    pub text: String,
    /// Items granted by the loot stage.
    #[serde(default)]
    pub items: Vec<GrantedItem>,
    /// Gold granted by the loot stage.
    #[serde(default)]
    pub gold: u32,
    /// Experience granted by the progression stage.
    #[serde(default)]
    pub xp: u32,
    /// New level when the grant crossed the threshold.
    #[serde(default)]
    pub level_up: Option<u32>,
}
