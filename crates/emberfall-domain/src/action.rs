//! Submitted and validated actions.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::character::ActionAttribute;

/// Lowest difficulty a validated action may carry.
pub const MIN_DIFFICULTY: u8 = 5;
/// Highest difficulty a validated action may carry.
pub const MAX_DIFFICULTY: u8 = 20;
/// Difficulty assigned when validation fails open.
pub const DEFAULT_DIFFICULTY: u8 = 12;

/// One free-text intent submitted for a character this round.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmittedAction {
    /// The acting character.
    pub character_id: Uuid,
    /// Free-text action description.
    pub text: String,
    /// Set when the player sits this round out.
    #[serde(default)]
    pub skip: bool,
    /// Semantic category of the player-selected target, when one was
    /// picked from the scene (`item`, `npc`, `exit`, ...).
    #[serde(default)]
    pub target_category: Option<String>,
}

impl SubmittedAction {
    /// True when the action carries no usable intent.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.skip || self.text.trim().is_empty()
    }
}

/// Risk level attached to a validated action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// Parses a loose risk string, defaulting to `Medium`.
    #[must_use]
    pub fn from_loose(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some("low") => Self::Low,
            Some("high") => Self::High,
            _ => Self::Medium,
        }
    }
}

/// Clamps a raw difficulty into the playable `[5, 20]` band.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn clamp_difficulty(raw: i64) -> u8 {
    raw.clamp(i64::from(MIN_DIFFICULTY), i64::from(MAX_DIFFICULTY)) as u8
}

/// A structured action produced by the validator. Created once per
/// submitted action per round and consumed exactly once by the dice
/// resolver; never mutated afterward.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidatedAction {
    /// The acting character.
    pub character_id: Uuid,
    /// Narrative description of the attempt.
    pub description: String,
    /// The attribute the check tests.
    pub primary_attribute: ActionAttribute,
    /// Difficulty in `[5, 20]`.
    pub difficulty: u8,
    /// Risk level.
    pub risk: RiskLevel,
    /// Whether a success may change inventories.
    pub affects_inventory: bool,
    /// Whether the action was judged sensible in context.
    pub valid: bool,
    /// Reason given for an invalid action.
    #[serde(default)]
    pub reason: Option<String>,
}

impl ValidatedAction {
    /// The fail-open action used when the validator's external call fails:
    /// every submitted action is accepted with default difficulty and risk.
    #[must_use]
    pub fn accepted_default(character_id: Uuid, description: impl Into<String>) -> Self {
        Self {
            character_id,
            description: description.into(),
            primary_attribute: ActionAttribute::Perception,
            difficulty: DEFAULT_DIFFICULTY,
            risk: RiskLevel::Medium,
            affects_inventory: false,
            valid: true,
            reason: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_difficulty_band() {
        assert_eq!(clamp_difficulty(99), 20);
        assert_eq!(clamp_difficulty(0), 5);
        assert_eq!(clamp_difficulty(-3), 5);
        assert_eq!(clamp_difficulty(12), 12);
    }

    #[test]
    fn test_risk_from_loose_defaults_to_medium() {
        assert_eq!(RiskLevel::from_loose(None), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_loose(Some("reckless")), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_loose(Some("high")), RiskLevel::High);
    }

    #[test]
    fn test_blank_detection() {
        let action = SubmittedAction {
            character_id: Uuid::new_v4(),
            text: "   ".to_owned(),
            skip: false,
            target_category: None,
        };
        assert!(action.is_blank());

        let skipped = SubmittedAction {
            character_id: Uuid::new_v4(),
            text: "search the altar".to_owned(),
            skip: true,
            target_category: None,
        };
        assert!(skipped.is_blank());
    }

    #[test]
    fn test_accepted_default_shape() {
        let id = Uuid::new_v4();
        let action = ValidatedAction::accepted_default(id, "pry the grate open");

        assert!(action.valid);
        assert_eq!(action.difficulty, DEFAULT_DIFFICULTY);
        assert_eq!(action.risk, RiskLevel::Medium);
        assert!(!action.affects_inventory);
    }
}
