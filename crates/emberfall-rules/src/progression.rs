//! The progression stage: XP grants and level-ups.
//!
//! XP is granted only on rewarding tiers, in an amount equal to the
//! action's difficulty, so harder attempts pay better. The level threshold
//! is `level * 100`; overflow carries into the next level, and a single
//! grant can raise the level at most once. A grant large enough to satisfy
//! a second threshold leaves the remainder parked below it.

use emberfall_domain::action::ValidatedAction;
use emberfall_domain::character::Character;
use emberfall_domain::outcome::OutcomeTier;

/// XP required to leave the given level.
#[must_use]
pub fn xp_needed(level: u32) -> u32 {
    level * 100
}

/// The result of one experience grant.
#[derive(Debug, Clone)]
pub struct ProgressionResult {
    /// The character with XP/level applied.
    pub character: Character,
    /// XP granted (zero on non-rewarding tiers).
    pub gained: u32,
    /// New level when the grant crossed the threshold.
    pub level_up: Option<u32>,
}

/// Grants experience for one resolved action, returning a new character
/// value rather than mutating shared state.
#[must_use]
pub fn grant_experience(
    character: &Character,
    action: &ValidatedAction,
    tier: OutcomeTier,
) -> ProgressionResult {
    let mut updated = character.clone();
    if !tier.rewards() {
        return ProgressionResult {
            character: updated,
            gained: 0,
            level_up: None,
        };
    }

    let gained = u32::from(action.difficulty);
    let needed = xp_needed(updated.level);
    let accumulated = updated.xp + gained;

    let level_up = if accumulated >= needed {
        updated.level += 1;
        updated.xp = accumulated - needed;
        Some(updated.level)
    } else {
        updated.xp = accumulated;
        None
    };

    tracing::debug!(
        character = %updated.id,
        gained,
        level = updated.level,
        xp = updated.xp,
        "experience granted"
    );

    ProgressionResult {
        character: updated,
        gained,
        level_up,
    }
}
