//! The d20 resolver.
//!
//! Natural 1 and natural 20 are special-cased on the raw die, independent
//! of the modifier. Everything else compares `raw + modifier` against the
//! difficulty: at or above is a success, within `PARTIAL_MARGIN` below is
//! a partial success, further below is a failure.

use emberfall_domain::outcome::OutcomeTier;

/// How far below the difficulty a total still counts as a partial success.
pub const PARTIAL_MARGIN: i32 = 5;

/// The result of one resolved roll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RollResult {
    /// Raw die plus modifier.
    pub total: i32,
    /// The derived outcome tier.
    pub tier: OutcomeTier,
}

/// Resolves one d20 check. Deterministic given its three inputs; exactly
/// one resolution happens per validated action.
#[must_use]
#[allow(clippy::cast_possible_wrap)]
pub fn resolve(modifier: i32, difficulty: u8, raw: u32) -> RollResult {
    debug_assert!((1..=20).contains(&raw), "raw roll must be a d20 face");
    let total = raw as i32 + modifier;
    let difficulty = i32::from(difficulty);

    let tier = if raw == 1 {
        OutcomeTier::CriticalFail
    } else if raw == 20 {
        OutcomeTier::Critical
    } else if total >= difficulty {
        OutcomeTier::Success
    } else if total >= difficulty - PARTIAL_MARGIN {
        OutcomeTier::Partial
    } else {
        OutcomeTier::Fail
    };

    RollResult { total, tier }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_natural_one_is_critical_fail_regardless_of_modifier() {
        let result = resolve(15, 5, 1);
        assert_eq!(result.tier, OutcomeTier::CriticalFail);
        assert_eq!(result.total, 16);
    }

    #[test]
    fn test_natural_twenty_is_critical_regardless_of_modifier() {
        let result = resolve(-10, 20, 20);
        assert_eq!(result.tier, OutcomeTier::Critical);
        assert_eq!(result.total, 10);
    }

    #[test]
    fn test_total_at_difficulty_is_success() {
        let result = resolve(3, 15, 12);
        assert_eq!(result.total, 15);
        assert_eq!(result.tier, OutcomeTier::Success);
    }

    #[test]
    fn test_total_within_margin_is_partial() {
        let result = resolve(2, 15, 8);
        assert_eq!(result.total, 10);
        assert_eq!(result.tier, OutcomeTier::Partial);
    }

    #[test]
    fn test_total_below_margin_is_fail() {
        let result = resolve(1, 15, 3);
        assert_eq!(result.total, 4);
        assert_eq!(result.tier, OutcomeTier::Fail);
    }

    #[test]
    fn test_determinism() {
        for raw in 1..=20 {
            assert_eq!(resolve(2, 12, raw), resolve(2, 12, raw));
        }
    }
}
