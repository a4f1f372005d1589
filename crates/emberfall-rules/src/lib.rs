//! Emberfall Rules — deterministic resolution rules.
//!
//! The d20 resolver and the XP/level progression stage. Both are pure:
//! randomness lives in the caller that draws the raw roll.

pub mod dice;
pub mod progression;
