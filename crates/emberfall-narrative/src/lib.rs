//! Emberfall Narrative — the AI-facing stages of a round.
//!
//! Scene cache, action validator, outcome narration, and loot generation.
//! Every stage here follows the same failure policy: an AI transport or
//! parse failure is recovered locally with a deterministic fallback, so
//! the round can always proceed.

pub mod loot;
pub mod outcome;
pub mod prompts;
pub mod scene_cache;
pub mod validator;
