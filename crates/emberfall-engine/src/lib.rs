//! Emberfall Engine — the turn queue orchestrator.
//!
//! One round is a strictly sequential pipeline: assemble context, serve
//! the scene, validate the party's intents, then resolve each valid
//! action one at a time (dice, narration, loot, progression) before the
//! next character may even be asked to roll. Closing a round writes the
//! diary entry and regenerates the scene with the round's outcomes as
//! narrative input.

pub mod round;

pub use round::{ClosedRound, RollResolution, RoundPhase, RoundPlan, TurnQueue};
