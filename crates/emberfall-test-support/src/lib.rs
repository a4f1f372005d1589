//! Shared test mocks and fixtures for the Emberfall engine.

mod clock;
mod completions;
mod fixtures;
mod rng;

pub use clock::FixedClock;
pub use completions::{FailingCompletions, ScriptedCompletions};
pub use fixtures::{sample_context, sample_location, sample_party, sample_world};
pub use rng::{MockRng, SequenceRng};
