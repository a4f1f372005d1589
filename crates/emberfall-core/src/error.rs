//! Engine error taxonomy.

use thiserror::Error;
use uuid::Uuid;

/// Top-level engine error type.
///
/// `Transport` and `Parse` are always recovered locally by the stage that
/// observes them (templated fallback, seed data); they never reach the
/// player as a hard failure. `NoAction` and `InvalidPhase` are surfaced to
/// the caller and block round advancement until corrected.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The AI transport timed out or returned an HTTP failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// The AI response could not be parsed as JSON after one repair pass.
    #[error("unusable response payload: {0}")]
    Parse(String),

    /// Every party member skipped or submitted an empty action.
    #[error("no actionable input: every party member skipped or left blank")]
    NoAction,

    /// A character id was not found in the party.
    #[error("character not found: {0}")]
    CharacterNotFound(Uuid),

    /// The round state machine rejected an operation for the current phase.
    #[error("invalid phase: {0}")]
    InvalidPhase(String),

    /// A validation error in domain logic.
    #[error("validation error: {0}")]
    Validation(String),

    /// A persistence failure from the object store.
    #[error("store error: {0}")]
    Store(String),
}
