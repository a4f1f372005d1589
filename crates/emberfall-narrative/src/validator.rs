//! The action validator: free-text intents in, structured actions out.
//!
//! Validation is an external AI call and therefore fallible. The policy is
//! fail-open: a transport or parse failure accepts every submitted action
//! with default difficulty and risk, so a transient failure never blocks
//! play. The only hard error is `NoAction`, raised before any external
//! call when the whole party skipped or left blank.

use std::sync::Arc;
use std::time::Duration;

use emberfall_ai::{CompletionClient, CompletionRequest};
use emberfall_ai::payload::extract_array;
use emberfall_core::error::EngineError;
use emberfall_domain::action::{
    DEFAULT_DIFFICULTY, RiskLevel, SubmittedAction, ValidatedAction, clamp_difficulty,
};
use emberfall_domain::character::ActionAttribute;
use emberfall_domain::context::NarrativeContext;

/// Token budget for a validation call.
const VALIDATION_MAX_TOKENS: u32 = 700;
/// Per-request timeout for validation.
const VALIDATION_TIMEOUT: Duration = Duration::from_secs(20);

/// Target category whose selection forces `affects_inventory`.
const ITEM_CATEGORY: &str = "item";

/// The action validator over a completion client.
pub struct ActionValidator {
    completions: Arc<dyn CompletionClient>,
}

impl ActionValidator {
    /// Creates a validator over the given client.
    #[must_use]
    pub fn new(completions: Arc<dyn CompletionClient>) -> Self {
        Self { completions }
    }

    /// Validates a round's submitted actions. Returns one entry per input
    /// action in the same order; skipped/blank actions come back invalid
    /// with a fixed reason and are never sent to the validator.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::NoAction` when no submitted action is usable.
    /// Transport and parse failures do not error; they fail open.
    pub async fn validate(
        &self,
        context: &NarrativeContext,
        actions: &[SubmittedAction],
        scene_text: Option<&str>,
        previous_outcomes: Option<&str>,
    ) -> Result<Vec<ValidatedAction>, EngineError> {
        let actionable: Vec<&SubmittedAction> =
            actions.iter().filter(|a| !a.is_blank()).collect();
        if actionable.is_empty() {
            return Err(EngineError::NoAction);
        }

        let judged = match self
            .call_validator(context, &actionable, scene_text, previous_outcomes)
            .await
        {
            Ok(judged) => judged,
            Err(error) => {
                tracing::warn!(%error, "validation failed open; accepting all actions");
                actionable
                    .iter()
                    .map(|a| ValidatedAction::accepted_default(a.character_id, a.text.clone()))
                    .collect()
            }
        };

        // Stitch judged entries back into input order, marking blanks.
        let mut judged = judged.into_iter();
        let mut out = Vec::with_capacity(actions.len());
        for action in actions {
            if action.is_blank() {
                out.push(ValidatedAction {
                    character_id: action.character_id,
                    description: action.text.clone(),
                    primary_attribute: ActionAttribute::Perception,
                    difficulty: DEFAULT_DIFFICULTY,
                    risk: RiskLevel::Medium,
                    affects_inventory: false,
                    valid: false,
                    reason: Some("skipped this round".to_owned()),
                });
            } else {
                let mut validated = judged
                    .next()
                    .unwrap_or_else(|| {
                        ValidatedAction::accepted_default(action.character_id, action.text.clone())
                    });
                apply_item_target_correction(action, &mut validated);
                out.push(validated);
            }
        }
        Ok(out)
    }

    async fn call_validator(
        &self,
        context: &NarrativeContext,
        actionable: &[&SubmittedAction],
        scene_text: Option<&str>,
        previous_outcomes: Option<&str>,
    ) -> Result<Vec<ValidatedAction>, EngineError> {
        let (system, user) =
            crate::prompts::validation(context, actionable, scene_text, previous_outcomes);
        let text = self
            .completions
            .complete(CompletionRequest {
                system,
                user,
                max_tokens: VALIDATION_MAX_TOKENS,
                timeout: VALIDATION_TIMEOUT,
            })
            .await?;
        let value = extract_array(&text)?;
        let entries = value
            .as_array()
            .ok_or_else(|| EngineError::Parse("validation payload is not an array".to_owned()))?;

        Ok(actionable
            .iter()
            .enumerate()
            .map(|(index, submitted)| parse_entry(submitted, entries.get(index)))
            .collect())
    }
}

/// Maps one judged entry onto its submitted action, applying clamps and
/// defaults. A missing entry falls open to acceptance.
fn parse_entry(submitted: &SubmittedAction, entry: Option<&serde_json::Value>) -> ValidatedAction {
    let Some(entry) = entry else {
        return ValidatedAction::accepted_default(submitted.character_id, submitted.text.clone());
    };
    let description = entry
        .get("description")
        .and_then(|v| v.as_str())
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(&submitted.text)
        .to_owned();
    ValidatedAction {
        character_id: submitted.character_id,
        description,
        primary_attribute: ActionAttribute::from_loose(
            entry.get("primary_attribute").and_then(|v| v.as_str()),
        ),
        difficulty: entry
            .get("difficulty")
            .and_then(serde_json::Value::as_i64)
            .map_or(DEFAULT_DIFFICULTY, clamp_difficulty),
        risk: RiskLevel::from_loose(entry.get("risk").and_then(|v| v.as_str())),
        affects_inventory: entry
            .get("affects_inventory")
            .and_then(serde_json::Value::as_bool)
            .unwrap_or(false),
        valid: entry
            .get("valid")
            .and_then(serde_json::Value::as_bool)
            .unwrap_or(true),
        reason: entry
            .get("reason")
            .and_then(|v| v.as_str())
            .map(ToOwned::to_owned),
    }
}

/// Post-validation correction layer: an action whose player-selected target
/// is an item must affect inventory, overriding the upstream result.
fn apply_item_target_correction(submitted: &SubmittedAction, validated: &mut ValidatedAction) {
    if submitted.target_category.as_deref() == Some(ITEM_CATEGORY) {
        validated.affects_inventory = true;
    }
}
