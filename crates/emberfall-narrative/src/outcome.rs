//! The outcome stage: narrating one resolved action.
//!
//! Always produces prose, whatever the tier; failures are narrated too.
//! On an external-call failure the stage falls back to a templated
//! one-line consequence derived solely from the tier, so narration never
//! blocks the pipeline.

use std::sync::Arc;
use std::time::Duration;

use emberfall_ai::{CompletionClient, CompletionRequest};
use emberfall_ai::payload::extract_object;
use emberfall_core::error::EngineError;
use emberfall_domain::action::ValidatedAction;
use emberfall_domain::context::NarrativeContext;
use emberfall_domain::outcome::OutcomeTier;
use serde::Deserialize;

/// Token budget for outcome narration.
const OUTCOME_MAX_TOKENS: u32 = 500;
/// Per-request timeout for outcome narration.
const OUTCOME_TIMEOUT: Duration = Duration::from_secs(20);

/// Narrated result of one action.
#[derive(Debug, Clone)]
pub struct OutcomeNarration {
    /// One vivid paragraph.
    pub text: String,
    /// One short factual line.
    pub consequence: String,
}

#[derive(Debug, Deserialize)]
struct NarrationDraft {
    text: String,
    #[serde(default)]
    consequence: Option<String>,
}

/// The outcome narrator over a completion client.
pub struct OutcomeNarrator {
    completions: Arc<dyn CompletionClient>,
}

impl OutcomeNarrator {
    /// Creates a narrator over the given client.
    #[must_use]
    pub fn new(completions: Arc<dyn CompletionClient>) -> Self {
        Self { completions }
    }

    /// Narrates one resolved action. Never fails: any transport or parse
    /// error falls back to the templated consequence for the tier.
    pub async fn narrate(
        &self,
        context: &NarrativeContext,
        action: &ValidatedAction,
        tier: OutcomeTier,
        total: i32,
        character_name: &str,
        scene_text: Option<&str>,
    ) -> OutcomeNarration {
        let (system, user) =
            crate::prompts::outcome(context, action, tier, total, character_name, scene_text);
        let request = CompletionRequest {
            system,
            user,
            max_tokens: OUTCOME_MAX_TOKENS,
            timeout: OUTCOME_TIMEOUT,
        };
        match self.completions.complete(request).await {
            Ok(text) => match parse_narration(&text, tier) {
                Ok(narration) => narration,
                Err(error) => {
                    tracing::warn!(%error, "narration payload unusable; using template");
                    template_narration(character_name, tier)
                }
            },
            Err(error) => {
                tracing::warn!(%error, "narration call failed; using template");
                template_narration(character_name, tier)
            }
        }
    }
}

fn parse_narration(text: &str, tier: OutcomeTier) -> Result<OutcomeNarration, EngineError> {
    let value = extract_object(text)?;
    let draft: NarrationDraft = serde_json::from_value(value)
        .map_err(|e| EngineError::Parse(format!("narration shape mismatch: {e}")))?;
    if draft.text.trim().is_empty() {
        return Err(EngineError::Parse("narration text empty".to_owned()));
    }
    Ok(OutcomeNarration {
        text: draft.text,
        consequence: draft
            .consequence
            .unwrap_or_else(|| template_consequence(tier).to_owned()),
    })
}

fn template_consequence(tier: OutcomeTier) -> &'static str {
    match tier {
        OutcomeTier::CriticalFail => "The attempt backfires badly.",
        OutcomeTier::Fail => "The attempt comes to nothing.",
        OutcomeTier::Partial => "It half-works, at a cost.",
        OutcomeTier::Success => "It works as intended.",
        OutcomeTier::Critical => "It succeeds beyond expectation.",
    }
}

fn template_narration(character_name: &str, tier: OutcomeTier) -> OutcomeNarration {
    OutcomeNarration {
        text: format!("{character_name}: {}", template_consequence(tier)),
        consequence: template_consequence(tier).to_owned(),
    }
}
