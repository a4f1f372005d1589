//! Prompt builders for the narrative stages.
//!
//! Each builder returns `(system, user)` prompt pair. The user prompt
//! carries the round context; the system prompt pins the stage's task and
//! the JSON shape the stage will extract.

use std::fmt::Write;

use emberfall_domain::action::{SubmittedAction, ValidatedAction};
use emberfall_domain::context::NarrativeContext;
use emberfall_domain::outcome::OutcomeTier;

fn tier_label(tier: OutcomeTier) -> &'static str {
    match tier {
        OutcomeTier::CriticalFail => "critical failure",
        OutcomeTier::Fail => "failure",
        OutcomeTier::Partial => "partial success",
        OutcomeTier::Success => "success",
        OutcomeTier::Critical => "critical success",
    }
}

fn render_party(context: &NarrativeContext) -> String {
    let mut out = String::new();
    for member in &context.party {
        let _ = writeln!(
            out,
            "- {} (level {}, hp {}, gold {})",
            member.name, member.level, member.hp, member.gold
        );
    }
    out
}

fn render_history(context: &NarrativeContext) -> String {
    let mut out = String::new();
    for entry in context.history.iter().rev().take(3).rev() {
        let _ = writeln!(out, "Earlier at {}: {}", entry.location_name, entry.scene_title);
        for action in &entry.actions {
            let _ = writeln!(
                out,
                "  {} tried \"{}\" ({})",
                action.character_name,
                action.description,
                tier_label(action.tier)
            );
        }
    }
    out
}

/// Prompt for generating a location scene.
#[must_use]
pub fn scene(
    context: &NarrativeContext,
    is_intro: bool,
    outcomes_summary: Option<&str>,
) -> (String, String) {
    let system = "You are the narrator of a grounded fantasy adventure. \
                  Respond with a single JSON object: \
                  {\"title\": string, \"description\": string, \"mood\": string}. \
                  The description is 2-4 paragraphs and may embed semantic tags \
                  like [item:rope] or [npc:warden] around interactable things."
        .to_owned();

    let mut user = format!(
        "World: {} — {}\nLocation: {} — {}\n\nParty:\n{}",
        context.world.name,
        context.world.description,
        context.location.name,
        context.location.description,
        render_party(context),
    );
    if is_intro {
        user.push_str("\nThis is the party's first look at this place. Set the scene.\n");
    }
    if let Some(summary) = outcomes_summary {
        let _ = write!(
            user,
            "\nThe scene continues after these events:\n{summary}\n\
             Show their consequences in the description.\n"
        );
    }
    let history = render_history(context);
    if !history.is_empty() {
        let _ = write!(user, "\nRecent history:\n{history}");
    }

    (system, user)
}

/// Prompt for validating a batch of submitted actions.
#[must_use]
pub fn validation(
    context: &NarrativeContext,
    actions: &[&SubmittedAction],
    scene_text: Option<&str>,
    previous_outcomes: Option<&str>,
) -> (String, String) {
    let system = "You judge whether player actions make sense in the scene. \
                  Respond with a single JSON array, one object per action, in \
                  the same order: {\"valid\": bool, \"reason\": string, \
                  \"description\": string, \"primary_attribute\": one of \
                  strength|agility|intellect|charisma|perception|willpower, \
                  \"difficulty\": integer 5-20, \"risk\": low|medium|high, \
                  \"affects_inventory\": bool}."
        .to_owned();

    let mut user = format!(
        "Location: {} — {}\n\nParty:\n{}",
        context.location.name,
        context.location.description,
        render_party(context),
    );
    if let Some(text) = scene_text {
        let _ = write!(user, "\nCurrent scene:\n{text}\n");
    }
    if let Some(previous) = previous_outcomes {
        let _ = write!(user, "\nWhat just happened:\n{previous}\n");
    }
    user.push_str("\nActions to judge:\n");
    for (index, action) in actions.iter().enumerate() {
        let name = context
            .member(action.character_id)
            .map_or("someone", |c| c.name.as_str());
        let _ = writeln!(user, "{}. {name}: {}", index + 1, action.text);
    }

    (system, user)
}

/// Prompt for narrating one resolved action.
#[must_use]
pub fn outcome(
    context: &NarrativeContext,
    action: &ValidatedAction,
    tier: OutcomeTier,
    total: i32,
    character_name: &str,
    scene_text: Option<&str>,
) -> (String, String) {
    let system = "You narrate the result of one character's action. Respond \
                  with a single JSON object: {\"text\": string, \
                  \"consequence\": string}. The text is one vivid paragraph; \
                  the consequence is one short factual line."
        .to_owned();

    let mut user = format!(
        "Location: {}\nCharacter: {character_name}\nAttempt: {}\n\
         Result: {} (rolled {total} against difficulty {})\n",
        context.location.name,
        action.description,
        tier_label(tier),
        action.difficulty,
    );
    if let Some(text) = scene_text {
        let _ = write!(user, "\nScene:\n{text}\n");
    }
    user.push_str("\nNarrate failures honestly; do not soften them.\n");

    (system, user)
}

/// Prompt for generating loot after a qualifying outcome.
#[must_use]
pub fn loot(
    context: &NarrativeContext,
    action: &ValidatedAction,
    tier: OutcomeTier,
    scene_text: Option<&str>,
) -> (String, String) {
    let system = "You decide what a successful, inventory-affecting action \
                  yields. Respond with a single JSON object: \
                  {\"character_id\": string|null, \"gold\": integer, \
                  \"items\": [{\"name\": string, \"kind\": string, \
                  \"rarity\": comum|incomum|raro|epico|lendario, \
                  \"sell_price\": integer, \"hp_restore\": integer, \
                  \"difficulty_reduction\": integer, \"consumable\": bool, \
                  \"equippable\": bool, \"stackable\": bool}]}. \
                  Every item field is required; keep rewards modest."
        .to_owned();

    let mut user = format!(
        "Location: {}\nAttempt: {}\nResult: {}\n",
        context.location.name,
        action.description,
        tier_label(tier),
    );
    if let Some(text) = scene_text {
        let _ = write!(user, "\nScene:\n{text}\n");
    }

    (system, user)
}
