//! The loot stage: item and gold grants for qualifying outcomes.
//!
//! Invoked only for inventory-affecting actions that at least partially
//! succeeded; the turn queue enforces that gate. Rarity scales with the
//! tier: a critical raises the generated rarity one step, a partial lowers
//! it one step or drops the item entirely. A generated item missing any
//! required field is discarded before being applied. On external-call
//! failure the stage instantiates a location-defined descriptor instead,
//! so it never returns a silently broken item.

use std::sync::Arc;
use std::time::Duration;

use emberfall_ai::{CompletionClient, CompletionRequest};
use emberfall_ai::payload::extract_object;
use emberfall_core::error::EngineError;
use emberfall_core::rng::DeterministicRng;
use emberfall_domain::action::ValidatedAction;
use emberfall_domain::character::Character;
use emberfall_domain::context::NarrativeContext;
use emberfall_domain::equipment::{Equipment, Rarity};
use emberfall_domain::outcome::{GrantedItem, OutcomeTier};
use serde::Deserialize;
use std::collections::BTreeMap;
use uuid::Uuid;

/// Token budget for loot generation.
const LOOT_MAX_TOKENS: u32 = 600;
/// Per-request timeout for loot generation.
const LOOT_TIMEOUT: Duration = Duration::from_secs(20);

/// Generated loot plus the AI's opinion of who should receive it.
#[derive(Debug, Clone)]
pub struct LootDrop {
    /// Complete, valid items ready to grant.
    pub items: Vec<Equipment>,
    /// Gold to grant.
    pub gold: u32,
    /// AI-specified recipient, fed into the target resolver.
    pub target_hint: Option<Uuid>,
}

/// A generated item as the AI must author it: every field required except
/// the bonus map. Drafts that fail to deserialize are discarded.
#[derive(Debug, Deserialize)]
struct LootItemDraft {
    name: String,
    kind: String,
    rarity: Rarity,
    sell_price: u32,
    hp_restore: u32,
    difficulty_reduction: u8,
    consumable: bool,
    equippable: bool,
    stackable: bool,
    #[serde(default)]
    bonus: BTreeMap<String, i32>,
}

#[derive(Debug, Deserialize)]
struct LootDraft {
    #[serde(default)]
    character_id: Option<Uuid>,
    #[serde(default)]
    gold: Option<i64>,
    #[serde(default)]
    items: Vec<serde_json::Value>,
}

/// The loot stage over a completion client.
pub struct LootStage {
    completions: Arc<dyn CompletionClient>,
}

impl LootStage {
    /// Creates a loot stage over the given client.
    #[must_use]
    pub fn new(completions: Arc<dyn CompletionClient>) -> Self {
        Self { completions }
    }

    /// Generates loot for one qualifying outcome. Never fails: any
    /// transport or parse error falls back to a seed descriptor from the
    /// location.
    pub async fn generate(
        &self,
        context: &NarrativeContext,
        action: &ValidatedAction,
        tier: OutcomeTier,
        rng: &mut dyn DeterministicRng,
        scene_text: Option<&str>,
    ) -> LootDrop {
        debug_assert!(
            action.affects_inventory && tier.rewards(),
            "loot stage invoked outside its gate"
        );

        let (system, user) = crate::prompts::loot(context, action, tier, scene_text);
        let request = CompletionRequest {
            system,
            user,
            max_tokens: LOOT_MAX_TOKENS,
            timeout: LOOT_TIMEOUT,
        };
        match self.completions.complete(request).await {
            Ok(text) => match parse_drop(&text, tier) {
                Ok(drop) => drop,
                Err(error) => {
                    tracing::warn!(%error, "loot payload unusable; using seed fallback");
                    fallback_drop(context, tier, rng)
                }
            },
            Err(error) => {
                tracing::warn!(%error, "loot call failed; using seed fallback");
                fallback_drop(context, tier, rng)
            }
        }
    }
}

fn parse_drop(text: &str, tier: OutcomeTier) -> Result<LootDrop, EngineError> {
    let value = extract_object(text)?;
    let draft: LootDraft = serde_json::from_value(value)
        .map_err(|e| EngineError::Parse(format!("loot shape mismatch: {e}")))?;

    let mut items = Vec::new();
    for raw in draft.items {
        // Incomplete items are discarded, not repaired.
        let Ok(item) = serde_json::from_value::<LootItemDraft>(raw) else {
            tracing::debug!("discarding incomplete loot item");
            continue;
        };
        if item.name.trim().is_empty() || item.kind.trim().is_empty() {
            continue;
        }
        let Some(rarity) = shift_rarity(item.rarity, tier) else {
            continue;
        };
        items.push(Equipment {
            id: Uuid::new_v4(),
            name: item.name,
            kind: item.kind,
            rarity,
            bonus: item.bonus,
            difficulty_reduction: item.difficulty_reduction,
            hp_restore: item.hp_restore,
            sell_price: item.sell_price,
            consumable: item.consumable,
            equippable: item.equippable,
            stackable: item.stackable,
        });
    }

    let gold = draft
        .gold
        .map_or(0, |g| u32::try_from(g.max(0)).unwrap_or(u32::MAX));

    Ok(LootDrop {
        items,
        gold,
        target_hint: draft.character_id,
    })
}

/// Applies the tier's rarity scaling to a generated baseline. `None` means
/// the item is dropped (a partial at the bottom of the ladder).
fn shift_rarity(baseline: Rarity, tier: OutcomeTier) -> Option<Rarity> {
    match tier {
        OutcomeTier::Critical => Some(baseline.raised()),
        OutcomeTier::Success => Some(baseline),
        OutcomeTier::Partial => baseline.lowered(),
        OutcomeTier::Fail | OutcomeTier::CriticalFail => None,
    }
}

/// Rarity for a fallback-instantiated item, derived from the tier alone.
fn fallback_rarity(tier: OutcomeTier) -> Rarity {
    match tier {
        OutcomeTier::Critical => Rarity::Uncommon,
        _ => Rarity::Common,
    }
}

/// Gold granted on the fallback path.
fn fallback_gold(tier: OutcomeTier) -> u32 {
    match tier {
        OutcomeTier::Critical => 10,
        OutcomeTier::Success => 5,
        _ => 2,
    }
}

fn fallback_drop(
    context: &NarrativeContext,
    tier: OutcomeTier,
    rng: &mut dyn DeterministicRng,
) -> LootDrop {
    let items = if context.location.loot_table.is_empty() {
        Vec::new()
    } else {
        let index = rng.next_index(context.location.loot_table.len());
        vec![context.location.loot_table[index].instantiate(fallback_rarity(tier))]
    };
    LootDrop {
        items,
        gold: fallback_gold(tier),
        target_hint: None,
    }
}

/// Resolves which party member receives a drop, as an explicit chain:
/// the AI-specified hint when it names a party member, else the acting
/// character, else the first party member.
#[must_use]
pub fn resolve_loot_target(
    party: &[Character],
    hint: Option<Uuid>,
    actor_id: Uuid,
) -> Option<Uuid> {
    let in_party = |id: Uuid| party.iter().any(|c| c.id == id);
    if let Some(hinted) = hint.filter(|&id| in_party(id)) {
        return Some(hinted);
    }
    if in_party(actor_id) {
        return Some(actor_id);
    }
    party.first().map(|c| c.id)
}

/// Applies a drop to a character, returning the new character value and
/// the grant records for narration and the diary. Each generated item is
/// granted as one copy.
#[must_use]
pub fn apply_drop(character: &Character, drop: &LootDrop) -> (Character, Vec<GrantedItem>) {
    let mut updated = character.clone();
    let mut granted = Vec::with_capacity(drop.items.len());
    for item in &drop.items {
        updated.grant_item(item, 1);
        granted.push(GrantedItem {
            equipment_id: item.id,
            name: item.name.clone(),
            quantity: 1,
        });
    }
    updated.grant_gold(i64::from(drop.gold));
    (updated, granted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use emberfall_test_support::{
        FailingCompletions, MockRng, ScriptedCompletions, SequenceRng, sample_context,
        sample_party,
    };

    fn inventory_action(context: &NarrativeContext) -> ValidatedAction {
        let mut action =
            ValidatedAction::accepted_default(context.party[0].id, "search the cairn");
        action.affects_inventory = true;
        action
    }

    const FULL_ITEM_REPLY: &str = r#"{
        "character_id": null,
        "gold": 7,
        "items": [{
            "name": "Riverstone Charm",
            "kind": "accessory",
            "rarity": "incomum",
            "sell_price": 14,
            "hp_restore": 0,
            "difficulty_reduction": 1,
            "consumable": false,
            "equippable": true,
            "stackable": false
        }]
    }"#;

    #[tokio::test]
    async fn test_success_keeps_baseline_rarity() {
        let stage = LootStage::new(Arc::new(ScriptedCompletions::replying(vec![
            FULL_ITEM_REPLY,
        ])));
        let context = sample_context();
        let action = inventory_action(&context);
        let mut rng = MockRng;

        let drop = stage
            .generate(&context, &action, OutcomeTier::Success, &mut rng, None)
            .await;

        assert_eq!(drop.items.len(), 1);
        assert_eq!(drop.items[0].rarity, Rarity::Uncommon);
        assert_eq!(drop.gold, 7);
    }

    #[tokio::test]
    async fn test_critical_raises_rarity_one_step() {
        let stage = LootStage::new(Arc::new(ScriptedCompletions::replying(vec![
            FULL_ITEM_REPLY,
        ])));
        let context = sample_context();
        let action = inventory_action(&context);
        let mut rng = MockRng;

        let drop = stage
            .generate(&context, &action, OutcomeTier::Critical, &mut rng, None)
            .await;

        assert_eq!(drop.items[0].rarity, Rarity::Rare);
    }

    #[tokio::test]
    async fn test_partial_lowers_rarity_or_drops_item() {
        let stage = LootStage::new(Arc::new(ScriptedCompletions::replying(vec![
            FULL_ITEM_REPLY,
        ])));
        let context = sample_context();
        let action = inventory_action(&context);
        let mut rng = MockRng;

        let drop = stage
            .generate(&context, &action, OutcomeTier::Partial, &mut rng, None)
            .await;
        assert_eq!(drop.items[0].rarity, Rarity::Common);

        // A common baseline on a partial has nowhere to go and is dropped.
        let common_reply = FULL_ITEM_REPLY.replace("incomum", "comum");
        let stage = LootStage::new(Arc::new(ScriptedCompletions::replying(vec![
            common_reply.as_str(),
        ])));
        let drop = stage
            .generate(&context, &action, OutcomeTier::Partial, &mut rng, None)
            .await;
        assert!(drop.items.is_empty());
    }

    #[tokio::test]
    async fn test_incomplete_items_are_discarded() {
        let reply = r#"{
            "gold": 3,
            "items": [
                {"name": "Mystery Trinket", "rarity": "comum"},
                {
                    "name": "Grave Candle",
                    "kind": "tool",
                    "rarity": "comum",
                    "sell_price": 2,
                    "hp_restore": 0,
                    "difficulty_reduction": 0,
                    "consumable": false,
                    "equippable": false,
                    "stackable": true
                }
            ]
        }"#;
        let stage = LootStage::new(Arc::new(ScriptedCompletions::replying(vec![reply])));
        let context = sample_context();
        let action = inventory_action(&context);
        let mut rng = MockRng;

        let drop = stage
            .generate(&context, &action, OutcomeTier::Success, &mut rng, None)
            .await;

        assert_eq!(drop.items.len(), 1);
        assert_eq!(drop.items[0].name, "Grave Candle");
    }

    #[tokio::test]
    async fn test_transport_failure_instantiates_seed_descriptor() {
        let stage = LootStage::new(Arc::new(FailingCompletions));
        let context = sample_context();
        let action = inventory_action(&context);
        let mut rng = SequenceRng::new(vec![1]);

        let drop = stage
            .generate(&context, &action, OutcomeTier::Success, &mut rng, None)
            .await;

        assert_eq!(drop.items.len(), 1);
        assert_eq!(drop.items[0].name, "Bent Hunting Knife");
        assert_eq!(drop.items[0].rarity, Rarity::Common);
        assert!(drop.gold > 0);
    }

    #[tokio::test]
    async fn test_fallback_rarity_scales_with_critical() {
        let stage = LootStage::new(Arc::new(FailingCompletions));
        let context = sample_context();
        let action = inventory_action(&context);
        let mut rng = MockRng;

        let drop = stage
            .generate(&context, &action, OutcomeTier::Critical, &mut rng, None)
            .await;

        assert_eq!(drop.items[0].rarity, Rarity::Uncommon);
    }

    #[test]
    fn test_target_resolver_prefers_hint_in_party() {
        let party = sample_party();
        let hinted = party[1].id;
        let actor = party[0].id;

        assert_eq!(
            resolve_loot_target(&party, Some(hinted), actor),
            Some(hinted)
        );
    }

    #[test]
    fn test_target_resolver_falls_back_to_actor() {
        let party = sample_party();
        let actor = party[1].id;
        let stranger = Uuid::new_v4();

        assert_eq!(
            resolve_loot_target(&party, Some(stranger), actor),
            Some(actor)
        );
    }

    #[test]
    fn test_target_resolver_falls_back_to_first_member() {
        let party = sample_party();
        let stranger = Uuid::new_v4();

        assert_eq!(
            resolve_loot_target(&party, Some(stranger), stranger),
            Some(party[0].id)
        );
        assert_eq!(resolve_loot_target(&[], None, stranger), None);
    }

    #[test]
    fn test_apply_drop_grants_items_and_gold() {
        let party = sample_party();
        let drop = LootDrop {
            items: vec![
                sample_context().location.loot_table[0].instantiate(Rarity::Common),
            ],
            gold: 9,
            target_hint: None,
        };

        let (updated, granted) = apply_drop(&party[0], &drop);

        assert_eq!(updated.inventory.len(), 1);
        assert_eq!(updated.gold, party[0].gold + 9);
        assert_eq!(granted.len(), 1);
        assert_eq!(granted[0].quantity, 1);
    }
}
