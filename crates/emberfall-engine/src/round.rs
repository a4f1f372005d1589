//! The round state machine and its surface.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use emberfall_ai::CompletionClient;
use emberfall_core::clock::Clock;
use emberfall_core::error::EngineError;
use emberfall_core::rng::DeterministicRng;
use emberfall_core::store::{CHARACTERS, DIARY, EQUIPMENT, ObjectStore};
use emberfall_domain::action::{SubmittedAction, ValidatedAction};
use emberfall_domain::character::{Character, EquipSlot};
use emberfall_domain::context::{LocationInfo, NarrativeContext, WorldInfo};
use emberfall_domain::diary::DiaryEntry;
use emberfall_domain::equipment::Equipment;
use emberfall_domain::outcome::{OutcomeTier, ResolvedOutcome};
use emberfall_domain::scene::Scene;
use emberfall_narrative::loot::{LootStage, apply_drop, resolve_loot_target};
use emberfall_narrative::outcome::OutcomeNarrator;
use emberfall_narrative::scene_cache::SceneCache;
use emberfall_narrative::validator::ActionValidator;
use emberfall_rules::{dice, progression};
use emberfall_store::WriteQueue;
use serde::Serialize;
use std::fmt::Write as _;
use uuid::Uuid;

/// How many closed rounds the assembled context keeps as history.
const HISTORY_WINDOW: usize = 10;

/// The observable phase of the round state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RoundPhase {
    /// Collecting one action (or skip) per party member.
    AwaitingActions,
    /// Resolving valid actions head-first, one roll at a time.
    Resolving,
    /// All rolls committed; waiting for `close_round`.
    Closing,
}

/// Everything a round accumulates between validation and closure.
struct RoundState {
    context: NarrativeContext,
    scene: Scene,
    queue: VecDeque<ValidatedAction>,
    outcomes: Vec<(String, String, ResolvedOutcome)>,
}

/// Result of `submit_actions`: the scene the round plays in plus the
/// validator's verdicts. Invalid actions are surfaced but do not block
/// the round when at least one action is valid.
#[derive(Debug, Clone, Serialize)]
pub struct RoundPlan {
    /// The scene the round opens on.
    pub scene: Scene,
    /// Whether the scene came from the cache.
    pub from_cache: bool,
    /// Actions queued for resolution, in order.
    pub valid_actions: Vec<ValidatedAction>,
    /// Rejected or skipped actions, with reasons.
    pub invalid_actions: Vec<ValidatedAction>,
    /// The character whose roll the machine will accept next.
    pub next_to_roll: Option<Uuid>,
}

/// Result of one committed roll.
#[derive(Debug, Clone, Serialize)]
pub struct RollResolution {
    /// The full resolved outcome for the acting character.
    pub outcome: ResolvedOutcome,
    /// Every character whose state changed during this step.
    pub updated_characters: Vec<Character>,
    /// New level when progression crossed the threshold.
    pub level_up: Option<u32>,
    /// The character whose roll the machine will accept next.
    pub next_to_roll: Option<Uuid>,
}

/// Result of `close_round`.
#[derive(Debug, Clone, Serialize)]
pub struct ClosedRound {
    /// The diary entry written for the round.
    pub diary_entry: DiaryEntry,
    /// The regenerated scene the next round opens on.
    pub next_scene: Scene,
}

/// The turn queue: exclusive owner of party state for the duration of a
/// round. Characters resolve strictly sequentially; `submit_roll` is
/// rejected for any character but the queue head, and no mutation exists
/// for a pending step until its roll has actually been drawn.
pub struct TurnQueue {
    store: Arc<dyn ObjectStore>,
    write_queue: WriteQueue,
    scene_cache: SceneCache,
    validator: ActionValidator,
    narrator: OutcomeNarrator,
    loot: LootStage,
    clock: Arc<dyn Clock>,
    rng: Box<dyn DeterministicRng>,
    world: WorldInfo,
    location: LocationInfo,
    catalog: Vec<Equipment>,
    party: Vec<Character>,
    history: Vec<DiaryEntry>,
    last_summary: Option<String>,
    phase: RoundPhase,
    round: Option<RoundState>,
}

impl TurnQueue {
    /// Creates the queue and spawns its background write worker.
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        store: Arc<dyn ObjectStore>,
        completions: Arc<dyn CompletionClient>,
        clock: Arc<dyn Clock>,
        rng: Box<dyn DeterministicRng>,
        world: WorldInfo,
        location: LocationInfo,
        catalog: Vec<Equipment>,
        party: Vec<Character>,
    ) -> Self {
        Self {
            write_queue: WriteQueue::spawn(store.clone()),
            scene_cache: SceneCache::new(store.clone(), completions.clone(), clock.clone()),
            validator: ActionValidator::new(completions.clone()),
            narrator: OutcomeNarrator::new(completions.clone()),
            loot: LootStage::new(completions),
            store,
            clock,
            rng,
            world,
            location,
            catalog,
            party,
            history: Vec::new(),
            last_summary: None,
            phase: RoundPhase::AwaitingActions,
            round: None,
        }
    }

    /// Current phase of the state machine.
    #[must_use]
    pub fn phase(&self) -> RoundPhase {
        self.phase
    }

    /// The party's current state.
    #[must_use]
    pub fn party(&self) -> &[Character] {
        &self.party
    }

    /// The current location.
    #[must_use]
    pub fn location(&self) -> &LocationInfo {
        &self.location
    }

    /// Diary entries closed this session, oldest first.
    #[must_use]
    pub fn session_history(&self) -> &[DiaryEntry] {
        &self.history
    }

    /// Every equipment definition known to this session.
    #[must_use]
    pub fn catalog(&self) -> &[Equipment] {
        &self.catalog
    }

    /// Opens a round: serves the scene, validates the submitted actions,
    /// and queues the valid ones for sequential resolution. When no action
    /// survives validation the machine stays in `AwaitingActions` and the
    /// plan carries only rejections.
    ///
    /// # Errors
    ///
    /// `InvalidPhase` outside `AwaitingActions`, `CharacterNotFound` for an
    /// unknown submitter, `Validation` when a member submits twice,
    /// `NoAction` when every member skipped or left blank, `Store` on
    /// persistence failure.
    pub async fn submit_actions(
        &mut self,
        actions: Vec<SubmittedAction>,
    ) -> Result<RoundPlan, EngineError> {
        if self.phase != RoundPhase::AwaitingActions {
            return Err(EngineError::InvalidPhase(
                "actions can only be submitted between rounds".to_owned(),
            ));
        }
        let mut submitters = HashSet::new();
        for action in &actions {
            if !self.party.iter().any(|c| c.id == action.character_id) {
                return Err(EngineError::CharacterNotFound(action.character_id));
            }
            if !submitters.insert(action.character_id) {
                return Err(EngineError::Validation(format!(
                    "character {} submitted more than one action",
                    action.character_id
                )));
            }
        }
        // All-blank submissions fail here, before the scene cache can
        // trigger a generation on a miss.
        if actions.iter().all(SubmittedAction::is_blank) {
            return Err(EngineError::NoAction);
        }

        let context = self.assemble_context();
        let is_intro = self.history.is_empty();
        let (scene, from_cache) = self.scene_cache.get_or_generate(&context, is_intro).await?;

        let validated = self
            .validator
            .validate(
                &context,
                &actions,
                Some(&scene.description),
                self.last_summary.as_deref(),
            )
            .await?;

        let (valid, invalid): (Vec<_>, Vec<_>) =
            validated.into_iter().partition(|action| action.valid);
        let next_to_roll = valid.first().map(|action| action.character_id);

        if valid.is_empty() {
            tracing::info!("no action survived validation; round not started");
            return Ok(RoundPlan {
                scene,
                from_cache,
                valid_actions: valid,
                invalid_actions: invalid,
                next_to_roll: None,
            });
        }

        tracing::info!(
            queued = valid.len(),
            rejected = invalid.len(),
            "round opened"
        );
        self.round = Some(RoundState {
            context,
            scene: scene.clone(),
            queue: valid.iter().cloned().collect(),
            outcomes: Vec::new(),
        });
        self.phase = RoundPhase::Resolving;

        Ok(RoundPlan {
            scene,
            from_cache,
            valid_actions: valid,
            invalid_actions: invalid,
            next_to_roll,
        })
    }

    /// Commits one roll for the character at the head of the queue and
    /// runs its full pipeline: dice, narration, loot when the gate allows,
    /// then progression. The next character's roll is not accepted until
    /// everything here has been applied and persisted.
    ///
    /// # Errors
    ///
    /// `InvalidPhase` outside `Resolving` or for any character but the
    /// queue head, `Validation` for a raw roll off the d20, `Store` on
    /// persistence failure.
    pub async fn submit_roll(
        &mut self,
        character_id: Uuid,
        raw: u32,
    ) -> Result<RollResolution, EngineError> {
        if self.phase != RoundPhase::Resolving {
            return Err(EngineError::InvalidPhase(
                "no roll is being awaited".to_owned(),
            ));
        }
        if !(1..=20).contains(&raw) {
            return Err(EngineError::Validation(format!(
                "raw roll {raw} is not a d20 face"
            )));
        }
        let round = self
            .round
            .as_mut()
            .ok_or_else(|| EngineError::InvalidPhase("no round in progress".to_owned()))?;
        let head = round
            .queue
            .front()
            .ok_or_else(|| EngineError::InvalidPhase("resolution queue is empty".to_owned()))?;
        if head.character_id != character_id {
            return Err(EngineError::InvalidPhase(format!(
                "waiting on character {}, not {character_id}",
                head.character_id
            )));
        }

        // The roll is drawn; from here the step commits.
        let Some(action) = round.queue.pop_front() else {
            return Err(EngineError::InvalidPhase(
                "resolution queue is empty".to_owned(),
            ));
        };
        let actor = self
            .party
            .iter()
            .find(|c| c.id == character_id)
            .cloned()
            .ok_or(EngineError::CharacterNotFound(character_id))?;

        let modifier = actor.attributes.score(action.primary_attribute);
        let roll = dice::resolve(modifier, action.difficulty, raw);
        tracing::info!(
            character = %actor.name,
            raw,
            total = roll.total,
            difficulty = action.difficulty,
            tier = ?roll.tier,
            "roll resolved"
        );

        let narration = self
            .narrator
            .narrate(
                &round.context,
                &action,
                roll.tier,
                roll.total,
                &actor.name,
                Some(&round.scene.description),
            )
            .await;

        let mut changed: Vec<Uuid> = Vec::new();
        let mut granted_items = Vec::new();
        let mut granted_gold = 0;
        if action.affects_inventory && roll.tier.rewards() {
            let drop = self
                .loot
                .generate(
                    &round.context,
                    &action,
                    roll.tier,
                    self.rng.as_mut(),
                    Some(&round.scene.description),
                )
                .await;
            if let Some(target_id) =
                resolve_loot_target(&self.party, drop.target_hint, character_id)
            {
                for item in &drop.items {
                    let value = serde_json::to_value(item).map_err(|e| {
                        EngineError::Store(format!("equipment serialization failed: {e}"))
                    })?;
                    self.store
                        .put(EQUIPMENT, &item.id.to_string(), value)
                        .await?;
                    self.catalog.push(item.clone());
                }
                let target = self
                    .party
                    .iter()
                    .find(|c| c.id == target_id)
                    .cloned()
                    .ok_or(EngineError::CharacterNotFound(target_id))?;
                let (updated, granted) = apply_drop(&target, &drop);
                granted_items = granted;
                granted_gold = drop.gold;
                replace_member(&mut self.party, updated);
                changed.push(target_id);
            }
        }

        let actor_latest = self
            .party
            .iter()
            .find(|c| c.id == character_id)
            .cloned()
            .ok_or(EngineError::CharacterNotFound(character_id))?;
        let progressed = progression::grant_experience(&actor_latest, &action, roll.tier);
        let level_up = progressed.level_up;
        let gained_xp = progressed.gained;
        replace_member(&mut self.party, progressed.character);
        if !changed.contains(&character_id) {
            changed.push(character_id);
        }

        // Character writes stay on the critical path.
        for id in &changed {
            if let Some(member) = self.party.iter().find(|c| c.id == *id) {
                persist_character(self.store.as_ref(), member).await?;
            }
        }

        let outcome = ResolvedOutcome {
            character_id,
            natural_roll: raw,
            total: roll.total,
            difficulty: action.difficulty,
            tier: roll.tier,
            text: narration.text,
            items: granted_items,
            gold: granted_gold,
            xp: gained_xp,
            level_up,
        };
        round
            .outcomes
            .push((actor.name, action.description, outcome.clone()));

        let next_to_roll = round.queue.front().map(|a| a.character_id);
        if next_to_roll.is_none() {
            self.phase = RoundPhase::Closing;
        }

        let updated_characters = self
            .party
            .iter()
            .filter(|c| changed.contains(&c.id))
            .cloned()
            .collect();
        Ok(RollResolution {
            outcome,
            updated_characters,
            level_up,
            next_to_roll,
        })
    }

    /// Closes the round: writes one diary entry, clears the accumulator,
    /// and regenerates the scene with the round's outcomes as input. A new
    /// round cannot validate until this has completed.
    ///
    /// # Errors
    ///
    /// `InvalidPhase` outside `Closing`, `Store` on persistence failure.
    pub async fn close_round(&mut self) -> Result<ClosedRound, EngineError> {
        if self.phase != RoundPhase::Closing {
            return Err(EngineError::InvalidPhase(
                "the round still has rolls outstanding".to_owned(),
            ));
        }
        let round = self
            .round
            .take()
            .ok_or_else(|| EngineError::InvalidPhase("no round in progress".to_owned()))?;

        let entry = DiaryEntry::from_round(
            self.location.id,
            self.location.name.clone(),
            round.scene.title.clone(),
            round.scene.description.clone(),
            &round.outcomes,
            self.clock.now(),
        );
        let value = serde_json::to_value(&entry)
            .map_err(|e| EngineError::Store(format!("diary serialization failed: {e}")))?;
        // Diary durability is best-effort, off the critical path.
        self.write_queue
            .enqueue(DIARY, &entry.id.to_string(), value);

        let mut summary = String::new();
        let mut action_log = Vec::with_capacity(round.outcomes.len());
        for (name, description, outcome) in &round.outcomes {
            let _ = writeln!(summary, "{name}: {}", outcome.text);
            action_log.push(format!(
                "{name} tried \"{description}\" ({})",
                tier_name(outcome.tier)
            ));
        }

        let context = self.assemble_context();
        let next_scene = self
            .scene_cache
            .regenerate_with_outcomes(&context, &summary, action_log)
            .await?;

        tracing::info!(entry = %entry.id, "round closed");
        self.history.push(entry.clone());
        self.last_summary = Some(summary);
        self.phase = RoundPhase::AwaitingActions;

        Ok(ClosedRound {
            diary_entry: entry,
            next_scene,
        })
    }

    /// Moves the party to a new location, invalidating the old location's
    /// scene row.
    ///
    /// # Errors
    ///
    /// `InvalidPhase` while a round is in progress, `Store` on failure.
    pub async fn travel(&mut self, destination: LocationInfo) -> Result<(), EngineError> {
        if self.phase != RoundPhase::AwaitingActions {
            return Err(EngineError::InvalidPhase(
                "cannot travel mid-round".to_owned(),
            ));
        }
        self.scene_cache.invalidate(self.location.id).await?;
        tracing::info!(from = %self.location.name, to = %destination.name, "party traveled");
        self.location = destination;
        Ok(())
    }

    /// Equips a held item into the slot matching its kind.
    ///
    /// # Errors
    ///
    /// `InvalidPhase` mid-round, `CharacterNotFound`, `Validation` for an
    /// unknown, unheld, or unequippable item, `Store` on failure.
    pub async fn equip_item(
        &mut self,
        character_id: Uuid,
        equipment_id: Uuid,
    ) -> Result<Character, EngineError> {
        let equipment = self.catalog_item(equipment_id)?.clone();
        self.with_character(character_id, |c| c.equip(&equipment))
            .await
    }

    /// Clears one of a character's equipment slots.
    ///
    /// # Errors
    ///
    /// `InvalidPhase` mid-round, `CharacterNotFound`, `Store` on failure.
    pub async fn unequip_slot(
        &mut self,
        character_id: Uuid,
        slot: EquipSlot,
    ) -> Result<Character, EngineError> {
        self.with_character(character_id, |c| {
            c.unequip(slot);
            Ok(())
        })
        .await
    }

    /// Consumes one copy of a consumable item, applying its HP restore.
    ///
    /// # Errors
    ///
    /// `InvalidPhase` mid-round, `CharacterNotFound`, `Validation` for an
    /// unknown, unheld, or non-consumable item, `Store` on failure.
    pub async fn consume_item(
        &mut self,
        character_id: Uuid,
        equipment_id: Uuid,
    ) -> Result<Character, EngineError> {
        let equipment = self.catalog_item(equipment_id)?.clone();
        self.with_character(character_id, |c| c.consume(&equipment))
            .await
    }

    /// Sells one copy of a held item for its sell price.
    ///
    /// # Errors
    ///
    /// `InvalidPhase` mid-round, `CharacterNotFound`, `Validation` for an
    /// unknown or unheld item, `Store` on failure.
    pub async fn sell_item(
        &mut self,
        character_id: Uuid,
        equipment_id: Uuid,
    ) -> Result<Character, EngineError> {
        let equipment = self.catalog_item(equipment_id)?.clone();
        self.with_character(character_id, |c| c.sell_item(&equipment))
            .await
    }

    /// Drains the background write queue. Call once at shutdown.
    pub async fn shutdown(self) {
        self.write_queue.close_and_wait().await;
    }

    fn assemble_context(&self) -> NarrativeContext {
        let start = self.history.len().saturating_sub(HISTORY_WINDOW);
        NarrativeContext::assemble(
            self.world.clone(),
            self.location.clone(),
            &self.catalog,
            self.party.clone(),
            self.history[start..].to_vec(),
        )
    }

    fn catalog_item(&self, equipment_id: Uuid) -> Result<&Equipment, EngineError> {
        self.catalog
            .iter()
            .find(|e| e.id == equipment_id)
            .ok_or_else(|| EngineError::Validation(format!("unknown equipment {equipment_id}")))
    }

    /// Applies a mutation to one character between rounds, persisting the
    /// whole object on success.
    async fn with_character(
        &mut self,
        character_id: Uuid,
        mutate: impl FnOnce(&mut Character) -> Result<(), EngineError>,
    ) -> Result<Character, EngineError> {
        if self.phase != RoundPhase::AwaitingActions {
            return Err(EngineError::InvalidPhase(
                "characters can only be managed between rounds".to_owned(),
            ));
        }
        let mut updated = self
            .party
            .iter()
            .find(|c| c.id == character_id)
            .cloned()
            .ok_or(EngineError::CharacterNotFound(character_id))?;
        mutate(&mut updated)?;
        persist_character(self.store.as_ref(), &updated).await?;
        replace_member(&mut self.party, updated.clone());
        Ok(updated)
    }
}

fn replace_member(party: &mut [Character], updated: Character) {
    if let Some(slot) = party.iter_mut().find(|c| c.id == updated.id) {
        *slot = updated;
    }
}

async fn persist_character(
    store: &dyn ObjectStore,
    character: &Character,
) -> Result<(), EngineError> {
    let value = serde_json::to_value(character)
        .map_err(|e| EngineError::Store(format!("character serialization failed: {e}")))?;
    store
        .put(CHARACTERS, &character.id.to_string(), value)
        .await
}

fn tier_name(tier: OutcomeTier) -> &'static str {
    match tier {
        OutcomeTier::CriticalFail => "critical failure",
        OutcomeTier::Fail => "failure",
        OutcomeTier::Partial => "partial success",
        OutcomeTier::Success => "success",
        OutcomeTier::Critical => "critical success",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use emberfall_core::store::SCENES;
    use emberfall_store::MemoryStore;
    use emberfall_test_support::{
        FixedClock, MockRng, ScriptedCompletions, sample_location, sample_party, sample_world,
    };

    const SCENE_JSON: &str = r#"{"title": "The Mosswood Gate", "description": "Lichen crawls over the arch.", "mood": "quiet"}"#;
    const NEXT_SCENE_JSON: &str = r#"{"title": "After the Scuffle", "description": "Splinters litter the path.", "mood": "tense"}"#;

    fn queue_with(script: Vec<&str>) -> (TurnQueue, Arc<MemoryStore>, Arc<ScriptedCompletions>) {
        let store = Arc::new(MemoryStore::new());
        let completions = Arc::new(ScriptedCompletions::replying(script));
        let clock = Arc::new(FixedClock(
            Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap(),
        ));
        let queue = TurnQueue::new(
            store.clone(),
            completions.clone(),
            clock,
            Box::new(MockRng),
            sample_world(),
            sample_location(),
            Vec::new(),
            sample_party(),
        );
        (queue, store, completions)
    }

    fn submitted(character_id: Uuid, text: &str) -> SubmittedAction {
        SubmittedAction {
            character_id,
            text: text.to_owned(),
            skip: false,
            target_category: None,
        }
    }

    #[tokio::test]
    async fn test_full_round_flow() {
        let validation = r#"[
            {"valid": true, "difficulty": 10, "primary_attribute": "perception"},
            {"valid": true, "difficulty": 14, "primary_attribute": "strength"}
        ]"#;
        let narration_1 = r#"{"text": "Wren picks out a safe path.", "consequence": "The way forward is clear."}"#;
        let narration_2 = r#"{"text": "The gate does not budge.", "consequence": "The gate holds."}"#;
        let (mut queue, store, _completions) = queue_with(vec![
            SCENE_JSON,
            validation,
            narration_1,
            narration_2,
            NEXT_SCENE_JSON,
        ]);
        let wren = queue.party()[0].id;
        let bram = queue.party()[1].id;

        let plan = queue
            .submit_actions(vec![
                submitted(wren, "scout the arch"),
                submitted(bram, "force the gate"),
            ])
            .await
            .unwrap();
        assert_eq!(plan.valid_actions.len(), 2);
        assert_eq!(plan.next_to_roll, Some(wren));
        assert_eq!(queue.phase(), RoundPhase::Resolving);

        // Wren: perception 3, raw 12 against difficulty 10 -> success.
        let first = queue.submit_roll(wren, 12).await.unwrap();
        assert_eq!(first.outcome.tier, OutcomeTier::Success);
        assert_eq!(first.outcome.total, 15);
        assert_eq!(first.outcome.xp, 10);
        assert_eq!(first.next_to_roll, Some(bram));

        // Bram: strength 3, raw 5 against difficulty 14 -> failure, no XP.
        let second = queue.submit_roll(bram, 5).await.unwrap();
        assert_eq!(second.outcome.tier, OutcomeTier::Fail);
        assert_eq!(second.outcome.xp, 0);
        assert!(second.next_to_roll.is_none());
        assert_eq!(queue.phase(), RoundPhase::Closing);

        let closed = queue.close_round().await.unwrap();
        assert_eq!(closed.diary_entry.actions.len(), 2);
        assert_eq!(closed.next_scene.title, "After the Scuffle");
        assert_eq!(queue.phase(), RoundPhase::AwaitingActions);
        assert_eq!(queue.session_history().len(), 1);

        queue.shutdown().await;
        assert_eq!(store.list_all(DIARY).await.unwrap().len(), 1);
        assert_eq!(store.list_all(CHARACTERS).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_loot_stage_skipped_when_action_does_not_affect_inventory() {
        // Critical outcome, but affects_inventory is false: exactly three
        // calls happen (scene, validation, narration), none for loot.
        let validation = r#"[{"valid": true, "difficulty": 10, "primary_attribute": "perception", "affects_inventory": false}]"#;
        let narration = r#"{"text": "A flawless climb.", "consequence": "Wren reaches the top."}"#;
        let (mut queue, _store, completions) =
            queue_with(vec![SCENE_JSON, validation, narration]);
        let wren = queue.party()[0].id;

        queue
            .submit_actions(vec![submitted(wren, "scale the arch")])
            .await
            .unwrap();
        let resolution = queue.submit_roll(wren, 20).await.unwrap();

        assert_eq!(resolution.outcome.tier, OutcomeTier::Critical);
        assert!(resolution.outcome.items.is_empty());
        assert_eq!(resolution.outcome.gold, 0);
        assert_eq!(completions.request_count(), 3);
    }

    #[tokio::test]
    async fn test_loot_applies_to_actor_and_persists_definition() {
        let validation = r#"[{"valid": true, "difficulty": 10, "primary_attribute": "agility", "affects_inventory": true}]"#;
        let narration = r#"{"text": "The lockbox opens.", "consequence": "Its contents are Wren's."}"#;
        let loot = r#"{
            "gold": 7,
            "items": [{
                "name": "Riverstone Charm",
                "kind": "accessory",
                "rarity": "comum",
                "sell_price": 14,
                "hp_restore": 0,
                "difficulty_reduction": 1,
                "consumable": false,
                "equippable": true,
                "stackable": false
            }]
        }"#;
        let (mut queue, store, _completions) =
            queue_with(vec![SCENE_JSON, validation, narration, loot]);
        let wren = queue.party()[0].id;

        queue
            .submit_actions(vec![submitted(wren, "pick the lockbox")])
            .await
            .unwrap();
        // Agility 2, raw 10 -> total 12 against difficulty 10: success.
        let resolution = queue.submit_roll(wren, 10).await.unwrap();

        assert_eq!(resolution.outcome.items.len(), 1);
        assert_eq!(resolution.outcome.gold, 7);
        assert_eq!(resolution.outcome.xp, 10);
        let updated = &resolution.updated_characters[0];
        assert_eq!(updated.id, wren);
        assert_eq!(updated.inventory.len(), 1);
        assert_eq!(updated.gold, 7);
        assert_eq!(store.list_all(EQUIPMENT).await.unwrap().len(), 1);
        assert_eq!(queue.catalog().len(), 1);
    }

    #[tokio::test]
    async fn test_second_roll_rejected_until_first_commits() {
        let validation = r#"[
            {"valid": true, "difficulty": 10, "primary_attribute": "perception"},
            {"valid": true, "difficulty": 10, "primary_attribute": "strength"}
        ]"#;
        let narration = r#"{"text": "Done.", "consequence": "Done."}"#;
        let (mut queue, _store, _completions) =
            queue_with(vec![SCENE_JSON, validation, narration, narration]);
        let wren = queue.party()[0].id;
        let bram = queue.party()[1].id;

        queue
            .submit_actions(vec![
                submitted(wren, "scout ahead"),
                submitted(bram, "push the cart"),
            ])
            .await
            .unwrap();

        let err = queue.submit_roll(bram, 10).await.unwrap_err();
        assert!(matches!(err, EngineError::InvalidPhase(_)));

        queue.submit_roll(wren, 10).await.unwrap();
        queue.submit_roll(bram, 10).await.unwrap();
        assert_eq!(queue.phase(), RoundPhase::Closing);
    }

    #[tokio::test]
    async fn test_no_mutation_before_a_roll_is_drawn() {
        let validation =
            r#"[{"valid": true, "difficulty": 10, "primary_attribute": "perception"}]"#;
        let (mut queue, store, _completions) = queue_with(vec![SCENE_JSON, validation]);
        let wren = queue.party()[0].id;

        queue
            .submit_actions(vec![submitted(wren, "scout ahead")])
            .await
            .unwrap();

        // Abandoning the pending step here leaves no trace.
        assert!(store.list_all(CHARACTERS).await.unwrap().is_empty());
        assert_eq!(queue.party()[0].xp, 0);
    }

    #[tokio::test]
    async fn test_phase_misuse_is_rejected() {
        let validation =
            r#"[{"valid": true, "difficulty": 10, "primary_attribute": "perception"}]"#;
        let (mut queue, _store, _completions) = queue_with(vec![SCENE_JSON, validation]);
        let wren = queue.party()[0].id;

        let err = queue.submit_roll(wren, 10).await.unwrap_err();
        assert!(matches!(err, EngineError::InvalidPhase(_)));
        let err = queue.close_round().await.unwrap_err();
        assert!(matches!(err, EngineError::InvalidPhase(_)));

        queue
            .submit_actions(vec![submitted(wren, "scout ahead")])
            .await
            .unwrap();
        let err = queue
            .submit_actions(vec![submitted(wren, "scout again")])
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidPhase(_)));
    }

    #[tokio::test]
    async fn test_duplicate_submitter_is_rejected() {
        let (mut queue, _store, completions) = queue_with(Vec::new());
        let wren = queue.party()[0].id;

        let err = queue
            .submit_actions(vec![
                submitted(wren, "scout ahead"),
                submitted(wren, "scout again"),
            ])
            .await
            .unwrap_err();

        assert!(matches!(err, EngineError::Validation(_)));
        assert_eq!(completions.request_count(), 0);
        assert_eq!(queue.phase(), RoundPhase::AwaitingActions);
    }

    #[tokio::test]
    async fn test_no_action_surfaces_without_contacting_the_model() {
        // Empty script: any completion request would panic, and the
        // count pins down that none was made.
        let (mut queue, _store, completions) = queue_with(Vec::new());
        let wren = queue.party()[0].id;
        let bram = queue.party()[1].id;

        let err = queue
            .submit_actions(vec![
                SubmittedAction {
                    character_id: wren,
                    text: String::new(),
                    skip: true,
                    target_category: None,
                },
                SubmittedAction {
                    character_id: bram,
                    text: "   ".to_owned(),
                    skip: false,
                    target_category: None,
                },
            ])
            .await
            .unwrap_err();

        assert!(matches!(err, EngineError::NoAction));
        assert_eq!(completions.request_count(), 0);
        assert_eq!(queue.phase(), RoundPhase::AwaitingActions);
    }

    #[tokio::test]
    async fn test_all_invalid_actions_do_not_start_round() {
        let validation = r#"[{"valid": false, "reason": "there is no river here"}]"#;
        let (mut queue, _store, _completions) = queue_with(vec![SCENE_JSON, validation]);
        let wren = queue.party()[0].id;

        let plan = queue
            .submit_actions(vec![submitted(wren, "swim the river")])
            .await
            .unwrap();

        assert!(plan.valid_actions.is_empty());
        assert_eq!(plan.invalid_actions.len(), 1);
        assert!(plan.next_to_roll.is_none());
        assert_eq!(queue.phase(), RoundPhase::AwaitingActions);
    }

    #[tokio::test]
    async fn test_equip_between_rounds_and_rejected_mid_round() {
        let loot = Equipment {
            id: Uuid::new_v4(),
            name: "Ash Spear".to_owned(),
            kind: "weapon".to_owned(),
            rarity: emberfall_domain::equipment::Rarity::Common,
            bonus: std::collections::BTreeMap::new(),
            difficulty_reduction: 0,
            hp_restore: 0,
            sell_price: 5,
            consumable: false,
            equippable: true,
            stackable: false,
        };
        let validation =
            r#"[{"valid": true, "difficulty": 10, "primary_attribute": "strength"}]"#;
        let store = Arc::new(MemoryStore::new());
        let completions = Arc::new(ScriptedCompletions::replying(vec![SCENE_JSON, validation]));
        let clock = Arc::new(FixedClock(
            Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap(),
        ));
        let mut party = sample_party();
        party[1].grant_item(&loot, 1);
        let mut queue = TurnQueue::new(
            store.clone(),
            completions,
            clock,
            Box::new(MockRng),
            sample_world(),
            sample_location(),
            vec![loot.clone()],
            party,
        );
        let bram = queue.party()[1].id;

        let updated = queue.equip_item(bram, loot.id).await.unwrap();
        assert_eq!(updated.equipped.weapon, Some(loot.id));
        assert!(store.get(CHARACTERS, &bram.to_string()).await.unwrap().is_some());

        queue
            .submit_actions(vec![submitted(bram, "swing the spear")])
            .await
            .unwrap();
        let err = queue.unequip_slot(bram, EquipSlot::Weapon).await.unwrap_err();
        assert!(matches!(err, EngineError::InvalidPhase(_)));
    }

    #[tokio::test]
    async fn test_travel_invalidates_scene_row() {
        let validation =
            r#"[{"valid": true, "difficulty": 10, "primary_attribute": "perception"}]"#;
        let narration = r#"{"text": "Done.", "consequence": "Done."}"#;
        let (mut queue, store, _completions) = queue_with(vec![
            SCENE_JSON,
            validation,
            narration,
            NEXT_SCENE_JSON,
        ]);
        let wren = queue.party()[0].id;
        let origin = queue.location().id;

        queue
            .submit_actions(vec![submitted(wren, "scout ahead")])
            .await
            .unwrap();
        queue.submit_roll(wren, 10).await.unwrap();
        queue.close_round().await.unwrap();

        let key = emberfall_domain::scene::SceneCacheRow::key(origin);
        assert!(store.get(SCENES, &key).await.unwrap().is_some());

        let destination = LocationInfo {
            id: Uuid::new_v4(),
            name: "The Sunken Crypt".to_owned(),
            description: "Stairs descend into standing water.".to_owned(),
            loot_table: Vec::new(),
        };
        queue.travel(destination.clone()).await.unwrap();

        assert!(store.get(SCENES, &key).await.unwrap().is_none());
        assert_eq!(queue.location().id, destination.id);
    }
}
