//! Party characters: attributes, inventory, equipment slots, gold, and XP.

use emberfall_core::error::EngineError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::equipment::Equipment;

/// The six attributes an action can test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionAttribute {
    /// Raw physical power.
    Strength,
    /// Speed, reflexes, and precision.
    Agility,
    /// Reasoning and lore.
    Intellect,
    /// Social force.
    Charisma,
    /// Noticing what others miss.
    Perception,
    /// Grit and resistance to pressure.
    Willpower,
}

impl ActionAttribute {
    /// Parses a loose attribute string. Unrecognized values default to
    /// `Perception`.
    #[must_use]
    pub fn from_loose(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some("strength") => Self::Strength,
            Some("agility") => Self::Agility,
            Some("intellect") => Self::Intellect,
            Some("charisma") => Self::Charisma,
            Some("willpower") => Self::Willpower,
            _ => Self::Perception,
        }
    }
}

/// Scores for the six action attributes. The score doubles as the dice
/// modifier for checks against that attribute.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ActionAttributes {
    pub strength: i32,
    pub agility: i32,
    pub intellect: i32,
    pub charisma: i32,
    pub perception: i32,
    pub willpower: i32,
}

impl ActionAttributes {
    /// Returns the score for the given attribute.
    #[must_use]
    pub fn score(&self, attribute: ActionAttribute) -> i32 {
        match attribute {
            ActionAttribute::Strength => self.strength,
            ActionAttribute::Agility => self.agility,
            ActionAttribute::Intellect => self.intellect,
            ActionAttribute::Charisma => self.charisma,
            ActionAttribute::Perception => self.perception,
            ActionAttribute::Willpower => self.willpower,
        }
    }
}

/// Scores for the four battle attributes.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct BattleAttributes {
    pub attack: i32,
    pub defense: i32,
    pub speed: i32,
    pub resistance: i32,
}

/// The four fixed equipment slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EquipSlot {
    Weapon,
    Armor,
    Accessory,
    Relic,
}

impl EquipSlot {
    /// Maps an equipment kind to the slot it occupies, if any.
    #[must_use]
    pub fn for_kind(kind: &str) -> Option<Self> {
        match kind {
            "weapon" => Some(Self::Weapon),
            "armor" => Some(Self::Armor),
            "accessory" => Some(Self::Accessory),
            "relic" => Some(Self::Relic),
            _ => None,
        }
    }
}

/// The character's four equipment slots, each holding an equipment id.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct EquippedItems {
    pub weapon: Option<Uuid>,
    pub armor: Option<Uuid>,
    pub accessory: Option<Uuid>,
    pub relic: Option<Uuid>,
}

impl EquippedItems {
    fn slot_mut(&mut self, slot: EquipSlot) -> &mut Option<Uuid> {
        match slot {
            EquipSlot::Weapon => &mut self.weapon,
            EquipSlot::Armor => &mut self.armor,
            EquipSlot::Accessory => &mut self.accessory,
            EquipSlot::Relic => &mut self.relic,
        }
    }

    /// Returns the equipment id occupying `slot`, if any.
    #[must_use]
    pub fn slot(&self, slot: EquipSlot) -> Option<Uuid> {
        match slot {
            EquipSlot::Weapon => self.weapon,
            EquipSlot::Armor => self.armor,
            EquipSlot::Accessory => self.accessory,
            EquipSlot::Relic => self.relic,
        }
    }
}

/// One ordered inventory slot. `quantity` is always at least 1; slots that
/// would reach zero are removed instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryItem {
    /// Unique slot identifier.
    pub id: Uuid,
    /// The equipment definition this slot holds.
    pub equipment_id: Uuid,
    /// Number of copies held.
    pub quantity: u32,
}

/// A party character. Owned exclusively by the party; mutated only by the
/// loot/progression stages or explicit equip/unequip/consume commands, and
/// persisted by full-object overwrite.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Character {
    /// Unique identifier.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// The six action attributes.
    pub attributes: ActionAttributes,
    /// The four battle attributes.
    pub battle: BattleAttributes,
    /// Current hit points.
    pub hp: u32,
    /// Experience toward the next level. Invariant: `xp < level * 100`.
    pub xp: u32,
    /// Current level, starting at 1.
    pub level: u32,
    /// Gold on hand, never negative.
    pub gold: u32,
    /// Ordered inventory.
    #[serde(default)]
    pub inventory: Vec<InventoryItem>,
    /// The four fixed equipment slots.
    #[serde(default)]
    pub equipped: EquippedItems,
}

impl Character {
    /// Creates a level-1 character with empty inventory.
    #[must_use]
    pub fn new(name: impl Into<String>, attributes: ActionAttributes) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            attributes,
            battle: BattleAttributes::default(),
            hp: 20,
            xp: 0,
            level: 1,
            gold: 0,
            inventory: Vec::new(),
            equipped: EquippedItems::default(),
        }
    }

    /// Returns the held quantity for an equipment id, summed across slots.
    #[must_use]
    pub fn held_quantity(&self, equipment_id: Uuid) -> u32 {
        self.inventory
            .iter()
            .filter(|item| item.equipment_id == equipment_id)
            .map(|item| item.quantity)
            .sum()
    }

    /// Adds `quantity` copies of `equipment` to the inventory. Stackable
    /// items increment an existing slot; everything else appends.
    pub fn grant_item(&mut self, equipment: &Equipment, quantity: u32) {
        if quantity == 0 {
            return;
        }
        if equipment.stackable {
            if let Some(slot) = self
                .inventory
                .iter_mut()
                .find(|item| item.equipment_id == equipment.id)
            {
                slot.quantity += quantity;
                return;
            }
        }
        self.inventory.push(InventoryItem {
            id: Uuid::new_v4(),
            equipment_id: equipment.id,
            quantity,
        });
    }

    /// Removes `quantity` copies of an equipment id. Slots that reach zero
    /// are dropped from the inventory.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Validation` if fewer than `quantity` copies are
    /// held.
    pub fn remove_item(&mut self, equipment_id: Uuid, quantity: u32) -> Result<(), EngineError> {
        if self.held_quantity(equipment_id) < quantity {
            return Err(EngineError::Validation(format!(
                "character {} does not hold {quantity} of equipment {equipment_id}",
                self.id
            )));
        }
        let mut remaining = quantity;
        for item in &mut self.inventory {
            if item.equipment_id != equipment_id || remaining == 0 {
                continue;
            }
            let taken = item.quantity.min(remaining);
            item.quantity -= taken;
            remaining -= taken;
        }
        self.inventory.retain(|item| item.quantity >= 1);
        Ok(())
    }

    /// Applies a gold delta, clamping the balance at zero.
    pub fn grant_gold(&mut self, delta: i64) {
        let balance = i64::from(self.gold) + delta;
        self.gold = u32::try_from(balance.max(0)).unwrap_or(u32::MAX);
    }

    /// Sells one copy of an item for its sell price.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Validation` if the item is not held.
    pub fn sell_item(&mut self, equipment: &Equipment) -> Result<(), EngineError> {
        self.remove_item(equipment.id, 1)?;
        self.grant_gold(i64::from(equipment.sell_price));
        Ok(())
    }

    /// Equips an item into the slot matching its kind, replacing any
    /// current occupant.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Validation` if the item is not held, is not
    /// equippable, or its kind maps to no slot.
    pub fn equip(&mut self, equipment: &Equipment) -> Result<(), EngineError> {
        if self.held_quantity(equipment.id) == 0 {
            return Err(EngineError::Validation(format!(
                "character {} does not hold equipment {}",
                self.id, equipment.id
            )));
        }
        if !equipment.equippable {
            return Err(EngineError::Validation(format!(
                "equipment {} is not equippable",
                equipment.id
            )));
        }
        let slot = EquipSlot::for_kind(&equipment.kind).ok_or_else(|| {
            EngineError::Validation(format!("equipment kind {:?} has no slot", equipment.kind))
        })?;
        *self.equipped.slot_mut(slot) = Some(equipment.id);
        Ok(())
    }

    /// Clears an equipment slot. Clearing an empty slot is a no-op.
    pub fn unequip(&mut self, slot: EquipSlot) {
        *self.equipped.slot_mut(slot) = None;
    }

    /// Consumes one copy of a consumable item, restoring HP and removing
    /// the copy from the inventory.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Validation` if the item is not held or not
    /// consumable.
    pub fn consume(&mut self, equipment: &Equipment) -> Result<(), EngineError> {
        if !equipment.consumable {
            return Err(EngineError::Validation(format!(
                "equipment {} is not consumable",
                equipment.id
            )));
        }
        self.remove_item(equipment.id, 1)?;
        self.hp = self.hp.saturating_add(equipment.hp_restore);
        Ok(())
    }
}
