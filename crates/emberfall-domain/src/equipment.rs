//! Equipment definitions and rarity tiers.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Rarity tier of a piece of equipment.
///
/// The wire names are the ones carried by persisted objects and AI payloads;
/// ordering follows declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Rarity {
    /// The baseline tier.
    #[serde(rename = "comum")]
    Common,
    /// One step above baseline.
    #[serde(rename = "incomum")]
    Uncommon,
    /// Mid tier.
    #[serde(rename = "raro")]
    Rare,
    /// High tier.
    #[serde(rename = "epico")]
    Epic,
    /// Top tier.
    #[serde(rename = "lendario")]
    Legendary,
}

impl Rarity {
    /// Returns the next tier up, saturating at `Legendary`.
    #[must_use]
    pub fn raised(self) -> Self {
        match self {
            Self::Common => Self::Uncommon,
            Self::Uncommon => Self::Rare,
            Self::Rare => Self::Epic,
            Self::Epic | Self::Legendary => Self::Legendary,
        }
    }

    /// Returns the next tier down, or `None` below `Common`. A `None` here
    /// means a partial success yields no item at all.
    #[must_use]
    pub fn lowered(self) -> Option<Self> {
        match self {
            Self::Common => None,
            Self::Uncommon => Some(Self::Common),
            Self::Rare => Some(Self::Uncommon),
            Self::Epic => Some(Self::Rare),
            Self::Legendary => Some(Self::Epic),
        }
    }

    /// Parses a loose rarity string, defaulting to `Common` when the value
    /// is absent or unrecognized.
    #[must_use]
    pub fn from_loose(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some("incomum") => Self::Uncommon,
            Some("raro") => Self::Rare,
            Some("epico") => Self::Epic,
            Some("lendario") => Self::Legendary,
            _ => Self::Common,
        }
    }
}

/// A piece of equipment. Immutable once created and shared by id from any
/// number of inventories.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Equipment {
    /// Unique identifier.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Equipment kind (`weapon`, `armor`, `accessory`, `relic`,
    /// `consumable`, ...). Free-form, but the four slot kinds are special.
    pub kind: String,
    /// Rarity tier.
    pub rarity: Rarity,
    /// Attribute bonuses granted while equipped, keyed by attribute name.
    #[serde(default)]
    pub bonus: BTreeMap<String, i32>,
    /// Flat reduction applied to action difficulty while equipped.
    #[serde(default)]
    pub difficulty_reduction: u8,
    /// HP restored when consumed.
    #[serde(default)]
    pub hp_restore: u32,
    /// Gold received when sold.
    #[serde(default)]
    pub sell_price: u32,
    /// Whether the item is destroyed on use.
    #[serde(default)]
    pub consumable: bool,
    /// Whether the item can occupy an equipment slot.
    #[serde(default)]
    pub equippable: bool,
    /// Whether copies collapse into one inventory slot.
    #[serde(default)]
    pub stackable: bool,
}

/// A loot descriptor attached to a location, used when AI loot generation
/// fails and the stage falls back to seed data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LootDescriptor {
    /// Display name of the item this descriptor instantiates.
    pub name: String,
    /// Equipment kind.
    pub kind: String,
    /// Sell price of the instantiated item.
    #[serde(default)]
    pub sell_price: u32,
    /// Whether the instantiated item is consumable.
    #[serde(default)]
    pub consumable: bool,
    /// Whether the instantiated item is equippable.
    #[serde(default)]
    pub equippable: bool,
    /// Whether the instantiated item is stackable.
    #[serde(default)]
    pub stackable: bool,
}

impl LootDescriptor {
    /// Instantiates the descriptor as a concrete `Equipment` at the given
    /// rarity.
    #[must_use]
    pub fn instantiate(&self, rarity: Rarity) -> Equipment {
        Equipment {
            id: Uuid::new_v4(),
            name: self.name.clone(),
            kind: self.kind.clone(),
            rarity,
            bonus: BTreeMap::new(),
            difficulty_reduction: 0,
            hp_restore: if self.consumable { 10 } else { 0 },
            sell_price: self.sell_price,
            consumable: self.consumable,
            equippable: self.equippable,
            stackable: self.stackable,
        }
    }
}
