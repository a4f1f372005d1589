//! Seed content loading.

use std::collections::BTreeMap;

use emberfall_core::error::EngineError;
use emberfall_domain::context::LocationInfo;
use emberfall_domain::equipment::{Equipment, LootDescriptor, Rarity};
use serde::Deserialize;
use uuid::Uuid;

/// The bundled default seed file.
const DEFAULT_SEEDS: &str = include_str!("../assets/seeds.yaml");

/// One equipment definition as authored in YAML. Ids are assigned at load
/// time so seed files stay free of UUIDs.
#[derive(Debug, Clone, Deserialize)]
struct EquipmentSeed {
    name: String,
    kind: String,
    rarity: Rarity,
    #[serde(default)]
    bonus: BTreeMap<String, i32>,
    #[serde(default)]
    difficulty_reduction: u8,
    #[serde(default)]
    hp_restore: u32,
    #[serde(default)]
    sell_price: u32,
    #[serde(default)]
    consumable: bool,
    #[serde(default)]
    equippable: bool,
    #[serde(default)]
    stackable: bool,
}

impl EquipmentSeed {
    fn into_equipment(self) -> Equipment {
        Equipment {
            id: Uuid::new_v4(),
            name: self.name,
            kind: self.kind,
            rarity: self.rarity,
            bonus: self.bonus,
            difficulty_reduction: self.difficulty_reduction,
            hp_restore: self.hp_restore,
            sell_price: self.sell_price,
            consumable: self.consumable,
            equippable: self.equippable,
            stackable: self.stackable,
        }
    }
}

/// One location as authored in YAML.
#[derive(Debug, Clone, Deserialize)]
struct LocationSeed {
    name: String,
    description: String,
    #[serde(default)]
    loot_table: Vec<LootDescriptor>,
}

impl LocationSeed {
    fn into_location(self) -> LocationInfo {
        LocationInfo {
            id: Uuid::new_v4(),
            name: self.name,
            description: self.description,
            loot_table: self.loot_table,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SeedFile {
    #[serde(default)]
    equipment: Vec<EquipmentSeed>,
    #[serde(default)]
    locations: Vec<LocationSeed>,
}

/// Loaded seed content with ids assigned.
#[derive(Debug, Clone)]
pub struct SeedContent {
    /// The equipment catalog.
    pub equipment: Vec<Equipment>,
    /// Starting locations with their loot descriptors.
    pub locations: Vec<LocationInfo>,
}

/// Parses seed content from YAML.
///
/// # Errors
///
/// Returns `EngineError::Validation` when the YAML is malformed.
pub fn load_seed_content(yaml: &str) -> Result<SeedContent, EngineError> {
    let file: SeedFile = serde_yaml::from_str(yaml)
        .map_err(|e| EngineError::Validation(format!("malformed seed content: {e}")))?;
    Ok(SeedContent {
        equipment: file
            .equipment
            .into_iter()
            .map(EquipmentSeed::into_equipment)
            .collect(),
        locations: file
            .locations
            .into_iter()
            .map(LocationSeed::into_location)
            .collect(),
    })
}

impl SeedContent {
    /// Loads the bundled default seed file.
    ///
    /// # Panics
    ///
    /// Panics if the bundled file is malformed, which is a build defect.
    #[must_use]
    pub fn bundled() -> Self {
        load_seed_content(DEFAULT_SEEDS).expect("bundled seeds.yaml must parse")
    }
}
