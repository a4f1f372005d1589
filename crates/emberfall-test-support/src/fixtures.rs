//! Party and world fixtures shared across stage tests.

use emberfall_domain::character::{ActionAttributes, Character};
use emberfall_domain::context::{LocationInfo, NarrativeContext, WorldInfo};
use emberfall_domain::equipment::LootDescriptor;
use uuid::Uuid;

/// A two-member party: Wren (sharp-eyed scout) and Bram (strong-armed
/// veteran).
#[must_use]
pub fn sample_party() -> Vec<Character> {
    let wren = Character::new(
        "Wren",
        ActionAttributes {
            agility: 2,
            perception: 3,
            ..ActionAttributes::default()
        },
    );
    let bram = Character::new(
        "Bram",
        ActionAttributes {
            strength: 3,
            willpower: 1,
            ..ActionAttributes::default()
        },
    );
    vec![wren, bram]
}

/// A world framing fixture.
#[must_use]
pub fn sample_world() -> WorldInfo {
    WorldInfo {
        name: "The Emberfall Marches".to_owned(),
        description: "Borderlands where old roads outlive the kingdoms that built them.".to_owned(),
    }
}

/// A location with a populated loot table, as the fallback path requires.
#[must_use]
pub fn sample_location() -> LocationInfo {
    LocationInfo {
        id: Uuid::new_v4(),
        name: "Mosswood Gate".to_owned(),
        description: "A lichen-covered arch at the forest edge.".to_owned(),
        loot_table: vec![
            LootDescriptor {
                name: "Forager's Pouch".to_owned(),
                kind: "tool".to_owned(),
                sell_price: 4,
                consumable: false,
                equippable: false,
                stackable: true,
            },
            LootDescriptor {
                name: "Bent Hunting Knife".to_owned(),
                kind: "weapon".to_owned(),
                sell_price: 6,
                consumable: false,
                equippable: true,
                stackable: false,
            },
        ],
    }
}

/// A full context over the sample world, location, and party.
#[must_use]
pub fn sample_context() -> NarrativeContext {
    NarrativeContext::assemble(
        sample_world(),
        sample_location(),
        &[],
        sample_party(),
        Vec::new(),
    )
}
