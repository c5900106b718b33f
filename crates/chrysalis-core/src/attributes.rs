// crates/chrysalis-core/src/attributes.rs
//
// Deterministic trait values for each evolution stage.

use crate::lookup::StageTable;
use crate::stage::Attribute;

pub const TRAIT_EVOLUTION_STAGE: &str = "Evolution Stage";
pub const TRAIT_EVOLUTION_PATH: &str = "Evolution Path";
pub const TRAIT_POWER_LEVEL: &str = "Power Level";
pub const TRAIT_AURA: &str = "Aura";
pub const TRAIT_SPECIAL_ABILITY: &str = "Special Ability";
pub const TRAIT_INTERACTIONS: &str = "Interactions";

/// Evolution path names, one per stage.
pub const EVOLUTION_PATHS: StageTable<5> =
    StageTable::new(["Nascent", "Emergent", "Ascendant", "Transcendent", "Legendary"]);

/// Aura colours, first shown at stage 2.
pub const AURAS: StageTable<5> = StageTable::new([
    "Faint Blue",
    "Glowing Green",
    "Radiant Gold",
    "Cosmic Purple",
    "Divine White",
]);

/// Special abilities, first shown at stage 3.
pub const SPECIAL_ABILITIES: StageTable<5> = StageTable::new([
    "Chain Vision",
    "Transaction Boost",
    "Block Perception",
    "Gas Optimization",
    "Consensus Alignment",
]);

/// Power level grows linearly with the stage.
pub const POWER_PER_STAGE: u32 = 20;

/// Attributes carried by the unmodified genesis stage.
pub fn genesis_attributes() -> Vec<Attribute> {
    vec![
        Attribute::new(TRAIT_EVOLUTION_STAGE, "0"),
        Attribute::new(TRAIT_INTERACTIONS, "0"),
    ]
}

/// Attributes for an evolved stage (`stage >= 1`).
///
/// Always carries stage, path and power level. `Aura` joins at stage 2 and
/// `Special Ability` at stage 3.
pub fn derive_attributes(stage: u32) -> Vec<Attribute> {
    let mut attributes = vec![
        Attribute::new(TRAIT_EVOLUTION_STAGE, stage.to_string()),
        Attribute::new(TRAIT_EVOLUTION_PATH, EVOLUTION_PATHS.get(stage)),
        Attribute::new(
            TRAIT_POWER_LEVEL,
            u64::from(stage).saturating_mul(u64::from(POWER_PER_STAGE)).to_string(),
        ),
    ];

    if stage >= 2 {
        attributes.push(Attribute::new(TRAIT_AURA, AURAS.get(stage)));
    }

    if stage >= 3 {
        attributes.push(Attribute::new(
            TRAIT_SPECIAL_ABILITY,
            SPECIAL_ABILITIES.get(stage),
        ));
    }

    attributes
}
