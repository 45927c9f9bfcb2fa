//! Load a content catalog from a TOML file
//!
//! The file format mirrors the definition tables, with costs and
//! thresholds written as TOML tables (`base_cost = { wood = 10.0 }`).
//! Loaded catalogs pass through the same `finalize()` validation as the
//! built-in one, so a file with dangling references is rejected up front.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::core::error::Result;
use crate::core::types::{BuildingCategory, EraIndex, Tick};

use super::effect::Effect;
use super::{
    BuildingDef, Catalog, ChainDef, EraDef, EventDef, ExpeditionDef, MilestoneDef,
    PrestigeUpgradeDef, ResourceDef, TechDef, WorkforceDef,
};

/// Load and validate a catalog from a TOML file
pub fn load_catalog(path: &Path) -> Result<Catalog> {
    let content = fs::read_to_string(path)?;
    parse_catalog(&content)
}

/// Parse and validate a catalog from TOML text
pub fn parse_catalog(content: &str) -> Result<Catalog> {
    let raw: RawCatalog = toml::from_str(content)?;
    raw.into_catalog()
}

#[derive(Debug, Deserialize)]
struct RawCatalog {
    min_prestige_era: EraIndex,
    soldier_key: String,
    #[serde(default)]
    eras: Vec<RawEra>,
    #[serde(default)]
    resources: Vec<ResourceDef>,
    #[serde(default)]
    buildings: Vec<RawBuilding>,
    #[serde(default)]
    workforce: Vec<WorkforceDef>,
    #[serde(default)]
    technologies: Vec<TechDef>,
    #[serde(default)]
    events: Vec<RawEvent>,
    #[serde(default)]
    expeditions: Vec<RawExpedition>,
    #[serde(default)]
    milestones: Vec<MilestoneDef>,
    #[serde(default)]
    chains: Vec<ChainDef>,
    #[serde(default)]
    prestige_upgrades: Vec<PrestigeUpgradeDef>,
}

#[derive(Debug, Deserialize)]
struct RawEra {
    key: String,
    name: String,
    #[serde(default)]
    resource_thresholds: BTreeMap<String, f64>,
    #[serde(default)]
    building_thresholds: BTreeMap<String, u32>,
    #[serde(default)]
    unlocks_buildings: Vec<String>,
    #[serde(default)]
    unlocks_resources: Vec<String>,
    #[serde(default)]
    unlocks_workforce: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RawBuilding {
    key: String,
    name: String,
    category: BuildingCategory,
    base_cost: BTreeMap<String, f64>,
    cost_growth: f64,
    #[serde(default)]
    effects: Vec<Effect>,
    #[serde(default)]
    max_count: Option<u32>,
    #[serde(default)]
    build_ticks: u32,
}

#[derive(Debug, Deserialize)]
struct RawEvent {
    key: String,
    name: String,
    weight: f64,
    #[serde(default)]
    min_era: EraIndex,
    #[serde(default)]
    min_tick: Tick,
    cooldown: Tick,
    #[serde(default)]
    duration: u32,
    #[serde(default)]
    instant_rewards: BTreeMap<String, f64>,
    #[serde(default)]
    effects: Vec<Effect>,
}

#[derive(Debug, Deserialize)]
struct RawExpedition {
    key: String,
    name: String,
    soldiers_required: u32,
    duration: u32,
    base_difficulty: f64,
    rewards: BTreeMap<String, f64>,
    #[serde(default)]
    min_era: EraIndex,
}

fn pairs(map: BTreeMap<String, f64>) -> Vec<(String, f64)> {
    map.into_iter().collect()
}

fn count_pairs(map: BTreeMap<String, u32>) -> Vec<(String, u32)> {
    map.into_iter().collect()
}

impl RawCatalog {
    fn into_catalog(self) -> Result<Catalog> {
        let catalog = Catalog {
            eras: self
                .eras
                .into_iter()
                .map(|era| EraDef {
                    key: era.key,
                    name: era.name,
                    resource_thresholds: pairs(era.resource_thresholds),
                    building_thresholds: count_pairs(era.building_thresholds),
                    unlocks_buildings: era.unlocks_buildings,
                    unlocks_resources: era.unlocks_resources,
                    unlocks_workforce: era.unlocks_workforce,
                })
                .collect(),
            resources: self.resources,
            buildings: self
                .buildings
                .into_iter()
                .map(|b| BuildingDef {
                    key: b.key,
                    name: b.name,
                    category: b.category,
                    base_cost: pairs(b.base_cost),
                    cost_growth: b.cost_growth,
                    effects: b.effects,
                    max_count: b.max_count,
                    build_ticks: b.build_ticks,
                })
                .collect(),
            workforce: self.workforce,
            technologies: self.technologies,
            events: self
                .events
                .into_iter()
                .map(|e| EventDef {
                    key: e.key,
                    name: e.name,
                    weight: e.weight,
                    min_era: e.min_era,
                    min_tick: e.min_tick,
                    cooldown: e.cooldown,
                    duration: e.duration,
                    instant_rewards: pairs(e.instant_rewards),
                    effects: e.effects,
                })
                .collect(),
            expeditions: self
                .expeditions
                .into_iter()
                .map(|e| ExpeditionDef {
                    key: e.key,
                    name: e.name,
                    soldiers_required: e.soldiers_required,
                    duration: e.duration,
                    base_difficulty: e.base_difficulty,
                    rewards: pairs(e.rewards),
                    min_era: e.min_era,
                })
                .collect(),
            milestones: self.milestones,
            chains: self.chains,
            prestige_upgrades: self.prestige_upgrades,
            min_prestige_era: self.min_prestige_era,
            soldier_key: self.soldier_key,
            building_index: Default::default(),
            resource_index: Default::default(),
            workforce_index: Default::default(),
            tech_index: Default::default(),
            event_index: Default::default(),
            expedition_index: Default::default(),
            upgrade_index: Default::default(),
        };
        catalog.finalize()
    }
}
