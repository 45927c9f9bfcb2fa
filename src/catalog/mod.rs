//! Static content catalog
//!
//! Read-only definition tables for eras, resources, buildings, workforce
//! types, technologies, timed events, expeditions, milestones and prestige
//! upgrades, each keyed by a unique string id. The catalog is loaded once
//! at startup (built-in standard content or a TOML file) and never mutated
//! by the simulation. Referential integrity between tables is validated
//! here so the core can assume it.

pub mod effect;
pub mod loader;
pub mod standard;

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::core::error::{GameError, Result};
use crate::core::types::{BuildingCategory, EraIndex, ResourceVec, Tick};
use effect::Effect;

/// A named progression stage gating available content
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EraDef {
    pub key: String,
    pub name: String,
    /// Resource amounts required to enter this era
    #[serde(default)]
    pub resource_thresholds: ResourceVec,
    /// Building counts required to enter this era
    #[serde(default)]
    pub building_thresholds: Vec<(String, u32)>,
    /// Building keys unlocked on entering
    #[serde(default)]
    pub unlocks_buildings: Vec<String>,
    /// Resource keys unlocked on entering
    #[serde(default)]
    pub unlocks_resources: Vec<String>,
    /// Workforce keys unlocked on entering
    #[serde(default)]
    pub unlocks_workforce: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceDef {
    pub key: String,
    pub name: String,
    /// Storage cap before any storage bonuses
    pub base_cap: f64,
    /// Amount granted when a run starts
    #[serde(default)]
    pub starting_amount: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildingDef {
    pub key: String,
    pub name: String,
    pub category: BuildingCategory,
    /// Cost of the first unit; the Nth costs floor(base * growth^N)
    pub base_cost: ResourceVec,
    pub cost_growth: f64,
    /// Effects scaled linearly by owned count
    #[serde(default)]
    pub effects: Vec<Effect>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_count: Option<u32>,
    /// Construction duration in ticks; 0 completes instantly
    #[serde(default)]
    pub build_ticks: u32,
}

impl BuildingDef {
    /// Cost vector for the next unit given the current owned count
    pub fn cost_at(&self, owned: u32) -> ResourceVec {
        let growth = self.cost_growth.powi(owned as i32);
        self.base_cost
            .iter()
            .map(|(key, base)| (key.clone(), (base * growth).floor()))
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkforceDef {
    pub key: String,
    pub name: String,
    /// Food consumed per unit per tick
    pub food_upkeep: f64,
    /// Resources gathered per assigned unit per tick
    pub gather_rate: f64,
    /// Resource keys this workforce may be assigned to
    #[serde(default)]
    pub gathers: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TechDef {
    pub key: String,
    pub name: String,
    #[serde(default)]
    pub prerequisites: Vec<String>,
    #[serde(default)]
    pub min_era: EraIndex,
    pub knowledge_cost: f64,
    /// Research duration in ticks
    pub ticks: u32,
    #[serde(default)]
    pub effects: Vec<Effect>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventDef {
    pub key: String,
    pub name: String,
    /// Relative weight in the per-tick random pick
    pub weight: f64,
    #[serde(default)]
    pub min_era: EraIndex,
    #[serde(default)]
    pub min_tick: Tick,
    /// Ticks that must elapse after firing before it may fire again
    pub cooldown: Tick,
    /// Ticks the durable effects stay in the active pool; 0 = instant only
    #[serde(default)]
    pub duration: u32,
    /// Resources granted immediately when the event fires
    #[serde(default)]
    pub instant_rewards: ResourceVec,
    /// Effects contributed to the active pool while the event runs
    #[serde(default)]
    pub effects: Vec<Effect>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpeditionDef {
    pub key: String,
    pub name: String,
    pub soldiers_required: u32,
    pub duration: u32,
    /// Chance of failure before the military bonus is applied, in [0, 1]
    pub base_difficulty: f64,
    pub rewards: ResourceVec,
    #[serde(default)]
    pub min_era: EraIndex,
}

/// A predicate over world state used by milestones
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum Condition {
    ResourceAtLeast { resource: String, amount: f64 },
    BuildingCountAtLeast { building: String, count: u32 },
    TotalBuildingsAtLeast { count: u32 },
    PopulationAtLeast { count: u32 },
    TechCountAtLeast { count: u32 },
    SoldiersAtLeast { count: u32 },
    WonderCountAtLeast { count: u32 },
    ExpeditionsCompletedAtLeast { count: u32 },
    EraAtLeast { era: EraIndex },
}

/// One-shot reward applied when a milestone completes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum MilestoneReward {
    /// Immediate resource grant
    Resources { grants: ResourceVec },
    /// Effects merged into the permanent bonus accumulator
    Permanent { effects: Vec<Effect> },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MilestoneDef {
    pub key: String,
    pub name: String,
    /// All conditions must hold for the milestone to complete
    pub conditions: Vec<Condition>,
    pub reward: MilestoneReward,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainDef {
    pub key: String,
    /// Title granted when every member milestone is complete
    pub title: String,
    pub members: Vec<String>,
    /// Temporary tick-speed boost granted once on completion
    pub boost_magnitude: f64,
    pub boost_duration: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrestigeUpgradeDef {
    pub key: String,
    pub name: String,
    /// Cost of the first tier; tier T costs floor(base * growth^T)
    pub base_cost: u64,
    pub cost_growth: f64,
    pub max_tier: u32,
    /// Effects scaled linearly by purchased tier
    pub effects: Vec<Effect>,
}

impl PrestigeUpgradeDef {
    /// Point cost for the next tier given the current purchased tier
    pub fn cost_at(&self, tier: u32) -> u64 {
        (self.base_cost as f64 * self.cost_growth.powi(tier as i32)).floor() as u64
    }
}

/// The complete static content catalog
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Catalog {
    /// Ordered progression; index 0 is the starting era
    pub eras: Vec<EraDef>,
    pub resources: Vec<ResourceDef>,
    pub buildings: Vec<BuildingDef>,
    pub workforce: Vec<WorkforceDef>,
    pub technologies: Vec<TechDef>,
    pub events: Vec<EventDef>,
    pub expeditions: Vec<ExpeditionDef>,
    pub milestones: Vec<MilestoneDef>,
    pub chains: Vec<ChainDef>,
    pub prestige_upgrades: Vec<PrestigeUpgradeDef>,
    /// Minimum era index from which prestige becomes available
    pub min_prestige_era: EraIndex,
    /// Workforce key counted as soldiers by expeditions and milestones
    pub soldier_key: String,

    #[serde(skip)]
    building_index: AHashMap<String, usize>,
    #[serde(skip)]
    resource_index: AHashMap<String, usize>,
    #[serde(skip)]
    workforce_index: AHashMap<String, usize>,
    #[serde(skip)]
    tech_index: AHashMap<String, usize>,
    #[serde(skip)]
    event_index: AHashMap<String, usize>,
    #[serde(skip)]
    expedition_index: AHashMap<String, usize>,
    #[serde(skip)]
    upgrade_index: AHashMap<String, usize>,
}

impl Catalog {
    /// Build lookup indices and validate referential integrity
    pub fn finalize(mut self) -> Result<Self> {
        self.building_index = index_of(&self.buildings, |b| &b.key)?;
        self.resource_index = index_of(&self.resources, |r| &r.key)?;
        self.workforce_index = index_of(&self.workforce, |w| &w.key)?;
        self.tech_index = index_of(&self.technologies, |t| &t.key)?;
        self.event_index = index_of(&self.events, |e| &e.key)?;
        self.expedition_index = index_of(&self.expeditions, |e| &e.key)?;
        self.upgrade_index = index_of(&self.prestige_upgrades, |u| &u.key)?;
        self.validate()?;
        Ok(self)
    }

    pub fn building(&self, key: &str) -> Option<&BuildingDef> {
        self.building_index.get(key).map(|&i| &self.buildings[i])
    }

    pub fn resource(&self, key: &str) -> Option<&ResourceDef> {
        self.resource_index.get(key).map(|&i| &self.resources[i])
    }

    pub fn workforce_type(&self, key: &str) -> Option<&WorkforceDef> {
        self.workforce_index.get(key).map(|&i| &self.workforce[i])
    }

    pub fn technology(&self, key: &str) -> Option<&TechDef> {
        self.tech_index.get(key).map(|&i| &self.technologies[i])
    }

    pub fn event(&self, key: &str) -> Option<&EventDef> {
        self.event_index.get(key).map(|&i| &self.events[i])
    }

    pub fn expedition(&self, key: &str) -> Option<&ExpeditionDef> {
        self.expedition_index.get(key).map(|&i| &self.expeditions[i])
    }

    pub fn prestige_upgrade(&self, key: &str) -> Option<&PrestigeUpgradeDef> {
        self.upgrade_index.get(key).map(|&i| &self.prestige_upgrades[i])
    }

    pub fn era(&self, index: EraIndex) -> Option<&EraDef> {
        self.eras.get(index)
    }

    /// Every building/resource/workforce key unlocked at or before an era
    pub fn unlocked_through(&self, era: EraIndex) -> UnlockSet {
        let mut set = UnlockSet::default();
        for def in self.eras.iter().take(era + 1) {
            set.buildings.extend(def.unlocks_buildings.iter().cloned());
            set.resources.extend(def.unlocks_resources.iter().cloned());
            set.workforce.extend(def.unlocks_workforce.iter().cloned());
        }
        set
    }

    fn validate(&self) -> Result<()> {
        if self.eras.is_empty() {
            return Err(GameError::InvalidCatalog("no eras defined".into()));
        }
        if self.min_prestige_era >= self.eras.len() {
            return Err(GameError::InvalidCatalog(format!(
                "min_prestige_era {} out of range ({} eras)",
                self.min_prestige_era,
                self.eras.len()
            )));
        }
        if self.workforce_type(&self.soldier_key).is_none() {
            return Err(GameError::InvalidCatalog(format!(
                "soldier_key '{}' is not a workforce type",
                self.soldier_key
            )));
        }

        for era in &self.eras {
            for (key, _) in &era.resource_thresholds {
                self.require_resource(key, &era.key)?;
            }
            for (key, _) in &era.building_thresholds {
                self.require_building(key, &era.key)?;
            }
            for key in &era.unlocks_buildings {
                self.require_building(key, &era.key)?;
            }
            for key in &era.unlocks_resources {
                self.require_resource(key, &era.key)?;
            }
            for key in &era.unlocks_workforce {
                if self.workforce_type(key).is_none() {
                    return Err(dangling("era", &era.key, "workforce", key));
                }
            }
        }

        for building in &self.buildings {
            if building.cost_growth < 1.0 {
                return Err(GameError::InvalidCatalog(format!(
                    "building '{}' has cost_growth < 1.0",
                    building.key
                )));
            }
            for (key, _) in &building.base_cost {
                self.require_resource(key, &building.key)?;
            }
            self.validate_effects(&building.key, &building.effects)?;
        }

        for workforce in &self.workforce {
            for key in &workforce.gathers {
                self.require_resource(key, &workforce.key)?;
            }
        }

        for tech in &self.technologies {
            for prereq in &tech.prerequisites {
                if self.technology(prereq).is_none() {
                    return Err(dangling("technology", &tech.key, "prerequisite", prereq));
                }
            }
            if tech.min_era >= self.eras.len() {
                return Err(GameError::InvalidCatalog(format!(
                    "technology '{}' requires era {} but only {} eras exist",
                    tech.key,
                    tech.min_era,
                    self.eras.len()
                )));
            }
            self.validate_effects(&tech.key, &tech.effects)?;
        }

        for event in &self.events {
            for (key, _) in &event.instant_rewards {
                self.require_resource(key, &event.key)?;
            }
            self.validate_effects(&event.key, &event.effects)?;
        }

        for expedition in &self.expeditions {
            for (key, _) in &expedition.rewards {
                self.require_resource(key, &expedition.key)?;
            }
            if !(0.0..=1.0).contains(&expedition.base_difficulty) {
                return Err(GameError::InvalidCatalog(format!(
                    "expedition '{}' difficulty outside [0, 1]",
                    expedition.key
                )));
            }
        }

        for milestone in &self.milestones {
            for condition in &milestone.conditions {
                match condition {
                    Condition::ResourceAtLeast { resource, .. } => {
                        self.require_resource(resource, &milestone.key)?;
                    }
                    Condition::BuildingCountAtLeast { building, .. } => {
                        self.require_building(building, &milestone.key)?;
                    }
                    _ => {}
                }
            }
            if let MilestoneReward::Resources { grants } = &milestone.reward {
                for (key, _) in grants {
                    self.require_resource(key, &milestone.key)?;
                }
            }
            if let MilestoneReward::Permanent { effects } = &milestone.reward {
                self.validate_effects(&milestone.key, effects)?;
            }
        }

        for chain in &self.chains {
            for member in &chain.members {
                if !self.milestones.iter().any(|m| &m.key == member) {
                    return Err(dangling("chain", &chain.key, "milestone", member));
                }
            }
        }

        for upgrade in &self.prestige_upgrades {
            self.validate_effects(&upgrade.key, &upgrade.effects)?;
        }

        Ok(())
    }

    fn validate_effects(&self, owner: &str, effects: &[Effect]) -> Result<()> {
        for effect in effects {
            match &effect.target {
                Some(target) => self.require_resource(target, owner)?,
                None => {
                    if Effect::needs_target(effect.kind) {
                        return Err(GameError::InvalidCatalog(format!(
                            "'{}' has a {:?} effect without a resource target",
                            owner, effect.kind
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    fn require_resource(&self, key: &str, owner: &str) -> Result<()> {
        if self.resource(key).is_none() {
            return Err(dangling("definition", owner, "resource", key));
        }
        Ok(())
    }

    fn require_building(&self, key: &str, owner: &str) -> Result<()> {
        if self.building(key).is_none() {
            return Err(dangling("definition", owner, "building", key));
        }
        Ok(())
    }
}

/// Keys unlocked up to and including a given era
#[derive(Debug, Clone, Default)]
pub struct UnlockSet {
    pub buildings: Vec<String>,
    pub resources: Vec<String>,
    pub workforce: Vec<String>,
}

fn index_of<T>(items: &[T], key: impl Fn(&T) -> &String) -> Result<AHashMap<String, usize>> {
    let mut index = AHashMap::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        if index.insert(key(item).clone(), i).is_some() {
            return Err(GameError::InvalidCatalog(format!(
                "duplicate key '{}'",
                key(item)
            )));
        }
    }
    Ok(index)
}

fn dangling(owner_kind: &str, owner: &str, target_kind: &str, target: &str) -> GameError {
    GameError::InvalidCatalog(format!(
        "{} '{}' references unknown {} '{}'",
        owner_kind, owner, target_kind, target
    ))
}
