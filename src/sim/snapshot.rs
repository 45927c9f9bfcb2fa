//! Immutable world snapshots for presentation layers
//!
//! A snapshot is a deep copy assembled under the engine lock; it never
//! aliases internal containers, so renderers can hold one while the next
//! tick runs. Tables follow catalog order for stable display.

use serde::{Deserialize, Serialize};

use crate::core::types::{EraIndex, EraRecord, Tick};
use crate::sim::world::GameWorld;
use crate::state::buildings::ConstructionEntry;
use crate::state::events::ActiveModifier;
use crate::state::military::ActiveExpedition;
use crate::state::research::ActiveResearch;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EraView {
    pub index: EraIndex,
    pub key: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceView {
    pub key: String,
    pub name: String,
    pub amount: f64,
    pub cap: f64,
    pub rate: f64,
    pub unlocked: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildingView {
    pub key: String,
    pub name: String,
    pub count: u32,
    pub unlocked: bool,
    /// Cost of the next unit at the current committed count
    pub next_cost: Vec<(String, f64)>,
    pub queued: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkforceView {
    pub key: String,
    pub name: String,
    pub count: u32,
    pub idle: u32,
    pub assigned: Vec<(String, u32)>,
    pub unlocked: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResearchView {
    pub active: Option<ActiveResearch>,
    pub completed: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MilitaryView {
    pub active: Option<ActiveExpedition>,
    pub completed: u32,
    pub loot_totals: Vec<(String, f64)>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MilestoneView {
    pub completed: Vec<String>,
    pub completed_chains: Vec<String>,
    pub titles: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrestigeView {
    pub level: u32,
    pub points_available: u64,
    pub points_total: u64,
    /// Points the run would bank if prestiged right now
    pub pending_points: u64,
    pub upgrades: Vec<(String, u32)>,
}

/// A fully-copied, immutable view of world state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub tick: Tick,
    pub era: EraView,
    pub era_history: Vec<EraRecord>,
    pub tick_interval_ms: u64,
    pub tick_speed_multiplier: f64,
    pub population_capacity: u32,
    pub total_population: u32,
    pub resources: Vec<ResourceView>,
    pub buildings: Vec<BuildingView>,
    pub construction_queue: Vec<ConstructionEntry>,
    pub workforce: Vec<WorkforceView>,
    pub research: ResearchView,
    pub active_modifiers: Vec<ActiveModifier>,
    pub military: MilitaryView,
    pub milestones: MilestoneView,
    pub prestige: PrestigeView,
}

impl Snapshot {
    /// Deep-copy the world; the caller must hold the engine lock
    pub fn capture(world: &GameWorld) -> Self {
        let catalog = &world.catalog;
        let era_def = &catalog.eras[world.era_index];

        let resources = catalog
            .resources
            .iter()
            .map(|def| ResourceView {
                key: def.key.clone(),
                name: def.name.clone(),
                amount: world.resources.amount(&def.key),
                cap: world.resources.cap(&def.key),
                rate: world.resources.rate(&def.key),
                unlocked: world.resources.is_unlocked(&def.key),
            })
            .collect();

        let buildings = catalog
            .buildings
            .iter()
            .map(|def| BuildingView {
                key: def.key.clone(),
                name: def.name.clone(),
                count: world.buildings.count(&def.key),
                unlocked: world.buildings.is_unlocked(&def.key),
                next_cost: def.cost_at(world.buildings.committed_count(&def.key)),
                queued: world.buildings.queued_count(&def.key),
            })
            .collect();

        let workforce = catalog
            .workforce
            .iter()
            .map(|def| {
                let state = world.population.get(&def.key);
                let mut assigned: Vec<(String, u32)> = state
                    .map(|s| s.assigned.iter().map(|(k, v)| (k.clone(), *v)).collect())
                    .unwrap_or_default();
                assigned.sort();
                WorkforceView {
                    key: def.key.clone(),
                    name: def.name.clone(),
                    count: state.map(|s| s.count).unwrap_or(0),
                    idle: state.map(|s| s.idle()).unwrap_or(0),
                    assigned,
                    unlocked: world.population.is_unlocked(&def.key),
                }
            })
            .collect();

        let mut completed_research: Vec<String> = world.research.completed().cloned().collect();
        completed_research.sort();
        let mut completed_milestones: Vec<String> =
            world.milestones.completed().cloned().collect();
        completed_milestones.sort();
        let mut completed_chains: Vec<String> = catalog
            .chains
            .iter()
            .filter(|c| world.milestones.is_chain_completed(&c.key))
            .map(|c| c.key.clone())
            .collect();
        completed_chains.sort();
        let mut loot_totals: Vec<(String, f64)> = world
            .military
            .loot_totals()
            .iter()
            .map(|(k, v)| (k.clone(), *v))
            .collect();
        loot_totals.sort_by(|a, b| a.0.cmp(&b.0));
        let mut upgrades: Vec<(String, u32)> = world
            .prestige
            .upgrades()
            .map(|(k, v)| (k.clone(), *v))
            .collect();
        upgrades.sort();

        Self {
            tick: world.tick,
            era: EraView {
                index: world.era_index,
                key: era_def.key.clone(),
                name: era_def.name.clone(),
            },
            era_history: world.era_history.clone(),
            tick_interval_ms: world.tick_interval_ms,
            tick_speed_multiplier: world.tick_speed_multiplier(),
            population_capacity: world.population_capacity(),
            total_population: world.population.total_population(),
            resources,
            buildings,
            construction_queue: world.buildings.queue().to_vec(),
            workforce,
            research: ResearchView {
                active: world.research.active().cloned(),
                completed: completed_research,
            },
            active_modifiers: world.events.active().to_vec(),
            military: MilitaryView {
                active: world.military.active().cloned(),
                completed: world.military.completed_count(),
                loot_totals,
            },
            milestones: MilestoneView {
                completed: completed_milestones,
                completed_chains,
                titles: world.milestones.titles().to_vec(),
            },
            prestige: PrestigeView {
                level: world.prestige.level(),
                points_available: world.prestige.points_available(),
                points_total: world.prestige.points_total(),
                pending_points: world.pending_prestige_points(),
                upgrades,
            },
        }
    }

    pub fn resource(&self, key: &str) -> Option<&ResourceView> {
        self.resources.iter().find(|r| r.key == key)
    }

    pub fn building(&self, key: &str) -> Option<&BuildingView> {
        self.buildings.iter().find(|b| b.key == key)
    }
}
