//! Save/load - a versioned, complete snapshot of all mutable state
//!
//! A save captures every leaf subsystem plus the queue, bonus accumulator,
//! tick counter and era pointer: enough to reconstruct an identical world
//! against the same catalog. Applying a save is all-or-nothing; validation
//! happens before the first field is touched, so a bad file leaves the
//! current world exactly as it was.

use std::fs;
use std::path::Path;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::catalog::effect::BonusPool;
use crate::catalog::Catalog;
use crate::core::error::{GameError, Result};
use crate::core::types::{EraIndex, EraRecord, Tick};
use crate::sim::world::GameWorld;
use crate::state::buildings::BuildingRegistry;
use crate::state::events::EventScheduler;
use crate::state::military::MilitaryOffice;
use crate::state::milestones::MilestoneTracker;
use crate::state::population::PopulationRoster;
use crate::state::prestige::PrestigeLedger;
use crate::state::research::ResearchTree;
use crate::state::resources::ResourceLedger;

pub const SAVE_VERSION: u32 = 1;

/// The complete persisted state of a world
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveGame {
    pub version: u32,
    pub tick: Tick,
    pub era_index: EraIndex,
    pub era_history: Vec<EraRecord>,
    pub resources: ResourceLedger,
    pub buildings: BuildingRegistry,
    pub population: PopulationRoster,
    pub research: ResearchTree,
    pub events: EventScheduler,
    pub military: MilitaryOffice,
    pub milestones: MilestoneTracker,
    pub prestige: PrestigeLedger,
    pub bonuses: BonusPool,
}

impl SaveGame {
    /// Capture the world's mutable state at a consistent point in time
    ///
    /// The caller must hold the world lock for the duration.
    pub fn capture(world: &GameWorld) -> Self {
        Self {
            version: SAVE_VERSION,
            tick: world.tick,
            era_index: world.era_index,
            era_history: world.era_history.clone(),
            resources: world.resources.clone(),
            buildings: world.buildings.clone(),
            population: world.population.clone(),
            research: world.research.clone(),
            events: world.events.clone(),
            military: world.military.clone(),
            milestones: world.milestones.clone(),
            prestige: world.prestige.clone(),
            bonuses: world.bonuses.clone(),
        }
    }

    /// Check the save is consistent with the catalog before it is applied
    pub fn validate(&self, catalog: &Catalog) -> Result<()> {
        if self.version != SAVE_VERSION {
            return Err(GameError::SaveVersion {
                found: self.version,
                expected: SAVE_VERSION,
            });
        }
        if self.era_index >= catalog.eras.len() {
            return Err(GameError::CorruptSave(format!(
                "era index {} out of range",
                self.era_index
            )));
        }
        for (key, _) in self.resources.iter() {
            if catalog.resource(key).is_none() {
                return Err(GameError::CorruptSave(format!("unknown resource '{key}'")));
            }
        }
        for (key, _) in self.buildings.iter_counts() {
            if catalog.building(key).is_none() {
                return Err(GameError::CorruptSave(format!("unknown building '{key}'")));
            }
        }
        for entry in self.buildings.queue() {
            if catalog.building(&entry.building).is_none() {
                return Err(GameError::CorruptSave(format!(
                    "queued unknown building '{}'",
                    entry.building
                )));
            }
        }
        for (key, _) in self.population.iter() {
            if catalog.workforce_type(key).is_none() {
                return Err(GameError::CorruptSave(format!(
                    "unknown workforce type '{key}'"
                )));
            }
        }
        for tech in self.research.completed() {
            if catalog.technology(tech).is_none() {
                return Err(GameError::CorruptSave(format!("unknown technology '{tech}'")));
            }
        }
        if let Some(active) = self.research.active() {
            if catalog.technology(&active.tech).is_none() {
                return Err(GameError::CorruptSave(format!(
                    "unknown technology in progress '{}'",
                    active.tech
                )));
            }
        }
        if let Some(active) = self.military.active() {
            if catalog.expedition(&active.expedition).is_none() {
                return Err(GameError::CorruptSave(format!(
                    "unknown expedition in progress '{}'",
                    active.expedition
                )));
            }
        }
        for (key, _) in self.prestige.upgrades() {
            if catalog.prestige_upgrade(key).is_none() {
                return Err(GameError::CorruptSave(format!(
                    "unknown prestige upgrade '{key}'"
                )));
            }
        }
        Ok(())
    }

    /// Replace the world's state atomically, then recompute rates once
    pub fn apply(self, world: &mut GameWorld) -> Result<()> {
        self.validate(&world.catalog)?;

        world.tick = self.tick;
        world.era_index = self.era_index;
        world.era_history = self.era_history;
        world.resources = self.resources;
        world.buildings = self.buildings;
        world.population = self.population;
        world.research = self.research;
        world.events = self.events;
        world.military = self.military;
        world.milestones = self.milestones;
        world.prestige = self.prestige;
        world.bonuses = self.bonuses;
        world.prestige_bonuses = world.prestige.bonus_pool(&world.catalog);
        world.rng = ChaCha8Rng::seed_from_u64(world.config.seed ^ world.tick);

        world.recompute_rates();
        world.update_tick_interval();
        Ok(())
    }
}

/// Serialize a save to pretty JSON
pub fn to_json(save: &SaveGame) -> Result<String> {
    Ok(serde_json::to_string_pretty(save)?)
}

/// Parse a save from JSON without applying it
pub fn from_json(json: &str) -> Result<SaveGame> {
    Ok(serde_json::from_str(json)?)
}

/// Write a save file
pub fn write_file(path: &Path, save: &SaveGame) -> Result<()> {
    fs::write(path, to_json(save)?)?;
    Ok(())
}

/// Read a save file
pub fn read_file(path: &Path) -> Result<SaveGame> {
    from_json(&fs::read_to_string(path)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::standard::standard_catalog;
    use crate::core::config::EngineConfig;
    use crate::sim::tick::run_tick;
    use std::sync::Arc;

    fn world() -> GameWorld {
        let catalog = Arc::new(standard_catalog().unwrap());
        GameWorld::new(catalog, EngineConfig::default())
    }

    fn developed_world() -> GameWorld {
        let mut w = world();
        w.resources.add("wood", 80.0);
        w.build_building("hut").unwrap();
        w.build_building("farm").unwrap();
        w.recruit_villager("villager", 4).unwrap();
        w.assign_villager("villager", "food", 2).unwrap();
        w.era_index = 2;
        w.resources.unlock("knowledge");
        w.resources.add("knowledge", 40.0);
        w.start_research("writing").unwrap();
        for _ in 0..3 {
            run_tick(&mut w);
        }
        w
    }

    #[test]
    fn test_round_trip_preserves_state() {
        let mut original = developed_world();
        let json = to_json(&SaveGame::capture(&original)).unwrap();

        let mut restored = world();
        from_json(&json).unwrap().apply(&mut restored).unwrap();

        assert_eq!(restored.tick, original.tick);
        assert_eq!(restored.era_index, original.era_index);
        assert_eq!(restored.resources, original.resources);
        assert_eq!(restored.buildings, original.buildings);
        assert_eq!(restored.population, original.population);
        assert_eq!(restored.research, original.research);
        assert_eq!(restored.events, original.events);
        assert_eq!(restored.military, original.military);
        assert_eq!(restored.milestones, original.milestones);
        assert_eq!(restored.prestige, original.prestige);
        assert_eq!(restored.bonuses, original.bonuses);

        // The two worlds stay in lockstep on deterministic state
        run_tick(&mut original);
        run_tick(&mut restored);
        assert_eq!(restored.resources, original.resources);
    }

    #[test]
    fn test_version_mismatch_rejected_untouched() {
        let mut target = developed_world();
        let fingerprint = target.resources.clone();

        let mut save = SaveGame::capture(&world());
        save.version = 99;
        let err = save.apply(&mut target).unwrap_err();
        assert!(matches!(err, GameError::SaveVersion { found: 99, .. }));
        assert_eq!(target.resources, fingerprint);
    }

    #[test]
    fn test_corrupt_era_rejected_untouched() {
        let mut target = world();
        let fingerprint = target.resources.clone();

        let mut save = SaveGame::capture(&target);
        save.era_index = 999;
        let err = save.apply(&mut target).unwrap_err();
        assert!(matches!(err, GameError::CorruptSave(_)));
        assert_eq!(target.resources, fingerprint);
    }

    #[test]
    fn test_bad_json_rejected() {
        assert!(matches!(from_json("{ not json"), Err(GameError::Serde(_))));
    }

    #[test]
    fn test_file_round_trip() {
        let dir = std::env::temp_dir().join("eraforge_save_test");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("roundtrip.json");

        let original = developed_world();
        write_file(&path, &SaveGame::capture(&original)).unwrap();

        let mut restored = world();
        read_file(&path).unwrap().apply(&mut restored).unwrap();
        assert_eq!(restored.resources, original.resources);
        assert_eq!(restored.buildings, original.buildings);
        assert_eq!(restored.population, original.population);

        fs::remove_file(&path).ok();
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = read_file(Path::new("/nonexistent/eraforge.json")).unwrap_err();
        assert!(matches!(err, GameError::Io(_)));
    }

    #[test]
    fn test_queue_and_cooldowns_survive() {
        let mut w = world();
        w.resources.add("wood", 50.0);
        w.build_building("farm").unwrap();
        run_tick(&mut w);
        assert_eq!(w.buildings.queue().len(), 1);

        let save = SaveGame::capture(&w);
        let mut restored = world();
        save.apply(&mut restored).unwrap();
        assert_eq!(restored.buildings.queue(), w.buildings.queue());
    }
}
