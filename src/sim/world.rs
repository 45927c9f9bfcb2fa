//! The world aggregate - owns every leaf subsystem and all domain operations
//!
//! All mutation goes through `&mut self` methods that validate first and
//! mutate second, so a failed operation never leaves partial state behind.
//! Events raised by operations and ticks collect in a pending buffer that
//! the engine drains onto the bus after each lock scope.

use std::sync::Arc;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::catalog::effect::{BonusPool, Effect, EffectKind};
use crate::catalog::{Catalog, MilestoneReward};
use crate::core::config::EngineConfig;
use crate::core::error::{GameError, Result};
use crate::core::types::{EraIndex, EraRecord, Tick, KNOWLEDGE_KEY};
use crate::sim::rates;
use crate::sim::tick::GameEvent;
use crate::state::buildings::BuildingRegistry;
use crate::state::events::EventScheduler;
use crate::state::military::MilitaryOffice;
use crate::state::milestones::{MilestoneFacts, MilestoneTracker};
use crate::state::population::PopulationRoster;
use crate::state::prestige::{PrestigeLedger, RunStats};
use crate::state::research::ResearchTree;
use crate::state::resources::ResourceLedger;

/// Result of a successful build order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildOutcome {
    /// Zero-duration building, count already incremented
    Completed { count: u32 },
    /// Entry added to the construction queue
    Queued { ticks: u32 },
}

/// The complete mutable simulation state for one run
pub struct GameWorld {
    pub catalog: Arc<Catalog>,
    pub config: EngineConfig,

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

    /// Permanent accumulator: research effects + milestone permanent rewards
    pub bonuses: BonusPool,
    /// Rebuilt from purchased prestige upgrades; survives resets with them
    pub prestige_bonuses: BonusPool,

    /// Effective tick interval computed at the end of the last tick
    pub tick_interval_ms: u64,

    pub(crate) rng: ChaCha8Rng,
    pending: Vec<GameEvent>,
}

impl GameWorld {
    /// Fresh world in the starting era
    pub fn new(catalog: Arc<Catalog>, config: EngineConfig) -> Self {
        let rng = ChaCha8Rng::seed_from_u64(config.seed);
        let mut world = Self {
            tick: 0,
            era_index: 0,
            era_history: Vec::new(),
            resources: ResourceLedger::default(),
            buildings: BuildingRegistry::default(),
            population: PopulationRoster::default(),
            research: ResearchTree::new(),
            events: EventScheduler::new(),
            military: MilitaryOffice::new(),
            milestones: MilestoneTracker::new(),
            prestige: PrestigeLedger::new(),
            bonuses: BonusPool::new(),
            prestige_bonuses: BonusPool::new(),
            tick_interval_ms: config.base_tick_interval_ms,
            rng,
            pending: Vec::new(),
            catalog,
            config,
        };
        world.reset_run();
        world
    }

    /// Recreate every leaf except the prestige ledger; starting state for a
    /// new run, including permanent starting-resource upgrades
    pub(crate) fn reset_run(&mut self) {
        let unlocked = self.catalog.unlocked_through(0);
        self.prestige_bonuses = self.prestige.bonus_pool(&self.catalog);

        self.resources = ResourceLedger::new(&self.catalog, &unlocked.resources);
        self.buildings = BuildingRegistry::new(&unlocked.buildings);
        self.population = PopulationRoster::new(&self.catalog, &unlocked.workforce);
        self.research = ResearchTree::new();
        self.events = EventScheduler::new();
        self.military = MilitaryOffice::new();
        self.milestones = MilestoneTracker::new();
        self.bonuses = BonusPool::new();

        self.tick = 0;
        self.era_index = 0;
        self.era_history = vec![EraRecord {
            era: self.catalog.eras[0].key.clone(),
            entered_at: 0,
        }];

        for (key, amount) in self.prestige_bonuses.starting_resources.clone() {
            self.resources.add(&key, amount);
        }

        self.recompute_rates();
        self.update_tick_interval();
    }

    /// Drain events raised since the last drain
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.pending)
    }

    pub(crate) fn push_event(&mut self, event: GameEvent) {
        self.pending.push(event);
    }

    // === Bonus pools ===

    /// Building effects (minus flat production, which is a base rate)
    /// scaled by owned counts
    pub fn building_bonus_pool(&self) -> BonusPool {
        let mut pool = BonusPool::new();
        for (key, count) in self.buildings.iter_counts() {
            if let Some(def) = self.catalog.building(key) {
                let effects: Vec<Effect> = def
                    .effects
                    .iter()
                    .filter(|e| e.kind != EffectKind::Production)
                    .cloned()
                    .collect();
                pool.absorb_scaled(&effects, *count as f64);
            }
        }
        pool
    }

    /// Accumulator + prestige + building bonuses, merged additively
    pub fn combined_bonuses(&self) -> BonusPool {
        let building_pool = self.building_bonus_pool();
        BonusPool::combined(&[&self.bonuses, &self.prestige_bonuses, &building_pool])
    }

    pub fn military_bonus(&self) -> f64 {
        self.combined_bonuses().military
    }

    pub fn population_capacity(&self) -> u32 {
        let bonus = self.combined_bonuses().population_cap;
        (self.config.base_population_cap as f64 + bonus).floor().max(0.0) as u32
    }

    /// Current tick-speed multiplier from permanent and active sources
    pub fn tick_speed_multiplier(&self) -> f64 {
        let multiplier = 1.0 + self.combined_bonuses().tick_speed + self.events.tick_speed_bonus();
        multiplier.max(0.0)
    }

    /// Recompute the effective interval; called at the end of every tick
    pub(crate) fn update_tick_interval(&mut self) {
        let multiplier = self.tick_speed_multiplier().max(1e-6);
        let interval = (self.config.base_tick_interval_ms as f64 / multiplier).round() as u64;
        self.tick_interval_ms = interval.max(self.config.min_tick_interval_ms);
    }

    /// Rebuild every resource's rate and cap from zero
    pub fn recompute_rates(&mut self) {
        let bonuses = self.combined_bonuses();
        let outcome = rates::compose(
            &self.catalog,
            &self.buildings,
            &self.population,
            &self.events,
            &bonuses,
        );
        let keys: Vec<String> = self.catalog.resources.iter().map(|d| d.key.clone()).collect();
        for key in keys {
            if let Some(cap) = outcome.caps.get(&key) {
                self.resources.set_cap(&key, *cap);
            }
            let rate = if self.resources.is_unlocked(&key) {
                outcome.rates.get(&key).copied().unwrap_or(0.0)
            } else {
                0.0
            };
            self.resources.set_rate(&key, rate);
        }
    }

    // === Public operations ===

    /// Manually gather a resource; returns the amount actually added
    pub fn gather_resource(&mut self, key: &str, amount: f64) -> Result<f64> {
        if amount <= 0.0 {
            return Err(GameError::InvalidArgument(
                "gather amount must be positive".into(),
            ));
        }
        if self.catalog.resource(key).is_none() {
            return Err(GameError::NotFound {
                kind: "resource",
                key: key.to_string(),
            });
        }
        if !self.resources.is_unlocked(key) {
            return Err(GameError::Locked(key.to_string()));
        }
        Ok(self.resources.add(key, amount))
    }

    /// Buy one building: all-or-nothing payment, then queue or complete
    pub fn build_building(&mut self, key: &str) -> Result<BuildOutcome> {
        let def = self
            .catalog
            .building(key)
            .ok_or_else(|| GameError::NotFound {
                kind: "building",
                key: key.to_string(),
            })?
            .clone();
        if !self.buildings.is_unlocked(key) {
            return Err(GameError::Locked(key.to_string()));
        }
        // Queued units count against the max and escalate the price
        let committed = self.buildings.committed_count(key);
        if let Some(max) = def.max_count {
            if committed >= max {
                return Err(GameError::MaxCountReached {
                    key: key.to_string(),
                    max,
                });
            }
        }
        self.resources.pay(&def.cost_at(committed))?;

        if def.build_ticks == 0 {
            let count = self.buildings.complete(key);
            self.push_event(GameEvent::BuildingCompleted {
                building: key.to_string(),
                count,
            });
            self.recompute_rates();
            Ok(BuildOutcome::Completed { count })
        } else {
            self.buildings.enqueue(key, def.build_ticks);
            Ok(BuildOutcome::Queued {
                ticks: def.build_ticks,
            })
        }
    }

    /// Repeat purchases until resources or the limit run out
    ///
    /// Returns how many were bought. The first failure is surfaced only if
    /// nothing was bought at all.
    pub fn build_multiple(&mut self, key: &str, limit: u32) -> Result<u32> {
        if limit == 0 {
            return Err(GameError::InvalidArgument("count must be positive".into()));
        }
        let mut built = 0;
        for _ in 0..limit {
            match self.build_building(key) {
                Ok(_) => built += 1,
                Err(err) if built == 0 => return Err(err),
                Err(_) => break,
            }
        }
        Ok(built)
    }

    /// Recruit workforce units, bounded by population capacity
    pub fn recruit_villager(&mut self, key: &str, count: u32) -> Result<()> {
        if count == 0 {
            return Err(GameError::InvalidArgument("count must be positive".into()));
        }
        if self.catalog.workforce_type(key).is_none() {
            return Err(GameError::NotFound {
                kind: "workforce type",
                key: key.to_string(),
            });
        }
        if !self.population.is_unlocked(key) {
            return Err(GameError::Locked(key.to_string()));
        }
        let capacity = self.population_capacity();
        if self.population.total_population() + count > capacity {
            return Err(GameError::PopulationCapacity { capacity });
        }
        self.population.recruit(key, count)?;
        self.recompute_rates();
        Ok(())
    }

    /// Assign idle units to gather an unlocked resource
    pub fn assign_villager(&mut self, key: &str, resource: &str, count: u32) -> Result<()> {
        if count == 0 {
            return Err(GameError::InvalidArgument("count must be positive".into()));
        }
        if !self.population.is_unlocked(key) {
            return Err(GameError::Locked(key.to_string()));
        }
        if self.catalog.resource(resource).is_none() {
            return Err(GameError::NotFound {
                kind: "resource",
                key: resource.to_string(),
            });
        }
        if !self.resources.is_unlocked(resource) {
            return Err(GameError::Locked(resource.to_string()));
        }
        self.population.assign(&self.catalog, key, resource, count)?;
        self.recompute_rates();
        Ok(())
    }

    /// Return assigned units to the idle pool
    pub fn unassign_villager(&mut self, key: &str, resource: &str, count: u32) -> Result<()> {
        if count == 0 {
            return Err(GameError::InvalidArgument("count must be positive".into()));
        }
        self.population.unassign(key, resource, count)?;
        self.recompute_rates();
        Ok(())
    }

    /// Start researching a technology; knowledge is paid up front and is
    /// not refunded on cancel
    pub fn start_research(&mut self, key: &str) -> Result<()> {
        let def = self
            .catalog
            .technology(key)
            .ok_or_else(|| GameError::NotFound {
                kind: "technology",
                key: key.to_string(),
            })?
            .clone();
        if self.research.is_researched(key) {
            return Err(GameError::AlreadyResearched {
                tech: key.to_string(),
            });
        }
        if self.research.in_progress() {
            return Err(GameError::AlreadyInProgress("research"));
        }
        if def.min_era > self.era_index {
            return Err(GameError::EraRequired {
                required: self.catalog.eras[def.min_era].name.clone(),
            });
        }
        for prereq in &def.prerequisites {
            if !self.research.is_researched(prereq) {
                return Err(GameError::PrerequisiteMissing {
                    tech: prereq.clone(),
                });
            }
        }
        self.resources.spend(KNOWLEDGE_KEY, def.knowledge_cost)?;
        self.research.begin(key, def.ticks);
        Ok(())
    }

    /// Abandon the active research; progress and cost are forfeit
    pub fn cancel_research(&mut self) -> Result<()> {
        self.research
            .cancel()
            .map(|_| ())
            .ok_or(GameError::NothingInProgress("research"))
    }

    /// Send soldiers on an expedition
    pub fn launch_expedition(&mut self, key: &str) -> Result<()> {
        let def = self
            .catalog
            .expedition(key)
            .ok_or_else(|| GameError::NotFound {
                kind: "expedition",
                key: key.to_string(),
            })?
            .clone();
        if self.military.in_progress() {
            return Err(GameError::AlreadyInProgress("an expedition"));
        }
        if def.min_era > self.era_index {
            return Err(GameError::EraRequired {
                required: self.catalog.eras[def.min_era].name.clone(),
            });
        }
        let soldier_key = self.catalog.soldier_key.clone();
        let available = self
            .population
            .count(&soldier_key)
            .saturating_sub(self.military.committed());
        if available < def.soldiers_required {
            return Err(GameError::InsufficientWorkers {
                workforce: soldier_key,
                required: def.soldiers_required,
                available,
            });
        }
        self.military.launch(&def);
        Ok(())
    }

    /// Points the current run would bank if prestiged right now
    pub fn pending_prestige_points(&self) -> u64 {
        let stats = RunStats {
            era: self.era_index,
            milestones_completed: self.milestones.completed_count(),
            techs_researched: self.research.completed_count(),
            buildings_built: self.buildings.total_built(),
        };
        self.prestige
            .points_for_run(&self.config, &self.catalog, &stats)
    }

    /// Irreversible world reset in exchange for prestige points
    pub fn do_prestige(&mut self) -> Result<u64> {
        if self.era_index < self.catalog.min_prestige_era {
            return Err(GameError::PrestigeUnavailable {
                required: self.catalog.eras[self.catalog.min_prestige_era].name.clone(),
            });
        }
        let points = self.pending_prestige_points();
        self.prestige.record_prestige(points);
        self.reset_run();
        let level = self.prestige.level();
        self.push_event(GameEvent::PrestigeCompleted { level, points });
        tracing::info!(level, points, "prestige complete, world reset");
        Ok(points)
    }

    /// Spend banked points on a permanent upgrade tier
    pub fn buy_prestige_upgrade(&mut self, key: &str) -> Result<()> {
        self.prestige.buy_upgrade(&self.catalog, key)?;
        self.prestige_bonuses = self.prestige.bonus_pool(&self.catalog);
        self.recompute_rates();
        Ok(())
    }

    // === Tick pipeline steps (driven by `sim::tick::run_tick`) ===

    /// Step 1: advance the construction queue
    pub(crate) fn advance_construction(&mut self) {
        for building in self.buildings.advance_queue() {
            let count = self.buildings.count(&building);
            self.push_event(GameEvent::BuildingCompleted { building, count });
        }
    }

    /// Step 2: advance research and merge completed effects
    pub(crate) fn advance_research(&mut self) {
        if let Some(tech) = self.research.advance() {
            if let Some(def) = self.catalog.technology(&tech) {
                self.bonuses.absorb(&def.effects);
            }
            self.push_event(GameEvent::ResearchCompleted { tech });
        }
    }

    /// Step 3: expire active modifiers, then maybe fire one event
    pub(crate) fn roll_events(&mut self) {
        let expired = self.events.expire();
        for source in expired {
            tracing::debug!(source, "timed modifier expired");
        }

        let eligible = self
            .events
            .eligible(&self.catalog, self.era_index, self.tick);
        if eligible.is_empty() {
            return;
        }
        let picked = match self.events.pick(&eligible, &mut self.rng) {
            Some(def) => def.clone(),
            None => return,
        };
        // Independent low-probability gate keeps event frequency down
        // without a second cooldown dimension.
        if self.rng.gen_range(0.0..1.0) >= self.config.event_fire_chance {
            return;
        }
        for (key, amount) in &picked.instant_rewards {
            self.resources.add(key, *amount);
        }
        self.events.fire(&picked, self.tick);
        self.push_event(GameEvent::EventFired {
            event: picked.key.clone(),
        });
    }

    /// Step 4: advance the active expedition and settle its outcome
    pub(crate) fn advance_expedition(&mut self) {
        let Some(active) = self.military.active() else {
            return;
        };
        let Some(def) = self.catalog.expedition(&active.expedition).cloned() else {
            return;
        };
        let bonuses = self.combined_bonuses();
        let outcome = self.military.advance(
            &self.config,
            &def,
            bonuses.military,
            bonuses.expedition_reward,
            &mut self.rng,
        );
        if let Some(outcome) = outcome {
            for (key, amount) in &outcome.loot {
                self.resources.add(key, *amount);
            }
            if outcome.soldiers_lost > 0 {
                let soldier_key = self.catalog.soldier_key.clone();
                self.population.remove(&soldier_key, outcome.soldiers_lost);
            }
            self.push_event(GameEvent::ExpeditionResolved {
                expedition: outcome.expedition,
                success: outcome.success,
                soldiers_lost: outcome.soldiers_lost,
            });
        }
    }

    /// Step 7: complete newly satisfied milestones and chains
    pub(crate) fn evaluate_milestones(&mut self) {
        let newly: Vec<_> = {
            let facts = MilestoneFacts {
                catalog: &self.catalog,
                resources: &self.resources,
                buildings: &self.buildings,
                population: &self.population,
                tech_count: self.research.completed_count(),
                expeditions_completed: self.military.completed_count(),
                era: self.era_index,
            };
            self.milestones
                .newly_satisfied(&facts)
                .into_iter()
                .cloned()
                .collect()
        };
        for def in newly {
            if !self.milestones.mark_completed(&def.key) {
                continue;
            }
            match &def.reward {
                MilestoneReward::Resources { grants } => {
                    for (key, amount) in grants {
                        self.resources.add(key, *amount);
                    }
                }
                MilestoneReward::Permanent { effects } => {
                    self.bonuses.absorb(effects);
                }
            }
            self.push_event(GameEvent::MilestoneCompleted {
                milestone: def.key.clone(),
            });
        }

        let chains: Vec<_> = self
            .milestones
            .newly_completed_chains(&self.catalog)
            .into_iter()
            .cloned()
            .collect();
        for chain in chains {
            if !self.milestones.mark_chain_completed(&chain) {
                continue;
            }
            self.events.push_modifier(
                &format!("chain:{}", chain.key),
                vec![Effect::new(EffectKind::TickSpeed, None, chain.boost_magnitude)],
                chain.boost_duration,
            );
            self.push_event(GameEvent::ChainCompleted {
                chain: chain.key.clone(),
                title: chain.title.clone(),
            });
        }
    }

    /// Step 8: advance one era if every threshold for the next is met
    pub(crate) fn evaluate_era(&mut self) {
        let next = self.era_index + 1;
        let Some(def) = self.catalog.era(next).cloned() else {
            return;
        };
        let resources_met = def
            .resource_thresholds
            .iter()
            .all(|(key, amount)| self.resources.amount(key) >= *amount);
        let buildings_met = def
            .building_thresholds
            .iter()
            .all(|(key, count)| self.buildings.count(key) >= *count);
        if !resources_met || !buildings_met {
            return;
        }

        self.era_index = next;
        for key in &def.unlocks_resources {
            self.resources.unlock(key);
        }
        for key in &def.unlocks_buildings {
            self.buildings.unlock(key);
        }
        for key in &def.unlocks_workforce {
            self.population.unlock(key);
        }
        self.era_history.push(EraRecord {
            era: def.key.clone(),
            entered_at: self.tick,
        });
        self.push_event(GameEvent::EraAdvanced { era: def.key });
        tracing::info!(era = %self.catalog.eras[next].key, tick = self.tick, "era advanced");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::standard::standard_catalog;

    pub(crate) fn test_world() -> GameWorld {
        let catalog = Arc::new(standard_catalog().unwrap());
        GameWorld::new(catalog, EngineConfig::default())
    }

    #[test]
    fn test_fresh_world_matches_catalog() {
        let world = test_world();
        assert_eq!(world.era_index, 0);
        assert_eq!(world.resources.amount("food"), 15.0);
        assert_eq!(world.resources.amount("wood"), 12.0);
        assert_eq!(world.era_history.len(), 1);
        assert_eq!(world.era_history[0].era, "stone_age");
    }

    #[test]
    fn test_gather_locked_resource_fails_until_unlocked() {
        let mut world = test_world();
        let err = world.gather_resource("iron", 5.0).unwrap_err();
        assert!(matches!(err, GameError::Locked(_)));

        // Meet the bronze age thresholds and advance
        world.resources.add("food", 100.0);
        world.resources.add("wood", 150.0);
        world.build_building("hut").unwrap();
        world.build_building("hut").unwrap();
        world.build_building("farm").unwrap();
        for _ in 0..10 {
            world.advance_construction();
        }
        world.evaluate_era();
        assert_eq!(world.era_index, 1);

        let added = world.gather_resource("iron", 5.0).unwrap();
        assert_eq!(added, 5.0);
    }

    #[test]
    fn test_build_unaffordable_keeps_resources() {
        let mut world = test_world();
        // Farm costs wood 15; fresh world has 12
        let err = world.build_building("farm").unwrap_err();
        assert!(matches!(err, GameError::InsufficientResource { .. }));
        assert_eq!(world.resources.amount("wood"), 12.0);
    }

    #[test]
    fn test_build_instant_vs_queued() {
        let mut world = test_world();
        // Hut has no construction duration
        let outcome = world.build_building("hut").unwrap();
        assert_eq!(outcome, BuildOutcome::Completed { count: 1 });
        assert_eq!(world.resources.amount("wood"), 2.0);

        // Farm takes 5 ticks and must not raise the count yet
        world.resources.add("wood", 100.0);
        let outcome = world.build_building("farm").unwrap();
        assert_eq!(outcome, BuildOutcome::Queued { ticks: 5 });
        assert_eq!(world.buildings.count("farm"), 0);
        assert_eq!(world.buildings.queue().len(), 1);
    }

    #[test]
    fn test_build_cost_escalates_with_queue() {
        let mut world = test_world();
        world.resources.add("wood", 100.0);
        world.build_building("farm").unwrap(); // 15 wood
        world.build_building("farm").unwrap(); // floor(15 * 1.4) = 21 wood
        assert_eq!(world.resources.amount("wood"), 112.0 - 15.0 - 21.0);
    }

    #[test]
    fn test_build_locked_and_unknown() {
        let mut world = test_world();
        assert!(matches!(
            world.build_building("library").unwrap_err(),
            GameError::Locked(_)
        ));
        assert!(matches!(
            world.build_building("ziggurat").unwrap_err(),
            GameError::NotFound { .. }
        ));
    }

    #[test]
    fn test_build_multiple_stops_at_funds() {
        let mut world = test_world();
        world.resources.add("wood", 30.0); // 42 wood total: huts cost 10, 13, 16, 21
        let built = world.build_multiple("hut", 10).unwrap();
        assert_eq!(built, 3);
        // A fourth would need 21 with only 3 left
        assert_eq!(world.resources.amount("wood"), 3.0);

        let err = world.build_multiple("hut", 10).unwrap_err();
        assert!(matches!(err, GameError::InsufficientResource { .. }));
    }

    #[test]
    fn test_recruit_respects_capacity() {
        let mut world = test_world();
        // Base capacity is 5
        world.recruit_villager("villager", 5).unwrap();
        let err = world.recruit_villager("villager", 1).unwrap_err();
        assert!(matches!(err, GameError::PopulationCapacity { capacity: 5 }));

        // A hut adds 2 capacity
        world.resources.add("wood", 10.0);
        world.build_building("hut").unwrap();
        world.recruit_villager("villager", 2).unwrap();
        assert_eq!(world.population.total_population(), 7);
    }

    #[test]
    fn test_assign_locked_resource_fails() {
        let mut world = test_world();
        world.recruit_villager("villager", 2).unwrap();
        let err = world.assign_villager("villager", "stone", 1).unwrap_err();
        assert!(matches!(err, GameError::Locked(_)));
    }

    #[test]
    fn test_research_flow_and_knowledge_cost() {
        let mut world = test_world();
        world.era_index = 2;
        world.resources.unlock("knowledge");
        world.resources.add("knowledge", 50.0);

        // Prerequisite not met
        let err = world.start_research("currency").unwrap_err();
        assert!(matches!(err, GameError::PrerequisiteMissing { .. }));

        world.start_research("writing").unwrap();
        assert_eq!(world.resources.amount("knowledge"), 30.0);

        // Only one research slot
        let err = world.start_research("pottery").unwrap_err();
        assert!(matches!(err, GameError::AlreadyInProgress(_)));

        // Cancel forfeits the 20 knowledge
        world.cancel_research().unwrap();
        assert_eq!(world.resources.amount("knowledge"), 30.0);
        assert!(matches!(
            world.cancel_research().unwrap_err(),
            GameError::NothingInProgress(_)
        ));

        // Completion merges effects and is not repeatable
        world.start_research("writing").unwrap();
        assert_eq!(world.resources.amount("knowledge"), 10.0);
        for _ in 0..10 {
            world.advance_research();
        }
        assert!(world.research.is_researched("writing"));
        assert!((world.bonuses.production_flat["knowledge"] - 0.1).abs() < 1e-9);
        let err = world.start_research("writing").unwrap_err();
        assert!(matches!(err, GameError::AlreadyResearched { .. }));
    }

    #[test]
    fn test_research_era_gate() {
        let mut world = test_world();
        world.resources.unlock("knowledge");
        world.resources.add("knowledge", 500.0);
        let err = world.start_research("writing").unwrap_err();
        assert!(matches!(err, GameError::EraRequired { .. }));
    }

    #[test]
    fn test_launch_expedition_requires_soldiers() {
        let mut world = test_world();
        world.era_index = 2;
        world.population.unlock("soldier");

        let err = world.launch_expedition("scout_the_frontier").unwrap_err();
        match err {
            GameError::InsufficientWorkers { required, available, .. } => {
                assert_eq!(required, 2);
                assert_eq!(available, 0);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(world.military.active().is_none());

        world.population.recruit("soldier", 2).unwrap();
        world.launch_expedition("scout_the_frontier").unwrap();
        assert!(world.military.in_progress());

        let err = world.launch_expedition("scout_the_frontier").unwrap_err();
        assert!(matches!(err, GameError::AlreadyInProgress(_)));
    }

    #[test]
    fn test_prestige_gate_and_reset() {
        let mut world = test_world();
        let err = world.do_prestige().unwrap_err();
        assert!(matches!(err, GameError::PrestigeUnavailable { .. }));

        // Force a developed medieval run
        world.era_index = 3;
        world.resources.add("food", 100.0);
        world.recruit_villager("villager", 3).unwrap();
        world.buildings.unlock("hut");
        world.build_building("hut").unwrap();

        let points = world.do_prestige().unwrap();
        assert!(points >= 1);
        assert_eq!(world.prestige.level(), 1);
        assert_eq!(world.era_index, 0);
        assert_eq!(world.tick, 0);
        assert_eq!(world.population.total_population(), 0);
        assert_eq!(world.buildings.total_built(), 0);
        // Fresh starting resources again
        assert_eq!(world.resources.amount("food"), 15.0);
        assert!(!world.resources.is_unlocked("iron"));
    }

    #[test]
    fn test_prestige_starting_resource_upgrade_applies() {
        let mut world = test_world();
        world.era_index = 3;
        world.do_prestige().unwrap();
        // Bank enough for head_start and buy it
        world.prestige.record_prestige(10);
        world.buy_prestige_upgrade("head_start").unwrap();

        world.era_index = 3;
        world.do_prestige().unwrap();
        assert_eq!(world.resources.amount("food"), 40.0); // 15 + 25
        assert_eq!(world.resources.amount("wood"), 37.0); // 12 + 25
    }

    #[test]
    fn test_tick_interval_responds_to_bonuses() {
        let mut world = test_world();
        let base = world.tick_interval_ms;
        world
            .bonuses
            .absorb(&[Effect::new(EffectKind::TickSpeed, None, 1.0)]);
        world.update_tick_interval();
        assert_eq!(world.tick_interval_ms, base / 2);
    }

    #[test]
    fn test_locked_resources_never_accumulate() {
        let mut world = test_world();
        // A quarry would produce stone, but stone is locked in era 0
        world.buildings.unlock("quarry");
        world.resources.add("wood", 100.0);
        world.build_building("quarry").unwrap();
        for _ in 0..10 {
            world.advance_construction();
        }
        assert_eq!(world.buildings.count("quarry"), 1);
        world.recompute_rates();
        assert_eq!(world.resources.rate("stone"), 0.0);
    }
}
