//! Milestone tracker - one-shot achievement and chain completion

use ahash::AHashSet;
use serde::{Deserialize, Serialize};

use crate::catalog::{Catalog, ChainDef, Condition, MilestoneDef};
use crate::core::types::EraIndex;

/// The world facts milestone predicates are evaluated against
///
/// A plain read-only value bundle so predicate evaluation stays pure and
/// side-effect free.
#[derive(Debug, Clone, Copy)]
pub struct MilestoneFacts<'a> {
    pub catalog: &'a Catalog,
    pub resources: &'a crate::state::resources::ResourceLedger,
    pub buildings: &'a crate::state::buildings::BuildingRegistry,
    pub population: &'a crate::state::population::PopulationRoster,
    pub tech_count: u32,
    pub expeditions_completed: u32,
    pub era: EraIndex,
}

/// Tracks which milestones and chains have completed, and earned titles
///
/// Completion is monotonic: a key enters the completed set exactly once,
/// so rewards fire exactly once even if the predicate stays true.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MilestoneTracker {
    completed: AHashSet<String>,
    completed_chains: AHashSet<String>,
    titles: Vec<String>,
}

impl MilestoneTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_completed(&self, key: &str) -> bool {
        self.completed.contains(key)
    }

    pub fn is_chain_completed(&self, key: &str) -> bool {
        self.completed_chains.contains(key)
    }

    pub fn completed_count(&self) -> u32 {
        self.completed.len() as u32
    }

    pub fn completed(&self) -> impl Iterator<Item = &String> {
        self.completed.iter()
    }

    pub fn titles(&self) -> &[String] {
        &self.titles
    }

    /// Milestones whose predicates hold but are not yet completed
    ///
    /// Pure: does not mutate the tracker. The caller marks completion and
    /// applies rewards on the transition edge.
    pub fn newly_satisfied<'a>(&self, facts: &MilestoneFacts<'a>) -> Vec<&'a MilestoneDef> {
        facts
            .catalog
            .milestones
            .iter()
            .filter(|def| !self.completed.contains(&def.key))
            .filter(|def| def.conditions.iter().all(|c| holds(c, facts)))
            .collect()
    }

    /// Mark one milestone completed; returns false if it already was
    pub fn mark_completed(&mut self, key: &str) -> bool {
        self.completed.insert(key.to_string())
    }

    /// Chains whose members are all complete but which are not yet marked
    pub fn newly_completed_chains<'a>(&self, catalog: &'a Catalog) -> Vec<&'a ChainDef> {
        catalog
            .chains
            .iter()
            .filter(|chain| !self.completed_chains.contains(&chain.key))
            .filter(|chain| chain.members.iter().all(|m| self.completed.contains(m)))
            .collect()
    }

    /// Mark a chain completed and record its title
    pub fn mark_chain_completed(&mut self, chain: &ChainDef) -> bool {
        if self.completed_chains.insert(chain.key.clone()) {
            self.titles.push(chain.title.clone());
            true
        } else {
            false
        }
    }
}

/// Evaluate one milestone condition against the world facts
fn holds(condition: &Condition, facts: &MilestoneFacts<'_>) -> bool {
    match condition {
        Condition::ResourceAtLeast { resource, amount } => {
            facts.resources.amount(resource) >= *amount
        }
        Condition::BuildingCountAtLeast { building, count } => {
            facts.buildings.count(building) >= *count
        }
        Condition::TotalBuildingsAtLeast { count } => facts.buildings.total_count() >= *count,
        Condition::PopulationAtLeast { count } => facts.population.total_population() >= *count,
        Condition::TechCountAtLeast { count } => facts.tech_count >= *count,
        Condition::SoldiersAtLeast { count } => {
            facts.population.count(&facts.catalog.soldier_key) >= *count
        }
        Condition::WonderCountAtLeast { count } => {
            facts
                .buildings
                .count_in_category(facts.catalog, crate::core::types::BuildingCategory::Wonder)
                >= *count
        }
        Condition::ExpeditionsCompletedAtLeast { count } => {
            facts.expeditions_completed >= *count
        }
        Condition::EraAtLeast { era } => facts.era >= *era,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::standard::standard_catalog;
    use crate::state::buildings::BuildingRegistry;
    use crate::state::population::PopulationRoster;
    use crate::state::resources::ResourceLedger;

    struct World {
        catalog: Catalog,
        resources: ResourceLedger,
        buildings: BuildingRegistry,
        population: PopulationRoster,
    }

    fn world() -> World {
        let catalog = standard_catalog().unwrap();
        let unlocked = catalog.unlocked_through(2);
        World {
            resources: ResourceLedger::new(&catalog, &unlocked.resources),
            buildings: BuildingRegistry::new(&unlocked.buildings),
            population: PopulationRoster::new(&catalog, &unlocked.workforce),
            catalog,
        }
    }

    fn facts<'a>(w: &'a World, era: EraIndex) -> MilestoneFacts<'a> {
        MilestoneFacts {
            catalog: &w.catalog,
            resources: &w.resources,
            buildings: &w.buildings,
            population: &w.population,
            tech_count: 0,
            expeditions_completed: 0,
            era,
        }
    }

    #[test]
    fn test_milestone_fires_once() {
        let mut w = world();
        w.resources.add("food", 60.0); // 15 starting + 60 > 50

        let mut tracker = MilestoneTracker::new();
        let newly: Vec<String> = tracker
            .newly_satisfied(&facts(&w, 0))
            .iter()
            .map(|d| d.key.clone())
            .collect();
        assert!(newly.contains(&"first_harvest".to_string()));

        assert!(tracker.mark_completed("first_harvest"));
        // Predicate still true, but the milestone no longer surfaces
        let again: Vec<String> = tracker
            .newly_satisfied(&facts(&w, 0))
            .iter()
            .map(|d| d.key.clone())
            .collect();
        assert!(!again.contains(&"first_harvest".to_string()));
        // Second mark reports already-completed
        assert!(!tracker.mark_completed("first_harvest"));
    }

    #[test]
    fn test_soldier_and_wonder_conditions() {
        let mut w = world();
        w.population.recruit("soldier", 10).unwrap();
        w.buildings.complete("cathedral");

        let tracker = MilestoneTracker::new();
        let keys: Vec<String> = tracker
            .newly_satisfied(&facts(&w, 0))
            .iter()
            .map(|d| d.key.clone())
            .collect();
        assert!(keys.contains(&"standing_army".to_string()));
        assert!(keys.contains(&"wonder_of_the_world".to_string()));
    }

    #[test]
    fn test_chain_completion_after_all_members() {
        let w = world();
        let mut tracker = MilestoneTracker::new();
        tracker.mark_completed("first_harvest");
        tracker.mark_completed("woodworker");
        assert!(tracker.newly_completed_chains(&w.catalog).is_empty());

        tracker.mark_completed("hamlet");
        let chains = tracker.newly_completed_chains(&w.catalog);
        assert_eq!(chains.len(), 1);
        assert_eq!(chains[0].key, "foundations");

        let chain = chains[0].clone();
        assert!(tracker.mark_chain_completed(&chain));
        assert_eq!(tracker.titles(), &["Founder".to_string()]);
        // Chain also fires only once
        assert!(!tracker.mark_chain_completed(&chain));
        assert!(tracker.newly_completed_chains(&w.catalog).is_empty());
    }

    #[test]
    fn test_era_condition() {
        let w = world();
        let tracker = MilestoneTracker::new();
        let at_start: Vec<String> = tracker
            .newly_satisfied(&facts(&w, 0))
            .iter()
            .map(|d| d.key.clone())
            .collect();
        assert!(!at_start.contains(&"age_of_legends".to_string()));

        let at_medieval: Vec<String> = tracker
            .newly_satisfied(&facts(&w, 3))
            .iter()
            .map(|d| d.key.clone())
            .collect();
        assert!(at_medieval.contains(&"age_of_legends".to_string()));
    }
}
