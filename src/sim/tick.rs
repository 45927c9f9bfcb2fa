//! Tick pipeline - advances the whole world by one simulation step
//!
//! The step order is fixed: construction, research, events, expedition,
//! rate recomposition, rate application, milestones, era advancement,
//! tick-speed update. Commands issued between ticks observe only fully
//! consistent states because the engine holds one exclusive lock around
//! the entire pipeline.

use serde::{Deserialize, Serialize};

use crate::core::types::Tick;
use crate::sim::world::GameWorld;

/// Events published on the bus for collaborators that react without polling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    BuildingCompleted { building: String, count: u32 },
    ResearchCompleted { tech: String },
    EventFired { event: String },
    ExpeditionResolved { expedition: String, success: bool, soldiers_lost: u32 },
    MilestoneCompleted { milestone: String },
    ChainCompleted { chain: String, title: String },
    EraAdvanced { era: String },
    PrestigeCompleted { level: u32, points: u64 },
}

/// Execute exactly one tick; events collect in the world's pending buffer
pub fn run_tick(world: &mut GameWorld) -> Tick {
    world.tick += 1;

    // 1. Construction queue
    world.advance_construction();

    // 2. Research progress
    world.advance_research();

    // 3. Timed events: expiry, weighted pick, fire gate
    world.roll_events();

    // 4. Active expedition
    world.advance_expedition();

    // 5-6. Rates rebuilt from zero, then applied under clamps
    world.recompute_rates();
    world.resources.apply_rates();

    // 7. Milestones and chains
    world.evaluate_milestones();

    // 8. Era advancement
    world.evaluate_era();

    // 9. Tick-speed multiplier for the scheduler
    world.update_tick_interval();

    tracing::debug!(tick = world.tick, interval_ms = world.tick_interval_ms, "tick complete");
    world.tick
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::standard::standard_catalog;
    use crate::core::config::EngineConfig;
    use crate::sim::world::BuildOutcome;
    use std::sync::Arc;

    fn world() -> GameWorld {
        let catalog = Arc::new(standard_catalog().unwrap());
        GameWorld::new(catalog, EngineConfig::default())
    }

    #[test]
    fn test_tick_advances_counter() {
        let mut w = world();
        assert_eq!(run_tick(&mut w), 1);
        assert_eq!(run_tick(&mut w), 2);
    }

    #[test]
    fn test_construction_completes_through_ticks() {
        let mut w = world();
        w.resources.add("wood", 50.0);
        assert_eq!(
            w.build_building("farm").unwrap(),
            BuildOutcome::Queued { ticks: 5 }
        );
        w.drain_events();

        for _ in 0..4 {
            run_tick(&mut w);
            assert_eq!(w.buildings.count("farm"), 0);
        }
        run_tick(&mut w);
        assert_eq!(w.buildings.count("farm"), 1);
        let events = w.drain_events();
        assert!(events.contains(&GameEvent::BuildingCompleted {
            building: "farm".into(),
            count: 1
        }));
    }

    #[test]
    fn test_rates_apply_with_clamps_every_tick() {
        let mut w = world();
        w.resources.add("wood", 50.0);
        w.build_building("farm").unwrap();
        for _ in 0..5 {
            run_tick(&mut w);
        }
        let before = w.resources.amount("food");
        run_tick(&mut w);
        // One farm: +0.5 food per tick, no population upkeep
        assert!((w.resources.amount("food") - (before + 0.5)).abs() < 1e-9);

        // Amounts never escape [0, cap] no matter how long we run
        for _ in 0..2000 {
            run_tick(&mut w);
            let food = w.resources.amount("food");
            assert!(food >= 0.0 && food <= w.resources.cap("food"));
        }
    }

    #[test]
    fn test_research_completes_through_ticks() {
        let mut w = world();
        w.era_index = 2;
        w.resources.unlock("knowledge");
        w.resources.add("knowledge", 30.0);
        w.start_research("writing").unwrap();
        w.drain_events();

        for _ in 0..10 {
            run_tick(&mut w);
        }
        assert!(w.research.is_researched("writing"));
        let events = w.drain_events();
        assert!(events.contains(&GameEvent::ResearchCompleted { tech: "writing".into() }));
    }

    #[test]
    fn test_era_advances_when_thresholds_met() {
        let mut w = world();
        w.resources.add("food", 120.0);
        w.resources.add("wood", 188.0);
        w.build_building("hut").unwrap();
        w.build_building("hut").unwrap();
        w.build_building("farm").unwrap();
        w.drain_events();

        let mut advanced = false;
        for _ in 0..10 {
            run_tick(&mut w);
            if w.era_index == 1 {
                advanced = true;
                break;
            }
        }
        assert!(advanced, "era should advance once the farm completes");
        assert!(w.resources.is_unlocked("stone"));
        assert!(w.buildings.is_unlocked("quarry"));
        assert_eq!(w.era_history.last().unwrap().era, "bronze_age");
    }

    #[test]
    fn test_expedition_resolves_through_ticks() {
        let mut w = world();
        w.era_index = 2;
        w.population.unlock("soldier");
        w.population.recruit("soldier", 5).unwrap();
        w.launch_expedition("scout_the_frontier").unwrap();
        w.drain_events();

        for _ in 0..10 {
            run_tick(&mut w);
        }
        assert!(!w.military.in_progress());
        assert_eq!(w.military.completed_count(), 1);
        let events = w.drain_events();
        assert!(events
            .iter()
            .any(|e| matches!(e, GameEvent::ExpeditionResolved { .. })));
    }

    #[test]
    fn test_milestone_completes_once_through_ticks() {
        let mut w = world();
        w.resources.add("food", 100.0);
        run_tick(&mut w);
        let events = w.drain_events();
        let fired = events
            .iter()
            .filter(|e| matches!(e, GameEvent::MilestoneCompleted { milestone } if milestone == "first_harvest"))
            .count();
        assert_eq!(fired, 1);

        // Predicate stays true, reward must not repeat
        for _ in 0..5 {
            run_tick(&mut w);
        }
        let events = w.drain_events();
        assert!(!events
            .iter()
            .any(|e| matches!(e, GameEvent::MilestoneCompleted { milestone } if milestone == "first_harvest")));
    }

    #[test]
    fn test_chain_boost_expires() {
        let mut w = world();
        w.milestones.mark_completed("first_harvest");
        w.milestones.mark_completed("woodworker");
        w.milestones.mark_completed("hamlet");
        run_tick(&mut w);
        assert!(w.milestones.is_chain_completed("foundations"));
        assert!(w.events.tick_speed_bonus() > 0.0);
        let boosted = w.tick_interval_ms;
        assert!(boosted < w.config.base_tick_interval_ms);

        // Boost lasts 50 ticks from when it was pushed
        for _ in 0..51 {
            run_tick(&mut w);
        }
        assert_eq!(w.events.tick_speed_bonus(), 0.0);
        assert_eq!(w.tick_interval_ms, w.config.base_tick_interval_ms);
    }

    #[test]
    fn test_event_gate_keeps_frequency_low() {
        let mut w = world();
        // Run long enough for eligibility, count fired events
        let mut fired = 0;
        for _ in 0..500 {
            run_tick(&mut w);
            fired += w
                .drain_events()
                .iter()
                .filter(|e| matches!(e, GameEvent::EventFired { .. }))
                .count();
        }
        // With an 8% gate and 60+ tick cooldowns, the count stays small
        assert!(fired < 40, "{fired} events in 500 ticks is too many");
    }
}
