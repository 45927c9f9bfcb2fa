//! Effects and the bonus pool they accumulate into
//!
//! Buildings, technologies, timed events, milestone rewards and prestige
//! upgrades all describe what they do as a list of [`Effect`] values. At
//! runtime those effects are folded into [`BonusPool`] accumulators which
//! the rate pipeline reads in a fixed order.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

/// What a single effect changes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectKind {
    /// Flat per-tick rate added to the target resource
    Production,
    /// Multiplier on the target resource's positive rate (+0.1 = +10%)
    ProductionMult,
    /// Multiplier on every positive rate
    AllProductionMult,
    /// Additive bonus re-applied to the workforce-sourced base rate
    GatherRate,
    /// Storage cap added to the target resource
    Storage,
    /// Storage cap added to every resource
    StorageAll,
    /// Additional population capacity
    PopulationCap,
    /// Military strength (reduces expedition difficulty)
    Military,
    /// Multiplier on expedition rewards
    ExpeditionReward,
    /// Tick-speed multiplier contribution
    TickSpeed,
    /// Resource granted after a prestige reset (prestige upgrades only)
    StartingResource,
}

/// A single (kind, target, magnitude) effect from the content catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Effect {
    pub kind: EffectKind,
    /// Resource key for per-resource kinds; None for global kinds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    pub magnitude: f64,
}

impl Effect {
    pub fn new(kind: EffectKind, target: Option<&str>, magnitude: f64) -> Self {
        Self {
            kind,
            target: target.map(str::to_string),
            magnitude,
        }
    }

    /// True if this kind requires a resource target
    pub fn needs_target(kind: EffectKind) -> bool {
        matches!(
            kind,
            EffectKind::Production
                | EffectKind::ProductionMult
                | EffectKind::Storage
                | EffectKind::StartingResource
        )
    }
}

/// Accumulator from effect targets to cumulative magnitudes
///
/// One pool per bonus source category: the permanent accumulator (research
/// plus milestone rewards), the prestige pool (rebuilt from purchased
/// upgrades), and a transient per-tick pool for building effects. Pools
/// are merged additively before the rate pipeline reads them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BonusPool {
    pub all_production: f64,
    pub gather_rate: f64,
    pub tick_speed: f64,
    pub military: f64,
    pub expedition_reward: f64,
    pub population_cap: f64,
    pub storage_all: f64,
    /// Per-resource production multipliers
    pub production_mult: AHashMap<String, f64>,
    /// Per-resource flat per-tick additions
    pub production_flat: AHashMap<String, f64>,
    /// Per-resource storage cap additions
    pub storage: AHashMap<String, f64>,
    /// Resources granted at the start of a run
    pub starting_resources: AHashMap<String, f64>,
}

impl BonusPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold a list of effects into the pool at 1x scale
    pub fn absorb(&mut self, effects: &[Effect]) {
        self.absorb_scaled(effects, 1.0);
    }

    /// Fold a list of effects into the pool, scaling every magnitude
    ///
    /// Scale is the owned-building count or the purchased upgrade tier.
    pub fn absorb_scaled(&mut self, effects: &[Effect], scale: f64) {
        for effect in effects {
            let amount = effect.magnitude * scale;
            match effect.kind {
                EffectKind::AllProductionMult => self.all_production += amount,
                EffectKind::GatherRate => self.gather_rate += amount,
                EffectKind::TickSpeed => self.tick_speed += amount,
                EffectKind::Military => self.military += amount,
                EffectKind::ExpeditionReward => self.expedition_reward += amount,
                EffectKind::PopulationCap => self.population_cap += amount,
                EffectKind::StorageAll => self.storage_all += amount,
                EffectKind::Production => {
                    if let Some(target) = &effect.target {
                        *self.production_flat.entry(target.clone()).or_default() += amount;
                    }
                }
                EffectKind::ProductionMult => {
                    if let Some(target) = &effect.target {
                        *self.production_mult.entry(target.clone()).or_default() += amount;
                    }
                }
                EffectKind::Storage => {
                    if let Some(target) = &effect.target {
                        *self.storage.entry(target.clone()).or_default() += amount;
                    }
                }
                EffectKind::StartingResource => {
                    if let Some(target) = &effect.target {
                        *self.starting_resources.entry(target.clone()).or_default() += amount;
                    }
                }
            }
        }
    }

    /// Additive merge of another pool into this one
    pub fn merge(&mut self, other: &BonusPool) {
        self.all_production += other.all_production;
        self.gather_rate += other.gather_rate;
        self.tick_speed += other.tick_speed;
        self.military += other.military;
        self.expedition_reward += other.expedition_reward;
        self.population_cap += other.population_cap;
        self.storage_all += other.storage_all;
        for (key, value) in &other.production_mult {
            *self.production_mult.entry(key.clone()).or_default() += value;
        }
        for (key, value) in &other.production_flat {
            *self.production_flat.entry(key.clone()).or_default() += value;
        }
        for (key, value) in &other.storage {
            *self.storage.entry(key.clone()).or_default() += value;
        }
        for (key, value) in &other.starting_resources {
            *self.starting_resources.entry(key.clone()).or_default() += value;
        }
    }

    /// Combined pool from several sources, in one pass
    pub fn combined(pools: &[&BonusPool]) -> BonusPool {
        let mut merged = BonusPool::new();
        for pool in pools {
            merged.merge(pool);
        }
        merged
    }

    pub fn production_mult_for(&self, resource: &str) -> f64 {
        self.production_mult.get(resource).copied().unwrap_or(0.0)
    }

    pub fn storage_for(&self, resource: &str) -> f64 {
        self.storage.get(resource).copied().unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absorb_scalar_kinds() {
        let mut pool = BonusPool::new();
        pool.absorb(&[
            Effect::new(EffectKind::AllProductionMult, None, 0.1),
            Effect::new(EffectKind::Military, None, 0.25),
            Effect::new(EffectKind::TickSpeed, None, 0.2),
        ]);
        assert!((pool.all_production - 0.1).abs() < 1e-9);
        assert!((pool.military - 0.25).abs() < 1e-9);
        assert!((pool.tick_speed - 0.2).abs() < 1e-9);
    }

    #[test]
    fn test_absorb_targeted_kinds_accumulate() {
        let mut pool = BonusPool::new();
        pool.absorb(&[
            Effect::new(EffectKind::ProductionMult, Some("gold"), 0.1),
            Effect::new(EffectKind::ProductionMult, Some("gold"), 0.15),
            Effect::new(EffectKind::Storage, Some("food"), 100.0),
        ]);
        assert!((pool.production_mult_for("gold") - 0.25).abs() < 1e-9);
        assert!((pool.storage_for("food") - 100.0).abs() < 1e-9);
        assert_eq!(pool.production_mult_for("wood"), 0.0);
    }

    #[test]
    fn test_absorb_scaled_by_count() {
        let mut pool = BonusPool::new();
        let effects = [Effect::new(EffectKind::PopulationCap, None, 2.0)];
        pool.absorb_scaled(&effects, 3.0);
        assert!((pool.population_cap - 6.0).abs() < 1e-9);
    }

    #[test]
    fn test_merge_is_additive() {
        let mut a = BonusPool::new();
        a.absorb(&[Effect::new(EffectKind::Production, Some("food"), 0.5)]);
        let mut b = BonusPool::new();
        b.absorb(&[
            Effect::new(EffectKind::Production, Some("food"), 0.25),
            Effect::new(EffectKind::GatherRate, None, 0.1),
        ]);

        let merged = BonusPool::combined(&[&a, &b]);
        assert!((merged.production_flat["food"] - 0.75).abs() < 1e-9);
        assert!((merged.gather_rate - 0.1).abs() < 1e-9);
    }

    #[test]
    fn test_same_target_from_multiple_sources() {
        // Two techs contributing to the same target key must stack
        let mut pool = BonusPool::new();
        pool.absorb(&[Effect::new(EffectKind::ProductionMult, Some("knowledge"), 0.25)]);
        pool.absorb(&[Effect::new(EffectKind::ProductionMult, Some("knowledge"), 0.4)]);
        assert!((pool.production_mult_for("knowledge") - 0.65).abs() < 1e-9);
    }
}
