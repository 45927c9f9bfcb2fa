//! Event scheduler - cooldown bookkeeping and active timed modifiers
//!
//! Besides fired timed events, the active pool also hosts synthetic
//! modifiers such as the milestone-chain speed boost; anything with a
//! remaining duration and an effect list lives here.

use ahash::AHashMap;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::catalog::effect::{Effect, EffectKind};
use crate::catalog::{Catalog, EventDef};
use crate::core::types::{EraIndex, Tick};

/// A timed modifier currently contributing to the active-rate pool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveModifier {
    /// Event key, or a synthetic source such as a chain boost
    pub source: String,
    pub effects: Vec<Effect>,
    pub remaining: u32,
}

/// Tracks per-event cooldowns and the pool of active timed modifiers
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventScheduler {
    last_fired: AHashMap<String, Tick>,
    active: Vec<ActiveModifier>,
}

impl EventScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> &[ActiveModifier] {
        &self.active
    }

    pub fn is_active(&self, source: &str) -> bool {
        self.active.iter().any(|m| m.source == source)
    }

    pub fn last_fired(&self, key: &str) -> Option<Tick> {
        self.last_fired.get(key).copied()
    }

    /// Remove modifiers whose remaining duration reaches zero; returns the
    /// sources that expired this tick
    pub fn expire(&mut self) -> Vec<String> {
        let mut expired = Vec::new();
        for modifier in &mut self.active {
            modifier.remaining = modifier.remaining.saturating_sub(1);
        }
        self.active.retain(|modifier| {
            if modifier.remaining == 0 {
                expired.push(modifier.source.clone());
                false
            } else {
                true
            }
        });
        expired
    }

    /// Event definitions that may fire this tick
    pub fn eligible<'a>(
        &self,
        catalog: &'a Catalog,
        era: EraIndex,
        tick: Tick,
    ) -> Vec<&'a EventDef> {
        catalog
            .events
            .iter()
            .filter(|def| def.min_era <= era)
            .filter(|def| def.min_tick <= tick)
            .filter(|def| !self.is_active(&def.key))
            .filter(|def| match self.last_fired(&def.key) {
                Some(last) => tick.saturating_sub(last) >= def.cooldown,
                None => true,
            })
            .collect()
    }

    /// Weighted random pick among the eligible events
    pub fn pick<'a, R: Rng>(&self, eligible: &[&'a EventDef], rng: &mut R) -> Option<&'a EventDef> {
        let total: f64 = eligible.iter().map(|def| def.weight).sum();
        if total <= 0.0 {
            return None;
        }
        let mut roll = rng.gen_range(0.0..total);
        for def in eligible {
            if roll < def.weight {
                return Some(def);
            }
            roll -= def.weight;
        }
        eligible.last().copied()
    }

    /// Record a firing: stamp the cooldown and enqueue durable effects
    pub fn fire(&mut self, def: &EventDef, tick: Tick) {
        self.last_fired.insert(def.key.clone(), tick);
        if def.duration > 0 && !def.effects.is_empty() {
            self.active.push(ActiveModifier {
                source: def.key.clone(),
                effects: def.effects.clone(),
                remaining: def.duration,
            });
        }
    }

    /// Push a synthetic modifier (e.g. a chain completion boost)
    pub fn push_modifier(&mut self, source: &str, effects: Vec<Effect>, duration: u32) {
        if duration == 0 || effects.is_empty() {
            return;
        }
        self.active.push(ActiveModifier {
            source: source.to_string(),
            effects,
            remaining: duration,
        });
    }

    /// Sum of flat production contributions per resource from the pool
    pub fn production_effects(&self) -> AHashMap<String, f64> {
        let mut rates = AHashMap::new();
        for modifier in &self.active {
            for effect in &modifier.effects {
                if effect.kind == EffectKind::Production {
                    if let Some(target) = &effect.target {
                        *rates.entry(target.clone()).or_default() += effect.magnitude;
                    }
                }
            }
        }
        rates
    }

    /// Sum of tick-speed contributions from the pool
    pub fn tick_speed_bonus(&self) -> f64 {
        self.active
            .iter()
            .flat_map(|modifier| &modifier.effects)
            .filter(|effect| effect.kind == EffectKind::TickSpeed)
            .map(|effect| effect.magnitude)
            .sum()
    }
}
