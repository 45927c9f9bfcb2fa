//! Rate composition pipeline
//!
//! Rates are rebuilt from zero every tick, never accumulated across ticks.
//! The pass order below is a contract: positive-only multipliers must not
//! touch negative event rates, and the gather-rate bonus is re-applied
//! additively on top of the multiplicative passes. Each pass is a pure
//! function so it can be tested in isolation with exact expected values.

use ahash::AHashMap;

use crate::catalog::effect::{BonusPool, EffectKind};
use crate::catalog::Catalog;
use crate::core::types::FOOD_KEY;
use crate::state::buildings::BuildingRegistry;
use crate::state::events::EventScheduler;
use crate::state::population::PopulationRoster;

/// Per-resource rates and storage caps produced by one composition pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RateOutcome {
    pub rates: AHashMap<String, f64>,
    pub caps: AHashMap<String, f64>,
}

/// Pass 1: base production from buildings (effect magnitude x owned count)
pub fn base_building_rates(
    catalog: &Catalog,
    buildings: &BuildingRegistry,
) -> AHashMap<String, f64> {
    let mut rates = AHashMap::new();
    for (key, count) in buildings.iter_counts() {
        let Some(def) = catalog.building(key) else {
            continue;
        };
        for effect in &def.effects {
            if effect.kind == EffectKind::Production {
                if let Some(target) = &effect.target {
                    *rates.entry(target.clone()).or_default() +=
                        effect.magnitude * *count as f64;
                }
            }
        }
    }
    rates
}

/// Pass 2: base production from workforce assignments
pub fn base_workforce_rates(
    catalog: &Catalog,
    population: &PopulationRoster,
) -> AHashMap<String, f64> {
    population.base_gather_rates(catalog)
}

/// Passes 3-4: multiply currently-positive rates by (1 + bonus)
///
/// The positive-only guard is load-bearing: a drought's negative rate must
/// not be amplified by production bonuses.
pub fn apply_positive_mult(rates: &mut AHashMap<String, f64>, bonus_for: impl Fn(&str) -> f64) {
    for (key, rate) in rates.iter_mut() {
        if *rate > 0.0 {
            *rate *= 1.0 + bonus_for(key);
        }
    }
}

/// Pass 5: additive gather-rate bonus on top of the multiplicative passes
///
/// Adds `base_workforce_rate x gather_bonus` per resource. Deliberately
/// additive rather than compounding; kept for compatibility with the
/// established numbers.
pub fn apply_gather_bonus(
    rates: &mut AHashMap<String, f64>,
    workforce_base: &AHashMap<String, f64>,
    gather_bonus: f64,
) {
    if gather_bonus == 0.0 {
        return;
    }
    for (key, base) in workforce_base {
        *rates.entry(key.clone()).or_default() += base * gather_bonus;
    }
}

/// Passes 6-7: flat additions (research/permanent flats, then events)
pub fn apply_flat(rates: &mut AHashMap<String, f64>, flat: &AHashMap<String, f64>) {
    for (key, amount) in flat {
        *rates.entry(key.clone()).or_default() += amount;
    }
}

/// Pass 8: subtract total food upkeep from the food rate only
pub fn apply_food_upkeep(rates: &mut AHashMap<String, f64>, upkeep: f64) {
    if upkeep > 0.0 {
        *rates.entry(FOOD_KEY.to_string()).or_default() -= upkeep;
    }
}

/// Pass 9: storage caps from base + all-storage + per-resource bonuses
pub fn compose_caps(catalog: &Catalog, bonuses: &BonusPool) -> AHashMap<String, f64> {
    let mut caps = AHashMap::with_capacity(catalog.resources.len());
    for def in &catalog.resources {
        let cap = def.base_cap + bonuses.storage_all + bonuses.storage_for(&def.key);
        caps.insert(def.key.clone(), cap.max(0.0));
    }
    caps
}

/// Run the full ordered pipeline
///
/// `bonuses` is the merged pool from research, permanent milestone rewards,
/// prestige upgrades and building effects (excluding building flat
/// production, which is pass 1).
pub fn compose(
    catalog: &Catalog,
    buildings: &BuildingRegistry,
    population: &PopulationRoster,
    events: &EventScheduler,
    bonuses: &BonusPool,
) -> RateOutcome {
    // 1-2: base rates from buildings, then workforce
    let mut rates = base_building_rates(catalog, buildings);
    let workforce_base = base_workforce_rates(catalog, population);
    for (key, base) in &workforce_base {
        *rates.entry(key.clone()).or_default() += base;
    }

    // 3: global production multiplier, positive rates only
    apply_positive_mult(&mut rates, |_| bonuses.all_production);

    // 4: per-resource multiplier, same guard
    apply_positive_mult(&mut rates, |key| bonuses.production_mult_for(key));

    // 5: additive gather-rate bonus
    apply_gather_bonus(&mut rates, &workforce_base, bonuses.gather_rate);

    // 6: flat production from research and other permanent sources
    apply_flat(&mut rates, &bonuses.production_flat);

    // 7: active timed modifiers
    apply_flat(&mut rates, &events.production_effects());

    // 8: food upkeep
    apply_food_upkeep(&mut rates, population.food_upkeep(catalog));

    // 9: storage caps
    let caps = compose_caps(catalog, bonuses);

    RateOutcome { rates, caps }
}
