//! Military office - the single active expedition and cumulative loot

use ahash::AHashMap;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::catalog::ExpeditionDef;
use crate::core::config::EngineConfig;

/// The expedition currently in the field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveExpedition {
    pub expedition: String,
    pub soldiers: u32,
    pub remaining: u32,
}

/// Outcome of a resolved expedition
#[derive(Debug, Clone, PartialEq)]
pub struct ExpeditionOutcome {
    pub expedition: String,
    pub success: bool,
    /// Reward vector after success/failure scaling and reward bonuses
    pub loot: Vec<(String, f64)>,
    pub soldiers_lost: u32,
    /// Soldiers that come home (committed minus losses)
    pub soldiers_returned: u32,
}

/// Tracks at most one in-progress expedition plus lifetime totals
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MilitaryOffice {
    active: Option<ActiveExpedition>,
    completed: u32,
    loot_totals: AHashMap<String, f64>,
}

impl MilitaryOffice {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> Option<&ActiveExpedition> {
        self.active.as_ref()
    }

    pub fn in_progress(&self) -> bool {
        self.active.is_some()
    }

    pub fn completed_count(&self) -> u32 {
        self.completed
    }

    pub fn loot_totals(&self) -> &AHashMap<String, f64> {
        &self.loot_totals
    }

    /// Soldiers currently committed to the field
    pub fn committed(&self) -> u32 {
        self.active.as_ref().map(|a| a.soldiers).unwrap_or(0)
    }

    /// Occupy the expedition slot; preconditions checked by the caller
    pub fn launch(&mut self, def: &ExpeditionDef) {
        self.active = Some(ActiveExpedition {
            expedition: def.key.clone(),
            soldiers: def.soldiers_required,
            remaining: def.duration,
        });
    }

    /// Decrement the active expedition; at zero, resolve it
    ///
    /// Resolution: effective difficulty is the base reduced by the military
    /// bonus, floored; a uniform draw above it succeeds. Success pays the
    /// full reward scaled by the reward bonus with a small chance of losing
    /// one soldier; failure pays a fraction and costs 1-2 soldiers.
    pub fn advance<R: Rng>(
        &mut self,
        config: &EngineConfig,
        def: &ExpeditionDef,
        military_bonus: f64,
        reward_bonus: f64,
        rng: &mut R,
    ) -> Option<ExpeditionOutcome> {
        let active = self.active.as_mut()?;
        active.remaining = active.remaining.saturating_sub(1);
        if active.remaining > 0 {
            return None;
        }
        let active = self.active.take()?;

        let effective = (def.base_difficulty
            - military_bonus * config.military_difficulty_factor)
            .max(config.expedition_min_difficulty);
        let draw: f64 = rng.gen_range(0.0..1.0);
        let success = draw > effective;

        let (loot, soldiers_lost) = if success {
            let loot: Vec<(String, f64)> = def
                .rewards
                .iter()
                .map(|(key, amount)| (key.clone(), amount * (1.0 + reward_bonus)))
                .collect();
            let lost = if rng.gen_range(0.0..1.0) < effective * config.success_loss_factor {
                1
            } else {
                0
            };
            (loot, lost.min(active.soldiers))
        } else {
            let loot: Vec<(String, f64)> = def
                .rewards
                .iter()
                .map(|(key, amount)| (key.clone(), amount * config.failure_reward_factor))
                .collect();
            let lost = rng.gen_range(1..=2u32).min(active.soldiers);
            (loot, lost)
        };

        for (key, amount) in &loot {
            *self.loot_totals.entry(key.clone()).or_default() += amount;
        }
        self.completed += 1;

        Some(ExpeditionOutcome {
            expedition: active.expedition,
            success,
            loot,
            soldiers_lost,
            soldiers_returned: active.soldiers - soldiers_lost,
        })
    }
}
