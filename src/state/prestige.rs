//! Prestige ledger - the only state that survives a world reset

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::catalog::effect::BonusPool;
use crate::catalog::Catalog;
use crate::core::config::EngineConfig;
use crate::core::error::{GameError, Result};
use crate::core::types::EraIndex;

/// Stats of the current run that feed the prestige score
#[derive(Debug, Clone, Copy)]
pub struct RunStats {
    pub era: EraIndex,
    pub milestones_completed: u32,
    pub techs_researched: u32,
    pub buildings_built: u32,
}

/// Tracks prestige level, banked points and purchased permanent upgrades
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PrestigeLedger {
    level: u32,
    points_available: u64,
    points_total: u64,
    /// upgrade key -> purchased tier
    upgrades: AHashMap<String, u32>,
}

impl PrestigeLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn points_available(&self) -> u64 {
        self.points_available
    }

    pub fn points_total(&self) -> u64 {
        self.points_total
    }

    pub fn tier(&self, upgrade: &str) -> u32 {
        self.upgrades.get(upgrade).copied().unwrap_or(0)
    }

    pub fn upgrades(&self) -> impl Iterator<Item = (&String, &u32)> {
        self.upgrades.iter()
    }

    /// Points the current run would bank, with diminishing returns
    ///
    /// floor((era + milestones/10 + techs/15 + buildings/50) / sqrt(level+1)),
    /// floored at 1 once the minimum prestige era has been reached.
    pub fn points_for_run(&self, config: &EngineConfig, catalog: &Catalog, stats: &RunStats) -> u64 {
        let raw = stats.era as f64
            + stats.milestones_completed as f64 / config.prestige_milestone_divisor
            + stats.techs_researched as f64 / config.prestige_tech_divisor
            + stats.buildings_built as f64 / config.prestige_building_divisor;
        let scaled = raw / ((self.level as f64 + 1.0).sqrt());
        let points = scaled.floor() as u64;
        if stats.era >= catalog.min_prestige_era {
            points.max(1)
        } else {
            points
        }
    }

    /// Record a completed prestige: bump the level and bank the points
    pub fn record_prestige(&mut self, points: u64) {
        self.level += 1;
        self.points_available += points;
        self.points_total += points;
    }

    /// Buy the next tier of an upgrade, deducting its point cost
    pub fn buy_upgrade(&mut self, catalog: &Catalog, key: &str) -> Result<u32> {
        let def = catalog.prestige_upgrade(key).ok_or_else(|| GameError::NotFound {
            kind: "prestige upgrade",
            key: key.to_string(),
        })?;
        let tier = self.tier(key);
        if tier >= def.max_tier {
            return Err(GameError::MaxCountReached {
                key: key.to_string(),
                max: def.max_tier,
            });
        }
        let cost = def.cost_at(tier);
        if self.points_available < cost {
            return Err(GameError::InsufficientResource {
                resource: "prestige points".into(),
                required: cost as f64,
                available: self.points_available as f64,
            });
        }
        self.points_available -= cost;
        let new_tier = tier + 1;
        self.upgrades.insert(key.to_string(), new_tier);
        Ok(new_tier)
    }

    /// Rebuild the permanent bonus pool from every purchased upgrade
    pub fn bonus_pool(&self, catalog: &Catalog) -> BonusPool {
        let mut pool = BonusPool::new();
        for (key, tier) in &self.upgrades {
            if let Some(def) = catalog.prestige_upgrade(key) {
                pool.absorb_scaled(&def.effects, *tier as f64);
            }
        }
        pool
    }
}
