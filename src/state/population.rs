//! Population roster - workforce counts and per-resource assignments

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;
use crate::core::error::{GameError, Result};

/// Runtime state of one workforce type
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkforceState {
    pub count: u32,
    /// resource key -> units assigned to gather it
    pub assigned: AHashMap<String, u32>,
    pub unlocked: bool,
}

impl WorkforceState {
    pub fn assigned_total(&self) -> u32 {
        self.assigned.values().sum()
    }

    pub fn idle(&self) -> u32 {
        self.count.saturating_sub(self.assigned_total())
    }
}

/// Tracks count, idle count and work assignment per workforce type
///
/// Invariant: per type, the sum of assignments never exceeds the owned
/// count; the remainder is idle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PopulationRoster {
    types: AHashMap<String, WorkforceState>,
}

impl PopulationRoster {
    pub fn new(catalog: &Catalog, unlocked: &[String]) -> Self {
        let mut types = AHashMap::with_capacity(catalog.workforce.len());
        for def in &catalog.workforce {
            types.insert(
                def.key.clone(),
                WorkforceState {
                    count: 0,
                    assigned: AHashMap::new(),
                    unlocked: unlocked.contains(&def.key),
                },
            );
        }
        Self { types }
    }

    pub fn get(&self, key: &str) -> Option<&WorkforceState> {
        self.types.get(key)
    }

    pub fn count(&self, key: &str) -> u32 {
        self.types.get(key).map(|w| w.count).unwrap_or(0)
    }

    pub fn idle(&self, key: &str) -> u32 {
        self.types.get(key).map(|w| w.idle()).unwrap_or(0)
    }

    pub fn is_unlocked(&self, key: &str) -> bool {
        self.types.get(key).map(|w| w.unlocked).unwrap_or(false)
    }

    pub fn unlock(&mut self, key: &str) {
        if let Some(state) = self.types.get_mut(key) {
            state.unlocked = true;
        }
    }

    pub fn total_population(&self) -> u32 {
        self.types.values().map(|w| w.count).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &WorkforceState)> {
        self.types.iter()
    }

    /// Add recruits; capacity is checked by the coordinator
    pub fn recruit(&mut self, key: &str, count: u32) -> Result<()> {
        let state = self.types.get_mut(key).ok_or_else(|| GameError::NotFound {
            kind: "workforce type",
            key: key.to_string(),
        })?;
        state.count += count;
        Ok(())
    }

    /// Remove units, releasing assignments as needed (losses in battle)
    ///
    /// Idle units are removed first; if that is not enough, assignments
    /// are drained until the invariant holds again.
    pub fn remove(&mut self, key: &str, count: u32) {
        let Some(state) = self.types.get_mut(key) else {
            return;
        };
        state.count = state.count.saturating_sub(count);
        let mut excess = state.assigned_total().saturating_sub(state.count);
        if excess > 0 {
            for assigned in state.assigned.values_mut() {
                let take = (*assigned).min(excess);
                *assigned -= take;
                excess -= take;
                if excess == 0 {
                    break;
                }
            }
            state.assigned.retain(|_, v| *v > 0);
        }
    }

    /// Assign idle units of a type to gather one resource
    pub fn assign(&mut self, catalog: &Catalog, key: &str, resource: &str, count: u32) -> Result<()> {
        let def = catalog.workforce_type(key).ok_or_else(|| GameError::NotFound {
            kind: "workforce type",
            key: key.to_string(),
        })?;
        if !def.gathers.iter().any(|r| r == resource) {
            return Err(GameError::CannotGather {
                workforce: key.to_string(),
                resource: resource.to_string(),
            });
        }
        let state = self.types.get_mut(key).ok_or_else(|| GameError::NotFound {
            kind: "workforce type",
            key: key.to_string(),
        })?;
        let idle = state.idle();
        if idle < count {
            return Err(GameError::InsufficientWorkers {
                workforce: key.to_string(),
                required: count,
                available: idle,
            });
        }
        *state.assigned.entry(resource.to_string()).or_default() += count;
        Ok(())
    }

    /// Return assigned units of a type to the idle pool
    pub fn unassign(&mut self, key: &str, resource: &str, count: u32) -> Result<()> {
        let state = self.types.get_mut(key).ok_or_else(|| GameError::NotFound {
            kind: "workforce type",
            key: key.to_string(),
        })?;
        let assigned = state.assigned.get(resource).copied().unwrap_or(0);
        if assigned < count {
            return Err(GameError::InsufficientWorkers {
                workforce: key.to_string(),
                required: count,
                available: assigned,
            });
        }
        if assigned == count {
            state.assigned.remove(resource);
        } else if let Some(entry) = state.assigned.get_mut(resource) {
            *entry -= count;
        }
        Ok(())
    }

    /// Total food consumed per tick by the whole population
    pub fn food_upkeep(&self, catalog: &Catalog) -> f64 {
        self.types
            .iter()
            .filter_map(|(key, state)| {
                catalog
                    .workforce_type(key)
                    .map(|def| def.food_upkeep * state.count as f64)
            })
            .sum()
    }

    /// Per-resource base production from assignments (gather rate x count)
    pub fn base_gather_rates(&self, catalog: &Catalog) -> AHashMap<String, f64> {
        let mut rates = AHashMap::new();
        for (key, state) in &self.types {
            let Some(def) = catalog.workforce_type(key) else {
                continue;
            };
            for (resource, assigned) in &state.assigned {
                *rates.entry(resource.clone()).or_default() +=
                    def.gather_rate * *assigned as f64;
            }
        }
        rates
    }
}
