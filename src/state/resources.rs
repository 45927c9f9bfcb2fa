//! Resource ledger - amounts, rates and storage caps per resource

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;
use crate::core::error::{GameError, Result};

/// Runtime state of a single resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceState {
    pub amount: f64,
    /// Current storage cap, recomputed from base + bonuses each tick
    pub cap: f64,
    /// Net per-tick rate from the last composition pass (may be negative)
    pub rate: f64,
    pub unlocked: bool,
}

/// Tracks amount, rate and storage cap for every resource in the catalog
///
/// All resources exist from world creation; the unlocked flag gates
/// visibility and use until the owning era is reached.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceLedger {
    resources: AHashMap<String, ResourceState>,
}

impl ResourceLedger {
    /// Create a ledger with every catalog resource at its base cap,
    /// starting amounts applied, and the given keys unlocked
    pub fn new(catalog: &Catalog, unlocked: &[String]) -> Self {
        let mut resources = AHashMap::with_capacity(catalog.resources.len());
        for def in &catalog.resources {
            resources.insert(
                def.key.clone(),
                ResourceState {
                    amount: def.starting_amount.min(def.base_cap),
                    cap: def.base_cap,
                    rate: 0.0,
                    unlocked: unlocked.contains(&def.key),
                },
            );
        }
        Self { resources }
    }

    pub fn amount(&self, key: &str) -> f64 {
        self.resources.get(key).map(|r| r.amount).unwrap_or(0.0)
    }

    pub fn cap(&self, key: &str) -> f64 {
        self.resources.get(key).map(|r| r.cap).unwrap_or(0.0)
    }

    pub fn rate(&self, key: &str) -> f64 {
        self.resources.get(key).map(|r| r.rate).unwrap_or(0.0)
    }

    pub fn is_unlocked(&self, key: &str) -> bool {
        self.resources.get(key).map(|r| r.unlocked).unwrap_or(false)
    }

    pub fn get(&self, key: &str) -> Option<&ResourceState> {
        self.resources.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ResourceState)> {
        self.resources.iter()
    }

    /// Mark a resource as usable; set once per era unlock
    pub fn unlock(&mut self, key: &str) {
        if let Some(state) = self.resources.get_mut(key) {
            state.unlocked = true;
        }
    }

    /// Add up to `amount`, clamped to the cap; returns the amount added
    pub fn add(&mut self, key: &str, amount: f64) -> f64 {
        match self.resources.get_mut(key) {
            Some(state) => {
                let space = (state.cap - state.amount).max(0.0);
                let added = amount.max(0.0).min(space);
                state.amount += added;
                added
            }
            None => 0.0,
        }
    }

    /// Check whether every cost in the vector is affordable
    pub fn can_afford(&self, costs: &[(String, f64)]) -> bool {
        costs.iter().all(|(key, cost)| self.amount(key) >= *cost)
    }

    /// Atomic payment: either every cost is deducted or none are
    pub fn pay(&mut self, costs: &[(String, f64)]) -> Result<()> {
        for (key, cost) in costs {
            let available = self.amount(key);
            if available < *cost {
                return Err(GameError::InsufficientResource {
                    resource: key.clone(),
                    required: *cost,
                    available,
                });
            }
        }
        for (key, cost) in costs {
            if let Some(state) = self.resources.get_mut(key) {
                state.amount = (state.amount - cost).max(0.0);
            }
        }
        Ok(())
    }

    /// Deduct a single cost, with the same all-or-nothing check
    pub fn spend(&mut self, key: &str, amount: f64) -> Result<()> {
        self.pay(&[(key.to_string(), amount)])
    }

    /// Install a freshly composed rate for one resource
    pub fn set_rate(&mut self, key: &str, rate: f64) {
        if let Some(state) = self.resources.get_mut(key) {
            state.rate = rate;
        }
    }

    /// Install a freshly computed storage cap for one resource
    pub fn set_cap(&mut self, key: &str, cap: f64) {
        if let Some(state) = self.resources.get_mut(key) {
            state.cap = cap.max(0.0);
            state.amount = state.amount.min(state.cap);
        }
    }

    /// Apply every resource's rate to its amount, clamped to [0, cap]
    pub fn apply_rates(&mut self) {
        for state in self.resources.values_mut() {
            state.amount = (state.amount + state.rate).clamp(0.0, state.cap);
        }
    }

    /// Zero every rate before a composition pass
    pub fn clear_rates(&mut self) {
        for state in self.resources.values_mut() {
            state.rate = 0.0;
        }
    }
}
