//! Building registry - owned counts, unlocks and the construction queue

use ahash::{AHashMap, AHashSet};
use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;
use crate::core::types::BuildingCategory;

/// A building purchase waiting out its construction duration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstructionEntry {
    pub building: String,
    pub remaining: u32,
    pub total: u32,
}

/// Tracks owned count and unlock status per building type
///
/// Counts only increase while a run lasts; a prestige reset recreates the
/// registry from scratch. `total_built` feeds the prestige score.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BuildingRegistry {
    counts: AHashMap<String, u32>,
    unlocked: AHashSet<String>,
    queue: Vec<ConstructionEntry>,
    /// Cumulative completions this run, including instant builds
    total_built: u32,
}

impl BuildingRegistry {
    pub fn new(unlocked: &[String]) -> Self {
        Self {
            counts: AHashMap::new(),
            unlocked: unlocked.iter().cloned().collect(),
            queue: Vec::new(),
            total_built: 0,
        }
    }

    pub fn count(&self, key: &str) -> u32 {
        self.counts.get(key).copied().unwrap_or(0)
    }

    pub fn total_built(&self) -> u32 {
        self.total_built
    }

    pub fn is_unlocked(&self, key: &str) -> bool {
        self.unlocked.contains(key)
    }

    pub fn unlock(&mut self, key: &str) {
        self.unlocked.insert(key.to_string());
    }

    pub fn queue(&self) -> &[ConstructionEntry] {
        &self.queue
    }

    /// Number of queued entries for one building type
    pub fn queued_count(&self, key: &str) -> u32 {
        self.queue.iter().filter(|e| e.building == key).count() as u32
    }

    /// Record a completed construction and bump the counters
    pub fn complete(&mut self, key: &str) -> u32 {
        let count = self.counts.entry(key.to_string()).or_insert(0);
        *count += 1;
        self.total_built += 1;
        *count
    }

    /// Add an entry for a building with a nonzero construction duration
    pub fn enqueue(&mut self, key: &str, ticks: u32) {
        self.queue.push(ConstructionEntry {
            building: key.to_string(),
            remaining: ticks,
            total: ticks,
        });
    }

    /// Decrement every queue entry; completed building keys are returned
    /// in queue order and their counts incremented
    pub fn advance_queue(&mut self) -> Vec<String> {
        let mut completed = Vec::new();
        for entry in &mut self.queue {
            entry.remaining = entry.remaining.saturating_sub(1);
        }
        self.queue.retain(|entry| {
            if entry.remaining == 0 {
                completed.push(entry.building.clone());
                false
            } else {
                true
            }
        });
        for key in &completed {
            self.complete(key);
        }
        completed
    }

    /// Owned + queued units, used for max-count checks
    pub fn committed_count(&self, key: &str) -> u32 {
        self.count(key) + self.queued_count(key)
    }

    /// Total completed buildings of every type
    pub fn total_count(&self) -> u32 {
        self.counts.values().sum()
    }

    /// Completed buildings in a given category
    pub fn count_in_category(&self, catalog: &Catalog, category: BuildingCategory) -> u32 {
        self.counts
            .iter()
            .filter(|(key, _)| {
                catalog
                    .building(key)
                    .map(|def| def.category == category)
                    .unwrap_or(false)
            })
            .map(|(_, count)| count)
            .sum()
    }

    pub fn iter_counts(&self) -> impl Iterator<Item = (&String, &u32)> {
        self.counts.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::standard::standard_catalog;

    #[test]
    fn test_unlock_and_count() {
        let mut registry = BuildingRegistry::new(&["hut".to_string()]);
        assert!(registry.is_unlocked("hut"));
        assert!(!registry.is_unlocked("farm"));
        assert_eq!(registry.count("hut"), 0);

        registry.complete("hut");
        registry.complete("hut");
        assert_eq!(registry.count("hut"), 2);
        assert_eq!(registry.total_built(), 2);
    }

    #[test]
    fn test_queue_advances_and_completes() {
        let mut registry = BuildingRegistry::new(&[]);
        registry.enqueue("farm", 2);
        registry.enqueue("quarry", 1);

        let completed = registry.advance_queue();
        assert_eq!(completed, vec!["quarry".to_string()]);
        assert_eq!(registry.count("quarry"), 1);
        assert_eq!(registry.count("farm"), 0);
        assert_eq!(registry.queue().len(), 1);

        let completed = registry.advance_queue();
        assert_eq!(completed, vec!["farm".to_string()]);
        assert_eq!(registry.count("farm"), 1);
        assert!(registry.queue().is_empty());
    }

    #[test]
    fn test_committed_count_includes_queue() {
        let mut registry = BuildingRegistry::new(&[]);
        registry.complete("farm");
        registry.enqueue("farm", 5);
        assert_eq!(registry.count("farm"), 1);
        assert_eq!(registry.committed_count("farm"), 2);
    }

    #[test]
    fn test_category_count() {
        let catalog = standard_catalog().unwrap();
        let mut registry = BuildingRegistry::new(&[]);
        registry.complete("cathedral");
        registry.complete("farm");
        assert_eq!(
            registry.count_in_category(&catalog, BuildingCategory::Wonder),
            1
        );
        assert_eq!(
            registry.count_in_category(&catalog, BuildingCategory::Production),
            1
        );
    }
}
