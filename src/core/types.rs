//! Core type definitions used throughout the codebase

use serde::{Deserialize, Serialize};

/// Game tick counter (simulation time unit)
pub type Tick = u64;

/// Index into the catalog's ordered era table
pub type EraIndex = usize;

/// Resource key that receives the workforce upkeep deduction
pub const FOOD_KEY: &str = "food";

/// Resource key that research costs are paid in
pub const KNOWLEDGE_KEY: &str = "knowledge";

/// Functional category of a building type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildingCategory {
    Housing,
    Production,
    Research,
    Military,
    Storage,
    Wonder,
}

/// A cost or reward expressed as (resource key, amount) pairs
pub type ResourceVec = Vec<(String, f64)>;

/// An era entered during the current run, with the tick it was entered on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EraRecord {
    pub era: String,
    pub entered_at: Tick,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_building_category_distinct() {
        assert_ne!(BuildingCategory::Housing, BuildingCategory::Wonder);
        assert_ne!(BuildingCategory::Production, BuildingCategory::Storage);
    }

    #[test]
    fn test_era_record_roundtrip() {
        let record = EraRecord {
            era: "bronze_age".into(),
            entered_at: 42,
        };
        let json = serde_json::to_string(&record).unwrap();
        let back: EraRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(record, back);
    }
}
