//! Built-in standard content catalog
//!
//! Six eras from the Stone Age to the Industrial Era. Used when no external
//! catalog file is supplied, and by the test suites. Values are tuned for a
//! multi-hour first run; prestige becomes available at the Medieval Era.

use crate::core::error::Result;
use crate::core::types::BuildingCategory;

use super::effect::{Effect, EffectKind};
use super::{
    BuildingDef, Catalog, ChainDef, Condition, EraDef, EventDef, ExpeditionDef, MilestoneDef,
    MilestoneReward, PrestigeUpgradeDef, ResourceDef, TechDef, WorkforceDef,
};

fn costs(pairs: &[(&str, f64)]) -> Vec<(String, f64)> {
    pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
}

fn counts(pairs: &[(&str, u32)]) -> Vec<(String, u32)> {
    pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
}

fn keys(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// The standard catalog, validated and ready for use
pub fn standard_catalog() -> Result<Catalog> {
    let catalog = Catalog {
        eras: eras(),
        resources: resources(),
        buildings: buildings(),
        workforce: workforce(),
        technologies: technologies(),
        events: events(),
        expeditions: expeditions(),
        milestones: milestones(),
        chains: chains(),
        prestige_upgrades: prestige_upgrades(),
        min_prestige_era: 3,
        soldier_key: "soldier".into(),
        building_index: Default::default(),
        resource_index: Default::default(),
        workforce_index: Default::default(),
        tech_index: Default::default(),
        event_index: Default::default(),
        expedition_index: Default::default(),
        upgrade_index: Default::default(),
    };
    catalog.finalize()
}

fn eras() -> Vec<EraDef> {
    vec![
        EraDef {
            key: "stone_age".into(),
            name: "Stone Age".into(),
            resource_thresholds: vec![],
            building_thresholds: vec![],
            unlocks_buildings: keys(&["hut", "farm", "lumber_camp"]),
            unlocks_resources: keys(&["food", "wood"]),
            unlocks_workforce: keys(&["villager"]),
        },
        EraDef {
            key: "bronze_age".into(),
            name: "Bronze Age".into(),
            resource_thresholds: costs(&[("food", 100.0), ("wood", 80.0)]),
            building_thresholds: counts(&[("hut", 2), ("farm", 1)]),
            unlocks_buildings: keys(&["quarry", "mine", "granary", "storehouse"]),
            unlocks_resources: keys(&["stone", "iron"]),
            unlocks_workforce: vec![],
        },
        EraDef {
            key: "iron_age".into(),
            name: "Iron Age".into(),
            resource_thresholds: costs(&[("stone", 150.0), ("iron", 50.0)]),
            building_thresholds: counts(&[("quarry", 2), ("mine", 1)]),
            unlocks_buildings: keys(&["library", "market", "barracks"]),
            unlocks_resources: keys(&["gold", "knowledge"]),
            unlocks_workforce: keys(&["scholar", "soldier"]),
        },
        EraDef {
            key: "medieval_era".into(),
            name: "Medieval Era".into(),
            resource_thresholds: costs(&[("gold", 200.0), ("knowledge", 100.0)]),
            building_thresholds: counts(&[("library", 2), ("barracks", 1)]),
            unlocks_buildings: keys(&["castle", "cathedral"]),
            unlocks_resources: vec![],
            unlocks_workforce: vec![],
        },
        EraDef {
            key: "renaissance".into(),
            name: "Renaissance".into(),
            resource_thresholds: costs(&[("gold", 500.0), ("knowledge", 400.0)]),
            building_thresholds: counts(&[("castle", 1)]),
            unlocks_buildings: keys(&["university", "workshop"]),
            unlocks_resources: vec![],
            unlocks_workforce: vec![],
        },
        EraDef {
            key: "industrial_era".into(),
            name: "Industrial Era".into(),
            resource_thresholds: costs(&[("iron", 500.0), ("knowledge", 1000.0)]),
            building_thresholds: counts(&[("workshop", 2)]),
            unlocks_buildings: keys(&["factory", "monument"]),
            unlocks_resources: vec![],
            unlocks_workforce: vec![],
        },
    ]
}

fn resources() -> Vec<ResourceDef> {
    let def = |key: &str, name: &str, base_cap: f64, starting_amount: f64| ResourceDef {
        key: key.into(),
        name: name.into(),
        base_cap,
        starting_amount,
    };
    vec![
        def("food", "Food", 200.0, 15.0),
        def("wood", "Wood", 200.0, 12.0),
        def("stone", "Stone", 150.0, 0.0),
        def("iron", "Iron", 100.0, 0.0),
        def("gold", "Gold", 200.0, 0.0),
        def("knowledge", "Knowledge", 100.0, 0.0),
    ]
}

fn buildings() -> Vec<BuildingDef> {
    use EffectKind::*;

    let def = |key: &str,
               name: &str,
               category: BuildingCategory,
               base_cost: Vec<(String, f64)>,
               cost_growth: f64,
               effects: Vec<Effect>,
               max_count: Option<u32>,
               build_ticks: u32| BuildingDef {
        key: key.into(),
        name: name.into(),
        category,
        base_cost,
        cost_growth,
        effects,
        max_count,
        build_ticks,
    };

    vec![
        def(
            "hut",
            "Hut",
            BuildingCategory::Housing,
            costs(&[("wood", 10.0)]),
            1.3,
            vec![Effect::new(PopulationCap, None, 2.0)],
            None,
            0,
        ),
        def(
            "farm",
            "Farm",
            BuildingCategory::Production,
            costs(&[("wood", 15.0)]),
            1.4,
            vec![Effect::new(Production, Some("food"), 0.5)],
            None,
            5,
        ),
        def(
            "lumber_camp",
            "Lumber Camp",
            BuildingCategory::Production,
            costs(&[("food", 20.0)]),
            1.4,
            vec![Effect::new(Production, Some("wood"), 0.4)],
            None,
            5,
        ),
        def(
            "granary",
            "Granary",
            BuildingCategory::Storage,
            costs(&[("wood", 25.0)]),
            1.5,
            vec![Effect::new(Storage, Some("food"), 100.0)],
            None,
            6,
        ),
        def(
            "quarry",
            "Quarry",
            BuildingCategory::Production,
            costs(&[("wood", 30.0)]),
            1.5,
            vec![Effect::new(Production, Some("stone"), 0.3)],
            None,
            8,
        ),
        def(
            "mine",
            "Mine",
            BuildingCategory::Production,
            costs(&[("wood", 40.0), ("stone", 20.0)]),
            1.5,
            vec![Effect::new(Production, Some("iron"), 0.2)],
            None,
            10,
        ),
        def(
            "storehouse",
            "Storehouse",
            BuildingCategory::Storage,
            costs(&[("wood", 25.0), ("stone", 15.0)]),
            1.6,
            vec![Effect::new(StorageAll, None, 50.0)],
            None,
            8,
        ),
        def(
            "library",
            "Library",
            BuildingCategory::Research,
            costs(&[("wood", 60.0), ("stone", 40.0)]),
            1.6,
            vec![
                Effect::new(Production, Some("knowledge"), 0.2),
                Effect::new(Storage, Some("knowledge"), 50.0),
            ],
            None,
            12,
        ),
        def(
            "market",
            "Market",
            BuildingCategory::Production,
            costs(&[("wood", 50.0), ("stone", 30.0)]),
            1.5,
            vec![Effect::new(Production, Some("gold"), 0.3)],
            None,
            10,
        ),
        def(
            "barracks",
            "Barracks",
            BuildingCategory::Military,
            costs(&[("wood", 40.0), ("stone", 40.0)]),
            1.5,
            vec![Effect::new(EffectKind::Military, None, 0.25)],
            None,
            10,
        ),
        def(
            "castle",
            "Castle",
            BuildingCategory::Military,
            costs(&[("stone", 300.0), ("gold", 100.0)]),
            1.8,
            vec![
                Effect::new(EffectKind::Military, None, 1.0),
                Effect::new(PopulationCap, None, 5.0),
            ],
            Some(3),
            25,
        ),
        def(
            "cathedral",
            "Cathedral",
            BuildingCategory::Wonder,
            costs(&[("stone", 400.0), ("gold", 400.0)]),
            2.0,
            vec![Effect::new(AllProductionMult, None, 0.1)],
            Some(1),
            40,
        ),
        def(
            "university",
            "University",
            BuildingCategory::Research,
            costs(&[("wood", 150.0), ("stone", 150.0), ("gold", 150.0)]),
            1.7,
            vec![
                Effect::new(Production, Some("knowledge"), 0.6),
                Effect::new(Storage, Some("knowledge"), 100.0),
            ],
            None,
            20,
        ),
        def(
            "workshop",
            "Workshop",
            BuildingCategory::Production,
            costs(&[("wood", 100.0), ("iron", 50.0)]),
            1.6,
            vec![
                Effect::new(Production, Some("iron"), 0.3),
                Effect::new(Production, Some("wood"), 0.2),
            ],
            None,
            15,
        ),
        def(
            "factory",
            "Factory",
            BuildingCategory::Production,
            costs(&[("iron", 300.0), ("gold", 300.0)]),
            1.8,
            vec![
                Effect::new(Production, Some("gold"), 1.0),
                Effect::new(AllProductionMult, None, 0.05),
            ],
            None,
            30,
        ),
        def(
            "monument",
            "Monument",
            BuildingCategory::Wonder,
            costs(&[("stone", 1000.0), ("gold", 800.0)]),
            2.0,
            vec![Effect::new(TickSpeed, None, 0.25)],
            Some(1),
            50,
        ),
    ]
}

fn workforce() -> Vec<WorkforceDef> {
    vec![
        WorkforceDef {
            key: "villager".into(),
            name: "Villager".into(),
            food_upkeep: 0.1,
            gather_rate: 0.2,
            gathers: keys(&["food", "wood", "stone", "iron"]),
        },
        WorkforceDef {
            key: "scholar".into(),
            name: "Scholar".into(),
            food_upkeep: 0.15,
            gather_rate: 0.1,
            gathers: keys(&["knowledge"]),
        },
        WorkforceDef {
            key: "soldier".into(),
            name: "Soldier".into(),
            food_upkeep: 0.2,
            gather_rate: 0.0,
            gathers: vec![],
        },
    ]
}

fn technologies() -> Vec<TechDef> {
    use EffectKind::*;

    let def = |key: &str,
               name: &str,
               prerequisites: Vec<String>,
               min_era: usize,
               knowledge_cost: f64,
               ticks: u32,
               effects: Vec<Effect>| TechDef {
        key: key.into(),
        name: name.into(),
        prerequisites,
        min_era,
        knowledge_cost,
        ticks,
        effects,
    };

    vec![
        def(
            "writing",
            "Writing",
            vec![],
            2,
            20.0,
            10,
            vec![Effect::new(Production, Some("knowledge"), 0.1)],
        ),
        def(
            "pottery",
            "Pottery",
            vec![],
            2,
            30.0,
            10,
            vec![
                Effect::new(Storage, Some("food"), 100.0),
                Effect::new(StorageAll, None, 25.0),
            ],
        ),
        def(
            "currency",
            "Currency",
            keys(&["writing"]),
            2,
            50.0,
            15,
            vec![Effect::new(Production, Some("gold"), 0.3)],
        ),
        def(
            "mathematics",
            "Mathematics",
            keys(&["writing"]),
            2,
            80.0,
            20,
            vec![Effect::new(AllProductionMult, None, 0.05)],
        ),
        def(
            "iron_working",
            "Iron Working",
            vec![],
            2,
            60.0,
            15,
            vec![
                Effect::new(EffectKind::Military, None, 0.25),
                Effect::new(ProductionMult, Some("iron"), 0.15),
            ],
        ),
        def(
            "crop_rotation",
            "Crop Rotation",
            vec![],
            3,
            100.0,
            20,
            vec![Effect::new(ProductionMult, Some("food"), 0.2)],
        ),
        def(
            "engineering",
            "Engineering",
            keys(&["mathematics"]),
            3,
            120.0,
            25,
            vec![
                Effect::new(GatherRate, None, 0.15),
                Effect::new(StorageAll, None, 50.0),
            ],
        ),
        def(
            "military_tactics",
            "Military Tactics",
            keys(&["iron_working"]),
            3,
            100.0,
            20,
            vec![
                Effect::new(EffectKind::Military, None, 0.5),
                Effect::new(ExpeditionReward, None, 0.2),
            ],
        ),
        def(
            "philosophy",
            "Philosophy",
            keys(&["writing"]),
            3,
            150.0,
            25,
            vec![Effect::new(ProductionMult, Some("knowledge"), 0.25)],
        ),
        def(
            "banking",
            "Banking",
            keys(&["currency"]),
            4,
            250.0,
            30,
            vec![
                Effect::new(ProductionMult, Some("gold"), 0.3),
                Effect::new(Storage, Some("gold"), 200.0),
            ],
        ),
        def(
            "printing_press",
            "Printing Press",
            keys(&["philosophy"]),
            4,
            300.0,
            30,
            vec![
                Effect::new(ProductionMult, Some("knowledge"), 0.4),
                Effect::new(AllProductionMult, None, 0.05),
            ],
        ),
        def(
            "machinery",
            "Machinery",
            keys(&["engineering"]),
            5,
            500.0,
            40,
            vec![
                Effect::new(TickSpeed, None, 0.2),
                Effect::new(GatherRate, None, 0.2),
            ],
        ),
    ]
}

fn events() -> Vec<EventDef> {
    use EffectKind::*;

    vec![
        EventDef {
            key: "bountiful_harvest".into(),
            name: "Bountiful Harvest".into(),
            weight: 3.0,
            min_era: 0,
            min_tick: 20,
            cooldown: 60,
            duration: 0,
            instant_rewards: costs(&[("food", 25.0)]),
            effects: vec![],
        },
        EventDef {
            key: "drought".into(),
            name: "Drought".into(),
            weight: 2.0,
            min_era: 0,
            min_tick: 50,
            cooldown: 120,
            duration: 20,
            instant_rewards: vec![],
            effects: vec![Effect::new(Production, Some("food"), -0.5)],
        },
        EventDef {
            key: "festival".into(),
            name: "Festival".into(),
            weight: 2.0,
            min_era: 1,
            min_tick: 40,
            cooldown: 90,
            duration: 15,
            instant_rewards: vec![],
            effects: vec![Effect::new(TickSpeed, None, 0.1)],
        },
        EventDef {
            key: "merchant_caravan".into(),
            name: "Merchant Caravan".into(),
            weight: 2.0,
            min_era: 2,
            min_tick: 100,
            cooldown: 100,
            duration: 0,
            instant_rewards: costs(&[("gold", 30.0)]),
            effects: vec![],
        },
        EventDef {
            key: "gold_vein".into(),
            name: "Gold Vein".into(),
            weight: 1.0,
            min_era: 2,
            min_tick: 120,
            cooldown: 150,
            duration: 30,
            instant_rewards: vec![],
            effects: vec![Effect::new(Production, Some("gold"), 0.5)],
        },
        EventDef {
            key: "wandering_scholars".into(),
            name: "Wandering Scholars".into(),
            weight: 2.0,
            min_era: 2,
            min_tick: 80,
            cooldown: 120,
            duration: 0,
            instant_rewards: costs(&[("knowledge", 15.0)]),
            effects: vec![],
        },
    ]
}

fn expeditions() -> Vec<ExpeditionDef> {
    let def = |key: &str,
               name: &str,
               soldiers_required: u32,
               duration: u32,
               base_difficulty: f64,
               rewards: Vec<(String, f64)>,
               min_era: usize| ExpeditionDef {
        key: key.into(),
        name: name.into(),
        soldiers_required,
        duration,
        base_difficulty,
        rewards,
        min_era,
    };

    vec![
        def(
            "scout_the_frontier",
            "Scout the Frontier",
            2,
            10,
            0.25,
            costs(&[("food", 40.0), ("wood", 30.0)]),
            2,
        ),
        def(
            "raid_rival_camp",
            "Raid a Rival Camp",
            5,
            15,
            0.45,
            costs(&[("gold", 60.0), ("iron", 20.0)]),
            2,
        ),
        def(
            "secure_trade_routes",
            "Secure the Trade Routes",
            8,
            20,
            0.55,
            costs(&[("gold", 150.0), ("knowledge", 40.0)]),
            3,
        ),
        def(
            "conquer_borderlands",
            "Conquer the Borderlands",
            15,
            30,
            0.7,
            costs(&[("gold", 400.0), ("iron", 150.0), ("food", 200.0)]),
            4,
        ),
    ]
}

fn milestones() -> Vec<MilestoneDef> {
    use Condition::*;
    use EffectKind::*;

    let def = |key: &str, name: &str, conditions: Vec<Condition>, reward: MilestoneReward| {
        MilestoneDef {
            key: key.into(),
            name: name.into(),
            conditions,
            reward,
        }
    };
    let grant = |pairs: &[(&str, f64)]| MilestoneReward::Resources { grants: costs(pairs) };
    let permanent = |effects: Vec<Effect>| MilestoneReward::Permanent { effects };

    vec![
        def(
            "first_harvest",
            "First Harvest",
            vec![ResourceAtLeast { resource: "food".into(), amount: 50.0 }],
            grant(&[("wood", 15.0)]),
        ),
        def(
            "woodworker",
            "Woodworker",
            vec![ResourceAtLeast { resource: "wood".into(), amount: 100.0 }],
            grant(&[("food", 20.0)]),
        ),
        def(
            "hamlet",
            "Hamlet",
            vec![TotalBuildingsAtLeast { count: 5 }],
            grant(&[("wood", 30.0), ("stone", 20.0)]),
        ),
        def(
            "growing_village",
            "Growing Village",
            vec![PopulationAtLeast { count: 10 }],
            permanent(vec![Effect::new(PopulationCap, None, 3.0)]),
        ),
        def(
            "stonemason",
            "Stonemason",
            vec![BuildingCountAtLeast { building: "quarry".into(), count: 3 }],
            permanent(vec![Effect::new(ProductionMult, Some("stone"), 0.1)]),
        ),
        def(
            "scholars_of_the_age",
            "Scholars of the Age",
            vec![TechCountAtLeast { count: 3 }],
            permanent(vec![Effect::new(ProductionMult, Some("knowledge"), 0.1)]),
        ),
        def(
            "standing_army",
            "Standing Army",
            vec![SoldiersAtLeast { count: 10 }],
            permanent(vec![Effect::new(EffectKind::Military, None, 0.25)]),
        ),
        def(
            "first_conquest",
            "First Conquest",
            vec![ExpeditionsCompletedAtLeast { count: 1 }],
            grant(&[("gold", 50.0)]),
        ),
        def(
            "wonder_of_the_world",
            "Wonder of the World",
            vec![WonderCountAtLeast { count: 1 }],
            permanent(vec![Effect::new(AllProductionMult, None, 0.05)]),
        ),
        def(
            "age_of_legends",
            "Age of Legends",
            vec![EraAtLeast { era: 3 }],
            grant(&[("gold", 100.0), ("knowledge", 50.0)]),
        ),
        def(
            "master_builders",
            "Master Builders",
            vec![TotalBuildingsAtLeast { count: 25 }],
            permanent(vec![Effect::new(GatherRate, None, 0.1)]),
        ),
        def(
            "hoarder",
            "Hoarder",
            vec![ResourceAtLeast { resource: "gold".into(), amount: 500.0 }],
            permanent(vec![Effect::new(Storage, Some("gold"), 250.0)]),
        ),
    ]
}

fn chains() -> Vec<ChainDef> {
    vec![
        ChainDef {
            key: "foundations".into(),
            title: "Founder".into(),
            members: keys(&["first_harvest", "woodworker", "hamlet"]),
            boost_magnitude: 0.25,
            boost_duration: 50,
        },
        ChainDef {
            key: "imperium".into(),
            title: "Imperator".into(),
            members: keys(&["standing_army", "first_conquest", "age_of_legends"]),
            boost_magnitude: 0.5,
            boost_duration: 100,
        },
    ]
}

fn prestige_upgrades() -> Vec<PrestigeUpgradeDef> {
    use EffectKind::*;

    let def = |key: &str,
               name: &str,
               base_cost: u64,
               cost_growth: f64,
               max_tier: u32,
               effects: Vec<Effect>| PrestigeUpgradeDef {
        key: key.into(),
        name: name.into(),
        base_cost,
        cost_growth,
        max_tier,
        effects,
    };

    vec![
        def(
            "head_start",
            "Head Start",
            1,
            2.0,
            5,
            vec![
                Effect::new(StartingResource, Some("food"), 25.0),
                Effect::new(StartingResource, Some("wood"), 25.0),
            ],
        ),
        def(
            "enduring_knowledge",
            "Enduring Knowledge",
            2,
            2.0,
            5,
            vec![Effect::new(ProductionMult, Some("knowledge"), 0.1)],
        ),
        def(
            "golden_age",
            "Golden Age",
            3,
            2.0,
            10,
            vec![Effect::new(AllProductionMult, None, 0.05)],
        ),
        def(
            "warrior_tradition",
            "Warrior Tradition",
            2,
            2.0,
            5,
            vec![Effect::new(EffectKind::Military, None, 0.25)],
        ),
        def(
            "time_dilation",
            "Time Dilation",
            5,
            3.0,
            3,
            vec![Effect::new(TickSpeed, None, 0.1)],
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starting_resources_match_fresh_world() {
        let catalog = standard_catalog().unwrap();
        assert_eq!(catalog.resource("food").unwrap().starting_amount, 15.0);
        assert_eq!(catalog.resource("wood").unwrap().starting_amount, 12.0);
    }

    #[test]
    fn test_iron_locked_in_starting_era() {
        let catalog = standard_catalog().unwrap();
        let start = catalog.unlocked_through(0);
        assert!(!start.resources.contains(&"iron".to_string()));
        let next = catalog.unlocked_through(1);
        assert!(next.resources.contains(&"iron".to_string()));
    }

    #[test]
    fn test_prestige_era_is_medieval() {
        let catalog = standard_catalog().unwrap();
        assert_eq!(catalog.eras[catalog.min_prestige_era].key, "medieval_era");
    }

    #[test]
    fn test_tech_prerequisites_exist() {
        let catalog = standard_catalog().unwrap();
        for tech in &catalog.technologies {
            for prereq in &tech.prerequisites {
                assert!(
                    catalog.technology(prereq).is_some(),
                    "{} has dangling prerequisite {}",
                    tech.key,
                    prereq
                );
            }
        }
    }

    #[test]
    fn test_wonders_are_capped() {
        let catalog = standard_catalog().unwrap();
        for building in &catalog.buildings {
            if building.category == BuildingCategory::Wonder {
                assert_eq!(building.max_count, Some(1), "{} should be unique", building.key);
            }
        }
    }
}
