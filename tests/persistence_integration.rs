//! Save/load round trips through the public engine surface

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use eraforge::catalog::standard::standard_catalog;
use eraforge::core::config::EngineConfig;
use eraforge::persistence::{self, SaveGame};
use eraforge::sim::engine::Engine;

fn engine() -> Engine {
    let catalog = Arc::new(standard_catalog().unwrap());
    Engine::new(catalog, EngineConfig::default()).unwrap()
}

fn temp_path(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join("eraforge_integration");
    fs::create_dir_all(&dir).unwrap();
    dir.join(name)
}

fn developed() -> Engine {
    let engine = engine();
    engine.gather_resource("food", 100.0).unwrap();
    engine.gather_resource("wood", 120.0).unwrap();
    engine.build_building("hut").unwrap();
    engine.build_building("hut").unwrap();
    engine.build_building("farm").unwrap();
    engine.recruit_villager("villager", 4).unwrap();
    engine.assign_villager("villager", "food", 2).unwrap();
    engine.step(12);
    engine
}

#[test]
fn save_load_reproduces_amounts_counts_and_population() {
    let path = temp_path("full_roundtrip.json");
    let original = developed();
    original.save_to(&path).unwrap();
    let saved = original.snapshot();

    let restored = engine();
    restored.load_from(&path).unwrap();
    let loaded = restored.snapshot();

    assert_eq!(loaded.tick, saved.tick);
    assert_eq!(loaded.era, saved.era);
    assert_eq!(loaded.resources, saved.resources);
    assert_eq!(loaded.buildings, saved.buildings);
    assert_eq!(loaded.workforce, saved.workforce);
    assert_eq!(loaded.research, saved.research);
    assert_eq!(loaded.milestones, saved.milestones);
    assert_eq!(loaded.prestige, saved.prestige);
    assert_eq!(loaded.construction_queue, saved.construction_queue);

    fs::remove_file(&path).ok();
}

#[test]
fn load_recomputes_rates_before_returning() {
    let path = temp_path("rates_recomputed.json");
    let original = developed();
    original.save_to(&path).unwrap();

    let restored = engine();
    restored.load_from(&path).unwrap();
    let loaded = restored.snapshot();

    // Two assigned villagers gather food; the rate must already be
    // composed without waiting for the first tick after load.
    let food = loaded.resource("food").unwrap();
    assert!(food.rate != 0.0, "rates should be recomputed on load");
    assert_eq!(food.rate, original.snapshot().resource("food").unwrap().rate);

    fs::remove_file(&path).ok();
}

#[test]
fn failed_load_preserves_previous_world() {
    let path = temp_path("truncated.json");
    let original = developed();
    original.save_to(&path).unwrap();

    // Truncate the file mid-JSON
    let full = fs::read_to_string(&path).unwrap();
    fs::write(&path, &full[..full.len() / 2]).unwrap();

    let target = engine();
    target.gather_resource("food", 42.0).unwrap();
    let before = target.snapshot();

    assert!(target.load_from(&path).is_err());
    assert_eq!(target.snapshot(), before);

    fs::remove_file(&path).ok();
}

#[test]
fn version_bump_is_rejected() {
    let path = temp_path("future_version.json");
    let original = developed();
    original.save_to(&path).unwrap();

    let mut save = persistence::read_file(&path).unwrap();
    save.version = persistence::SAVE_VERSION + 1;
    persistence::write_file(&path, &save).unwrap();

    let target = engine();
    let err = target.load_from(&path).unwrap_err();
    assert!(matches!(
        err,
        eraforge::core::error::GameError::SaveVersion { .. }
    ));

    fs::remove_file(&path).ok();
}

#[test]
fn save_is_a_consistent_point_in_time() {
    let path = temp_path("consistency.json");
    let original = developed();
    original.save_to(&path).unwrap();

    let save: SaveGame = persistence::read_file(&path).unwrap();
    // Queue totals, counts and tick all come from the same lock scope
    assert_eq!(save.tick, original.snapshot().tick);
    for entry in save.buildings.queue() {
        assert!(entry.remaining <= entry.total);
    }

    fs::remove_file(&path).ok();
}

#[test]
fn prestige_ledger_survives_the_file_format() {
    let path = temp_path("prestige.json");
    let engine = developed();
    {
        // Reach the prestige gate artificially through a saved file edit:
        // saves are plain data, so craft one with a banked ledger.
        engine.save_to(&path).unwrap();
        let mut save = persistence::read_file(&path).unwrap();
        save.prestige.record_prestige(7);
        persistence::write_file(&path, &save).unwrap();
    }

    let restored = self::engine();
    restored.load_from(&path).unwrap();
    let snapshot = restored.snapshot();
    assert_eq!(snapshot.prestige.level, 1);
    assert_eq!(snapshot.prestige.points_available, 7);

    fs::remove_file(&path).ok();
}
