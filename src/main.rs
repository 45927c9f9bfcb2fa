//! Eraforge - Entry Point
//!
//! Sets up logging and the async runtime, builds the engine over the
//! standard or a file-supplied catalog, starts the tick scheduler, and
//! runs a plain text command loop against the engine's public operations.

use clap::Parser;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::runtime::Runtime;

use eraforge::catalog::{loader, standard};
use eraforge::core::config::EngineConfig;
use eraforge::core::error::Result;
use eraforge::sim::engine::Engine;
use eraforge::sim::snapshot::Snapshot;

#[derive(Parser, Debug)]
#[command(name = "eraforge", about = "Tick-based idle civilization simulation")]
struct Args {
    /// Seed for the world RNG
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Base tick interval in milliseconds
    #[arg(long)]
    tick_ms: Option<u64>,

    /// Content catalog TOML file (defaults to the built-in catalog)
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Save file; loaded on startup if present, written on quit
    #[arg(long)]
    save: Option<PathBuf>,

    /// Do not start the tick scheduler automatically
    #[arg(long, default_value_t = false)]
    paused: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("eraforge=info")),
        )
        .init();

    let args = Args::parse();
    tracing::info!(seed = args.seed, "Eraforge starting...");

    let rt = Runtime::new()?;
    let _guard = rt.enter();

    let catalog = match &args.catalog {
        Some(path) => Arc::new(loader::load_catalog(path)?),
        None => Arc::new(standard::standard_catalog()?),
    };

    let mut config = EngineConfig {
        seed: args.seed,
        ..EngineConfig::default()
    };
    if let Some(tick_ms) = args.tick_ms {
        config.base_tick_interval_ms = tick_ms;
        config.min_tick_interval_ms = config.min_tick_interval_ms.min(tick_ms);
    }

    let engine = Engine::new(catalog, config)?;

    if let Some(path) = &args.save {
        if path.exists() {
            engine.load_from(path)?;
            println!("Loaded save from {}", path.display());
        }
    }

    // Drain the event bus into the log so reactions show without polling
    let mut events = engine.subscribe();
    rt.spawn(async move {
        while let Ok(event) = events.recv().await {
            tracing::info!(?event, "event");
        }
    });

    if !args.paused {
        engine.start();
    }

    println!();
    println!("=== ERAFORGE ===");
    println!("An idle civilization, one tick at a time.");
    println!();
    print_help();

    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            break;
        }
        let input = input.trim();
        if input.is_empty() {
            continue;
        }

        let parts: Vec<&str> = input.split_whitespace().collect();
        match parts.as_slice() {
            ["quit"] | ["q"] => break,
            ["help"] | ["h"] => print_help(),
            ["status"] | ["s"] => print_status(&engine.snapshot()),
            ["start"] => {
                engine.start();
                println!("Scheduler running.");
            }
            ["stop"] => {
                engine.stop();
                println!("Scheduler stopped.");
            }
            ["tick"] | ["t"] => {
                engine.step(1);
                println!("Tick {} complete.", engine.snapshot().tick);
            }
            ["run", n] => match n.parse::<u32>() {
                Ok(n) => {
                    engine.step(n);
                    println!("Completed {} ticks. Now at tick {}.", n, engine.snapshot().tick);
                }
                Err(_) => println!("Usage: run <number>"),
            },
            ["gather", resource, amount] => match amount.parse::<f64>() {
                Ok(amount) => report(
                    engine
                        .gather_resource(resource, amount)
                        .map(|added| format!("Gathered {added:.1} {resource}")),
                ),
                Err(_) => println!("Usage: gather <resource> <amount>"),
            },
            ["build", key] => report(
                engine
                    .build_building(key)
                    .map(|outcome| format!("Build order accepted: {outcome:?}")),
            ),
            ["build", key, count] => match count.parse::<u32>() {
                Ok(count) => report(
                    engine
                        .build_multiple(key, count)
                        .map(|built| format!("Built {built} x {key}")),
                ),
                Err(_) => println!("Usage: build <key> [count]"),
            },
            ["recruit", key, count] => match count.parse::<u32>() {
                Ok(count) => report(
                    engine
                        .recruit_villager(key, count)
                        .map(|_| format!("Recruited {count} {key}")),
                ),
                Err(_) => println!("Usage: recruit <type> <count>"),
            },
            ["assign", key, resource, count] => match count.parse::<u32>() {
                Ok(count) => report(
                    engine
                        .assign_villager(key, resource, count)
                        .map(|_| format!("Assigned {count} {key} to {resource}")),
                ),
                Err(_) => println!("Usage: assign <type> <resource> <count>"),
            },
            ["unassign", key, resource, count] => match count.parse::<u32>() {
                Ok(count) => report(
                    engine
                        .unassign_villager(key, resource, count)
                        .map(|_| format!("Unassigned {count} {key} from {resource}")),
                ),
                Err(_) => println!("Usage: unassign <type> <resource> <count>"),
            },
            ["research", "cancel"] => {
                report(engine.cancel_research().map(|_| "Research cancelled".to_string()))
            }
            ["research", key] => {
                report(engine.start_research(key).map(|_| format!("Researching {key}")))
            }
            ["expedition", key] => {
                report(engine.launch_expedition(key).map(|_| format!("Expedition {key} launched")))
            }
            ["prestige"] => report(
                engine
                    .do_prestige()
                    .map(|points| format!("Prestiged! Banked {points} points")),
            ),
            ["upgrade", key] => {
                report(engine.buy_prestige_upgrade(key).map(|_| format!("Purchased {key}")))
            }
            ["save"] => match &args.save {
                Some(path) => report(engine.save_to(path).map(|_| "Saved".to_string())),
                None => println!("No save path configured (use --save)"),
            },
            ["save", path] => {
                report(engine.save_to(&PathBuf::from(path)).map(|_| "Saved".to_string()))
            }
            ["load"] => match &args.save {
                Some(path) => report(engine.load_from(path).map(|_| "Loaded".to_string())),
                None => println!("No save path configured (use --save)"),
            },
            ["load", path] => {
                report(engine.load_from(&PathBuf::from(path)).map(|_| "Loaded".to_string()))
            }
            _ => println!("Unknown command. Type 'help' for the command list."),
        }
    }

    engine.stop();
    if let Some(path) = &args.save {
        engine.save_to(path)?;
        println!("Saved to {}", path.display());
    }

    let snapshot = engine.snapshot();
    println!(
        "\nGoodbye! {} at tick {}, prestige level {}.",
        snapshot.era.name, snapshot.tick, snapshot.prestige.level
    );
    Ok(())
}

fn report(result: Result<String>) {
    match result {
        Ok(message) => println!("{message}"),
        Err(err) => println!("Command failed: {err}"),
    }
}

fn print_help() {
    println!("Commands:");
    println!("  status / s                          - Show the world");
    println!("  tick / t, run <n>                   - Advance manually");
    println!("  start / stop                        - Control the scheduler");
    println!("  gather <resource> <amount>          - Manual gathering");
    println!("  build <key> [count]                 - Construct buildings");
    println!("  recruit <type> <count>              - Grow the population");
    println!("  assign / unassign <type> <res> <n>  - Manage workers");
    println!("  research <key> | research cancel    - Technology");
    println!("  expedition <key>                    - Send the army out");
    println!("  prestige, upgrade <key>             - Start over, stronger");
    println!("  save [path] / load [path]           - Persistence");
    println!("  quit / q                            - Exit (autosaves)");
    println!();
}

fn print_status(snapshot: &Snapshot) {
    println!();
    println!(
        "--- Tick {} | {} | Population {}/{} | Prestige L{} ({} pts) ---",
        snapshot.tick,
        snapshot.era.name,
        snapshot.total_population,
        snapshot.population_capacity,
        snapshot.prestige.level,
        snapshot.prestige.points_available,
    );

    println!("Resources:");
    for resource in snapshot.resources.iter().filter(|r| r.unlocked) {
        println!(
            "  {:<12} {:>8.1} / {:<8.0} ({:+.2}/tick)",
            resource.name, resource.amount, resource.cap, resource.rate
        );
    }

    let owned: Vec<_> = snapshot
        .buildings
        .iter()
        .filter(|b| b.count > 0 || b.queued > 0)
        .collect();
    if !owned.is_empty() {
        println!("Buildings:");
        for building in owned {
            let queued = if building.queued > 0 {
                format!(" (+{} building)", building.queued)
            } else {
                String::new()
            };
            println!("  {:<12} x{}{}", building.name, building.count, queued);
        }
    }

    for unit in snapshot.workforce.iter().filter(|w| w.unlocked && w.count > 0) {
        let assignments: Vec<String> = unit
            .assigned
            .iter()
            .map(|(resource, count)| format!("{count} on {resource}"))
            .collect();
        println!(
            "  {:<12} x{} ({} idle{}{})",
            unit.name,
            unit.count,
            unit.idle,
            if assignments.is_empty() { "" } else { ", " },
            assignments.join(", ")
        );
    }

    if let Some(active) = &snapshot.research.active {
        println!(
            "Researching {} ({}/{} ticks left)",
            active.tech, active.remaining, active.total
        );
    }
    if let Some(active) = &snapshot.military.active {
        println!(
            "Expedition {} in the field ({} soldiers, {} ticks left)",
            active.expedition, active.soldiers, active.remaining
        );
    }
    for modifier in &snapshot.active_modifiers {
        println!("Active: {} ({} ticks left)", modifier.source, modifier.remaining);
    }
    if !snapshot.milestones.titles.is_empty() {
        println!("Titles: {}", snapshot.milestones.titles.join(", "));
    }
    println!(
        "Speed x{:.2} (interval {} ms); prestige now would bank {} points",
        snapshot.tick_speed_multiplier, snapshot.tick_interval_ms, snapshot.prestige.pending_points
    );
    println!();
}
