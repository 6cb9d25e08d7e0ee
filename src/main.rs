//! Void Trader - Combat Skirmish Runner
//!
//! Builds a small hand-made galaxy and fleet, then fires a batch of attacks at
//! the combat service concurrently and reports how each one settled.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use tokio::runtime::Runtime;
use tokio::task::JoinSet;

use void_trader::combat::{BroadcastNotifier, CombatResult, CombatService, SeededDiceSource};
use void_trader::core::error::Result;
use void_trader::core::types::{Cargo, SectorId, ShipId};
use void_trader::core::CombatConfig;
use void_trader::galaxy::StaticGalaxy;
use void_trader::ship::{Ship, ShipRegistry};

/// Combat skirmish runner
#[derive(Parser, Debug)]
#[command(name = "void-trader")]
#[command(about = "Run concurrent ship battles through the settlement engine")]
struct Args {
    /// Combat tuning file (TOML); defaults are used when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Random seed for deterministic runs
    #[arg(long)]
    seed: Option<u64>,

    /// Number of attacks to launch
    #[arg(long, default_value_t = 8)]
    battles: usize,

    /// Print results as JSON
    #[arg(long)]
    json: bool,
}

/// JSON output for one attempted attack
#[derive(Serialize)]
struct AttackReport {
    attacker: ShipId,
    defender: ShipId,
    result: Option<CombatResult>,
    error: Option<String>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "void_trader=info".into()),
        )
        .init();

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => CombatConfig::load(path)?,
        None => CombatConfig::default(),
    };
    let seed = args.seed.unwrap_or_else(rand::random);
    tracing::info!("Void Trader skirmish starting (seed {})", seed);

    let rt = Runtime::new()?;
    let reports = rt.block_on(run_skirmish(config, seed, args.battles))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        for report in &reports {
            match (&report.result, &report.error) {
                (Some(result), _) => println!("{}", result.summary),
                (None, Some(error)) => println!("{}", error),
                (None, None) => {}
            }
        }
    }
    Ok(())
}

/// Ten sectors in a ring with a spur, sector 1 is a protected starport
fn demo_galaxy() -> StaticGalaxy {
    let mut galaxy = StaticGalaxy::new();
    for s in 1..=10 {
        galaxy.add_warp(SectorId(s), SectorId(s % 10 + 1));
    }
    galaxy
        .add_warp(SectorId(4), SectorId(11))
        .add_warp(SectorId(11), SectorId(12))
        .protect(SectorId(1));
    galaxy
}

fn demo_fleet() -> Vec<Ship> {
    vec![
        Ship::new("Kestrel", SectorId(4))
            .with_fighters(60)
            .with_shields(30)
            .with_credits(5_000)
            .with_faction("Red Moon"),
        Ship::new("Stellar Mule", SectorId(4))
            .with_fighters(10)
            .with_shields(5)
            .with_credits(12_000)
            .with_hold(Cargo::new(20, 15, 10), 60)
            .with_colonists(40),
        Ship::new("Night Heron", SectorId(4))
            .with_fighters(45)
            .with_shields(45)
            .with_credits(3_000)
            .with_hold(Cargo::new(0, 5, 25), 40)
            .with_faction("Red Moon"),
        Ship::new("Brass Lantern", SectorId(4))
            .with_fighters(30)
            .with_shields(10)
            .with_credits(800)
            .with_hold(Cargo::new(30, 0, 0), 30),
        Ship::new("Quiet Orbit", SectorId(1)).with_fighters(25),
    ]
}

async fn run_skirmish(config: CombatConfig, seed: u64, battles: usize) -> Result<Vec<AttackReport>> {
    let registry = Arc::new(ShipRegistry::new());
    let mut ids = Vec::new();
    for ship in demo_fleet() {
        ids.push(registry.insert(ship).await);
    }

    let notifier = Arc::new(BroadcastNotifier::new(64));
    let mut listener = notifier.subscribe();
    tokio::spawn(async move {
        while let Ok(report) = listener.recv().await {
            tracing::debug!("Broadcast to {:?}: {}", report.audience(), report.summary);
        }
    });

    let service = Arc::new(
        CombatService::new(registry, Arc::new(demo_galaxy()), config)?
            .with_dice(Arc::new(SeededDiceSource::new(seed)))
            .with_notifier(notifier),
    );

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut tasks = JoinSet::new();
    for _ in 0..battles {
        let mut pair: Vec<ShipId> = ids.choose_multiple(&mut rng, 2).copied().collect();
        let (Some(defender), Some(attacker)) = (pair.pop(), pair.pop()) else {
            break;
        };
        let service = Arc::clone(&service);
        tasks.spawn(async move {
            let outcome = service.settle(attacker, defender).await;
            (attacker, defender, outcome)
        });
    }

    let mut reports = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        let Ok((attacker, defender, outcome)) = joined else {
            tracing::warn!("Battle task panicked");
            continue;
        };
        reports.push(match outcome {
            Ok(result) => AttackReport {
                attacker,
                defender,
                result: Some(result),
                error: None,
            },
            Err(err) => AttackReport {
                attacker,
                defender,
                result: None,
                error: Some(err.to_string()),
            },
        });
    }
    Ok(reports)
}
