#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs a headless Gridfall session.

use std::time::Duration;

use clap::Parser;
use gridfall_cli::{Session, SessionOutcome};
use gridfall_core::{config::LevelPlan, GridPos, TowerKind};

/// Runs the bundled level with a scripted defense and prints the outcome.
#[derive(Debug, Parser)]
#[command(name = "gridfall", about = "Headless Gridfall session runner")]
struct Args {
    /// Seed for the session's deterministic randomness.
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Fixed timestep per tick in milliseconds.
    #[arg(long, default_value_t = 50)]
    dt_ms: u64,

    /// Maximum number of ticks before the run is abandoned.
    #[arg(long, default_value_t = 20_000)]
    ticks: u64,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let plan = LevelPlan::standard();
    let mut session = Session::new(&plan, args.seed)?;

    // A small scripted defense along the first bends of the route.
    for (kind, cell) in [
        (TowerKind::Turret, GridPos::new(1, 1)),
        (TowerKind::Turret, GridPos::new(8, 5)),
        (TowerKind::Rapid, GridPos::new(13, 7)),
    ] {
        let _ = session
            .build_tower(kind, cell)
            .map_err(|error| log::warn!("skipping tower at ({}, {}): {error}", cell.x(), cell.y()));
    }

    let outcome = session.run(Duration::from_millis(args.dt_ms), args.ticks);

    let player = session.player();
    let verdict = match outcome {
        SessionOutcome::Victory => "victory",
        SessionOutcome::Defeat => "defeat",
        SessionOutcome::OutOfTicks => "unresolved",
    };
    println!("outcome:  {verdict}");
    println!("time:     {:.1}s", session.now().as_secs_f64());
    println!("wave:     {}", player.wave());
    println!("hp:       {}/{}", player.hp(), player.max_hp());
    println!("gold:     {}", player.gold());
    println!("towers:   {}", session.towers().len());
    Ok(())
}
