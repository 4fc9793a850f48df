//! Territory Wars headless runner
//!
//! Plays a full CPU-vs-CPU match at the fixed tick rate and prints the result.

#![allow(clippy::print_stdout)]

#[cfg(not(target_arch = "wasm32"))]
use std::path::PathBuf;

#[cfg(not(target_arch = "wasm32"))]
use anyhow::{Context, Result};
#[cfg(not(target_arch = "wasm32"))]
use clap::Parser;

#[cfg(not(target_arch = "wasm32"))]
use territory_wars::consts::SIM_DT;
#[cfg(not(target_arch = "wasm32"))]
use territory_wars::sim::{GameEvent, GameState, Snapshot, TickInput};
#[cfg(not(target_arch = "wasm32"))]
use territory_wars::{MapVariant, MatchSettings, logging};

/// Headless Territory Wars match
#[cfg(not(target_arch = "wasm32"))]
#[derive(Parser, Debug)]
#[command(name = "territory-wars")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Match settings JSON file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Random seed (overrides the settings file)
    #[arg(short, long)]
    seed: Option<u64>,

    /// Map layout: plains, fortress or canyon
    #[arg(short, long)]
    map: Option<String>,

    /// Give up after this many ticks (default: 30 minutes of play)
    #[arg(long, default_value = "108000")]
    max_ticks: u64,

    /// Print the final snapshot as JSON
    #[arg(long)]
    json: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> Result<()> {
    let args = Args::parse();
    logging::init(args.verbose);

    let mut settings = match &args.config {
        Some(path) => MatchSettings::load(path).with_context(|| format!("loading {}", path.display()))?,
        None => MatchSettings::default(),
    };
    if let Some(seed) = args.seed {
        settings.seed = seed;
    }
    if let Some(name) = &args.map {
        settings.map = name.parse::<MapVariant>()?;
    }
    settings.autopilot = true;

    log::info!("Territory Wars (headless) seed {} on {}", settings.seed, settings.map.as_str());
    let mut state = GameState::new(settings);
    let input = TickInput::default();

    let mut shots = 0u32;
    let mut eliminations = 0u32;
    while !state.is_over() && state.time_ticks < args.max_ticks {
        for event in state.advance(SIM_DT, &input) {
            match event {
                GameEvent::ProjectileFired { .. } | GameEvent::DirectHit { .. } => shots += 1,
                GameEvent::UnitEliminated { .. } => eliminations += 1,
                _ => {}
            }
        }
    }

    if args.json {
        println!("{}", Snapshot::capture(&state).to_json()?);
        return Ok(());
    }

    let [a, b] = state.scores();
    let seconds = state.time_ticks as f32 * SIM_DT;
    match (state.is_over(), state.match_state.winner) {
        (true, Some(team)) => println!("Team {team:?} wins {a} - {b}"),
        (true, None) => println!("Draw {a} - {b}"),
        (false, _) => println!("No result after {} ticks ({a} - {b})", state.time_ticks),
    }
    println!(
        "{} turns, {:.1}s simulated, {} attacks, {} eliminations",
        state.turn.turn_number, seconds, shots, eliminations
    );
    Ok(())
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // The simulation is driven by the host page on the web
}
