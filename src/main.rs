//! Headless mission runner
//!
//! `scroll-strike [level.json] [catalog_dir] [settings.json]`
//!
//! Plays a mission with a scripted player that pushes forward while
//! shooting, and logs what happens. Without arguments the bundled demo
//! mission is used. Set `RUST_LOG=debug` for per-entity detail.

use std::error::Error;
use std::process::ExitCode;

use scroll_strike::consts::{RUNNER_MAX_TICKS, RUNNER_TICK_MS};
use scroll_strike::sim::{Direction, GameEvent, LevelData};
use scroll_strike::{Catalog, GameState, InputSnapshot, PlayerProfile, Settings, tick};

const DEMO_LEVEL: &str = include_str!("../demos/level.json");
const DEMO_CATALOG: &str = include_str!("../demos/catalog.json");

/// How a headless run ended
struct Outcome {
    ticks: u32,
    won: bool,
    lost: bool,
    score: u64,
    kills: u32,
}

fn main() -> ExitCode {
    env_logger::init();
    log::info!("Scroll Strike (headless) starting...");

    let args: Vec<String> = std::env::args().skip(1).collect();
    match run(&args) {
        Ok(outcome) => {
            let result = if outcome.won {
                "won"
            } else if outcome.lost {
                "lost"
            } else {
                "unfinished"
            };
            log::info!(
                "Mission {} after {} ticks: score {}, {} kills",
                result,
                outcome.ticks,
                outcome.score,
                outcome.kills
            );
            ExitCode::SUCCESS
        }
        Err(err) => {
            log::error!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &[String]) -> Result<Outcome, Box<dyn Error>> {
    let level = match args.first() {
        Some(path) => LevelData::load(path)?,
        None => LevelData::from_json_str(DEMO_LEVEL)?,
    };
    let catalog = match args.get(1) {
        Some(dir) => Catalog::load_dir(dir)?,
        None => Catalog::from_json_str(DEMO_CATALOG)?,
    };
    let settings = match args.get(2) {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };

    let mut profile = PlayerProfile::new("player1", 3, "pistol");
    profile.set_ammo("9mm", 200);
    profile.subscribe(|change| log::debug!("Profile: {change:?}"));

    let mut state = GameState::new(settings, catalog, level, vec![profile])?;
    let mut ticks = 0;

    while !state.is_over() && ticks < RUNNER_MAX_TICKS {
        let input = scripted_input(ticks, state.level.direction());
        tick(&mut state, &[input], RUNNER_TICK_MS)?;
        ticks += 1;

        for event in state.drain_events() {
            match event {
                GameEvent::PlayerDied { player, .. } => log::info!("Player {} down", player),
                GameEvent::SegmentAdvanced { index } => log::info!("Segment {}", index),
                GameEvent::OutOfAmmo { player } => log::warn!("Player {} is out of ammo", player),
                other => log::trace!("{other:?}"),
            }
        }
    }

    let player = state.player(0)?;
    Ok(Outcome {
        ticks,
        won: state.is_won(),
        lost: state.is_lost(),
        score: player.profile.score(),
        kills: player.kills,
    })
}

/// Push toward the scroll direction and tap the trigger
fn scripted_input(tick: u32, direction: Direction) -> InputSnapshot {
    InputSnapshot {
        primary_action: (tick / 10) % 2 == 0,
        ..InputSnapshot::moving(direction)
    }
}
