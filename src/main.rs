//! Asteroids Sim entry point
//!
//! Headless attract mode: an autopilot ship plays a seeded run while the HUD
//! is logged once per simulated second.
//!
//! Usage: `asteroids-sim [seed] [seconds] [settings.json]`

use std::path::Path;

use asteroids_sim::consts::{DEFAULT_HEIGHT, DEFAULT_WIDTH};
use asteroids_sim::sim::{Category, TickInput, World, tick};
use asteroids_sim::{Scoreboard, Settings, SimError};
use glam::Vec2;

const DEFAULT_SEED: u64 = 0x5EED;
const DEFAULT_SECONDS: f32 = 60.0;
/// Step used when the frame cap is off
const UNCAPPED_DT: f32 = 1.0 / 120.0;

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let seed = args.first().and_then(|s| s.parse().ok()).unwrap_or(DEFAULT_SEED);
    let seconds = args.get(1).and_then(|s| s.parse().ok()).unwrap_or(DEFAULT_SECONDS);
    let settings = args.get(2).map(|p| Settings::load(Path::new(p))).unwrap_or_default();

    log::info!("Asteroids Sim (headless) starting, seed {:#x}", seed);
    if !settings.demo_enabled {
        log::info!("Attract mode disabled in settings, nothing to run");
        return;
    }

    match run(seed, seconds, settings) {
        Ok(board) => match board.to_json() {
            Ok(json) => println!("{json}"),
            Err(e) => log::error!("Could not encode scoreboard: {}", e),
        },
        Err(e) => log::error!("Run failed: {}", e),
    }
}

fn run(seed: u64, seconds: f32, settings: Settings) -> Result<Scoreboard, SimError> {
    let dt = settings.frame_time().unwrap_or(UNCAPPED_DT);
    let mut world = World::with_settings(seed, settings);
    world.set_bounds(DEFAULT_WIDTH, DEFAULT_HEIGHT)?;
    world.spawn_autopilot(Vec2::new(DEFAULT_WIDTH, DEFAULT_HEIGHT) * 0.5)?;

    let input = TickInput::default();
    let mut elapsed = 0.0;
    let mut next_report = 1.0;
    while elapsed < seconds {
        tick(&mut world, &input, dt);
        elapsed += dt;

        if elapsed >= next_report {
            next_report += 1.0;
            let hud = world.hud();
            log::info!(
                "t={:>5.1}s round {} score {:>6} lives {} asteroids {} saucers {} particles {}",
                elapsed,
                hud.round,
                hud.score,
                hud.lives,
                world.registry().count(Category::Asteroid),
                world.registry().count(Category::Saucer),
                world.particle_count(),
            );
        }
    }

    let hud = world.hud();
    log::info!("Finished: round {} score {}", hud.round, hud.score);

    let mut board = Scoreboard::new();
    board.submit("DEMO", hud.score, hud.round);
    Ok(board)
}
