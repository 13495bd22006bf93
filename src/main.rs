/// Entry point and game loop.

mod ui;

use std::fs::File;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use burrower::config::GameConfig;
use burrower::sim::{Phase, SimulationContext};
use ui::input::InputState;
use ui::renderer::Renderer;

const FRAME_SLEEP: Duration = Duration::from_millis(5);
const LOG_FILE: &str = "burrower.log";

fn main() {
    init_tracing();

    let config = GameConfig::load();
    let mut world = match SimulationContext::initialize_level(config.level.clone(), config.tuning.clone()) {
        Ok(world) => world,
        Err(e) => {
            error!(error = %e, "level_init_failed");
            eprintln!("Invalid level configuration: {e}");
            std::process::exit(1);
        }
    };

    let mut renderer = Renderer::new();
    if let Err(e) = renderer.init() {
        eprintln!("Terminal init failed: {e}");
        return;
    }

    let result = game_loop(&mut world, &mut renderer, &config);

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }

    if let Err(e) = result {
        error!(error = %e, "game_loop_failed");
        eprintln!("Game error: {e}");
    }

    info!(score = world.score, level = world.level, "session_end");
    println!();
    println!("Thanks for playing Burrower!");
    println!("Final Score: {}  (level {})", world.score, world.level);
}

/// The terminal belongs to the renderer, so logs go to a file.
fn init_tracing() {
    let Ok(file) = File::create(LOG_FILE) else {
        return;
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .init();
}

fn game_loop(
    world: &mut SimulationContext,
    renderer: &mut Renderer,
    config: &GameConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut input = InputState::new();
    input.honor_release = renderer.enhanced_keys();
    let tick_rate = Duration::from_millis(config.tick_rate_ms);
    let mut last_tick = Instant::now();
    let mut paused = false;

    info!(
        rows = world.grid.rows(),
        cols = world.grid.cols(),
        tick_rate_ms = config.tick_rate_ms,
        "game_start"
    );

    loop {
        input.drain_events();

        if input.quit_pressed() {
            break;
        }
        if input.restart_pressed() {
            world.restart()?;
            paused = false;
            last_tick = Instant::now();
            info!("restart");
        }
        if input.pause_pressed() && world.phase == Phase::Playing {
            paused = !paused;
        }

        if last_tick.elapsed() >= tick_rate {
            let dt = last_tick.elapsed().as_secs_f32();
            last_tick = Instant::now();
            // Paused ticks still consume the latched fire.
            let intent = input.take_intent();
            if !paused {
                world.tick(intent, dt);
            }
        }

        renderer.render(&world.snapshot(), paused)?;
        std::thread::sleep(FRAME_SLEEP);
    }

    Ok(())
}
