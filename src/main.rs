/// Entry point and game loop.

mod config;
mod domain;
mod error;
mod gfx;
mod sim;
mod ui;

use std::fs::File;
use std::process::ExitCode;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use config::GameConfig;
use error::{GameError, Result};
use sim::event::GameEvent;
use sim::level::load_level;
use sim::step;
use sim::world::WorldState;
use ui::gamepad::GamepadState;
use ui::input::InputState;
use ui::renderer::TerminalBackend;

/// HUD blink period.
const SLOW_TICK: Duration = Duration::from_millis(500);
/// Frames a gameplay message stays on the message bar.
const MESSAGE_FRAMES: u32 = 90;

fn main() -> ExitCode {
    let config = GameConfig::load();

    if let Err(e) = init_logging(&config) {
        eprintln!("{e}");
        return ExitCode::FAILURE;
    }

    let mut world = WorldState::new(&config);
    let mut backend = TerminalBackend::new();

    let honor_release = match backend.init() {
        Ok(flag) => flag,
        Err(e) => {
            // Raw mode may be half-enabled.
            let _ = backend.cleanup();
            error!(error = %e, "terminal init failed");
            eprintln!("Terminal init failed: {e}");
            return ExitCode::FAILURE;
        }
    };

    let result = game_loop(&mut world, &mut backend, &config, honor_release);

    if let Err(e) = backend.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }

    println!();
    println!("Thanks for playing Block Hop!");
    println!("Final Score: {}  (level {})", world.game.score, world.game.level);

    match result {
        Err(e) if e.is_fatal() => {
            error!(error = %e, "game aborted");
            eprintln!("Game error: {e}");
            ExitCode::FAILURE
        }
        _ => ExitCode::SUCCESS,
    }
}

/// Route `tracing` to the configured log file. The terminal belongs to
/// the renderer, so nothing is written to stdout/stderr while playing.
fn init_logging(config: &GameConfig) -> Result<()> {
    let path = &config.log.file;
    let file = File::create(path).map_err(|source| GameError::LogFile {
        path: path.clone(),
        source,
    })?;
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log.level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();

    info!(
        levels_dir = %config.levels_dir.display(),
        start_level = config.start_level,
        frame_ms = config.display.frame_ms,
        "block hop starting"
    );
    Ok(())
}

fn game_loop(
    world: &mut WorldState,
    backend: &mut TerminalBackend,
    config: &GameConfig,
    honor_release: bool,
) -> Result<()> {
    let mut kb = InputState::new(config.display.cursor_px_per_cell);
    kb.honor_release = honor_release;
    let mut gp = GamepadState::new();
    gp.load_button_config(&config.gamepad);
    info!(gamepad = gp.connected, key_release = honor_release, "input ready");

    let frame_time = Duration::from_millis(config.display.frame_ms.max(1));
    let mut last_slow = Instant::now();

    load_level(world, backend);

    loop {
        let frame_start = Instant::now();

        kb.drain_events();
        gp.update();

        if kb.ctrl_c_pressed() || kb.quit_pressed() || gp.quit_pressed() {
            info!(score = world.game.score, level = world.game.level, "quit");
            break;
        }

        let mut input = kb.frame_input();
        gp.merge_into(&mut input);

        backend.begin_frame()?;
        let aspect = backend.aspect();
        let events = step::frame(world, backend, &input, aspect);
        announce(world, &events);

        if last_slow.elapsed() >= SLOW_TICK {
            world.slow_tick = world.slow_tick.wrapping_add(1);
            last_slow = Instant::now();
        }

        backend.present(world)?;

        if let Some(rest) = frame_time.checked_sub(frame_start.elapsed()) {
            std::thread::sleep(rest);
        }
    }

    Ok(())
}

/// Log every event and put the interesting ones on the message bar.
fn announce(world: &mut WorldState, events: &[GameEvent]) {
    for event in events {
        info!(?event, tick = world.tick, "game event");
        let msg = match event {
            GameEvent::CoinCollected { score } => format!("Coin!  score {score}"),
            GameEvent::KeyCollected => "Key found: the lift is unlocked".to_string(),
            GameEvent::LiftEngaged => "Going up...".to_string(),
            GameEvent::LevelComplete { level } => format!("Level {level} complete"),
            GameEvent::HealthLost { health } => format!("Ouch!  health {health}"),
            GameEvent::LifeLost { lives } => format!("Life lost, {lives} left"),
            GameEvent::FellIntoPit => "Falling!".to_string(),
            GameEvent::GameOver { score } => format!("GAME OVER  final score {score}"),
        };
        world.set_message(&msg, MESSAGE_FRAMES);
    }
}
