/// WorldState: the complete snapshot of a running game.
///
/// Passed by `&mut` through every frame; there is no other mutable
/// state. Three layers:
///   - `player`  - the controlled cube (position, heading, phase)
///   - `game`    - counters that survive level loads (score, lives...)
///   - `scene`   - what the current level file placed, rebuilt per load
///
/// ## Frame transitions
///
/// Rules never reload a level mid-frame. They set `pending` and the next
/// frame applies it before anything is drawn:
///
///   LevelTransition → level + 1, reload
///   LifeLost        → lives and health back to full, start level, reload
///   Restarting      → everything back to full, score 0, start level, reload

use std::path::PathBuf;

use crate::config::{GameConfig, PlayerTuning, RuleTuning};
use crate::domain::camera::{Camera, ViewMode};
use crate::domain::entity::PlayerState;
use crate::gfx::FillMode;
use crate::sim::scene::Scene;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum FramePhase {
    #[default]
    Playing,
    LevelTransition,
    LifeLost,
    Restarting,
}

/// Counters shown on the HUD.
#[derive(Clone, Debug, PartialEq)]
pub struct GameState {
    pub level: u32,
    pub lives: u32,
    pub health: i32,
    pub score: u32,
    pub has_key: bool,
}

impl GameState {
    pub fn new(level: u32, rules: &RuleTuning) -> Self {
        GameState {
            level,
            lives: rules.lives,
            health: rules.max_health,
            score: 0,
            has_key: false,
        }
    }
}

pub struct WorldState {
    pub player: PlayerState,
    pub game: GameState,
    pub scene: Scene,
    pub camera: Camera,

    /// Transition applied at the start of the next frame.
    pub pending: FramePhase,
    /// Frames simulated since the program started.
    pub tick: u64,
    /// Half-second wall-clock counter, drives HUD blinking.
    pub slow_tick: u32,

    // ── UI ──
    pub message: String,
    pub message_timer: u32,

    // ── Config ──
    pub player_tuning: PlayerTuning,
    pub rules: RuleTuning,
    pub fov_degrees: f32,
    pub fill: FillMode,
    pub levels_dir: PathBuf,
    pub start_level: u32,
}

impl WorldState {
    pub fn new(config: &GameConfig) -> Self {
        let start_level = config.start_level.max(1);
        WorldState {
            player: PlayerState::new(config.player.initial_speed),
            game: GameState::new(start_level, &config.rules),
            scene: Scene::default(),
            camera: Camera::default(),
            pending: FramePhase::Playing,
            tick: 0,
            slow_tick: 0,
            message: String::new(),
            message_timer: 0,
            player_tuning: config.player.clone(),
            rules: config.rules.clone(),
            fov_degrees: config.display.fov_degrees,
            fill: if config.display.wireframe { FillMode::Line } else { FillMode::Fill },
            levels_dir: config.levels_dir.clone(),
            start_level,
        }
    }

    pub fn view(&self) -> ViewMode {
        self.camera.mode
    }

    pub fn set_message(&mut self, msg: &str, duration: u32) {
        self.message = msg.to_string();
        self.message_timer = duration;
    }

    /// Count down the message bar, clearing it when it expires.
    pub fn tick_message(&mut self) {
        if self.message_timer > 0 {
            self.message_timer -= 1;
            if self.message_timer == 0 {
                self.message.clear();
            }
        }
    }

    /// Back to the first level with full lives and health.
    pub fn reset_progress(&mut self, keep_score: bool) {
        let score = if keep_score { self.game.score } else { 0 };
        self.game = GameState::new(self.start_level, &self.rules);
        self.game.score = score;
    }
}
