/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD).
/// Falls back to sensible defaults if the file is missing or incomplete.
///
/// Runs before logging is set up (the log destination lives in here),
/// so problems are reported on stderr.

use serde::Deserialize;
use std::path::{Path, PathBuf};

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub player: PlayerTuning,
    pub rules: RuleTuning,
    pub display: DisplayConfig,
    pub gamepad: GamepadConfig,
    pub log: LogConfig,
    pub levels_dir: PathBuf,
    pub start_level: u32,
}

/// Movement numbers, all per frame.
#[derive(Clone, Debug)]
pub struct PlayerTuning {
    pub initial_speed: f32,
    pub speed_step: f32,
    pub min_speed: f32,
    pub max_speed: f32,
    pub jump_velocity: f32,
    pub gravity: f32,   // subtracted from vertical velocity every frame
}

#[derive(Clone, Debug)]
pub struct RuleTuning {
    pub lives: u32,
    pub max_health: i32,
    pub hazard_damage: i32,
    pub coin_value: u32,
}

#[derive(Clone, Debug)]
pub struct DisplayConfig {
    pub frame_ms: u64,
    pub fov_degrees: f32,
    /// Terminal reports the cursor in cells; orbit drag expects pixels.
    pub cursor_px_per_cell: f64,
    /// Draw triangle edges only.
    pub wireframe: bool,
}

#[derive(Clone, Debug)]
pub struct GamepadConfig {
    pub jump: Vec<String>,
    pub cycle_view: Vec<String>,
    pub orbit_view: Vec<String>,
    pub chase_near: Vec<String>,
    pub chase_far: Vec<String>,
    pub speed_up: Vec<String>,
    pub speed_down: Vec<String>,
    pub restart: Vec<String>,
    pub quit: Vec<String>,
}

#[derive(Clone, Debug)]
pub struct LogConfig {
    pub file: PathBuf,
    /// `tracing_subscriber::EnvFilter` directive; `RUST_LOG` wins if set.
    pub level: String,
}

impl Default for PlayerTuning {
    fn default() -> Self {
        let t = TomlPlayer::default();
        PlayerTuning {
            initial_speed: t.speed,
            speed_step: t.speed_step,
            min_speed: t.min_speed,
            max_speed: t.max_speed,
            jump_velocity: t.jump_velocity,
            gravity: t.gravity,
        }
    }
}

impl Default for RuleTuning {
    fn default() -> Self {
        let t = TomlRules::default();
        RuleTuning {
            lives: t.lives,
            max_health: t.health,
            hazard_damage: t.hazard_damage,
            coin_value: t.coin_value,
        }
    }
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    general: TomlGeneral,
    #[serde(default)]
    player: TomlPlayer,
    #[serde(default)]
    rules: TomlRules,
    #[serde(default)]
    display: TomlDisplay,
    #[serde(default)]
    gamepad: TomlGamepad,
    #[serde(default)]
    log: TomlLog,
}

#[derive(Deserialize, Debug)]
struct TomlGeneral {
    #[serde(default = "default_levels_dir")]
    levels_dir: String,
    #[serde(default = "default_start_level")]
    start_level: u32,
}

#[derive(Deserialize, Debug)]
struct TomlPlayer {
    #[serde(default = "default_speed")]
    speed: f32,
    #[serde(default = "default_speed_step")]
    speed_step: f32,
    #[serde(default = "default_min_speed")]
    min_speed: f32,
    #[serde(default = "default_max_speed")]
    max_speed: f32,
    #[serde(default = "default_jump_velocity")]
    jump_velocity: f32,
    #[serde(default = "default_gravity")]
    gravity: f32,
}

#[derive(Deserialize, Debug)]
struct TomlRules {
    #[serde(default = "default_lives")]
    lives: u32,
    #[serde(default = "default_health")]
    health: i32,
    #[serde(default = "default_hazard_damage")]
    hazard_damage: i32,
    #[serde(default = "default_coin_value")]
    coin_value: u32,
}

#[derive(Deserialize, Debug)]
struct TomlDisplay {
    #[serde(default = "default_frame_ms")]
    frame_ms: u64,
    #[serde(default = "default_fov")]
    fov_degrees: f32,
    #[serde(default = "default_cursor_px")]
    cursor_px_per_cell: f64,
    #[serde(default)]
    wireframe: bool,
}

#[derive(Deserialize, Debug)]
struct TomlGamepad {
    #[serde(default = "default_pad_jump")]
    jump: Vec<String>,
    #[serde(default = "default_pad_cycle")]
    cycle_view: Vec<String>,
    #[serde(default = "default_pad_orbit")]
    orbit_view: Vec<String>,
    #[serde(default = "default_pad_chase_near")]
    chase_near: Vec<String>,
    #[serde(default = "default_pad_chase_far")]
    chase_far: Vec<String>,
    #[serde(default = "default_pad_faster")]
    speed_up: Vec<String>,
    #[serde(default = "default_pad_slower")]
    speed_down: Vec<String>,
    #[serde(default = "default_pad_restart")]
    restart: Vec<String>,
    #[serde(default = "default_pad_quit")]
    quit: Vec<String>,
}

#[derive(Deserialize, Debug)]
struct TomlLog {
    #[serde(default = "default_log_file")]
    file: String,
    #[serde(default = "default_log_level")]
    level: String,
}

// ── Defaults ──

/// Upper bound for `rules.health` and `rules.hazard_damage`.
const MAX_HEALTH: i32 = 100;

fn default_levels_dir() -> String { "levels".into() }
fn default_start_level() -> u32 { 1 }
fn default_speed() -> f32 { 1.0 }
fn default_speed_step() -> f32 { 0.2 }
fn default_min_speed() -> f32 { 0.2 }
fn default_max_speed() -> f32 { 4.0 }
fn default_jump_velocity() -> f32 { 2.0 }
fn default_gravity() -> f32 { 0.1 }   // 2.0 / 0.1 → 40 frames up and down
fn default_lives() -> u32 { 5 }
fn default_health() -> i32 { 100 }
fn default_hazard_damage() -> i32 { 20 }
fn default_coin_value() -> u32 { 10 }
fn default_frame_ms() -> u64 { 16 }   // ~60 fps
fn default_fov() -> f32 { 45.0 }
fn default_cursor_px() -> f64 { 8.0 }

fn default_pad_jump() -> Vec<String> { vec!["A".into()] }
fn default_pad_cycle() -> Vec<String> { vec!["Y".into()] }
fn default_pad_orbit() -> Vec<String> { vec!["X".into()] }
fn default_pad_chase_near() -> Vec<String> { vec!["L2".into()] }
fn default_pad_chase_far() -> Vec<String> { vec!["R2".into()] }
fn default_pad_faster() -> Vec<String> { vec!["R1".into()] }
fn default_pad_slower() -> Vec<String> { vec!["L1".into()] }
fn default_pad_restart() -> Vec<String> { vec!["Start".into()] }
fn default_pad_quit() -> Vec<String> { vec!["Select".into()] }
fn default_log_file() -> String { "blockhop.log".into() }
fn default_log_level() -> String { "info".into() }

impl Default for TomlGeneral {
    fn default() -> Self {
        TomlGeneral {
            levels_dir: default_levels_dir(),
            start_level: default_start_level(),
        }
    }
}

impl Default for TomlPlayer {
    fn default() -> Self {
        TomlPlayer {
            speed: default_speed(),
            speed_step: default_speed_step(),
            min_speed: default_min_speed(),
            max_speed: default_max_speed(),
            jump_velocity: default_jump_velocity(),
            gravity: default_gravity(),
        }
    }
}

impl Default for TomlRules {
    fn default() -> Self {
        TomlRules {
            lives: default_lives(),
            health: default_health(),
            hazard_damage: default_hazard_damage(),
            coin_value: default_coin_value(),
        }
    }
}

impl Default for TomlDisplay {
    fn default() -> Self {
        TomlDisplay {
            frame_ms: default_frame_ms(),
            fov_degrees: default_fov(),
            cursor_px_per_cell: default_cursor_px(),
            wireframe: false,
        }
    }
}

impl Default for TomlGamepad {
    fn default() -> Self {
        TomlGamepad {
            jump: default_pad_jump(),
            cycle_view: default_pad_cycle(),
            orbit_view: default_pad_orbit(),
            chase_near: default_pad_chase_near(),
            chase_far: default_pad_chase_far(),
            speed_up: default_pad_faster(),
            speed_down: default_pad_slower(),
            restart: default_pad_restart(),
            quit: default_pad_quit(),
        }
    }
}

impl Default for TomlLog {
    fn default() -> Self {
        TomlLog {
            file: default_log_file(),
            level: default_log_level(),
        }
    }
}

// ── Loading ──

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory.
    /// Missing file or missing keys gracefully fall back to defaults.
    pub fn load() -> Self {
        let search_dirs = candidate_dirs();
        let toml_cfg = load_toml(&search_dirs);
        Self::from_toml(toml_cfg, &search_dirs)
    }

    fn from_toml(toml_cfg: TomlConfig, search_dirs: &[PathBuf]) -> Self {
        let levels_dir = resolve_dir(&toml_cfg.general.levels_dir, search_dirs);

        let mut player = PlayerTuning {
            initial_speed: toml_cfg.player.speed,
            speed_step: toml_cfg.player.speed_step,
            min_speed: toml_cfg.player.min_speed,
            max_speed: toml_cfg.player.max_speed,
            jump_velocity: toml_cfg.player.jump_velocity,
            gravity: toml_cfg.player.gravity,
        };
        if player.min_speed > player.max_speed {
            eprintln!("Warning: player.min_speed > player.max_speed, swapping.");
            std::mem::swap(&mut player.min_speed, &mut player.max_speed);
        }
        player.initial_speed = player.initial_speed.clamp(player.min_speed, player.max_speed);

        GameConfig {
            player,
            rules: RuleTuning {
                lives: toml_cfg.rules.lives.max(1),
                max_health: toml_cfg.rules.health.clamp(1, MAX_HEALTH),
                hazard_damage: toml_cfg.rules.hazard_damage.clamp(1, MAX_HEALTH),
                coin_value: toml_cfg.rules.coin_value,
            },
            display: DisplayConfig {
                frame_ms: toml_cfg.display.frame_ms.max(1),
                fov_degrees: toml_cfg.display.fov_degrees,
                cursor_px_per_cell: toml_cfg.display.cursor_px_per_cell,
                wireframe: toml_cfg.display.wireframe,
            },
            gamepad: GamepadConfig {
                jump: toml_cfg.gamepad.jump,
                cycle_view: toml_cfg.gamepad.cycle_view,
                orbit_view: toml_cfg.gamepad.orbit_view,
                chase_near: toml_cfg.gamepad.chase_near,
                chase_far: toml_cfg.gamepad.chase_far,
                speed_up: toml_cfg.gamepad.speed_up,
                speed_down: toml_cfg.gamepad.speed_down,
                restart: toml_cfg.gamepad.restart,
                quit: toml_cfg.gamepad.quit,
            },
            log: LogConfig {
                file: PathBuf::from(toml_cfg.log.file),
                level: toml_cfg.log.level,
            },
            levels_dir,
            start_level: toml_cfg.general.start_level,
        }
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self::from_toml(TomlConfig::default(), &[])
    }
}

/// Absolute paths pass through; relative ones are looked up in the
/// candidate dirs and fall back to CWD-relative.
fn resolve_dir(dir: &str, search_dirs: &[PathBuf]) -> PathBuf {
    let path = Path::new(dir);
    if path.is_absolute() {
        return path.to_path_buf();
    }
    search_dirs.iter()
        .map(|d| d.join(dir))
        .find(|p| p.is_dir())
        .unwrap_or_else(|| PathBuf::from(dir))
}

/// Candidate directories to search: exe dir + CWD (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    // 1. Directory of the running executable
    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    // 2. Current working directory
    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

/// Search for config.toml in candidate directories.
fn load_toml(search_dirs: &[PathBuf]) -> TomlConfig {
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(text) => match toml::from_str::<TomlConfig>(&text) {
                    Ok(cfg) => return cfg,
                    Err(e) => {
                        eprintln!("Warning: config.toml parse error: {e}");
                        eprintln!("Using default settings.");
                        return TomlConfig::default();
                    }
                },
                Err(e) => {
                    eprintln!("Warning: could not read {}: {e}", path.display());
                }
            }
        }
    }
    TomlConfig::default()
}
