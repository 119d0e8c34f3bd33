/// Entities: Player, Coin, Lift, plus the per-frame input snapshot.
/// Player state machine is minimal: Neutral / Falling / Ascending.

use std::f32::consts::FRAC_PI_2;

use glam::Vec3;

/// Fixed respawn point shared by every level.
pub const START_POSITION: Vec3 = Vec3::new(80.0, -80.0, 20.0);
pub const START_HEADING: f32 = FRAC_PI_2;
/// Altitude of the walkable surface (top of a floor block).
pub const GROUND_Z: f32 = 20.0;

/// Multi-frame part of the rule engine's outcome.
/// Anything that resolves within a single frame (push-back, damage)
/// never lands here.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum CollisionPhase {
    #[default]
    Neutral,
    Falling,   // dropping through a pit, no steering
    Ascending, // riding the lift, no steering
}

impl CollisionPhase {
    /// Can the player steer and jump this frame?
    pub fn allows_control(self) -> bool {
        self == CollisionPhase::Neutral
    }
}

#[derive(Clone, Debug)]
pub struct PlayerState {
    pub position: Vec3,
    pub heading: f32,
    pub vertical_velocity: f32,
    pub speed: f32,
    pub jumping: bool,
    pub phase: CollisionPhase,
}

impl PlayerState {
    pub fn new(speed: f32) -> Self {
        PlayerState {
            position: START_POSITION,
            heading: START_HEADING,
            vertical_velocity: 0.0,
            speed,
            jumping: false,
            phase: CollisionPhase::Neutral,
        }
    }

    /// Back to the start point. Speed survives respawns.
    pub fn respawn(&mut self) {
        self.position = START_POSITION;
        self.heading = START_HEADING;
        self.vertical_velocity = 0.0;
        self.jumping = false;
        self.phase = CollisionPhase::Neutral;
    }

    /// Unit vector along the heading, in the ground plane.
    pub fn facing(&self) -> Vec3 {
        Vec3::new(self.heading.cos(), self.heading.sin(), 0.0)
    }
}

#[derive(Clone, Debug)]
pub struct Coin {
    pub position: Vec3,
    pub collected: bool,
}

impl Coin {
    pub fn new(position: Vec3) -> Self {
        Coin { position, collected: false }
    }
}

/// The level exit platform. `position.z` climbs while the player rides it.
#[derive(Clone, Debug)]
pub struct Lift {
    pub position: Vec3,
}

// ── Input snapshot ──

/// Held up/down keys.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum MoveDir {
    Forward,
    Backward,
    #[default]
    Idle,
}

impl MoveDir {
    pub fn sign(self) -> f32 {
        match self {
            MoveDir::Forward => 1.0,
            MoveDir::Backward => -1.0,
            MoveDir::Idle => 0.0,
        }
    }
}

/// Held left/right keys. Left is counter-clockwise (heading grows).
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Turn {
    Left,
    Right,
    #[default]
    None,
}

impl Turn {
    pub fn sign(self) -> f32 {
        match self {
            Turn::Left => 1.0,
            Turn::Right => -1.0,
            Turn::None => 0.0,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SpeedStep {
    Faster,
    Slower,
}

/// Edge-triggered camera keys.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ViewCommand {
    Cycle,
    Orbit,
    ChaseNear,
    ChaseFar,
}

/// Mouse state for the frame. `cursor_x` is in pixels (or pixel-equivalents).
#[derive(Clone, Copy, Debug, Default)]
pub struct PointerInput {
    pub cursor_x: f64,
    /// Right button went down since the previous frame.
    pub drag_started: bool,
    /// Right button is held.
    pub dragging: bool,
    /// Accumulated wheel movement since the previous frame (up is positive).
    pub scroll_y: f64,
}

/// Frame input: continuous state (held keys) and one-shot presses.
#[derive(Clone, Copy, Debug, Default)]
pub struct FrameInput {
    pub movement: MoveDir,
    pub turn: Turn,
    pub jump: bool,
    pub speed: Option<SpeedStep>,
    pub view: Option<ViewCommand>,
    pub restart: bool,
    pub pointer: PointerInput,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn respawn_keeps_speed_and_resets_the_rest() {
        let mut p = PlayerState::new(1.0);
        p.speed = 3.0;
        p.position = Vec3::new(1.0, 2.0, -40.0);
        p.heading = 0.3;
        p.jumping = true;
        p.phase = CollisionPhase::Falling;
        p.respawn();
        assert_eq!(p.position, START_POSITION);
        assert_eq!(p.heading, START_HEADING);
        assert!(!p.jumping);
        assert_eq!(p.phase, CollisionPhase::Neutral);
        assert_eq!(p.speed, 3.0);
    }

    #[test]
    fn only_neutral_allows_control() {
        assert!(CollisionPhase::Neutral.allows_control());
        assert!(!CollisionPhase::Falling.allows_control());
        assert!(!CollisionPhase::Ascending.allows_control());
    }

    #[test]
    fn start_heading_faces_north() {
        let f = PlayerState::new(1.0).facing();
        assert!(f.x.abs() < 1e-6);
        assert!((f.y - 1.0).abs() < 1e-6);
    }
}
