/// Player controller: per-frame integration of held keys.
///
/// ## Order within a frame
///
///   1. Steer   - heading changes even mid-fall (the cube still spins)
///   2. Advance - position moves along the heading, Neutral phase only
///   3. Jump    - vertical velocity integrates, Neutral phase only
///
/// `advance` returns the delta it applied so the rule engine can undo it
/// when the player walks into a blocking block.

use std::f32::consts::PI;

use glam::Vec3;

use super::entity::{GROUND_Z, MoveDir, PlayerState, SpeedStep, Turn};
use crate::config::PlayerTuning;

/// Radians added to the heading per frame while a turn key is held.
pub const TURN_RATE: f32 = (1.0 / PI) / 10.0;

pub fn steer(player: &mut PlayerState, turn: Turn) {
    player.heading += turn.sign() * TURN_RATE;
}

/// Move along the heading. Returns the applied delta (zero when the
/// current phase does not allow control).
pub fn advance(player: &mut PlayerState, dir: MoveDir) -> Vec3 {
    if !player.phase.allows_control() {
        return Vec3::ZERO;
    }
    let delta = player.facing() * (dir.sign() * player.speed);
    player.position += delta;
    delta
}

/// Space pressed. Re-pressing mid-air restarts the climb.
pub fn start_jump(player: &mut PlayerState, tuning: &PlayerTuning) {
    if !player.phase.allows_control() {
        return;
    }
    player.vertical_velocity = tuning.jump_velocity;
    player.jumping = true;
}

/// One frame of ballistic motion. Lands on the ground plane.
pub fn integrate_jump(player: &mut PlayerState, tuning: &PlayerTuning) {
    if !player.jumping || !player.phase.allows_control() {
        return;
    }
    player.vertical_velocity -= tuning.gravity;
    player.position.z += player.vertical_velocity;
    if player.position.z <= GROUND_Z {
        land(player);
    }
}

/// Put the player on the ground plane and drop any jump in progress.
pub fn land(player: &mut PlayerState) {
    player.position.z = GROUND_Z;
    player.vertical_velocity = 0.0;
    player.jumping = false;
}

pub fn adjust_speed(player: &mut PlayerState, step: SpeedStep, tuning: &PlayerTuning) {
    let delta = match step {
        SpeedStep::Faster => tuning.speed_step,
        SpeedStep::Slower => -tuning.speed_step,
    };
    player.speed = (player.speed + delta).clamp(tuning.min_speed, tuning.max_speed);
}
