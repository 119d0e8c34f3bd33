/// The frame function: advances the world by one frame and draws it.
///
/// Processing order:
///   1. Pending transition (next level, game over, restart)
///   2. Camera: view keys, drag, wheel
///   3. Scene render (blocks, spike plates, lift, key, coins)
///   4. Player controller (steer, speed, move, jump)
///   5. Pickups (key, coins) and coin spin, at the moved position
///   6. Rule engine: probes → one resolved contact → effect
///   7. Player render
///
/// Rules never reload a level themselves; they leave a `FramePhase`
/// in `world.pending` for step 1 of the next frame.

use glam::{Mat4, Vec3};

use crate::domain::camera;
use crate::domain::entity::{CollisionPhase, FrameInput};
use crate::domain::geometry::{HAZARD_OFFSETS, HOLE_LIFT};
use crate::domain::physics;
use crate::domain::rules::{self, Contact, Probes};
use crate::gfx::RenderBackend;
use super::event::GameEvent;
use super::level::load_level;
use super::world::{FramePhase, WorldState};

// ══════════════════════════════════════════════════════════════
// Main entry point
// ══════════════════════════════════════════════════════════════

/// Run one frame. `aspect` is the output's width / height.
pub fn frame(
    world: &mut WorldState,
    backend: &mut dyn RenderBackend,
    input: &FrameInput,
    aspect: f32,
) -> Vec<GameEvent> {
    if input.restart {
        world.pending = FramePhase::Restarting;
    }
    apply_pending(world, backend);

    world.tick += 1;
    world.tick_message();

    let mut events = Vec::new();
    draw(world, backend, input, aspect, &mut events);
    events
}

/// Apply the transition requested by the previous frame, if any.
pub fn apply_pending(world: &mut WorldState, backend: &mut dyn RenderBackend) {
    match world.pending {
        FramePhase::Playing => return,
        FramePhase::LevelTransition => world.game.level += 1,
        FramePhase::LifeLost => world.reset_progress(true),
        FramePhase::Restarting => world.reset_progress(false),
    }
    world.pending = FramePhase::Playing;
    load_level(world, backend);
}

fn draw(
    world: &mut WorldState,
    backend: &mut dyn RenderBackend,
    input: &FrameInput,
    aspect: f32,
    events: &mut Vec<GameEvent>,
) {
    if let Some(cmd) = input.view {
        world.camera.apply(cmd);
    }
    world.camera.update(&input.pointer);
    let vp = camera::projection(aspect, world.fov_degrees) * world.camera.view_matrix(&world.player);

    render_scene(world, backend, vp);
    let delta = resolve_controls(world, input);
    resolve_pickups(world, events);
    resolve_contact(world, delta, events);
    render_player(world, backend, vp);
}

// ══════════════════════════════════════════════════════════════
// Rendering
// ══════════════════════════════════════════════════════════════

fn render_scene(world: &WorldState, backend: &mut dyn RenderBackend, vp: Mat4) {
    let Some(meshes) = world.scene.meshes else { return };
    let player = world.player.position;

    for block in world.scene.blocks() {
        if let Some(handle) = block.handle {
            backend.render(handle, vp * Mat4::from_translation(block.position));
        }
    }

    for hazard in &world.scene.hazards {
        let base = vp * Mat4::from_translation(hazard.position);
        backend.render(meshes.plate, base);
        for (dx, dy) in HAZARD_OFFSETS {
            backend.render(meshes.hole, base * Mat4::from_translation(Vec3::new(dx, dy, HOLE_LIFT)));
        }
        let spike_z = rules::spike_z(player, hazard.position);
        for (dx, dy) in HAZARD_OFFSETS {
            backend.render(meshes.spike, base * Mat4::from_translation(Vec3::new(dx, dy, spike_z)));
        }
    }

    if let Some(lift) = &world.scene.lift {
        backend.render(meshes.lift, vp * Mat4::from_translation(lift.position));
    }

    if let (Some(key), false) = (world.scene.key, world.game.has_key) {
        backend.render(meshes.key, vp * Mat4::from_translation(key));
    }

    let spin = Mat4::from_rotation_z(world.scene.coin_spin);
    for coin in world.scene.uncollected_coins() {
        backend.render(meshes.coin, vp * Mat4::from_translation(coin.position) * spin);
    }
}

fn render_player(world: &WorldState, backend: &mut dyn RenderBackend, vp: Mat4) {
    let Some(meshes) = world.scene.meshes else { return };
    let model = Mat4::from_translation(world.player.position)
        * Mat4::from_rotation_z(world.player.heading);
    backend.render(meshes.player, vp * model);
}

// ══════════════════════════════════════════════════════════════
// Controller
// ══════════════════════════════════════════════════════════════

/// Apply held keys. Returns this frame's planar move so a blocked
/// contact can take it back.
fn resolve_controls(world: &mut WorldState, input: &FrameInput) -> Vec3 {
    let tuning = &world.player_tuning;
    let player = &mut world.player;

    physics::steer(player, input.turn);
    if let Some(step) = input.speed {
        physics::adjust_speed(player, step, tuning);
    }
    let delta = physics::advance(player, input.movement);
    if input.jump {
        physics::start_jump(player, tuning);
    }
    physics::integrate_jump(player, tuning);
    delta
}

// ══════════════════════════════════════════════════════════════
// Rule engine
// ══════════════════════════════════════════════════════════════

fn resolve_contact(world: &mut WorldState, delta: Vec3, events: &mut Vec<GameEvent>) {
    let p = world.player.position;
    let previous = world.player.phase;
    let probes = Probes {
        blocked: rules::blocked(p, previous, world.scene.blockers()),
        pit: rules::pit(p, world.scene.pit_positions()),
        hazard: rules::hazard(p, world.scene.hazard_positions()),
        lift: rules::lift(p, world.scene.lift.as_ref().map(|l| l.position), world.game.has_key),
    };
    let contact = rules::resolve_contact(previous, &probes);
    world.player.phase = rules::next_phase(contact);

    match contact {
        Contact::None => {}
        Contact::Blocked => {
            world.player.position -= delta;
            physics::land(&mut world.player);
        }
        Contact::Falling { pit } => {
            if previous != CollisionPhase::Falling {
                events.push(GameEvent::FellIntoPit);
            }
            let player = &mut world.player;
            player.position.x = pit.x;
            player.position.y = pit.y;
            player.jumping = false;
            player.vertical_velocity = 0.0;
            player.position.z -= rules::FALL_RATE;
            if player.position.z < rules::FALL_FLOOR {
                player.respawn();
                lose_life(world, events);
            }
        }
        Contact::Damaged => {
            world.player.respawn();
            world.game.health -= world.rules.hazard_damage;
            events.push(GameEvent::HealthLost { health: world.game.health });
            if world.game.health <= 0 {
                world.game.health = world.rules.max_health;
                lose_life(world, events);
            }
        }
        Contact::Ascending => {
            if previous != CollisionPhase::Ascending {
                events.push(GameEvent::LiftEngaged);
            }
            world.player.jumping = false;
            world.player.vertical_velocity = 0.0;
            world.player.position.z += rules::LIFT_RATE;
            if let Some(lift) = &mut world.scene.lift {
                lift.position.z += rules::LIFT_RATE;
                if lift.position.z > rules::LIFT_TOP && world.pending == FramePhase::Playing {
                    world.pending = FramePhase::LevelTransition;
                    events.push(GameEvent::LevelComplete { level: world.game.level });
                }
            }
        }
    }
}

fn lose_life(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    world.game.lives = world.game.lives.saturating_sub(1);
    events.push(GameEvent::LifeLost { lives: world.game.lives });
    if world.game.lives == 0 {
        world.pending = FramePhase::LifeLost;
        events.push(GameEvent::GameOver { score: world.game.score });
    }
}

fn resolve_pickups(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    let p = world.player.position;

    if !world.game.has_key && world.scene.key.is_some_and(|k| rules::key(p, k)) {
        world.game.has_key = true;
        events.push(GameEvent::KeyCollected);
    }

    for coin in world.scene.coins.iter_mut().filter(|c| !c.collected) {
        if rules::coin(p, coin.position) {
            coin.collected = true;
            world.game.score += world.rules.coin_value;
            events.push(GameEvent::CoinCollected { score: world.game.score });
        }
    }

    world.scene.coin_spin += rules::COIN_SPIN_RATE;
}
