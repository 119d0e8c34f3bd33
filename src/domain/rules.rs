/// Collision and pickup rules, as truth tables.
///
/// Pure functions over positions; no side effects. The frame step calls
/// the probes after movement, folds them into one `Contact` and applies
/// the effect. Distances are in world units, "planar" means x/y only.
///
/// ## Probe Table
/// ┌──────────────┬──────────────────────────────────┬──────────────────┐
/// │ Probe         │ Hit when                          │ Against          │
/// ├──────────────┼──────────────────────────────────┼──────────────────┤
/// │ blocked       │ |dx| < 10 and |dy| < 10           │ walls, barriers  │
/// │               │ (never while falling)             │                  │
/// │ pit           │ |dx| < 9 and |dy| < 7 and z <= 20 │ pits             │
/// │ hazard        │ |dx| < 8 and |dy| < 8 and z <= 26 │ spike platforms  │
/// │ lift          │ planar < 3 and key held           │ the lift         │
/// │ key           │ planar < 8                        │ the key          │
/// │ coin          │ planar < 7.5 and |dz| < 15        │ each live coin   │
/// └──────────────┴──────────────────────────────────┴──────────────────┘
///
/// ## Contact Resolution
/// ┌────────────────────────────────┬──────────────────┐
/// │ Condition (priority order)      │ Contact          │
/// ├────────────────────────────────┼──────────────────┤
/// │ current phase = Ascending       │ Ascending (sticky)│
/// │ lift probe hit                  │ Ascending        │
/// │ hazard probe hit                │ Damaged          │
/// │ pit probe hit                   │ Falling { pit }  │
/// │ blocked probe hit               │ Blocked          │
/// │ otherwise                       │ None             │
/// └────────────────────────────────┴──────────────────┘
///
/// Key and coin pickups are not contacts: they never exclude each other
/// or the movement outcome, so the step applies them independently.

use glam::Vec3;

use super::entity::CollisionPhase;

/// Half-extent of the push-back box around a wall or barrier.
pub const BLOCK_REACH: f32 = 10.0;
pub const PIT_REACH_X: f32 = 9.0;
pub const PIT_REACH_Y: f32 = 7.0;
/// Above this altitude the player clears a pit (mid-jump).
pub const PIT_MAX_Z: f32 = 20.0;
pub const HAZARD_REACH: f32 = 8.0;
/// Above this altitude the player clears the spikes.
pub const HAZARD_MAX_Z: f32 = 26.0;
pub const LIFT_REACH: f32 = 3.0;
pub const KEY_REACH: f32 = 8.0;
pub const COIN_REACH: f32 = 7.5;
pub const COIN_Z_REACH: f32 = 15.0;

/// Units dropped per frame inside a pit.
pub const FALL_RATE: f32 = 2.0;
/// A fall ends (life lost) below this altitude.
pub const FALL_FLOOR: f32 = -300.0;
/// Units risen per frame on the lift, by lift and rider alike.
pub const LIFT_RATE: f32 = 0.2;
/// Lift altitude that completes the level.
pub const LIFT_TOP: f32 = 100.0;
pub const COIN_SPIN_RATE: f32 = 0.1;

/// Spikes come up when the player is this close to the platform.
pub const SPIKE_REVEAL: f32 = 30.0;
pub const SPIKE_RAISED_Z: f32 = 0.01;
pub const SPIKE_LOWERED_Z: f32 = -9.0;

#[inline]
fn planar_distance(a: Vec3, b: Vec3) -> f32 {
    (a.x - b.x).hypot(a.y - b.y)
}

#[inline]
fn within_box(a: Vec3, b: Vec3, reach_x: f32, reach_y: f32) -> bool {
    (a.x - b.x).abs() < reach_x && (a.y - b.y).abs() < reach_y
}

// ── Probes ──

pub fn blocked<I>(player: Vec3, phase: CollisionPhase, blockers: I) -> bool
where
    I: IntoIterator<Item = Vec3>,
{
    if phase == CollisionPhase::Falling {
        return false;
    }
    blockers.into_iter().any(|b| within_box(player, b, BLOCK_REACH, BLOCK_REACH))
}

/// Centre of the pit the player is over, if any. Last match wins.
pub fn pit<I>(player: Vec3, pits: I) -> Option<Vec3>
where
    I: IntoIterator<Item = Vec3>,
{
    if player.z > PIT_MAX_Z {
        return None;
    }
    pits.into_iter()
        .filter(|p| within_box(player, *p, PIT_REACH_X, PIT_REACH_Y))
        .last()
}

pub fn hazard<I>(player: Vec3, hazards: I) -> bool
where
    I: IntoIterator<Item = Vec3>,
{
    player.z <= HAZARD_MAX_Z
        && hazards.into_iter().any(|h| within_box(player, h, HAZARD_REACH, HAZARD_REACH))
}

pub fn lift(player: Vec3, lift: Option<Vec3>, has_key: bool) -> bool {
    has_key && lift.is_some_and(|l| planar_distance(player, l) < LIFT_REACH)
}

pub fn key(player: Vec3, key: Vec3) -> bool {
    planar_distance(player, key) < KEY_REACH
}

pub fn coin(player: Vec3, coin: Vec3) -> bool {
    planar_distance(player, coin) < COIN_REACH && (player.z - coin.z).abs() < COIN_Z_REACH
}

/// Altitude offset of a hazard's spikes for the current player position.
pub fn spike_z(player: Vec3, hazard: Vec3) -> f32 {
    if planar_distance(player, hazard) < SPIKE_REVEAL {
        SPIKE_RAISED_Z
    } else {
        SPIKE_LOWERED_Z
    }
}

// ── Contact Resolution ──

/// Raw probe results for one frame.
#[derive(Clone, Copy, Debug, Default)]
pub struct Probes {
    pub blocked: bool,
    pub pit: Option<Vec3>,
    pub hazard: bool,
    pub lift: bool,
}

/// The single outcome applied this frame.
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum Contact {
    None,
    Blocked,
    Falling { pit: Vec3 },
    Damaged,
    Ascending,
}

/// Fold probe results into one contact. See truth table above.
pub fn resolve_contact(current: CollisionPhase, probes: &Probes) -> Contact {
    // An ascent in progress runs to the top
    if current == CollisionPhase::Ascending {
        return Contact::Ascending;
    }
    if probes.lift { return Contact::Ascending; }
    if probes.hazard { return Contact::Damaged; }
    if let Some(pit) = probes.pit { return Contact::Falling { pit }; }
    if probes.blocked { return Contact::Blocked; }
    Contact::None
}

/// Phase the player carries into the next frame.
pub fn next_phase(contact: Contact) -> CollisionPhase {
    match contact {
        Contact::Falling { .. } => CollisionPhase::Falling,
        Contact::Ascending => CollisionPhase::Ascending,
        Contact::None | Contact::Blocked | Contact::Damaged => CollisionPhase::Neutral,
    }
}
