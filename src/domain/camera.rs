/// Camera/view state machine.
///
/// Five views. Keys switch between them, the right mouse button drags
/// the orbit angle and the wheel moves the orbit camera up and down.
///
///   T (1st press)           → Overview
///   T (2nd press, Overview) → Fixed
///   H → Orbit    A → ChaseNear    F → ChaseFar
///
/// Up is +z in every view.

use std::f32::consts::{FRAC_PI_4, PI, SQRT_2};

use glam::{Mat4, Vec3};

use super::entity::{PlayerState, PointerInput, ViewCommand};

pub const NEAR_PLANE: f32 = 1.0;
pub const FAR_PLANE: f32 = 500.0;
/// Horizontal radius of the orbit camera.
pub const ORBIT_RADIUS: f32 = 180.0 * SQRT_2;
/// Radians of orbit per pixel of horizontal drag.
pub const DRAG_RATE: f32 = PI / 300.0;
/// Orbit altitude change per wheel notch.
pub const SCROLL_RATE: f32 = 2.0;
pub const DEFAULT_ANGLE: f32 = FRAC_PI_4;
pub const DEFAULT_DISTANCE: f32 = 200.0;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ViewMode {
    Overview,
    Orbit,
    Fixed,
    ChaseNear,
    ChaseFar,
}

impl ViewMode {
    pub fn label(self) -> &'static str {
        match self {
            ViewMode::Overview => "overview",
            ViewMode::Orbit => "orbit",
            ViewMode::Fixed => "fixed",
            ViewMode::ChaseNear => "chase",
            ViewMode::ChaseFar => "follow",
        }
    }
}

#[derive(Clone, Debug)]
pub struct Camera {
    pub mode: ViewMode,
    /// Orbit angle in radians.
    pub angle: f32,
    /// Orbit camera altitude. Named after the wheel "zoom" it responds to.
    pub distance: f32,
    prev_x: f64,
    cycle_presses: u8,
}

impl Default for Camera {
    fn default() -> Self {
        Camera {
            mode: ViewMode::Orbit,
            angle: DEFAULT_ANGLE,
            distance: DEFAULT_DISTANCE,
            prev_x: 0.0,
            cycle_presses: 0,
        }
    }
}

impl Camera {
    /// Every level starts on the orbit view at the default angle.
    pub fn reset_for_level(&mut self) {
        self.mode = ViewMode::Orbit;
        self.angle = DEFAULT_ANGLE;
        self.distance = DEFAULT_DISTANCE;
        self.cycle_presses = 0;
    }

    pub fn apply(&mut self, cmd: ViewCommand) {
        match cmd {
            ViewCommand::Cycle => {
                self.cycle_presses += 1;
                if self.cycle_presses >= 2 && self.mode == ViewMode::Overview {
                    self.mode = ViewMode::Fixed;
                    self.cycle_presses = 0;
                } else {
                    self.mode = ViewMode::Overview;
                    self.cycle_presses = 1;
                }
            }
            ViewCommand::Orbit => self.mode = ViewMode::Orbit,
            ViewCommand::ChaseNear => self.mode = ViewMode::ChaseNear,
            ViewCommand::ChaseFar => self.mode = ViewMode::ChaseFar,
        }
    }

    /// Per-frame pointer handling. Also drops a half-finished cycle
    /// sequence once another view is active.
    pub fn update(&mut self, pointer: &PointerInput) {
        if self.mode != ViewMode::Overview {
            self.cycle_presses = 0;
        }
        if pointer.drag_started {
            self.prev_x = pointer.cursor_x;
        }
        if pointer.dragging {
            let dx = (pointer.cursor_x - self.prev_x) as f32;
            self.angle += dx * DRAG_RATE;
            self.prev_x = pointer.cursor_x;
        }
        if pointer.scroll_y != 0.0 {
            self.distance -= SCROLL_RATE * pointer.scroll_y as f32;
        }
    }

    /// Eye and look-at target for the current view.
    pub fn eye_target(&self, player: &PlayerState) -> (Vec3, Vec3) {
        let p = player.position;
        let h = player.facing();
        match self.mode {
            ViewMode::Overview => (Vec3::new(1e-7, 0.0, 300.0), Vec3::ZERO),
            ViewMode::Orbit => (
                Vec3::new(
                    ORBIT_RADIUS * self.angle.cos(),
                    -ORBIT_RADIUS * self.angle.sin(),
                    self.distance,
                ),
                Vec3::ZERO,
            ),
            ViewMode::Fixed => (Vec3::new(200.0, 0.0, 200.0), Vec3::ZERO),
            ViewMode::ChaseNear => (p + h * 7.0 + Vec3::Z * 10.0, p + h * 40.0),
            ViewMode::ChaseFar => (
                p - h * 20.0 + Vec3::Z * 30.0,
                p + h * 40.0 + Vec3::Z * 5.0,
            ),
        }
    }

    pub fn view_matrix(&self, player: &PlayerState) -> Mat4 {
        let (eye, target) = self.eye_target(player);
        Mat4::look_at_rh(eye, target, Vec3::Z)
    }
}

pub fn projection(aspect: f32, fov_degrees: f32) -> Mat4 {
    Mat4::perspective_rh_gl(fov_degrees.to_radians(), aspect, NEAR_PLANE, FAR_PLANE)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drag(x: f64, started: bool) -> PointerInput {
        PointerInput { cursor_x: x, drag_started: started, dragging: true, scroll_y: 0.0 }
    }

    #[test]
    fn cycle_goes_overview_then_fixed() {
        let mut cam = Camera::default();
        cam.apply(ViewCommand::Cycle);
        assert_eq!(cam.mode, ViewMode::Overview);
        cam.update(&PointerInput::default());
        cam.apply(ViewCommand::Cycle);
        assert_eq!(cam.mode, ViewMode::Fixed);
        // counter was reset: next press starts over
        cam.update(&PointerInput::default());
        cam.apply(ViewCommand::Cycle);
        assert_eq!(cam.mode, ViewMode::Overview);
    }

    #[test]
    fn cycle_counter_dropped_when_view_changes() {
        let mut cam = Camera::default();
        cam.apply(ViewCommand::Cycle);
        cam.apply(ViewCommand::ChaseNear);
        cam.update(&PointerInput::default());
        cam.apply(ViewCommand::Cycle);
        assert_eq!(cam.mode, ViewMode::Overview);
    }

    #[test]
    fn direct_view_keys() {
        let mut cam = Camera::default();
        cam.apply(ViewCommand::ChaseFar);
        assert_eq!(cam.mode, ViewMode::ChaseFar);
        cam.apply(ViewCommand::ChaseNear);
        assert_eq!(cam.mode, ViewMode::ChaseNear);
        cam.apply(ViewCommand::Orbit);
        assert_eq!(cam.mode, ViewMode::Orbit);
    }

    #[test]
    fn drag_baseline_resets_on_press() {
        let mut cam = Camera::default();
        let a0 = cam.angle;
        // cursor far from the stale baseline: no jump on the press frame
        cam.update(&drag(500.0, true));
        assert_eq!(cam.angle, a0);
        cam.update(&drag(530.0, false));
        assert!((cam.angle - (a0 + 30.0 * DRAG_RATE)).abs() < 1e-5);
    }

    #[test]
    fn drag_ignored_when_released() {
        let mut cam = Camera::default();
        let a0 = cam.angle;
        cam.update(&PointerInput { cursor_x: 900.0, ..Default::default() });
        assert_eq!(cam.angle, a0);
    }

    #[test]
    fn scroll_lowers_orbit_camera() {
        let mut cam = Camera::default();
        cam.update(&PointerInput { scroll_y: 3.0, ..Default::default() });
        assert!((cam.distance - (DEFAULT_DISTANCE - 6.0)).abs() < 1e-5);
    }

    #[test]
    fn orbit_eye_formula() {
        let cam = Camera::default();
        let (eye, target) = cam.eye_target(&PlayerState::new(1.0));
        assert!((eye.x - 180.0).abs() < 1e-3);
        assert!((eye.y + 180.0).abs() < 1e-3);
        assert_eq!(eye.z, DEFAULT_DISTANCE);
        assert_eq!(target, Vec3::ZERO);
    }

    #[test]
    fn chase_views_follow_heading() {
        let player = PlayerState::new(1.0); // at (80,-80,20), facing +y
        let mut cam = Camera::default();
        cam.apply(ViewCommand::ChaseNear);
        let (eye, target) = cam.eye_target(&player);
        assert!((eye - Vec3::new(80.0, -73.0, 30.0)).length() < 1e-4);
        assert!((target - Vec3::new(80.0, -40.0, 20.0)).length() < 1e-4);

        cam.apply(ViewCommand::ChaseFar);
        let (eye, target) = cam.eye_target(&player);
        assert!((eye - Vec3::new(80.0, -100.0, 50.0)).length() < 1e-4);
        assert!((target - Vec3::new(80.0, -40.0, 25.0)).length() < 1e-4);
    }

    #[test]
    fn reset_restores_orbit() {
        let mut cam = Camera::default();
        cam.apply(ViewCommand::ChaseFar);
        cam.angle = 3.0;
        cam.distance = 10.0;
        cam.reset_for_level();
        assert_eq!(cam.mode, ViewMode::Orbit);
        assert_eq!(cam.angle, DEFAULT_ANGLE);
        assert_eq!(cam.distance, DEFAULT_DISTANCE);
    }

    #[test]
    fn overview_and_fixed_look_at_origin() {
        let player = PlayerState::new(1.0);
        let mut cam = Camera::default();
        cam.apply(ViewCommand::Cycle);
        assert_eq!(cam.mode, ViewMode::Overview);
        assert_eq!(cam.eye_target(&player), (Vec3::new(1e-7, 0.0, 300.0), Vec3::ZERO));

        cam.apply(ViewCommand::Cycle);
        assert_eq!(cam.mode, ViewMode::Fixed);
        assert_eq!(cam.eye_target(&player), (Vec3::new(200.0, 0.0, 200.0), Vec3::ZERO));
    }

    #[test]
    fn overview_matrix_is_finite() {
        let mut cam = Camera::default();
        cam.apply(ViewCommand::Cycle);
        let m = cam.view_matrix(&PlayerState::new(1.0));
        assert!(m.is_finite());
    }

    #[test]
    fn projection_maps_near_plane_to_minus_one() {
        let proj = projection(1.0, 45.0);
        let clip = proj * glam::Vec4::new(0.0, 0.0, -NEAR_PLANE, 1.0);
        assert!((clip.z / clip.w + 1.0).abs() < 1e-4);
    }
}
