/// Gamepad input tracker using gilrs.
///
/// Button mapping is loaded from config.toml via `load_button_config()`.
/// Default mapping:
///   D-pad / Left Stick ↑↓ →  Forward / Backward
///   D-pad / Left Stick ←→ →  Turn
///   A                     →  Jump
///   Y                     →  Cycle view
///   X                     →  Orbit view
///   L2 / R2               →  Chase near / far view
///   R1 / L1               →  Speed up / down
///   Start                 →  Restart
///   Select                →  Quit

#[cfg(feature = "gamepad")]
use gilrs::{Axis, Button, EventType, Gilrs};
#[cfg(feature = "gamepad")]
use tracing::{info, warn};

use crate::config::GamepadConfig;
use crate::domain::entity::{FrameInput, MoveDir, SpeedStep, Turn, ViewCommand};

#[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
const STICK_DEADZONE: f32 = 0.25;

/// Logical button identifiers (one per physical button).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Btn {
    A,       // South
    B,       // East
    X,       // West
    Y,       // North
    L1,
    R1,
    L2,
    R2,
    Start,
    Select,
}

impl Btn {
    fn from_name(s: &str) -> Option<Btn> {
        match s.to_uppercase().as_str() {
            "A" | "SOUTH"  => Some(Btn::A),
            "B" | "EAST"   => Some(Btn::B),
            "X" | "WEST"   => Some(Btn::X),
            "Y" | "NORTH"  => Some(Btn::Y),
            "L1" | "LB" | "LEFTTRIGGER"  => Some(Btn::L1),
            "R1" | "RB" | "RIGHTTRIGGER" => Some(Btn::R1),
            "L2" | "LT" | "LEFTTRIGGER2"  => Some(Btn::L2),
            "R2" | "RT" | "RIGHTTRIGGER2" => Some(Btn::R2),
            "START" => Some(Btn::Start),
            "SELECT" | "BACK" => Some(Btn::Select),
            _ => None,
        }
    }

    #[cfg(feature = "gamepad")]
    fn from_gilrs(btn: Button) -> Option<Btn> {
        match btn {
            Button::South => Some(Btn::A),
            Button::East  => Some(Btn::B),
            Button::West  => Some(Btn::X),
            Button::North => Some(Btn::Y),
            Button::LeftTrigger   => Some(Btn::L1),
            Button::RightTrigger  => Some(Btn::R1),
            Button::LeftTrigger2  => Some(Btn::L2),
            Button::RightTrigger2 => Some(Btn::R2),
            Button::Start  => Some(Btn::Start),
            Button::Select => Some(Btn::Select),
            _ => None,
        }
    }
}

/// Per-button edge state. Buttons only trigger one-shot actions.
#[derive(Clone, Copy, Debug, Default)]
struct BtnState {
    just_pressed: bool,
}

/// Action-to-button mapping (loaded from config).
struct ActionMap {
    jump: Vec<Btn>,
    cycle_view: Vec<Btn>,
    orbit_view: Vec<Btn>,
    chase_near: Vec<Btn>,
    chase_far: Vec<Btn>,
    speed_up: Vec<Btn>,
    speed_down: Vec<Btn>,
    restart: Vec<Btn>,
    quit: Vec<Btn>,
}

impl Default for ActionMap {
    fn default() -> Self {
        ActionMap {
            jump:       vec![Btn::A],
            cycle_view: vec![Btn::Y],
            orbit_view: vec![Btn::X],
            chase_near: vec![Btn::L2],
            chase_far:  vec![Btn::R2],
            speed_up:   vec![Btn::R1],
            speed_down: vec![Btn::L1],
            restart:    vec![Btn::Start],
            quit:       vec![Btn::Select],
        }
    }
}

/// Four digital directions shared by the d-pad and the stick.
#[derive(Clone, Copy, Debug, Default)]
struct Cross {
    up: bool,
    down: bool,
    left: bool,
    right: bool,
}

pub struct GamepadState {
    #[cfg(feature = "gamepad")]
    gilrs: Option<Gilrs>,

    // All tracked buttons (indexed by Btn)
    buttons: [BtnState; 10],
    dpad: Cross,
    stick_x: f32,
    stick_y: f32,

    action_map: ActionMap,

    pub connected: bool,
}

fn btn_index(btn: Btn) -> usize {
    btn as usize
}

impl GamepadState {
    pub fn new() -> Self {
        #[cfg(feature = "gamepad")]
        let (gilrs_opt, connected) = match Gilrs::new() {
            Ok(g) => {
                let has_pad = g.gamepads().next().is_some();
                (Some(g), has_pad)
            }
            Err(e) => {
                warn!(error = %e, "gamepad support unavailable");
                (None, false)
            }
        };
        #[cfg(not(feature = "gamepad"))]
        let connected = false;

        GamepadState {
            #[cfg(feature = "gamepad")]
            gilrs: gilrs_opt,
            buttons: [BtnState::default(); 10],
            dpad: Cross::default(),
            stick_x: 0.0,
            stick_y: 0.0,
            action_map: ActionMap::default(),
            connected,
        }
    }

    /// Load button mapping from config. Lists with no recognised
    /// button name keep the default.
    pub fn load_button_config(&mut self, cfg: &GamepadConfig) {
        fn apply(slot: &mut Vec<Btn>, names: &[String]) {
            let parsed: Vec<Btn> = names.iter().filter_map(|s| Btn::from_name(s)).collect();
            if !parsed.is_empty() {
                *slot = parsed;
            }
        }
        let map = &mut self.action_map;
        apply(&mut map.jump, &cfg.jump);
        apply(&mut map.cycle_view, &cfg.cycle_view);
        apply(&mut map.orbit_view, &cfg.orbit_view);
        apply(&mut map.chase_near, &cfg.chase_near);
        apply(&mut map.chase_far, &cfg.chase_far);
        apply(&mut map.speed_up, &cfg.speed_up);
        apply(&mut map.speed_down, &cfg.speed_down);
        apply(&mut map.restart, &cfg.restart);
        apply(&mut map.quit, &cfg.quit);
    }

    pub fn update(&mut self) {
        for b in &mut self.buttons {
            b.just_pressed = false;
        }

        #[cfg(feature = "gamepad")]
        self.poll_gilrs();
    }

    #[cfg(feature = "gamepad")]
    fn poll_gilrs(&mut self) {
        let gilrs = match &mut self.gilrs {
            Some(g) => g,
            None => return,
        };

        let events: Vec<_> = std::iter::from_fn(|| gilrs.next_event()).collect();

        for event in events {
            match event.event {
                EventType::ButtonPressed(btn, _) => {
                    self.connected = true;
                    self.set_button(btn, true);
                }
                EventType::ButtonReleased(btn, _) => {
                    self.set_button(btn, false);
                }
                EventType::AxisChanged(axis, value, _) => {
                    self.connected = true;
                    self.update_axis(axis, value);
                }
                EventType::Connected => {
                    self.connected = true;
                    info!("gamepad connected");
                }
                EventType::Disconnected => {
                    self.connected = false;
                    self.release_all();
                    info!("gamepad disconnected");
                }
                _ => {}
            }
        }
    }

    #[cfg(feature = "gamepad")]
    fn set_button(&mut self, gilrs_btn: Button, held: bool) {
        // D-pad is read as held direction only
        match gilrs_btn {
            Button::DPadUp    => { self.dpad.up = held; return; }
            Button::DPadDown  => { self.dpad.down = held; return; }
            Button::DPadLeft  => { self.dpad.left = held; return; }
            Button::DPadRight => { self.dpad.right = held; return; }
            _ => {}
        }

        if let Some(btn) = Btn::from_gilrs(gilrs_btn) {
            self.press(btn, held);
        }
    }

    #[cfg(feature = "gamepad")]
    fn update_axis(&mut self, axis: Axis, value: f32) {
        match axis {
            Axis::LeftStickX => self.stick_x = value,
            Axis::LeftStickY => self.stick_y = value,
            _ => {}
        }
    }

    #[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
    fn press(&mut self, btn: Btn, down: bool) {
        if down {
            self.buttons[btn_index(btn)].just_pressed = true;
        }
    }

    #[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
    fn release_all(&mut self) {
        self.buttons = [BtnState::default(); 10];
        self.dpad = Cross::default();
        self.stick_x = 0.0;
        self.stick_y = 0.0;
    }

    // ── Action queries (config-driven) ──

    fn any_just_pressed(&self, btns: &[Btn]) -> bool {
        btns.iter().any(|&b| self.buttons[btn_index(b)].just_pressed)
    }

    fn direction(&self) -> Cross {
        Cross {
            up: self.dpad.up || self.stick_y > STICK_DEADZONE,
            down: self.dpad.down || self.stick_y < -STICK_DEADZONE,
            left: self.dpad.left || self.stick_x < -STICK_DEADZONE,
            right: self.dpad.right || self.stick_x > STICK_DEADZONE,
        }
    }

    pub fn quit_pressed(&self) -> bool {
        self.any_just_pressed(&self.action_map.quit)
    }

    /// Fold pad state into the keyboard's frame input. The keyboard wins
    /// wherever it already produced something.
    pub fn merge_into(&self, input: &mut FrameInput) {
        let dir = self.direction();
        if input.movement == MoveDir::Idle {
            input.movement = match (dir.up, dir.down) {
                (true, false) => MoveDir::Forward,
                (false, true) => MoveDir::Backward,
                _ => MoveDir::Idle,
            };
        }
        if input.turn == Turn::None {
            input.turn = match (dir.left, dir.right) {
                (true, false) => Turn::Left,
                (false, true) => Turn::Right,
                _ => Turn::None,
            };
        }

        let map = &self.action_map;
        input.jump |= self.any_just_pressed(&map.jump);
        input.restart |= self.any_just_pressed(&map.restart);
        if input.speed.is_none() {
            if self.any_just_pressed(&map.speed_up) {
                input.speed = Some(SpeedStep::Faster);
            } else if self.any_just_pressed(&map.speed_down) {
                input.speed = Some(SpeedStep::Slower);
            }
        }
        if input.view.is_none() {
            if self.any_just_pressed(&map.cycle_view) {
                input.view = Some(ViewCommand::Cycle);
            } else if self.any_just_pressed(&map.orbit_view) {
                input.view = Some(ViewCommand::Orbit);
            } else if self.any_just_pressed(&map.chase_near) {
                input.view = Some(ViewCommand::ChaseNear);
            } else if self.any_just_pressed(&map.chase_far) {
                input.view = Some(ViewCommand::ChaseFar);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;

    fn pad() -> GamepadState {
        GamepadState {
            #[cfg(feature = "gamepad")]
            gilrs: None,
            buttons: [BtnState::default(); 10],
            dpad: Cross::default(),
            stick_x: 0.0,
            stick_y: 0.0,
            action_map: ActionMap::default(),
            connected: false,
        }
    }

    #[test]
    fn names_are_case_insensitive() {
        assert_eq!(Btn::from_name("south"), Some(Btn::A));
        assert_eq!(Btn::from_name("Rb"), Some(Btn::R1));
        assert_eq!(Btn::from_name("back"), Some(Btn::Select));
        assert_eq!(Btn::from_name("Z"), None);
    }

    #[test]
    fn buttons_map_to_actions() {
        let mut gp = pad();
        gp.press(Btn::A, true);
        gp.press(Btn::R1, true);
        gp.press(Btn::Y, true);
        let mut input = FrameInput::default();
        gp.merge_into(&mut input);
        assert!(input.jump);
        assert_eq!(input.speed, Some(SpeedStep::Faster));
        assert_eq!(input.view, Some(ViewCommand::Cycle));
        assert!(!input.restart);
    }

    #[test]
    fn triggers_reach_chase_views() {
        let mut gp = pad();
        gp.press(Btn::L2, true);
        let mut input = FrameInput::default();
        gp.merge_into(&mut input);
        assert_eq!(input.view, Some(ViewCommand::ChaseNear));

        gp.update();
        gp.press(Btn::R2, true);
        let mut input = FrameInput::default();
        gp.merge_into(&mut input);
        assert_eq!(input.view, Some(ViewCommand::ChaseFar));
    }

    #[test]
    fn press_is_edge_only() {
        let mut gp = pad();
        gp.press(Btn::A, true);
        gp.update();
        let mut input = FrameInput::default();
        gp.merge_into(&mut input);
        assert!(!input.jump);
    }

    #[test]
    fn stick_respects_deadzone() {
        let mut gp = pad();
        gp.stick_y = 0.1;
        gp.stick_x = -0.9;
        let mut input = FrameInput::default();
        gp.merge_into(&mut input);
        assert_eq!(input.movement, MoveDir::Idle);
        assert_eq!(input.turn, Turn::Left);
    }

    #[test]
    fn keyboard_wins_over_pad() {
        let mut gp = pad();
        gp.dpad.down = true;
        gp.press(Btn::L1, true);
        let mut input = FrameInput {
            movement: MoveDir::Forward,
            speed: Some(SpeedStep::Faster),
            ..FrameInput::default()
        };
        gp.merge_into(&mut input);
        assert_eq!(input.movement, MoveDir::Forward);
        assert_eq!(input.speed, Some(SpeedStep::Faster));
    }

    #[test]
    fn config_remaps_and_ignores_unknown_names() {
        let mut cfg = GameConfig::default().gamepad;
        cfg.jump = vec!["B".into()];
        cfg.quit = vec!["nonsense".into()];
        let mut gp = pad();
        gp.load_button_config(&cfg);
        assert_eq!(gp.action_map.jump, vec![Btn::B]);
        assert_eq!(gp.action_map.quit, vec![Btn::Select]);

        gp.press(Btn::Select, true);
        assert!(gp.quit_pressed());
    }

    #[test]
    fn release_all_clears_directions() {
        let mut gp = pad();
        gp.dpad.up = true;
        gp.stick_x = 1.0;
        gp.release_all();
        let mut input = FrameInput::default();
        gp.merge_into(&mut input);
        assert_eq!(input.movement, MoveDir::Idle);
        assert_eq!(input.turn, Turn::None);
    }
}
