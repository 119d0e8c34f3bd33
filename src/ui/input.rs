/// Keyboard and mouse state tracker.
///
/// Tracks which keys are currently held down, enabling:
///   - Continuous movement and turning while a key is held
///   - Edge-triggered jump, speed and view keys (initial press only)
///   - Right-button drag and wheel for the orbit camera
///
/// Uses crossterm's keyboard enhancement for Release events when available.
/// Falls back to timeout-based release detection on terminals that don't support it.
///
/// ## Key map
///   Up/Down    move         Left/Right  turn
///   Space      jump         W / S       faster / slower
///   T          overview, then fixed     H  orbit
///   A          chase near   F           chase far
///   R          restart      Esc / Q     quit

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crossterm::event::{
    self, poll, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent,
    MouseEventKind,
};

use crate::domain::entity::{FrameInput, MoveDir, PointerInput, SpeedStep, Turn, ViewCommand};

/// After this duration without a Press/Repeat event, consider the key released.
/// Only used when the terminal doesn't report Release events.
const HOLD_TIMEOUT: Duration = Duration::from_millis(160);

pub struct InputState {
    /// Timestamp of last Press/Repeat event for each key.
    last_active: HashMap<KeyCode, Instant>,

    /// Keys that transitioned from "not held" → "held" during the
    /// most recent drain_events() call. Used for edge-triggered actions.
    fresh_presses: Vec<KeyCode>,

    /// Raw key events collected during drain, for quit handling.
    pub raw_events: Vec<KeyEvent>,

    /// Whether to honor Release events. Only true when keyboard
    /// enhancement is confirmed working.
    pub honor_release: bool,

    // ── Mouse ──
    /// Terminal columns → pixel-equivalents for the drag rate.
    px_per_cell: f64,
    cursor_x: f64,
    right_held: bool,
    drag_started: bool,
    scroll_y: f64,
}

impl InputState {
    pub fn new(px_per_cell: f64) -> Self {
        InputState {
            last_active: HashMap::with_capacity(16),
            fresh_presses: Vec::with_capacity(8),
            raw_events: Vec::with_capacity(8),
            honor_release: false,
            px_per_cell,
            cursor_x: 0.0,
            right_held: false,
            drag_started: false,
            scroll_y: 0.0,
        }
    }

    /// Drain all pending terminal events and update key states.
    /// Call this once per frame, before the simulation frame.
    pub fn drain_events(&mut self) {
        self.begin_frame();

        // Read all available events without blocking
        while poll(Duration::ZERO).unwrap_or(false) {
            match event::read() {
                Ok(ev) => self.handle_event(ev, Instant::now()),
                Err(_) => break,
            }
        }

        self.expire(Instant::now());
    }

    fn begin_frame(&mut self) {
        self.fresh_presses.clear();
        self.raw_events.clear();
    }

    fn handle_event(&mut self, ev: Event, now: Instant) {
        match ev {
            Event::Key(key) => self.handle_key(key, now),
            Event::Mouse(mouse) => self.handle_mouse(mouse),
            _ => {}
        }
    }

    fn handle_key(&mut self, key: KeyEvent, now: Instant) {
        self.raw_events.push(key);
        let code = normalize(key.code);

        match key.kind {
            KeyEventKind::Release if self.honor_release => {
                // Explicit release: remove from active set
                self.last_active.remove(&code);
            }
            KeyEventKind::Release => {
                // Ignore release when enhancement not confirmed;
                // rely on timeout-based expiry instead
            }
            _ => {
                let was_held = self.held_at(code, now);
                self.last_active.insert(code, now);
                if !was_held {
                    self.fresh_presses.push(code);
                }
            }
        }
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) {
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Right) => {
                self.cursor_x = mouse.column as f64 * self.px_per_cell;
                self.right_held = true;
                self.drag_started = true;
            }
            MouseEventKind::Drag(MouseButton::Right) => {
                self.cursor_x = mouse.column as f64 * self.px_per_cell;
                self.right_held = true;
            }
            MouseEventKind::Up(MouseButton::Right) => self.right_held = false,
            MouseEventKind::ScrollUp => self.scroll_y += 1.0,
            MouseEventKind::ScrollDown => self.scroll_y -= 1.0,
            _ => {}
        }
    }

    /// Expire keys that have timed out (fallback for terminals without Release)
    fn expire(&mut self, now: Instant) {
        if !self.honor_release {
            self.last_active.retain(|_, t| now.duration_since(*t) < HOLD_TIMEOUT);
        }
    }

    /// Is this key currently held down?
    pub fn is_held(&self, code: KeyCode) -> bool {
        self.held_at(code, Instant::now())
    }

    /// Was this key freshly pressed this frame? (edge trigger)
    pub fn was_pressed(&self, code: KeyCode) -> bool {
        self.fresh_presses.contains(&code)
    }

    /// Check if any raw event this frame has Ctrl+C
    pub fn ctrl_c_pressed(&self) -> bool {
        self.raw_events.iter().any(|k| {
            k.modifiers.contains(KeyModifiers::CONTROL)
                && (k.code == KeyCode::Char('c') || k.code == KeyCode::Char('C'))
        })
    }

    pub fn quit_pressed(&self) -> bool {
        self.ctrl_c_pressed()
            || self.was_pressed(KeyCode::Esc)
            || self.was_pressed(KeyCode::Char('q'))
    }

    /// Snapshot for the simulation. Resets the per-frame mouse deltas.
    pub fn frame_input(&mut self) -> FrameInput {
        let movement = match (self.is_held(KeyCode::Up), self.is_held(KeyCode::Down)) {
            (true, false) => MoveDir::Forward,
            (false, true) => MoveDir::Backward,
            _ => MoveDir::Idle,
        };
        let turn = match (self.is_held(KeyCode::Left), self.is_held(KeyCode::Right)) {
            (true, false) => Turn::Left,
            (false, true) => Turn::Right,
            _ => Turn::None,
        };
        let speed = if self.was_pressed(KeyCode::Char('w')) {
            Some(SpeedStep::Faster)
        } else if self.was_pressed(KeyCode::Char('s')) {
            Some(SpeedStep::Slower)
        } else {
            None
        };
        let view = [
            ('t', ViewCommand::Cycle),
            ('h', ViewCommand::Orbit),
            ('a', ViewCommand::ChaseNear),
            ('f', ViewCommand::ChaseFar),
        ]
        .into_iter()
        .find(|(c, _)| self.was_pressed(KeyCode::Char(*c)))
        .map(|(_, cmd)| cmd);

        FrameInput {
            movement,
            turn,
            jump: self.was_pressed(KeyCode::Char(' ')),
            speed,
            view,
            restart: self.was_pressed(KeyCode::Char('r')),
            pointer: self.take_pointer(),
        }
    }

    fn take_pointer(&mut self) -> PointerInput {
        let pointer = PointerInput {
            cursor_x: self.cursor_x,
            drag_started: self.drag_started,
            dragging: self.right_held,
            scroll_y: self.scroll_y,
        };
        self.drag_started = false;
        self.scroll_y = 0.0;
        pointer
    }

    // ── Internal ──

    fn held_at(&self, code: KeyCode, now: Instant) -> bool {
        match self.last_active.get(&code) {
            Some(_) if self.honor_release => true,
            Some(t) => now.duration_since(*t) < HOLD_TIMEOUT,
            None => false,
        }
    }
}

/// Letter keys match regardless of shift / caps lock.
fn normalize(code: KeyCode) -> KeyCode {
    match code {
        KeyCode::Char(c) => KeyCode::Char(c.to_ascii_lowercase()),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn release(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new_with_kind(code, KeyModifiers::NONE, KeyEventKind::Release))
    }

    fn mouse(kind: MouseEventKind, column: u16) -> Event {
        Event::Mouse(MouseEvent { kind, column, row: 0, modifiers: KeyModifiers::NONE })
    }

    fn feed(input: &mut InputState, events: Vec<Event>) {
        input.begin_frame();
        let now = Instant::now();
        for ev in events {
            input.handle_event(ev, now);
        }
    }

    #[test]
    fn held_arrows_map_to_movement() {
        let mut input = InputState::new(8.0);
        feed(&mut input, vec![press(KeyCode::Up), press(KeyCode::Left)]);
        let fi = input.frame_input();
        assert_eq!(fi.movement, MoveDir::Forward);
        assert_eq!(fi.turn, Turn::Left);
    }

    #[test]
    fn opposite_keys_cancel() {
        let mut input = InputState::new(8.0);
        feed(&mut input, vec![press(KeyCode::Up), press(KeyCode::Down)]);
        assert_eq!(input.frame_input().movement, MoveDir::Idle);
    }

    #[test]
    fn jump_is_edge_triggered() {
        let mut input = InputState::new(8.0);
        feed(&mut input, vec![press(KeyCode::Char(' '))]);
        assert!(input.frame_input().jump);
        // auto-repeat while held is not a new press
        feed(&mut input, vec![press(KeyCode::Char(' '))]);
        assert!(!input.frame_input().jump);
    }

    #[test]
    fn release_honored_only_when_enabled() {
        let mut input = InputState::new(8.0);
        feed(&mut input, vec![press(KeyCode::Up), release(KeyCode::Up)]);
        assert!(input.is_held(KeyCode::Up));

        input.honor_release = true;
        feed(&mut input, vec![release(KeyCode::Up)]);
        assert!(!input.is_held(KeyCode::Up));
    }

    #[test]
    fn held_key_times_out_without_release_events() {
        let mut input = InputState::new(8.0);
        let then = Instant::now();
        input.handle_event(press(KeyCode::Up), then);
        input.expire(then + HOLD_TIMEOUT * 2);
        assert!(!input.is_held(KeyCode::Up));

        input.honor_release = true;
        input.handle_event(press(KeyCode::Up), then);
        input.expire(then + HOLD_TIMEOUT * 2);
        assert!(input.is_held(KeyCode::Up));
    }

    #[test]
    fn uppercase_letters_match() {
        let mut input = InputState::new(8.0);
        feed(&mut input, vec![press(KeyCode::Char('W')), press(KeyCode::Char('T'))]);
        let fi = input.frame_input();
        assert_eq!(fi.speed, Some(SpeedStep::Faster));
        assert_eq!(fi.view, Some(ViewCommand::Cycle));
    }

    #[test]
    fn view_and_restart_keys() {
        let mut input = InputState::new(8.0);
        feed(&mut input, vec![press(KeyCode::Char('f')), press(KeyCode::Char('r'))]);
        let fi = input.frame_input();
        assert_eq!(fi.view, Some(ViewCommand::ChaseFar));
        assert!(fi.restart);
    }

    #[test]
    fn right_drag_reports_pixels_and_edge() {
        let mut input = InputState::new(8.0);
        feed(&mut input, vec![mouse(MouseEventKind::Down(MouseButton::Right), 10)]);
        let p = input.frame_input().pointer;
        assert!(p.drag_started && p.dragging);
        assert_eq!(p.cursor_x, 80.0);

        feed(&mut input, vec![mouse(MouseEventKind::Drag(MouseButton::Right), 12)]);
        let p = input.frame_input().pointer;
        assert!(!p.drag_started && p.dragging);
        assert_eq!(p.cursor_x, 96.0);

        feed(&mut input, vec![mouse(MouseEventKind::Up(MouseButton::Right), 12)]);
        assert!(!input.frame_input().pointer.dragging);
    }

    #[test]
    fn left_button_is_ignored() {
        let mut input = InputState::new(8.0);
        feed(&mut input, vec![mouse(MouseEventKind::Down(MouseButton::Left), 10)]);
        let p = input.frame_input().pointer;
        assert!(!p.dragging);
        assert_eq!(p.cursor_x, 0.0);
    }

    #[test]
    fn scroll_accumulates_then_resets() {
        let mut input = InputState::new(8.0);
        feed(&mut input, vec![
            mouse(MouseEventKind::ScrollUp, 0),
            mouse(MouseEventKind::ScrollUp, 0),
            mouse(MouseEventKind::ScrollDown, 0),
        ]);
        assert_eq!(input.frame_input().pointer.scroll_y, 1.0);
        assert_eq!(input.frame_input().pointer.scroll_y, 0.0);
    }

    #[test]
    fn quit_keys() {
        let mut input = InputState::new(8.0);
        feed(&mut input, vec![press(KeyCode::Char('Q'))]);
        assert!(input.quit_pressed());

        let mut input = InputState::new(8.0);
        feed(&mut input, vec![Event::Key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL))]);
        assert!(input.quit_pressed());
    }
}
