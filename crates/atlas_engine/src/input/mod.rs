//! Input state tracking
//!
//! Accumulates GLFW window events into polled state: which keys are held,
//! which were pressed this frame, and how far the mouse moved.

use std::collections::HashSet;

/// Polled keyboard and mouse state built from window events
#[derive(Default)]
pub struct Input {
    held: HashSet<glfw::Key>,
    pressed: HashSet<glfw::Key>,
    last_cursor: Option<(f64, f64)>,
    mouse_delta: (f64, f64),
}

impl Input {
    /// Create an empty input state
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear per-frame state. Call once at the start of each frame, before
    /// feeding events.
    pub fn begin_frame(&mut self) {
        self.pressed.clear();
        self.mouse_delta = (0.0, 0.0);
    }

    /// Fold one window event into the state
    pub fn handle_event(&mut self, event: &glfw::WindowEvent) {
        match *event {
            glfw::WindowEvent::Key(key, _, glfw::Action::Press, _) => {
                self.held.insert(key);
                self.pressed.insert(key);
            }
            glfw::WindowEvent::Key(key, _, glfw::Action::Release, _) => {
                self.held.remove(&key);
            }
            glfw::WindowEvent::CursorPos(x, y) => {
                if let Some((last_x, last_y)) = self.last_cursor {
                    self.mouse_delta.0 += x - last_x;
                    self.mouse_delta.1 += y - last_y;
                }
                self.last_cursor = Some((x, y));
            }
            _ => {}
        }
    }

    /// Whether `key` is currently held down
    pub fn is_key_held(&self, key: glfw::Key) -> bool {
        self.held.contains(&key)
    }

    /// Whether `key` was pressed since the last `begin_frame`
    pub fn was_key_pressed(&self, key: glfw::Key) -> bool {
        self.pressed.contains(&key)
    }

    /// Accumulated mouse movement since the last `begin_frame`
    pub fn mouse_delta(&self) -> (f64, f64) {
        self.mouse_delta
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glfw::{Action, Key, Modifiers, Scancode, WindowEvent};

    fn key_event(key: Key, action: Action) -> WindowEvent {
        WindowEvent::Key(key, 0 as Scancode, action, Modifiers::empty())
    }

    #[test]
    fn press_and_release_track_held_state() {
        let mut input = Input::new();
        input.handle_event(&key_event(Key::W, Action::Press));
        assert!(input.is_key_held(Key::W));
        assert!(input.was_key_pressed(Key::W));

        input.handle_event(&key_event(Key::W, Action::Release));
        assert!(!input.is_key_held(Key::W));
    }

    #[test]
    fn held_survives_frame_boundary_but_pressed_does_not() {
        let mut input = Input::new();
        input.handle_event(&key_event(Key::Space, Action::Press));

        input.begin_frame();
        assert!(input.is_key_held(Key::Space));
        assert!(!input.was_key_pressed(Key::Space));
    }

    #[test]
    fn first_cursor_event_produces_no_delta() {
        let mut input = Input::new();
        input.handle_event(&WindowEvent::CursorPos(100.0, 50.0));
        // No previous position to diff against
        assert_eq!(input.mouse_delta(), (0.0, 0.0));

        input.handle_event(&WindowEvent::CursorPos(110.0, 45.0));
        assert_eq!(input.mouse_delta(), (10.0, -5.0));
    }

    #[test]
    fn mouse_delta_accumulates_within_a_frame() {
        let mut input = Input::new();
        input.handle_event(&WindowEvent::CursorPos(0.0, 0.0));
        input.handle_event(&WindowEvent::CursorPos(3.0, 1.0));
        input.handle_event(&WindowEvent::CursorPos(5.0, 4.0));
        assert_eq!(input.mouse_delta(), (5.0, 4.0));

        input.begin_frame();
        assert_eq!(input.mouse_delta(), (0.0, 0.0));
    }
}
