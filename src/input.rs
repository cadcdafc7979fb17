//! Keyboard and mouse state for the viewer.
//!
//! Tracks both instantaneous events (key just pressed) and continuous state
//! (button held), so the viewer can toggle the formation on a single press
//! and orbit the camera while the mouse is dragged.

use glam::Vec2;
use std::collections::HashSet;
use winit::event::{ElementState, MouseButton as WinitMouseButton, MouseScrollDelta, WindowEvent};
use winit::keyboard::{KeyCode as WinitKeyCode, PhysicalKey};

/// Mouse button identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

impl MouseButton {
    fn from_winit(btn: WinitMouseButton) -> Option<Self> {
        match btn {
            WinitMouseButton::Left => Some(MouseButton::Left),
            WinitMouseButton::Right => Some(MouseButton::Right),
            WinitMouseButton::Middle => Some(MouseButton::Middle),
            _ => None,
        }
    }
}

/// Keys the viewer reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    /// Toggle between scattered and assembled.
    Space,
    Escape,
    /// Toggle camera auto-rotate.
    A,
    /// Remove every photo.
    C,
    /// Pause the clock.
    P,
    /// Reset the camera.
    R,
    Other(u32),
}

impl From<WinitKeyCode> for KeyCode {
    fn from(key: WinitKeyCode) -> Self {
        match key {
            WinitKeyCode::Space => KeyCode::Space,
            WinitKeyCode::Escape => KeyCode::Escape,
            WinitKeyCode::KeyA => KeyCode::A,
            WinitKeyCode::KeyC => KeyCode::C,
            WinitKeyCode::KeyP => KeyCode::P,
            WinitKeyCode::KeyR => KeyCode::R,
            _ => KeyCode::Other(key as u32),
        }
    }
}

/// Input state tracking for keyboard and mouse.
#[derive(Debug, Default)]
pub struct Input {
    keys_held: HashSet<KeyCode>,
    keys_pressed: HashSet<KeyCode>,

    mouse_held: HashSet<MouseButton>,
    mouse_pressed: HashSet<MouseButton>,

    mouse_position: Vec2,
    /// Movement accumulated since the last `begin_frame`.
    mouse_delta: Vec2,
    scroll_delta: f32,
}

impl Input {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if a key was pressed this frame (just went down).
    pub fn key_pressed(&self, key: KeyCode) -> bool {
        self.keys_pressed.contains(&key)
    }

    pub fn key_held(&self, key: KeyCode) -> bool {
        self.keys_held.contains(&key)
    }

    pub fn mouse_pressed(&self, button: MouseButton) -> bool {
        self.mouse_pressed.contains(&button)
    }

    pub fn mouse_held(&self, button: MouseButton) -> bool {
        self.mouse_held.contains(&button)
    }

    /// Mouse position in screen pixels.
    pub fn mouse_position(&self) -> Vec2 {
        self.mouse_position
    }

    /// Mouse movement since last frame in pixels.
    pub fn mouse_delta(&self) -> Vec2 {
        self.mouse_delta
    }

    /// Positive values indicate scrolling up/forward.
    pub fn scroll_delta(&self) -> f32 {
        self.scroll_delta
    }

    /// Clear per-frame state. Call after the frame has consumed it.
    pub(crate) fn begin_frame(&mut self) {
        self.keys_pressed.clear();
        self.mouse_pressed.clear();
        self.mouse_delta = Vec2::ZERO;
        self.scroll_delta = 0.0;
    }

    pub(crate) fn handle_event(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(code) = event.physical_key {
                    self.key_event(KeyCode::from(code), event.state);
                }
            }

            WindowEvent::MouseInput { state, button, .. } => {
                if let Some(btn) = MouseButton::from_winit(*button) {
                    self.button_event(btn, *state);
                }
            }

            WindowEvent::CursorMoved { position, .. } => {
                self.cursor_moved(Vec2::new(position.x as f32, position.y as f32));
            }

            WindowEvent::MouseWheel { delta, .. } => {
                self.scroll_delta += match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / 100.0,
                };
            }

            WindowEvent::Focused(false) => {
                self.keys_held.clear();
                self.mouse_held.clear();
            }

            _ => {}
        }
    }

    pub(crate) fn key_event(&mut self, key: KeyCode, state: ElementState) {
        match state {
            ElementState::Pressed => {
                // Ignore auto-repeat.
                if self.keys_held.insert(key) {
                    self.keys_pressed.insert(key);
                }
            }
            ElementState::Released => {
                self.keys_held.remove(&key);
            }
        }
    }

    pub(crate) fn button_event(&mut self, button: MouseButton, state: ElementState) {
        match state {
            ElementState::Pressed => {
                self.mouse_pressed.insert(button);
                self.mouse_held.insert(button);
            }
            ElementState::Released => {
                self.mouse_held.remove(&button);
            }
        }
    }

    pub(crate) fn cursor_moved(&mut self, position: Vec2) {
        self.mouse_delta += position - self.mouse_position;
        self.mouse_position = position;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_press_is_one_frame() {
        let mut input = Input::new();
        assert!(!input.key_pressed(KeyCode::Space));

        input.key_event(KeyCode::Space, ElementState::Pressed);
        assert!(input.key_pressed(KeyCode::Space));
        assert!(input.key_held(KeyCode::Space));

        input.begin_frame();
        assert!(!input.key_pressed(KeyCode::Space));
        assert!(input.key_held(KeyCode::Space));
    }

    #[test]
    fn test_auto_repeat_does_not_retrigger() {
        let mut input = Input::new();
        input.key_event(KeyCode::Space, ElementState::Pressed);
        input.begin_frame();
        input.key_event(KeyCode::Space, ElementState::Pressed);
        assert!(!input.key_pressed(KeyCode::Space));

        input.key_event(KeyCode::Space, ElementState::Released);
        input.key_event(KeyCode::Space, ElementState::Pressed);
        assert!(input.key_pressed(KeyCode::Space));
    }

    #[test]
    fn test_mouse_delta_accumulates() {
        let mut input = Input::new();
        input.cursor_moved(Vec2::new(100.0, 100.0));
        input.begin_frame();

        input.cursor_moved(Vec2::new(110.0, 95.0));
        input.cursor_moved(Vec2::new(120.0, 90.0));
        assert_eq!(input.mouse_delta(), Vec2::new(20.0, -10.0));

        input.begin_frame();
        assert_eq!(input.mouse_delta(), Vec2::ZERO);
        assert_eq!(input.mouse_position(), Vec2::new(120.0, 90.0));
    }

    #[test]
    fn test_drag_state() {
        let mut input = Input::new();
        input.button_event(MouseButton::Left, ElementState::Pressed);
        assert!(input.mouse_pressed(MouseButton::Left));
        input.begin_frame();
        assert!(input.mouse_held(MouseButton::Left));
        input.button_event(MouseButton::Left, ElementState::Released);
        assert!(!input.mouse_held(MouseButton::Left));
    }
}
