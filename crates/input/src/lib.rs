//! Input handling for keyboard and mouse.

use glam::Vec2;
use std::collections::HashSet;

/// Manages input state for the current frame.
///
/// Mouse motion arrives as relative device deltas and accumulates between
/// frames; `begin_frame()` drains the accumulator into the per-frame delta,
/// which stands in for the classic "read deltas, recenter cursor" step.
#[derive(Debug, Default)]
pub struct InputState {
    /// Keys currently held down.
    keys_held: HashSet<KeyCode>,
    /// Keys pressed this frame.
    keys_pressed: HashSet<KeyCode>,
    /// Keys released this frame.
    keys_released: HashSet<KeyCode>,

    /// Mouse movement delta this frame.
    mouse_delta: Vec2,
    /// Accumulated mouse delta (for when cursor is locked).
    accumulated_delta: Vec2,

    /// Whether the cursor is captured/locked.
    cursor_locked: bool,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear per-frame state. Call once per frame after input has been read.
    pub fn begin_frame(&mut self) {
        self.keys_pressed.clear();
        self.keys_released.clear();
        self.mouse_delta = self.accumulated_delta;
        self.accumulated_delta = Vec2::ZERO;
    }

    /// Process a keyboard event.
    pub fn process_keyboard(&mut self, key: KeyCode, state: ElementState) {
        match state {
            ElementState::Pressed => {
                if !self.keys_held.contains(&key) {
                    self.keys_pressed.insert(key);
                }
                self.keys_held.insert(key);
            }
            ElementState::Released => {
                self.keys_held.remove(&key);
                self.keys_released.insert(key);
            }
        }
    }

    /// Process relative mouse movement.
    pub fn process_mouse_motion(&mut self, delta: (f64, f64)) {
        self.accumulated_delta.x += delta.0 as f32;
        self.accumulated_delta.y += delta.1 as f32;
    }

    // Query methods

    /// Check if a key is currently held.
    pub fn is_key_held(&self, key: KeyCode) -> bool {
        self.keys_held.contains(&key)
    }

    /// Check if a key was pressed this frame.
    pub fn is_key_pressed(&self, key: KeyCode) -> bool {
        self.keys_pressed.contains(&key)
    }

    /// Check if a key was released this frame.
    pub fn is_key_released(&self, key: KeyCode) -> bool {
        self.keys_released.contains(&key)
    }

    /// Get the mouse movement delta for this frame.
    pub fn mouse_delta(&self) -> Vec2 {
        self.mouse_delta
    }

    /// Check if the cursor is locked.
    pub fn is_cursor_locked(&self) -> bool {
        self.cursor_locked
    }

    /// Set cursor lock state.
    pub fn set_cursor_locked(&mut self, locked: bool) {
        if self.cursor_locked != locked {
            log::debug!("cursor lock: {}", locked);
        }
        self.cursor_locked = locked;
    }

    // Demo bindings

    /// Move forward (W).
    pub fn is_forward_held(&self) -> bool {
        self.is_key_held(KeyCode::KeyW)
    }

    /// Move backward (S).
    pub fn is_backward_held(&self) -> bool {
        self.is_key_held(KeyCode::KeyS)
    }

    /// Turn left (A).
    pub fn is_turn_left_held(&self) -> bool {
        self.is_key_held(KeyCode::KeyA)
    }

    /// Turn right (D).
    pub fn is_turn_right_held(&self) -> bool {
        self.is_key_held(KeyCode::KeyD)
    }

    /// Ascend (Shift).
    pub fn is_ascend_held(&self) -> bool {
        self.is_key_held(KeyCode::ShiftLeft) || self.is_key_held(KeyCode::ShiftRight)
    }

    /// Descend (Ctrl).
    pub fn is_descend_held(&self) -> bool {
        self.is_key_held(KeyCode::ControlLeft) || self.is_key_held(KeyCode::ControlRight)
    }

    /// Tilt the view upward (PageUp).
    pub fn is_look_up_held(&self) -> bool {
        self.is_key_held(KeyCode::PageUp)
    }

    /// Tilt the view downward (PageDown).
    pub fn is_look_down_held(&self) -> bool {
        self.is_key_held(KeyCode::PageDown)
    }

    /// Rocket launch trigger (F1). Held state only; the launch latch lives
    /// in the animation driver.
    pub fn is_launch_held(&self) -> bool {
        self.is_key_held(KeyCode::F1)
    }

    /// Quit (Escape).
    pub fn is_quit_pressed(&self) -> bool {
        self.is_key_pressed(KeyCode::Escape)
    }
}

// Re-export for convenience
pub use winit::event::ElementState;
pub use winit::keyboard::KeyCode;

#[cfg(test)]
mod tests {
    use super::*;

    /// Holding a key reports pressed only on the frame of the transition.
    #[test]
    fn pressed_is_edge_held_is_level() {
        let mut input = InputState::new();
        input.process_keyboard(KeyCode::KeyW, ElementState::Pressed);
        assert!(input.is_key_pressed(KeyCode::KeyW));
        assert!(input.is_forward_held());

        input.begin_frame();
        input.process_keyboard(KeyCode::KeyW, ElementState::Pressed);
        assert!(!input.is_key_pressed(KeyCode::KeyW), "repeat is not an edge");
        assert!(input.is_forward_held());
    }

    /// Mouse deltas accumulate across events and drain exactly once.
    #[test]
    fn mouse_delta_drains_per_frame() {
        let mut input = InputState::new();
        input.process_mouse_motion((3.0, -1.0));
        input.process_mouse_motion((2.0, 4.0));

        input.begin_frame();
        assert_eq!(input.mouse_delta(), Vec2::new(5.0, 3.0));

        input.begin_frame();
        assert_eq!(input.mouse_delta(), Vec2::ZERO);
    }
}
