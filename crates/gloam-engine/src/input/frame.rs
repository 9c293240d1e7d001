use std::collections::HashSet;

use super::types::{Key, MouseButton};

/// Input changes since the previous frame.
#[derive(Debug, Default)]
pub struct InputFrame {
    pub keys_pressed: HashSet<Key>,
    pub keys_released: HashSet<Key>,
    pub buttons_pressed: HashSet<MouseButton>,
    pub buttons_released: HashSet<MouseButton>,

    /// Summed pointer motion in logical pixels (`+y` is down).
    pub pointer_delta: (f32, f32),

    /// Summed vertical wheel motion in lines.
    pub wheel_lines: f32,
}

impl InputFrame {
    pub fn key_pressed(&self, key: Key) -> bool {
        self.keys_pressed.contains(&key)
    }

    pub fn clear(&mut self) {
        self.keys_pressed.clear();
        self.keys_released.clear();
        self.buttons_pressed.clear();
        self.buttons_released.clear();
        self.pointer_delta = (0.0, 0.0);
        self.wheel_lines = 0.0;
    }
}
