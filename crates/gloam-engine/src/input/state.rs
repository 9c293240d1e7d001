use std::collections::HashSet;

use super::frame::InputFrame;
use super::types::{ButtonState, InputEvent, Key, Modifiers, MouseButton};

/// Held keys and buttons, pointer position and focus of one window.
#[derive(Debug, Default)]
pub struct InputState {
    pub modifiers: Modifiers,
    pub focused: bool,
    /// Logical pixels; `None` while the pointer is outside the window.
    pub pointer: Option<(f32, f32)>,
    keys: HashSet<Key>,
    buttons: HashSet<MouseButton>,
}

impl InputState {
    pub fn key_down(&self, key: Key) -> bool {
        self.keys.contains(&key)
    }

    pub fn button_down(&self, button: MouseButton) -> bool {
        self.buttons.contains(&button)
    }

    /// Updates held state and records the transition in `frame`.
    pub fn apply(&mut self, frame: &mut InputFrame, event: InputEvent) {
        match event {
            InputEvent::Key { key, state, .. } => match state {
                ButtonState::Pressed => {
                    if self.keys.insert(key) {
                        frame.keys_pressed.insert(key);
                    }
                }
                ButtonState::Released => {
                    if self.keys.remove(&key) {
                        frame.keys_released.insert(key);
                    }
                }
            },
            InputEvent::Button { button, state } => match state {
                ButtonState::Pressed => {
                    if self.buttons.insert(button) {
                        frame.buttons_pressed.insert(button);
                    }
                }
                ButtonState::Released => {
                    if self.buttons.remove(&button) {
                        frame.buttons_released.insert(button);
                    }
                }
            },
            InputEvent::PointerMoved { x, y } => {
                // The first position after entering carries no motion.
                if let Some((px, py)) = self.pointer {
                    frame.pointer_delta.0 += x - px;
                    frame.pointer_delta.1 += y - py;
                }
                self.pointer = Some((x, y));
            }
            InputEvent::PointerLeft => self.pointer = None,
            InputEvent::Wheel(delta) => frame.wheel_lines += delta.lines_y(),
            InputEvent::Modifiers(m) => self.modifiers = m,
            InputEvent::Focused(focused) => {
                self.focused = focused;
                // Releases that happen while unfocused are never delivered.
                if !focused {
                    self.keys.clear();
                    self.buttons.clear();
                }
            }
        }
    }
}
