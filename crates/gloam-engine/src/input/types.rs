/// Keys the engine names. Anything else arrives as `Unknown` with the
/// platform key code.
#[rustfmt::skip]
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Key {
    Escape,
    Enter,
    Tab,
    Space,
    Backspace,
    Shift,
    Control,
    Alt,
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
    A, B, C, D, E, F, G, H, I, J, K, L, M,
    N, O, P, Q, R, S, T, U, V, W, X, Y, Z,
    Digit0, Digit1, Digit2, Digit3, Digit4,
    Digit5, Digit6, Digit7, Digit8, Digit9,
    F1, F2, F3, F4, F5, F6, F7, F8, F9, F10, F11, F12,
    Unknown(u32),
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
    Other(u16),
}

/// Press or release, shared by keys and buttons.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ButtonState {
    Pressed,
    Released,
}

#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

/// Scroll amount. Line deltas come from notched wheels, pixel deltas from
/// touchpads.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum WheelDelta {
    Lines { x: f32, y: f32 },
    Pixels { x: f32, y: f32 },
}

impl WheelDelta {
    /// Logical pixels per wheel line.
    pub const PIXELS_PER_LINE: f32 = 20.0;

    /// Vertical scroll in lines, positive away from the user.
    pub fn lines_y(self) -> f32 {
        match self {
            WheelDelta::Lines { y, .. } => y,
            WheelDelta::Pixels { y, .. } => y / Self::PIXELS_PER_LINE,
        }
    }
}

/// Platform-neutral input event. Positions are logical pixels.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    Key {
        key: Key,
        state: ButtonState,
        repeat: bool,
    },
    Button {
        button: MouseButton,
        state: ButtonState,
    },
    PointerMoved {
        x: f32,
        y: f32,
    },
    PointerLeft,
    Wheel(WheelDelta),
    Modifiers(Modifiers),
    Focused(bool),
}
