//! Keyboard and pointer input.
//!
//! [`InputState`] holds what is down right now; [`InputFrame`] collects what
//! changed since the last frame (presses, releases, pointer motion, wheel).
//! The runtime translates winit events and clears the frame after each
//! `App::on_frame`.

mod frame;
mod state;
mod translate;
mod types;

pub use frame::InputFrame;
pub use state::InputState;
pub(crate) use translate::translate_window_event;
pub use types::{ButtonState, InputEvent, Key, Modifiers, MouseButton, WheelDelta};
