//! Frame timing. One [`FrameClock`] per render loop, ticked once per frame.

mod frame_clock;

pub use frame_clock::{FrameClock, FrameTime};
