use winit::window::Window;

use crate::gfx::GpuContext;
use crate::input::{InputFrame, InputState};
use crate::time::FrameTime;

/// Everything an app sees during one frame.
pub struct FrameCtx<'a> {
    /// Recording into this frame's encoder; `Framebuffer::Screen` is the
    /// swapchain image.
    pub gfx: &'a mut dyn GpuContext,
    /// Swapchain size in physical pixels.
    pub size: (u32, u32),
    pub window: &'a Window,
    pub input: &'a InputState,
    pub input_frame: &'a InputFrame,
    pub time: FrameTime,
}

impl FrameCtx<'_> {
    /// Width over height; 1 for a degenerate size.
    pub fn aspect(&self) -> f32 {
        if self.size.1 == 0 {
            1.0
        } else {
            self.size.0 as f32 / self.size.1 as f32
        }
    }
}
