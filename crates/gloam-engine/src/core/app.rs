use winit::event::WindowEvent;

use super::ctx::FrameCtx;

/// Returned by app callbacks.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AppControl {
    Continue,
    Exit,
}

/// Implemented by programs driven by [`crate::window::Runtime`].
pub trait App {
    /// Raw window events, after the runtime has updated input state.
    fn on_window_event(&mut self, event: &WindowEvent) -> AppControl {
        let _ = event;
        AppControl::Continue
    }

    /// One frame. Everything drawn through `ctx.gfx` is presented afterwards.
    fn on_frame(&mut self, ctx: &mut FrameCtx<'_>) -> AppControl;
}
