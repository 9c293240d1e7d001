//! The contract between the runtime loop and an application.

mod app;
mod ctx;

pub use app::{App, AppControl};
pub use ctx::FrameCtx;
