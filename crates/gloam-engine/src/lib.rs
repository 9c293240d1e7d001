//! Gloam engine: a deferred HDR renderer on wgpu and winit.
//!
//! - [`deferred`] is the pipeline (G-Buffer, SSAO, lighting, bloom, tonemap)
//! - [`gfx`] is the explicit binding context it draws through
//! - [`device`], [`window`], [`input`], [`time`] run it in a window

pub mod core;
pub mod deferred;
pub mod device;
pub mod gfx;
pub mod input;
pub mod logging;
pub mod time;
pub mod window;
