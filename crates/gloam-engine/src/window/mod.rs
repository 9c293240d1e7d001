//! Window and event loop.
//!
//! Owns the winit event loop and the window, wires them to [`crate::device`]
//! and drives an [`crate::core::App`] once per redraw.

mod runtime;

pub use runtime::{Runtime, RuntimeConfig};
