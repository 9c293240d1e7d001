//! wgpu device and window surface.
//!
//! [`Gpu`] owns the instance, adapter, device, queue and the configured surface
//! of one window. The deferred pipeline never sees it: the runtime hands the
//! device to a [`WgpuContext`](crate::gfx::backend::WgpuContext) and drives the
//! surface frame by frame.

mod gpu;
mod init;
mod surface;

pub use gpu::{Gpu, GpuFrame, SurfaceErrorAction};
pub use init::GpuInit;
