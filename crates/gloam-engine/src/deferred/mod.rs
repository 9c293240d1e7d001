//! Deferred HDR pipeline built on [`GpuContext`](crate::gfx::GpuContext).
//!
//! Geometry goes into the [`GBuffer`], [`SsaoStage`] derives ambient occlusion
//! from it, a full-screen lighting pass shades every covered pixel into the
//! [`HdrCompositor`]'s HDR target, forward draws are depth-tested against the
//! copied G-Buffer depth, and bloom plus tone mapping finish on the screen.
//! [`DeferredRenderer`] runs those steps in order.

mod bindings;
mod config;
mod gbuffer;
mod instanced;
mod light;
mod phase;
mod post;
mod primitives;
mod renderer;
mod ssao;
mod view;

pub mod texture;

pub use bindings::{Pass, Slot};
pub use config::RendererConfig;
pub use gbuffer::{GBuffer, Material};
pub use instanced::InstancedBatch;
pub use light::{MAX_LIGHTS, PointLight};
pub use phase::{PhaseTracker, PhaseViolation, PipelinePhase};
pub use post::{BloomSource, GAUSSIAN_WEIGHTS, HdrCompositor, PingPong};
pub use primitives::{CUBE_VERTICES, Primitives, QUAD_VERTICES};
pub use renderer::DeferredRenderer;
pub use ssao::{
    KERNEL_SIZE, NOISE_SIZE, SsaoInputs, SsaoStage, generate_kernel, generate_noise, kernel_scale,
};
pub use view::ViewState;
