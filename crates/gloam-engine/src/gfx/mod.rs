//! Explicit graphics binding context.
//!
//! Pipeline components never touch wgpu directly. They draw through a
//! [`GpuContext`] passed by reference, which owns the single "current target /
//! current program / texture units" state. Two implementations exist:
//! - [`backend::WgpuContext`] records real render passes into a frame encoder
//! - [`recording::RecordingContext`] validates and logs commands for tests

mod context;
mod handle;
mod program;
mod target;
mod uniform;

pub mod backend;
pub mod recording;

pub use context::{GpuContext, GpuContextExt};
pub use handle::{
    BufferId, InstanceBuffer, Mesh, MeshId, Owned, Program, ProgramId, ReleaseQueue, ResourceId,
    Target, TargetId, Texture, TextureId,
};
pub use program::{
    BlendMode, DepthMode, INSTANCE_LOCATION, INSTANCE_STRIDE, Instances, MAX_TEXTURE_UNITS,
    MeshData, MeshDesc, MeshVertex, ProgramDesc, QuadVertex, TextureUnit, Topology, VertexInput,
};
pub use target::{
    Clear, ColorAttachment, Filter, Format, Framebuffer, IncompleteReason, MAX_COLOR_ATTACHMENTS,
    TargetDesc, TargetStatus, TextureDesc, Wrap,
};
pub use uniform::{
    StructBuilder, UniformBlock, UniformKind, UniformLayout, UniformLayoutBuilder, UniformSlot,
    UniformValue, UniformWrite,
};
