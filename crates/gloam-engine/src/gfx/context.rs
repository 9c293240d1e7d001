use glam::Mat4;

use super::handle::{
    InstanceBuffer, Mesh, MeshId, Program, ProgramId, Target, TargetId, Texture, TextureId,
};
use super::program::{Instances, MeshDesc, ProgramDesc, TextureUnit};
use super::target::{Clear, Framebuffer, TargetDesc, TargetStatus, TextureDesc};
use super::uniform::UniformValue;

/// The single mutable binding context every pipeline component draws through.
///
/// At any instant exactly one framebuffer and at most one program are bound.
/// Texture units are not preserved across passes: each pass rebinds what it
/// samples. Implementations never fail at this boundary; resource problems are
/// logged and the affected draws produce undefined output.
pub trait GpuContext {
    // ── resources ─────────────────────────────────────────────────────────

    /// Creates a sampled texture, optionally uploading tightly packed `pixels`.
    fn create_texture(&mut self, desc: &TextureDesc, pixels: Option<&[u8]>) -> Texture;

    /// Creates a render target. Incomplete descriptions are logged and yield a
    /// handle that reports [`TargetStatus::Incomplete`].
    fn create_target(&mut self, desc: &TargetDesc) -> Target;

    fn target_status(&self, target: TargetId) -> TargetStatus;

    /// Colour attachment `index` of `target`, or `None` when the target is
    /// incomplete or has fewer attachments.
    fn target_attachment(&self, target: TargetId, index: usize) -> Option<TextureId>;

    fn target_size(&self, target: TargetId) -> Option<(u32, u32)>;

    /// Compiles and links a program. Diagnostics are logged; the handle is
    /// always returned.
    fn create_program(&mut self, desc: &ProgramDesc) -> Program;

    fn create_mesh(&mut self, desc: &MeshDesc<'_>) -> Mesh;

    /// Uploads per-instance model matrices (column-major).
    fn create_instance_buffer(&mut self, label: &str, transforms: &[Mat4]) -> InstanceBuffer;

    // ── binding state ─────────────────────────────────────────────────────

    fn bind_target(&mut self, target: Framebuffer);

    fn bound_target(&self) -> Framebuffer;

    fn use_program(&mut self, program: ProgramId);

    fn active_program(&self) -> Option<ProgramId>;

    /// Writes a named parameter of the active program. Unknown names are ignored.
    fn set_uniform(&mut self, name: &str, value: UniformValue);

    fn bind_texture(&mut self, unit: TextureUnit, texture: TextureId);

    // ── commands ──────────────────────────────────────────────────────────

    fn clear(&mut self, clear: Clear);

    fn draw(&mut self, mesh: MeshId, instances: Instances);

    /// Copies the depth attachment of `src` into `dst`. Both must be complete,
    /// carry depth, and share a size.
    fn copy_depth(&mut self, src: TargetId, dst: TargetId);

    // ── lifetime ──────────────────────────────────────────────────────────

    /// Frees every resource whose handle has been dropped. Returns the count.
    fn collect_released(&mut self) -> usize;
}

/// Convenience for `set_uniform` with anything convertible to a value.
pub trait GpuContextExt {
    fn set<V: Into<UniformValue>>(&mut self, name: &str, value: V);
}

impl<C: GpuContext + ?Sized> GpuContextExt for C {
    #[inline]
    fn set<V: Into<UniformValue>>(&mut self, name: &str, value: V) {
        self.set_uniform(name, value.into());
    }
}
