//! Recording mock of [`GpuContext`].
//!
//! Applies the same validation and binding rules as the wgpu backend but only
//! records what would have been submitted, so tests can assert exact bind and
//! draw sequences without a device.

use std::collections::{BTreeMap, HashSet};

use glam::Mat4;

use super::context::GpuContext;
use super::handle::{
    BufferId, InstanceBuffer, Mesh, MeshId, Program, ProgramId, ReleaseQueue, ResourceId, Target,
    TargetId, Texture, TextureId,
};
use super::program::{
    Instances, MAX_TEXTURE_UNITS, MeshDesc, ProgramDesc, TextureUnit, Topology, VertexInput,
};
use super::target::{
    Clear, Framebuffer, IncompleteReason, TargetDesc, TargetStatus, TextureDesc,
};
use super::uniform::{UniformBlock, UniformValue, UniformWrite};

/// One recorded draw.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawRecord {
    pub target: Framebuffer,
    pub program: Option<ProgramId>,
    pub mesh: MeshId,
    pub vertex_count: u32,
    pub instances: u32,
    pub instance_buffer: Option<BufferId>,
    /// Texture bound at each unit the program samples, in declaration order.
    pub textures: Vec<(TextureUnit, Option<TextureId>)>,
    /// Snapshot of the program's uniform bytes at draw time.
    pub uniforms: Vec<u8>,
    /// The draw was dropped (incomplete target, missing program/mesh).
    pub dropped: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    BindTarget(Framebuffer),
    UseProgram(ProgramId),
    BindTexture { unit: TextureUnit, texture: TextureId },
    SetUniform {
        program: Option<ProgramId>,
        name: String,
        value: UniformValue,
        written: bool,
    },
    Clear { target: Framebuffer, clear: Clear },
    Draw(DrawRecord),
    CopyDepth { src: TargetId, dst: TargetId, ok: bool },
}

#[derive(Debug)]
struct TextureRecord {
    label: String,
    width: u32,
    height: u32,
    pixels: Option<Vec<u8>>,
}

#[derive(Debug)]
struct TargetRecord {
    desc: TargetDesc,
    status: TargetStatus,
    attachments: Vec<TextureId>,
}

#[derive(Debug)]
struct ProgramRecord {
    label: String,
    vertex: VertexInput,
    textures: Vec<TextureUnit>,
    uniforms: UniformBlock,
}

#[derive(Debug)]
struct MeshRecord {
    vertex_count: u32,
    input: VertexInput,
    topology: Topology,
}

#[derive(Debug)]
struct BufferRecord {
    transforms: Vec<Mat4>,
}

/// Device-free [`GpuContext`] that records every command.
#[derive(Debug)]
pub struct RecordingContext {
    queue: ReleaseQueue,
    next_id: u32,
    max_dimension: u32,

    textures: BTreeMap<TextureId, TextureRecord>,
    targets: BTreeMap<TargetId, TargetRecord>,
    programs: BTreeMap<ProgramId, ProgramRecord>,
    meshes: BTreeMap<MeshId, MeshRecord>,
    buffers: BTreeMap<BufferId, BufferRecord>,

    bound: Framebuffer,
    program: Option<ProgramId>,
    units: [Option<TextureId>; MAX_TEXTURE_UNITS],

    commands: Vec<Command>,
    released: Vec<ResourceId>,
    warned_incomplete: HashSet<TargetId>,
}

impl Default for RecordingContext {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingContext {
    pub fn new() -> Self {
        Self::with_max_dimension(8192)
    }

    pub fn with_max_dimension(max_dimension: u32) -> Self {
        Self {
            queue: ReleaseQueue::new(),
            next_id: 1,
            max_dimension,
            textures: BTreeMap::new(),
            targets: BTreeMap::new(),
            programs: BTreeMap::new(),
            meshes: BTreeMap::new(),
            buffers: BTreeMap::new(),
            bound: Framebuffer::Screen,
            program: None,
            units: [None; MAX_TEXTURE_UNITS],
            commands: Vec::new(),
            released: Vec::new(),
            warned_incomplete: HashSet::new(),
        }
    }

    fn alloc(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    // ── inspection ────────────────────────────────────────────────────────

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Forgets recorded commands (resources and binding state are kept).
    pub fn clear_log(&mut self) {
        self.commands.clear();
    }

    pub fn draws(&self) -> impl Iterator<Item = &DrawRecord> {
        self.commands.iter().filter_map(|c| match c {
            Command::Draw(d) => Some(d),
            _ => None,
        })
    }

    pub fn texture_label(&self, id: TextureId) -> Option<&str> {
        self.textures.get(&id).map(|t| t.label.as_str())
    }

    pub fn texture_size(&self, id: TextureId) -> Option<(u32, u32)> {
        self.textures.get(&id).map(|t| (t.width, t.height))
    }

    pub fn texture_pixels(&self, id: TextureId) -> Option<&[u8]> {
        self.textures.get(&id).and_then(|t| t.pixels.as_deref())
    }

    pub fn program_label(&self, id: ProgramId) -> Option<&str> {
        self.programs.get(&id).map(|p| p.label.as_str())
    }

    pub fn target_label(&self, id: TargetId) -> Option<&str> {
        self.targets.get(&id).map(|t| t.desc.label.as_str())
    }

    pub fn target_desc(&self, id: TargetId) -> Option<&TargetDesc> {
        self.targets.get(&id).map(|t| &t.desc)
    }

    pub fn mesh_topology(&self, id: MeshId) -> Option<Topology> {
        self.meshes.get(&id).map(|m| m.topology)
    }

    pub fn mesh_vertex_count(&self, id: MeshId) -> Option<u32> {
        self.meshes.get(&id).map(|m| m.vertex_count)
    }

    pub fn instance_transforms(&self, id: BufferId) -> Option<&[Mat4]> {
        self.buffers.get(&id).map(|b| b.transforms.as_slice())
    }

    /// Current staged value of a program's `f32` parameter.
    pub fn uniform_f32(&self, program: ProgramId, name: &str) -> Option<f32> {
        let p = self.programs.get(&program)?;
        let slot = p.uniforms.layout().get(name)?;
        Some(p.uniforms.read_f32(slot.offset))
    }

    /// Number of live (not yet released) resources of every kind.
    pub fn live_resources(&self) -> usize {
        self.textures.len()
            + self.targets.len()
            + self.programs.len()
            + self.meshes.len()
            + self.buffers.len()
    }

    pub fn released(&self) -> &[ResourceId] {
        &self.released
    }

    pub fn bound_texture(&self, unit: TextureUnit) -> Option<TextureId> {
        self.units.get(unit.index()).copied().flatten()
    }

    fn target_ok(&mut self, fb: Framebuffer) -> bool {
        match fb {
            Framebuffer::Screen => true,
            Framebuffer::Offscreen(id) => {
                let complete = self
                    .targets
                    .get(&id)
                    .is_some_and(|t| t.status.is_complete());
                if !complete && self.warned_incomplete.insert(id) {
                    log::warn!("dropping draws into incomplete target {id:?}");
                }
                complete
            }
        }
    }
}

impl GpuContext for RecordingContext {
    fn create_texture(&mut self, desc: &TextureDesc, pixels: Option<&[u8]>) -> Texture {
        let id = TextureId(self.alloc());
        self.textures.insert(
            id,
            TextureRecord {
                label: desc.label.clone(),
                width: desc.width,
                height: desc.height,
                pixels: pixels.map(<[u8]>::to_vec),
            },
        );
        Texture::new(id, &self.queue)
    }

    fn create_target(&mut self, desc: &TargetDesc) -> Target {
        let id = TargetId(self.alloc());
        let status = desc.validate(self.max_dimension);

        let mut attachments = Vec::new();
        match status {
            TargetStatus::Complete => {
                for i in 0..desc.color.len() {
                    let tex = TextureId(self.alloc());
                    self.textures.insert(
                        tex,
                        TextureRecord {
                            label: format!("{} #{i}", desc.label),
                            width: desc.width,
                            height: desc.height,
                            pixels: None,
                        },
                    );
                    attachments.push(tex);
                }
            }
            TargetStatus::Incomplete(reason) => {
                log::error!("render target `{}` is incomplete: {reason}", desc.label);
            }
        }

        self.targets.insert(
            id,
            TargetRecord {
                desc: desc.clone(),
                status,
                attachments,
            },
        );
        Target::new(id, &self.queue)
    }

    fn target_status(&self, target: TargetId) -> TargetStatus {
        self.targets
            .get(&target)
            .map(|t| t.status)
            .unwrap_or(TargetStatus::Incomplete(IncompleteReason::NoAttachments))
    }

    fn target_attachment(&self, target: TargetId, index: usize) -> Option<TextureId> {
        self.targets
            .get(&target)
            .and_then(|t| t.attachments.get(index).copied())
    }

    fn target_size(&self, target: TargetId) -> Option<(u32, u32)> {
        self.targets
            .get(&target)
            .map(|t| (t.desc.width, t.desc.height))
    }

    fn create_program(&mut self, desc: &ProgramDesc) -> Program {
        let id = ProgramId(self.alloc());
        self.programs.insert(
            id,
            ProgramRecord {
                label: desc.label.clone(),
                vertex: desc.vertex,
                textures: desc.textures.clone(),
                uniforms: UniformBlock::new(desc.uniforms.clone()),
            },
        );
        Program::new(id, &self.queue)
    }

    fn create_mesh(&mut self, desc: &MeshDesc<'_>) -> Mesh {
        let id = MeshId(self.alloc());
        self.meshes.insert(
            id,
            MeshRecord {
                vertex_count: desc.data.vertex_count(),
                input: desc.data.input(),
                topology: desc.topology,
            },
        );
        Mesh::new(id, &self.queue)
    }

    fn create_instance_buffer(&mut self, _label: &str, transforms: &[Mat4]) -> InstanceBuffer {
        let id = BufferId(self.alloc());
        self.buffers.insert(
            id,
            BufferRecord {
                transforms: transforms.to_vec(),
            },
        );
        InstanceBuffer::new(id, &self.queue)
    }

    fn bind_target(&mut self, target: Framebuffer) {
        self.bound = target;
        self.commands.push(Command::BindTarget(target));
    }

    fn bound_target(&self) -> Framebuffer {
        self.bound
    }

    fn use_program(&mut self, program: ProgramId) {
        self.program = Some(program);
        self.commands.push(Command::UseProgram(program));
    }

    fn active_program(&self) -> Option<ProgramId> {
        self.program
    }

    fn set_uniform(&mut self, name: &str, value: UniformValue) {
        let written = match self.program.and_then(|p| self.programs.get_mut(&p)) {
            Some(p) => p.uniforms.set(name, value) == UniformWrite::Written,
            None => false,
        };
        self.commands.push(Command::SetUniform {
            program: self.program,
            name: name.to_string(),
            value,
            written,
        });
    }

    fn bind_texture(&mut self, unit: TextureUnit, texture: TextureId) {
        if let Some(slot) = self.units.get_mut(unit.index()) {
            *slot = Some(texture);
            self.commands.push(Command::BindTexture { unit, texture });
        } else {
            log::warn!("texture unit {} out of range", unit.0);
        }
    }

    fn clear(&mut self, clear: Clear) {
        self.commands.push(Command::Clear {
            target: self.bound,
            clear,
        });
    }

    fn draw(&mut self, mesh: MeshId, instances: Instances) {
        let target_ok = self.target_ok(self.bound);
        let program = self.program.and_then(|id| self.programs.get(&id));
        let mesh_rec = self.meshes.get(&mesh);

        let (textures, uniforms, vertex) = match program {
            Some(p) => (
                p.textures
                    .iter()
                    .map(|u| (*u, self.units.get(u.index()).copied().flatten()))
                    .collect(),
                p.uniforms.bytes().to_vec(),
                Some(p.vertex),
            ),
            None => (Vec::new(), Vec::new(), None),
        };

        let input_ok = matches!((vertex, mesh_rec), (Some(v), Some(m)) if v == m.input);
        let instance_buffer = match instances {
            Instances::One => None,
            Instances::Batch { buffer, .. } => Some(buffer),
        };

        let record = DrawRecord {
            target: self.bound,
            program: self.program,
            mesh,
            vertex_count: mesh_rec.map_or(0, |m| m.vertex_count),
            instances: instances.count(),
            instance_buffer,
            textures,
            uniforms,
            dropped: !(target_ok && input_ok),
        };
        self.commands.push(Command::Draw(record));
    }

    fn copy_depth(&mut self, src: TargetId, dst: TargetId) {
        let ok = match (self.targets.get(&src), self.targets.get(&dst)) {
            (Some(s), Some(d)) => {
                s.status.is_complete()
                    && d.status.is_complete()
                    && s.desc.depth
                    && d.desc.depth
                    && (s.desc.width, s.desc.height) == (d.desc.width, d.desc.height)
            }
            _ => false,
        };
        if !ok {
            log::warn!("depth copy {src:?} -> {dst:?} skipped: incompatible targets");
        }
        self.commands.push(Command::CopyDepth { src, dst, ok });
    }

    fn collect_released(&mut self) -> usize {
        let ids = self.queue.drain();
        for id in &ids {
            match *id {
                ResourceId::TextureId(t) => {
                    self.textures.remove(&t);
                }
                ResourceId::TargetId(t) => {
                    if let Some(rec) = self.targets.remove(&t) {
                        for a in rec.attachments {
                            self.textures.remove(&a);
                        }
                    }
                }
                ResourceId::ProgramId(p) => {
                    self.programs.remove(&p);
                    if self.program == Some(p) {
                        self.program = None;
                    }
                }
                ResourceId::MeshId(m) => {
                    self.meshes.remove(&m);
                }
                ResourceId::BufferId(b) => {
                    self.buffers.remove(&b);
                }
            }
        }
        let n = ids.len();
        self.released.extend(ids);
        n
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::target::{ColorAttachment, Filter, Format};
    use crate::gfx::uniform::UniformLayout;

    fn target_desc(w: u32, h: u32) -> TargetDesc {
        TargetDesc {
            label: "t".into(),
            width: w,
            height: h,
            color: vec![ColorAttachment::new(Format::Rgba16Float, Filter::Nearest)],
            depth: true,
        }
    }

    #[test]
    fn incomplete_target_has_no_attachments() {
        let mut ctx = RecordingContext::new();
        let t = ctx.create_target(&target_desc(0, 64));
        assert_eq!(
            ctx.target_status(t.id()),
            TargetStatus::Incomplete(IncompleteReason::ZeroExtent)
        );
        assert_eq!(ctx.target_attachment(t.id(), 0), None);
    }

    #[test]
    fn dropping_target_releases_attachments() {
        let mut ctx = RecordingContext::new();
        let t = ctx.create_target(&target_desc(8, 8));
        assert_eq!(ctx.live_resources(), 2);
        drop(t);
        assert_eq!(ctx.collect_released(), 1);
        assert_eq!(ctx.live_resources(), 0);
    }

    #[test]
    fn uniform_without_program_is_not_written() {
        let mut ctx = RecordingContext::new();
        ctx.set_uniform("exposure", 1.0f32.into());
        assert!(matches!(
            ctx.commands().last(),
            Some(Command::SetUniform { written: false, .. })
        ));
    }

    #[test]
    fn draw_snapshots_program_textures() {
        let mut ctx = RecordingContext::new();
        let program = ctx.create_program(&ProgramDesc {
            label: "p".into(),
            source: "".into(),
            vertex: VertexInput::Quad,
            uniforms: UniformLayout::builder().float("x").build(),
            textures: vec![TextureUnit(0), TextureUnit(1)],
            depth: crate::gfx::DepthMode::Off,
            blend: crate::gfx::BlendMode::Replace,
        });
        let quad = ctx.create_mesh(&MeshDesc {
            label: "q",
            data: crate::gfx::MeshData::Quad(&[]),
            topology: Topology::TriangleStrip,
        });
        let tex = ctx.create_texture(
            &TextureDesc {
                label: "img".into(),
                width: 1,
                height: 1,
                format: Format::Rgba8Unorm,
                filter: Filter::Nearest,
                wrap: crate::gfx::Wrap::Repeat,
            },
            None,
        );

        ctx.use_program(program.id());
        ctx.bind_texture(TextureUnit(1), tex.id());
        ctx.draw(quad.id(), Instances::One);

        let d = ctx.draws().last().unwrap();
        assert_eq!(
            d.textures,
            vec![(TextureUnit(0), None), (TextureUnit(1), Some(tex.id()))]
        );
        assert!(!d.dropped);
    }
}
