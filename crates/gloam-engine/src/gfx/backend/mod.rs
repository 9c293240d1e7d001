//! wgpu implementation of [`GpuContext`].
//!
//! Draws are collected into a pending render pass for the bound framebuffer and
//! encoded when the target changes, a depth copy needs ordering, or the frame
//! finishes. Clears issued before the first draw of a pass become its load ops.

mod pipelines;
mod resources;

use std::collections::{HashMap, HashSet};

use glam::Mat4;

use super::{
    Clear, Filter, Format, Framebuffer, GpuContext, IncompleteReason, InstanceBuffer, Instances,
    MAX_TEXTURE_UNITS, Mesh, MeshDesc, MeshId, Program, ProgramDesc, ProgramId, ReleaseQueue,
    ResourceId, Target, TargetDesc, TargetId, TargetStatus, Texture, TextureDesc, TextureId,
    TextureUnit, Topology, UniformBlock, UniformValue, UniformWrite, VertexInput, Wrap,
};
use super::{BufferId, BlendMode, DepthMode};

use pipelines::{PipelineKey, ProgramState};
use resources::{DepthEntry, TextureEntry};

struct TargetEntry {
    desc: TargetDesc,
    status: TargetStatus,
    color: Vec<TextureId>,
    depth: Option<DepthEntry>,
}

struct ProgramEntry {
    label: String,
    vertex: VertexInput,
    depth: DepthMode,
    blend: BlendMode,
    textures: Vec<TextureUnit>,
    module: wgpu::ShaderModule,
    bind_group_layout: wgpu::BindGroupLayout,
    layout: wgpu::PipelineLayout,
    uniforms: UniformBlock,
    pipelines: HashMap<PipelineKey, wgpu::RenderPipeline>,
    missed: HashSet<String>,
}

struct MeshEntry {
    buffer: wgpu::Buffer,
    vertex_count: u32,
    input: VertexInput,
    topology: Topology,
}

struct BufferEntry {
    buffer: wgpu::Buffer,
    count: u32,
}

struct DrawCall {
    pipeline: wgpu::RenderPipeline,
    bind_group: wgpu::BindGroup,
    vertices: wgpu::Buffer,
    instances: Option<wgpu::Buffer>,
    vertex_count: u32,
    instance_count: u32,
}

struct PendingPass {
    target: Framebuffer,
    clear_color: Option<[f32; 4]>,
    clear_depth: bool,
    draws: Vec<DrawCall>,
}

struct FrameState {
    encoder: wgpu::CommandEncoder,
    screen_view: wgpu::TextureView,
    screen_size: (u32, u32),
}

/// [`GpuContext`] backed by a wgpu device.
pub struct WgpuContext {
    device: wgpu::Device,
    queue: wgpu::Queue,
    surface_format: wgpu::TextureFormat,
    max_dimension: u32,

    release: ReleaseQueue,
    next_id: u32,

    textures: HashMap<TextureId, TextureEntry>,
    targets: HashMap<TargetId, TargetEntry>,
    programs: HashMap<ProgramId, ProgramEntry>,
    meshes: HashMap<MeshId, MeshEntry>,
    buffers: HashMap<BufferId, BufferEntry>,

    /// Bound to sampled units that have nothing bound.
    fallback: TextureEntry,
    /// Instance stream for non-instanced mesh draws.
    identity_instance: wgpu::Buffer,

    bound: Framebuffer,
    program: Option<ProgramId>,
    units: [Option<TextureId>; MAX_TEXTURE_UNITS],

    frame: Option<FrameState>,
    pending: Option<PendingPass>,

    warned_incomplete: HashSet<TargetId>,
    warned_no_frame: bool,
}

impl WgpuContext {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        surface_format: wgpu::TextureFormat,
    ) -> Self {
        let fallback = resources::create_sampled(
            device,
            "gloam fallback texture",
            (1, 1),
            Format::Rgba8Unorm,
            Filter::Nearest,
            Wrap::Repeat,
            false,
        );
        resources::upload(queue, &fallback, (1, 1), Format::Rgba8Unorm, &[0, 0, 0, 255]);

        let identity_instance = resources::vertex_buffer(
            device,
            "gloam identity instance",
            bytemuck::bytes_of(&Mat4::IDENTITY),
        );

        Self {
            device: device.clone(),
            queue: queue.clone(),
            surface_format,
            max_dimension: device.limits().max_texture_dimension_2d,
            release: ReleaseQueue::new(),
            next_id: 1,
            textures: HashMap::new(),
            targets: HashMap::new(),
            programs: HashMap::new(),
            meshes: HashMap::new(),
            buffers: HashMap::new(),
            fallback,
            identity_instance,
            bound: Framebuffer::Screen,
            program: None,
            units: [None; MAX_TEXTURE_UNITS],
            frame: None,
            pending: None,
            warned_incomplete: HashSet::new(),
            warned_no_frame: false,
        }
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.surface_format
    }

    pub fn max_dimension(&self) -> u32 {
        self.max_dimension
    }

    // ── frame lifecycle ───────────────────────────────────────────────────

    /// Starts recording into `encoder`, with `screen_view` as [`Framebuffer::Screen`].
    ///
    /// Resources whose handles were dropped since the last frame are freed here.
    pub fn begin_frame(
        &mut self,
        encoder: wgpu::CommandEncoder,
        screen_view: wgpu::TextureView,
        screen_size: (u32, u32),
    ) {
        if self.frame.is_some() {
            log::warn!("begin_frame called twice; previous frame discarded");
            self.pending = None;
        }
        self.collect_released();
        self.frame = Some(FrameState {
            encoder,
            screen_view,
            screen_size,
        });
        self.bound = Framebuffer::Screen;
    }

    /// Encodes any pending pass and hands the encoder back for submission.
    pub fn finish_frame(&mut self) -> Option<wgpu::CommandEncoder> {
        self.flush();
        self.frame.take().map(|f| f.encoder)
    }

    fn alloc(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    // ── passes ────────────────────────────────────────────────────────────

    fn color_formats(&self, target: Framebuffer) -> Vec<wgpu::TextureFormat> {
        match target {
            Framebuffer::Screen => vec![self.surface_format],
            Framebuffer::Offscreen(id) => self
                .targets
                .get(&id)
                .map(|t| {
                    t.desc
                        .color
                        .iter()
                        .map(|a| resources::wgpu_format(a.format))
                        .collect()
                })
                .unwrap_or_default(),
        }
    }

    fn has_depth(&self, target: Framebuffer) -> bool {
        match target {
            Framebuffer::Screen => false,
            Framebuffer::Offscreen(id) => self.targets.get(&id).is_some_and(|t| t.depth.is_some()),
        }
    }

    fn target_ok(&mut self, target: Framebuffer) -> bool {
        match target {
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

    /// Pending pass for the bound target, flushing a pass for another target.
    fn pass_for_bound(&mut self) -> &mut PendingPass {
        if self.pending.as_ref().is_some_and(|p| p.target != self.bound) {
            self.flush();
        }
        let bound = self.bound;
        self.pending.get_or_insert_with(|| PendingPass {
            target: bound,
            clear_color: None,
            clear_depth: false,
            draws: Vec::new(),
        })
    }

    /// Encodes the pending pass, if any.
    fn flush(&mut self) {
        let Some(pass) = self.pending.take() else { return };
        if pass.draws.is_empty() && pass.clear_color.is_none() && !pass.clear_depth {
            return;
        }
        let Some(frame) = self.frame.as_mut() else { return };

        let (color_views, depth_view) = match pass.target {
            Framebuffer::Screen => (vec![frame.screen_view.clone()], None),
            Framebuffer::Offscreen(id) => {
                let Some(t) = self.targets.get(&id) else { return };
                if !t.status.is_complete() {
                    return;
                }
                let views = t
                    .color
                    .iter()
                    .filter_map(|tex| self.textures.get(tex).map(|e| e.view.clone()))
                    .collect::<Vec<_>>();
                (views, t.depth.as_ref().map(|d| d.view.clone()))
            }
        };

        let load = match pass.clear_color {
            Some([r, g, b, a]) => wgpu::LoadOp::Clear(wgpu::Color {
                r: r as f64,
                g: g as f64,
                b: b as f64,
                a: a as f64,
            }),
            None => wgpu::LoadOp::Load,
        };

        let color_attachments: Vec<Option<wgpu::RenderPassColorAttachment<'_>>> = color_views
            .iter()
            .map(|view| {
                Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load,
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })
            })
            .collect();

        let depth_stencil_attachment =
            depth_view
                .as_ref()
                .map(|view| wgpu::RenderPassDepthStencilAttachment {
                    view,
                    depth_ops: Some(wgpu::Operations {
                        load: if pass.clear_depth {
                            wgpu::LoadOp::Clear(1.0)
                        } else {
                            wgpu::LoadOp::Load
                        },
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                });

        let mut rpass = frame.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("gloam pass"),
            color_attachments: &color_attachments,
            depth_stencil_attachment,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        for draw in &pass.draws {
            rpass.set_pipeline(&draw.pipeline);
            rpass.set_bind_group(0, &draw.bind_group, &[]);
            rpass.set_vertex_buffer(0, draw.vertices.slice(..));
            if let Some(instances) = &draw.instances {
                rpass.set_vertex_buffer(1, instances.slice(..));
            }
            rpass.draw(0..draw.vertex_count, 0..draw.instance_count);
        }
    }

    fn build_draw(&mut self, mesh: MeshId, instances: Instances) -> Option<DrawCall> {
        let program_id = self.program?;
        let key = PipelineKey {
            colors: self.color_formats(self.bound),
            depth: self.has_depth(self.bound),
            topology: self.meshes.get(&mesh)?.topology,
        };

        let mesh = self.meshes.get(&mesh)?;
        let program = self.programs.get_mut(&program_id)?;
        if mesh.input != program.vertex {
            log::warn!(
                "program `{}` expects {:?} vertices; mesh provides {:?}",
                program.label,
                program.vertex,
                mesh.input
            );
            return None;
        }

        let instance_count = instances.count();
        if mesh.vertex_count == 0 || instance_count == 0 {
            return None;
        }

        let instance_buffer = match (mesh.input, instances) {
            (VertexInput::Quad, _) => None,
            (VertexInput::Mesh, Instances::One) => Some(self.identity_instance.clone()),
            (VertexInput::Mesh, Instances::Batch { buffer, .. }) => {
                Some(self.buffers.get(&buffer)?.buffer.clone())
            }
        };

        let pipeline = program
            .pipelines
            .entry(key.clone())
            .or_insert_with(|| {
                log::debug!("building pipeline for `{}` ({key:?})", program.label);
                pipelines::create_pipeline(
                    &self.device,
                    &ProgramState {
                        label: &program.label,
                        module: &program.module,
                        layout: &program.layout,
                        vertex: program.vertex,
                        depth: program.depth,
                        blend: program.blend,
                    },
                    &key,
                )
            })
            .clone();

        let uniform = resources::uniform_buffer(&self.device, &program.label, program.uniforms.bytes());

        let sampled: Vec<&TextureEntry> = program
            .textures
            .iter()
            .map(|unit| {
                self.units
                    .get(unit.index())
                    .copied()
                    .flatten()
                    .and_then(|id| self.textures.get(&id))
                    .unwrap_or(&self.fallback)
            })
            .collect();

        let mut entries = Vec::with_capacity(1 + 2 * sampled.len());
        entries.push(wgpu::BindGroupEntry {
            binding: 0,
            resource: uniform.as_entire_binding(),
        });
        for (i, tex) in sampled.iter().enumerate() {
            let i = i as u32;
            entries.push(wgpu::BindGroupEntry {
                binding: 1 + 2 * i,
                resource: wgpu::BindingResource::TextureView(&tex.view),
            });
            entries.push(wgpu::BindGroupEntry {
                binding: 2 + 2 * i,
                resource: wgpu::BindingResource::Sampler(&tex.sampler),
            });
        }

        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(&program.label),
            layout: &program.bind_group_layout,
            entries: &entries,
        });

        Some(DrawCall {
            pipeline,
            bind_group,
            vertices: mesh.buffer.clone(),
            instances: instance_buffer,
            vertex_count: mesh.vertex_count,
            instance_count,
        })
    }

    fn compile(&self, desc: &ProgramDesc) -> wgpu::ShaderModule {
        let module = self
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(&desc.label),
                source: wgpu::ShaderSource::Wgsl(desc.source.clone()),
            });

        let info = pollster::block_on(module.get_compilation_info());
        for msg in &info.messages {
            let line = msg.location.as_ref().map_or(0, |l| l.line_number);
            match msg.message_type {
                wgpu::CompilationMessageType::Error => {
                    log::error!("program `{}` wgsl:{line}: {}", desc.label, msg.message)
                }
                wgpu::CompilationMessageType::Warning => {
                    log::warn!("program `{}` wgsl:{line}: {}", desc.label, msg.message)
                }
                wgpu::CompilationMessageType::Info => {
                    log::debug!("program `{}` wgsl:{line}: {}", desc.label, msg.message)
                }
            }
        }
        module
    }
}

impl GpuContext for WgpuContext {
    fn create_texture(&mut self, desc: &TextureDesc, pixels: Option<&[u8]>) -> Texture {
        let id = TextureId(self.alloc());

        let mut size = (desc.width, desc.height);
        if size.0 == 0 || size.1 == 0 || size.0 > self.max_dimension || size.1 > self.max_dimension
        {
            log::error!(
                "texture `{}` has invalid size {}x{}; using 1x1",
                desc.label,
                desc.width,
                desc.height
            );
            size = (1, 1);
        }

        let entry = resources::create_sampled(
            &self.device,
            &desc.label,
            size,
            desc.format,
            desc.filter,
            desc.wrap,
            false,
        );
        if let Some(pixels) = pixels
            && !resources::upload(&self.queue, &entry, size, desc.format, pixels)
        {
            log::error!(
                "texture `{}`: {} bytes do not cover {}x{} {:?}",
                desc.label,
                pixels.len(),
                size.0,
                size.1,
                desc.format
            );
        }

        self.textures.insert(id, entry);
        Texture::new(id, &self.release)
    }

    fn create_target(&mut self, desc: &TargetDesc) -> Target {
        let id = TargetId(self.alloc());
        let status = desc.validate(self.max_dimension);

        let mut color = Vec::new();
        let mut depth = None;
        match status {
            TargetStatus::Complete => {
                let size = (desc.width, desc.height);
                for (i, a) in desc.color.iter().enumerate() {
                    let tex = TextureId(self.alloc());
                    let entry = resources::create_sampled(
                        &self.device,
                        &format!("{} #{i}", desc.label),
                        size,
                        a.format,
                        a.filter,
                        Wrap::ClampToEdge,
                        true,
                    );
                    self.textures.insert(tex, entry);
                    color.push(tex);
                }
                if desc.depth {
                    depth = Some(resources::create_depth(
                        &self.device,
                        &format!("{} depth", desc.label),
                        size,
                    ));
                }
                log::debug!(
                    "target `{}` {}x{} with {} colour attachment(s)",
                    desc.label,
                    desc.width,
                    desc.height,
                    color.len()
                );
            }
            TargetStatus::Incomplete(reason) => {
                log::error!("render target `{}` is incomplete: {reason}", desc.label);
            }
        }

        self.targets.insert(
            id,
            TargetEntry {
                desc: desc.clone(),
                status,
                color,
                depth,
            },
        );
        Target::new(id, &self.release)
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
            .and_then(|t| t.color.get(index).copied())
    }

    fn target_size(&self, target: TargetId) -> Option<(u32, u32)> {
        self.targets
            .get(&target)
            .map(|t| (t.desc.width, t.desc.height))
    }

    fn create_program(&mut self, desc: &ProgramDesc) -> Program {
        let id = ProgramId(self.alloc());

        let textures = if desc.textures.len() > MAX_TEXTURE_UNITS {
            log::error!(
                "program `{}` declares {} texture units; max is {MAX_TEXTURE_UNITS}",
                desc.label,
                desc.textures.len()
            );
            desc.textures[..MAX_TEXTURE_UNITS].to_vec()
        } else {
            desc.textures.clone()
        };

        let module = self.compile(desc);
        let bind_group_layout =
            pipelines::bind_group_layout(&self.device, &desc.label, textures.len());
        let layout = self
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some(&desc.label),
                bind_group_layouts: &[&bind_group_layout],
                immediate_size: 0,
            });

        self.programs.insert(
            id,
            ProgramEntry {
                label: desc.label.clone(),
                vertex: desc.vertex,
                depth: desc.depth,
                blend: desc.blend,
                textures,
                module,
                bind_group_layout,
                layout,
                uniforms: UniformBlock::new(desc.uniforms.clone()),
                pipelines: HashMap::new(),
                missed: HashSet::new(),
            },
        );
        Program::new(id, &self.release)
    }

    fn create_mesh(&mut self, desc: &MeshDesc<'_>) -> Mesh {
        let id = MeshId(self.alloc());
        let bytes = desc.data.bytes();
        // Empty slices cannot be bound; keep a placeholder and skip the draws.
        let buffer = if bytes.is_empty() {
            resources::vertex_buffer(&self.device, desc.label, &[0u8; 16])
        } else {
            resources::vertex_buffer(&self.device, desc.label, bytes)
        };
        self.meshes.insert(
            id,
            MeshEntry {
                buffer,
                vertex_count: desc.data.vertex_count(),
                input: desc.data.input(),
                topology: desc.topology,
            },
        );
        Mesh::new(id, &self.release)
    }

    fn create_instance_buffer(&mut self, label: &str, transforms: &[Mat4]) -> InstanceBuffer {
        let id = BufferId(self.alloc());
        let buffer = if transforms.is_empty() {
            resources::vertex_buffer(&self.device, label, bytemuck::bytes_of(&Mat4::IDENTITY))
        } else {
            resources::vertex_buffer(&self.device, label, bytemuck::cast_slice(transforms))
        };
        self.buffers.insert(
            id,
            BufferEntry {
                buffer,
                count: transforms.len() as u32,
            },
        );
        InstanceBuffer::new(id, &self.release)
    }

    fn bind_target(&mut self, target: Framebuffer) {
        self.bound = target;
    }

    fn bound_target(&self) -> Framebuffer {
        self.bound
    }

    fn use_program(&mut self, program: ProgramId) {
        if !self.programs.contains_key(&program) {
            log::warn!("use_program: unknown program {program:?}");
        }
        self.program = Some(program);
    }

    fn active_program(&self) -> Option<ProgramId> {
        self.program
    }

    fn set_uniform(&mut self, name: &str, value: UniformValue) {
        let Some(program) = self.program.and_then(|p| self.programs.get_mut(&p)) else {
            return;
        };
        match program.uniforms.set(name, value) {
            UniformWrite::Written => {}
            UniformWrite::UnknownName => {
                if program.missed.insert(name.to_string()) {
                    log::trace!("program `{}` has no parameter `{name}`", program.label);
                }
            }
            UniformWrite::KindMismatch { expected } => {
                log::warn!(
                    "program `{}`: `{name}` is {expected:?}, got {:?}",
                    program.label,
                    value.kind()
                );
            }
        }
    }

    fn bind_texture(&mut self, unit: TextureUnit, texture: TextureId) {
        match self.units.get_mut(unit.index()) {
            Some(slot) => *slot = Some(texture),
            None => log::warn!("texture unit {} out of range", unit.0),
        }
    }

    fn clear(&mut self, clear: Clear) {
        // A clear after draws has to start a fresh pass to keep ordering.
        if self
            .pending
            .as_ref()
            .is_some_and(|p| p.target == self.bound && !p.draws.is_empty())
        {
            self.flush();
        }
        let pass = self.pass_for_bound();
        if clear.color.is_some() {
            pass.clear_color = clear.color;
        }
        pass.clear_depth |= clear.depth;
    }

    fn draw(&mut self, mesh: MeshId, instances: Instances) {
        if self.frame.is_none() {
            if !self.warned_no_frame {
                log::warn!("draw outside begin_frame/finish_frame ignored");
                self.warned_no_frame = true;
            }
            return;
        }
        if !self.target_ok(self.bound) {
            return;
        }
        if let Some(call) = self.build_draw(mesh, instances) {
            self.pass_for_bound().draws.push(call);
        }
    }

    fn copy_depth(&mut self, src: TargetId, dst: TargetId) {
        self.flush();

        let (Some(s), Some(d)) = (self.targets.get(&src), self.targets.get(&dst)) else {
            log::warn!("depth copy {src:?} -> {dst:?} skipped: unknown target");
            return;
        };
        let (Some(sd), Some(dd)) = (s.depth.as_ref(), d.depth.as_ref()) else {
            log::warn!("depth copy {src:?} -> {dst:?} skipped: missing depth attachment");
            return;
        };
        let size = (s.desc.width, s.desc.height);
        if size != (d.desc.width, d.desc.height) {
            log::warn!("depth copy {src:?} -> {dst:?} skipped: size mismatch");
            return;
        }
        let Some(frame) = self.frame.as_mut() else { return };

        frame.encoder.copy_texture_to_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &sd.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyTextureInfo {
                texture: &dd.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::Extent3d {
                width: size.0,
                height: size.1,
                depth_or_array_layers: 1,
            },
        );
    }

    fn collect_released(&mut self) -> usize {
        let ids = self.release.drain();
        for id in &ids {
            match *id {
                ResourceId::TextureId(t) => {
                    self.textures.remove(&t);
                }
                ResourceId::TargetId(t) => {
                    if let Some(entry) = self.targets.remove(&t) {
                        for tex in entry.color {
                            self.textures.remove(&tex);
                        }
                    }
                    self.warned_incomplete.remove(&t);
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
        if !ids.is_empty() {
            log::debug!("released {} gpu resource(s)", ids.len());
        }
        ids.len()
    }
}

impl WgpuContext {
    /// Size of the surface for the current frame.
    pub fn screen_size(&self) -> Option<(u32, u32)> {
        self.frame.as_ref().map(|f| f.screen_size)
    }

    /// Instance count recorded for `buffer`.
    pub fn instance_count(&self, buffer: BufferId) -> Option<u32> {
        self.buffers.get(&buffer).map(|b| b.count)
    }
}
