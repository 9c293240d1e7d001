//! Screen-space ambient occlusion.
//!
//! `compute` samples a 64-point hemisphere kernel around every covered pixel of
//! the G-Buffer into a raw single-channel target; `blur` box-filters it into a
//! second target, which is the only one lighting may read.

use glam::{Mat4, Vec2, Vec3};
use half::f16;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::gfx::{
    BlendMode, Clear, ColorAttachment, DepthMode, Filter, Format, Framebuffer, GpuContext,
    GpuContextExt, Instances, MeshId, Program, ProgramDesc, Target, TargetDesc, Texture,
    TextureDesc, TextureId, UniformKind, UniformLayout, VertexInput, Wrap,
};

use super::bindings::{Pass, Slot};
use super::texture::solid_texture;

const SSAO_SOURCE: &str = include_str!("shaders/ssao.wgsl");
const BLUR_SOURCE: &str = include_str!("shaders/ssao_blur.wgsl");

/// Hemisphere samples per pixel. Fixed: the shader declares the same array.
pub const KERNEL_SIZE: usize = 64;

/// Side of the square rotation-noise tile.
pub const NOISE_SIZE: u32 = 4;

/// Occlusion of a pixel nothing was drawn over.
const UNOCCLUDED: [f32; 4] = [1.0, 1.0, 1.0, 1.0];

fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + t * (b - a)
}

/// Length bound of kernel sample `i`: samples cluster near the origin.
pub fn kernel_scale(i: usize) -> f32 {
    let t = i as f32 / KERNEL_SIZE as f32;
    lerp(0.1, 1.0, t * t)
}

/// Hemisphere kernel in tangent space (`z ≥ 0`), `|s_i| ≤ kernel_scale(i)`.
pub fn generate_kernel(rng: &mut impl Rng) -> Vec<Vec3> {
    (0..KERNEL_SIZE)
        .map(|i| {
            let dir = Vec3::new(
                rng.gen_range(-1.0..=1.0),
                rng.gen_range(-1.0..=1.0),
                rng.gen_range(0.0..=1.0),
            )
            .normalize_or_zero();
            dir * rng.gen_range(0.0f32..=1.0) * kernel_scale(i)
        })
        .collect()
}

/// Random rotations around the surface normal (`z = 0`), one per tile texel.
pub fn generate_noise(rng: &mut impl Rng) -> Vec<Vec3> {
    (0..NOISE_SIZE * NOISE_SIZE)
        .map(|_| Vec3::new(rng.gen_range(-1.0..=1.0), rng.gen_range(-1.0..=1.0), 0.0))
        .collect()
}

fn noise_pixels(noise: &[Vec3]) -> Vec<u8> {
    let texels: Vec<f16> = noise
        .iter()
        .flat_map(|v| [v.x, v.y, v.z, 0.0].map(f16::from_f32))
        .collect();
    bytemuck::cast_slice(&texels).to_vec()
}

fn occlusion_target(ctx: &mut dyn GpuContext, label: &str, width: u32, height: u32) -> Target {
    ctx.create_target(&TargetDesc {
        label: label.into(),
        width,
        height,
        color: vec![ColorAttachment::new(Format::R16Float, Filter::Nearest)],
        depth: false,
    })
}

fn ssao_program_desc() -> ProgramDesc {
    ProgramDesc {
        label: "gloam ssao".into(),
        source: SSAO_SOURCE.into(),
        vertex: VertexInput::Quad,
        uniforms: UniformLayout::builder()
            .mat4("projection")
            .mat4("view")
            .array("samples", KERNEL_SIZE as u32, UniformKind::Vec3)
            .vec2("noiseScale")
            .float("radius")
            .float("bias")
            .build(),
        textures: Pass::Ssao.units(),
        depth: DepthMode::Off,
        blend: BlendMode::Replace,
    }
}

fn blur_program_desc() -> ProgramDesc {
    ProgramDesc {
        label: "gloam ssao blur".into(),
        source: BLUR_SOURCE.into(),
        vertex: VertexInput::Quad,
        uniforms: UniformLayout::builder().build(),
        textures: Pass::SsaoBlur.units(),
        depth: DepthMode::Off,
        blend: BlendMode::Replace,
    }
}

/// Inputs of one occlusion evaluation.
#[derive(Debug, Copy, Clone)]
pub struct SsaoInputs {
    pub position: TextureId,
    pub normal: TextureId,
    pub projection: Mat4,
    pub view: Mat4,
}

#[derive(Debug)]
pub struct SsaoStage {
    raw: Target,
    blurred: Target,
    program: Program,
    blur_program: Program,
    noise: Texture,
    /// Read in place of a missing raw buffer: no occlusion.
    unoccluded: Texture,
    kernel: Vec<Vec3>,
    size: (u32, u32),
    pub radius: f32,
    pub bias: f32,
}

impl SsaoStage {
    /// Builds targets and programs and draws the kernel and noise tile from
    /// `seed`; both are fixed for the stage's lifetime.
    pub fn new(
        ctx: &mut dyn GpuContext,
        width: u32,
        height: u32,
        radius: f32,
        bias: f32,
        seed: u64,
    ) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let kernel = generate_kernel(&mut rng);
        let noise = generate_noise(&mut rng);

        let noise = ctx.create_texture(
            &TextureDesc {
                label: "gloam ssao noise".into(),
                width: NOISE_SIZE,
                height: NOISE_SIZE,
                format: Format::Rgba16Float,
                filter: Filter::Nearest,
                wrap: Wrap::Repeat,
            },
            Some(&noise_pixels(&noise)),
        );

        Self {
            raw: occlusion_target(ctx, "gloam ssao raw", width, height),
            blurred: occlusion_target(ctx, "gloam ssao blurred", width, height),
            program: ctx.create_program(&ssao_program_desc()),
            blur_program: ctx.create_program(&blur_program_desc()),
            noise,
            unoccluded: solid_texture(ctx, "gloam ssao unoccluded", [255; 4]),
            kernel,
            size: (width, height),
            radius,
            bias,
        }
    }

    /// Rebuilds the size-dependent targets. Kernel and noise are kept.
    pub fn resize(&mut self, ctx: &mut dyn GpuContext, width: u32, height: u32) {
        self.raw = occlusion_target(ctx, "gloam ssao raw", width, height);
        self.blurred = occlusion_target(ctx, "gloam ssao blurred", width, height);
        self.size = (width, height);
    }

    pub fn kernel(&self) -> &[Vec3] {
        &self.kernel
    }

    pub fn noise_texture(&self) -> TextureId {
        self.noise.id()
    }

    pub fn is_complete(&self, ctx: &dyn GpuContext) -> bool {
        ctx.target_status(self.raw.id()).is_complete()
            && ctx.target_status(self.blurred.id()).is_complete()
    }

    /// Raw occlusion into the first target. Leaves that target bound.
    pub fn compute(&self, ctx: &mut dyn GpuContext, inputs: &SsaoInputs, quad: MeshId) {
        ctx.bind_target(Framebuffer::Offscreen(self.raw.id()));
        ctx.clear(Clear::color(UNOCCLUDED));

        ctx.use_program(self.program.id());
        ctx.bind_texture(Slot::SsaoPosition.unit(), inputs.position);
        ctx.bind_texture(Slot::SsaoNormal.unit(), inputs.normal);
        ctx.bind_texture(Slot::SsaoNoise.unit(), self.noise.id());

        ctx.set("projection", inputs.projection);
        ctx.set("view", inputs.view);
        for (i, sample) in self.kernel.iter().enumerate() {
            ctx.set(&format!("samples[{i}]"), *sample);
        }
        let (w, h) = self.size;
        ctx.set(
            "noiseScale",
            Vec2::new(w as f32, h as f32) / NOISE_SIZE as f32,
        );
        ctx.set("radius", self.radius);
        ctx.set("bias", self.bias);

        ctx.draw(quad, Instances::One);
    }

    /// Box-filters the raw occlusion into the second target. Must follow
    /// `compute`. Leaves that target bound.
    pub fn blur(&self, ctx: &mut dyn GpuContext, quad: MeshId) {
        ctx.bind_target(Framebuffer::Offscreen(self.blurred.id()));
        ctx.clear(Clear::color(UNOCCLUDED));

        ctx.use_program(self.blur_program.id());
        let raw = ctx.target_attachment(self.raw.id(), 0);
        ctx.bind_texture(Slot::SsaoRaw.unit(), raw.unwrap_or(self.unoccluded.id()));
        ctx.draw(quad, Instances::One);
    }

    /// Blurred occlusion. The raw buffer is never exposed.
    pub fn occlusion_texture(&self, ctx: &dyn GpuContext) -> Option<TextureId> {
        ctx.target_attachment(self.blurred.id(), 0)
    }
}

#[cfg(test)]
mod tests {
    use glam::{Vec4, Vec4Swizzles};

    use super::*;
    use crate::gfx::recording::{Command, RecordingContext};

    /// Per-pixel occlusion exactly as `ssao.wgsl` evaluates it, with the
    /// position buffer supplied as a function of uv.
    #[allow(clippy::too_many_arguments)]
    fn reference_occlusion(
        frag: Vec4,
        world_normal: Vec3,
        noise: Vec3,
        kernel: &[Vec3],
        projection: Mat4,
        view: Mat4,
        radius: f32,
        bias: f32,
        position_at: impl Fn(Vec2) -> Vec4,
    ) -> f32 {
        if frag.w == 0.0 {
            return 1.0;
        }
        let frag_pos = (view * frag.xyz().extend(1.0)).xyz();
        let normal = (view * world_normal.extend(0.0)).xyz().normalize();
        let random = noise.normalize();
        let tangent = (random - normal * random.dot(normal)).normalize();
        let bitangent = normal.cross(tangent);

        let mut occlusion = 0.0;
        for s in kernel {
            let sample = frag_pos + (tangent * s.x + bitangent * s.y + normal * s.z) * radius;
            let clip = projection * sample.extend(1.0);
            let ndc = clip.xyz() / clip.w;
            let uv = Vec2::new(ndc.x * 0.5 + 0.5, 0.5 - ndc.y * 0.5);

            let hit = position_at(uv);
            if hit.w == 0.0 {
                continue;
            }
            let sample_depth = (view * hit.xyz().extend(1.0)).z;
            let t = (radius / (frag_pos.z - sample_depth).abs()).clamp(0.0, 1.0);
            let range_check = t * t * (3.0 - 2.0 * t);
            if sample_depth >= sample.z + bias {
                occlusion += range_check;
            }
        }
        1.0 - occlusion / kernel.len() as f32
    }

    fn projection() -> Mat4 {
        Mat4::perspective_rh(60f32.to_radians(), 1.0, 0.1, 100.0)
    }

    /// Point on the plane `z = depth` seen through `uv` from the origin.
    fn plane_at(depth: f32) -> impl Fn(Vec2) -> Vec4 {
        let half = 30f32.to_radians().tan();
        move |uv: Vec2| {
            let ndc = Vec2::new(uv.x * 2.0 - 1.0, 1.0 - uv.y * 2.0);
            let d = -depth;
            Vec4::new(ndc.x * half * d, ndc.y * half * d, depth, 1.0)
        }
    }

    fn seeded_kernel() -> Vec<Vec3> {
        generate_kernel(&mut StdRng::seed_from_u64(7))
    }

    // ── kernel ────────────────────────────────────────────────────────────

    #[test]
    fn kernel_stays_in_the_scaled_hemisphere() {
        let kernel = seeded_kernel();
        assert_eq!(kernel.len(), KERNEL_SIZE);
        for (i, s) in kernel.iter().enumerate() {
            assert!(s.z >= 0.0, "sample {i} below the surface: {s:?}");
            assert!(s.length() <= kernel_scale(i) + 1e-5, "sample {i}: {s:?}");
        }
    }

    #[test]
    fn kernel_scale_grows_quadratically_from_one_tenth() {
        assert_eq!(kernel_scale(0), 0.1);
        assert!((kernel_scale(32) - (0.1 + 0.25 * 0.9)).abs() < 1e-6);
        for i in 1..KERNEL_SIZE {
            assert!(kernel_scale(i) > kernel_scale(i - 1));
        }
        assert!(kernel_scale(KERNEL_SIZE - 1) < 1.0);
    }

    #[test]
    fn same_seed_same_kernel() {
        assert_eq!(seeded_kernel(), seeded_kernel());
    }

    #[test]
    fn noise_rotates_around_z_only() {
        let noise = generate_noise(&mut StdRng::seed_from_u64(1));
        assert_eq!(noise.len(), 16);
        assert!(noise.iter().all(|v| v.z == 0.0 && v.x.abs() <= 1.0 && v.y.abs() <= 1.0));
        // 4x4 texels of 4 × f16.
        assert_eq!(noise_pixels(&noise).len(), 16 * 8);
    }

    // ── reference occlusion ───────────────────────────────────────────────

    #[test]
    fn empty_position_buffer_is_fully_lit() {
        let kernel = seeded_kernel();
        let ao = reference_occlusion(
            Vec4::ZERO,
            Vec3::ZERO,
            Vec3::X,
            &kernel,
            projection(),
            Mat4::IDENTITY,
            0.5,
            0.025,
            |_| Vec4::ZERO,
        );
        assert_eq!(ao, 1.0);
    }

    #[test]
    fn background_samples_never_occlude() {
        let kernel = seeded_kernel();
        let ao = reference_occlusion(
            Vec4::new(0.0, 0.0, -5.0, 1.0),
            Vec3::Z,
            Vec3::X,
            &kernel,
            projection(),
            Mat4::IDENTITY,
            0.5,
            0.025,
            |_| Vec4::ZERO,
        );
        assert_eq!(ao, 1.0);
    }

    #[test]
    fn flat_wall_does_not_occlude_itself() {
        let kernel = seeded_kernel();
        let ao = reference_occlusion(
            Vec4::new(0.0, 0.0, -5.0, 1.0),
            Vec3::Z,
            Vec3::X,
            &kernel,
            projection(),
            Mat4::IDENTITY,
            0.5,
            0.025,
            plane_at(-5.0),
        );
        assert_eq!(ao, 1.0);
    }

    #[test]
    fn surface_just_in_front_occludes() {
        let kernel = seeded_kernel();
        let ao = reference_occlusion(
            Vec4::new(0.0, 0.0, -5.0, 1.0),
            Vec3::Z,
            Vec3::X,
            &kernel,
            projection(),
            Mat4::IDENTITY,
            0.5,
            0.025,
            plane_at(-4.5),
        );
        assert!(ao < 0.5, "ao = {ao}");
    }

    // ── passes ────────────────────────────────────────────────────────────

    struct Fixture {
        stage: SsaoStage,
        quad: crate::gfx::Mesh,
        _input: Texture,
        inputs: SsaoInputs,
    }

    fn fixture(ctx: &mut RecordingContext) -> Fixture {
        let stage = SsaoStage::new(ctx, 256, 256, 0.5, 0.025, 3);
        let quad = ctx.create_mesh(&crate::gfx::MeshDesc {
            label: "quad",
            data: crate::gfx::MeshData::Quad(&crate::deferred::primitives::QUAD_VERTICES),
            topology: crate::gfx::Topology::TriangleStrip,
        });
        let pos = ctx.create_texture(
            &TextureDesc {
                label: "pos".into(),
                width: 1,
                height: 1,
                format: Format::Rgba16Float,
                filter: Filter::Nearest,
                wrap: Wrap::ClampToEdge,
            },
            None,
        );
        let inputs = SsaoInputs {
            position: pos.id(),
            normal: pos.id(),
            projection: projection(),
            view: Mat4::IDENTITY,
        };
        Fixture {
            stage,
            quad,
            _input: pos,
            inputs,
        }
    }

    #[test]
    fn compute_uploads_every_kernel_sample() {
        let mut ctx = RecordingContext::new();
        let Fixture {
            stage,
            quad,
            inputs,
            ..
        } = fixture(&mut ctx);
        ctx.clear_log();
        stage.compute(&mut ctx, &inputs, quad.id());

        let written: Vec<&str> = ctx
            .commands()
            .iter()
            .filter_map(|c| match c {
                Command::SetUniform {
                    name,
                    written: true,
                    ..
                } => Some(name.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(written.iter().filter(|n| n.starts_with("samples[")).count(), 64);
        assert!(written.contains(&"noiseScale"));

        let program = ctx.active_program().unwrap();
        assert_eq!(ctx.uniform_f32(program, "radius"), Some(0.5));

        let draw = ctx.draws().last().unwrap();
        assert!(!draw.dropped);
        assert_eq!(
            draw.textures[2],
            (Slot::SsaoNoise.unit(), Some(stage.noise_texture()))
        );
    }

    #[test]
    fn blur_reads_raw_and_exposes_only_blurred() {
        let mut ctx = RecordingContext::new();
        let Fixture {
            stage,
            quad,
            inputs,
            ..
        } = fixture(&mut ctx);
        stage.compute(&mut ctx, &inputs, quad.id());
        stage.blur(&mut ctx, quad.id());

        let raw = ctx.target_attachment(stage.raw.id(), 0);
        let blurred = stage.occlusion_texture(&ctx);
        assert_ne!(raw, blurred);
        assert_eq!(ctx.draws().last().unwrap().textures, vec![(Slot::SsaoRaw.unit(), raw)]);
        assert_eq!(ctx.bound_target(), Framebuffer::Offscreen(stage.blurred.id()));
    }

    #[test]
    fn blur_without_raw_buffer_reads_unoccluded() {
        let mut ctx = RecordingContext::new();
        let quad = ctx.create_mesh(&crate::gfx::MeshDesc {
            label: "quad",
            data: crate::gfx::MeshData::Quad(&crate::deferred::primitives::QUAD_VERTICES),
            topology: crate::gfx::Topology::TriangleStrip,
        });
        let leftover = solid_texture(&mut ctx, "leftover", [0; 4]);
        ctx.bind_texture(Slot::SsaoRaw.unit(), leftover.id());

        let stage = SsaoStage::new(&mut ctx, 0, 0, 0.5, 0.025, 9);
        stage.blur(&mut ctx, quad.id());
        assert_eq!(
            ctx.draws().last().unwrap().textures,
            vec![(Slot::SsaoRaw.unit(), Some(stage.unoccluded.id()))]
        );
    }

    #[test]
    fn resize_keeps_the_kernel() {
        let mut ctx = RecordingContext::new();
        let mut stage = SsaoStage::new(&mut ctx, 64, 64, 0.5, 0.025, 9);
        let kernel = stage.kernel().to_vec();
        stage.resize(&mut ctx, 128, 96);
        assert_eq!(stage.kernel(), &kernel[..]);
        assert!(stage.is_complete(&ctx));
        assert_eq!(ctx.collect_released(), 2);
    }
}
