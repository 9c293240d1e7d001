//! HDR accumulation, ping-pong bloom and the tone-mapping composite.

use std::borrow::Cow;

use crate::gfx::{
    BlendMode, Clear, ColorAttachment, DepthMode, Filter, Format, Framebuffer, GpuContext,
    GpuContextExt, Instances, MeshId, Program, ProgramDesc, Target, TargetDesc, TargetId,
    Texture, TextureId, UniformLayout, VertexInput,
};

use super::bindings::{Pass, Slot};
use super::texture::solid_texture;

const BLUR_SOURCE: &str = include_str!("shaders/blur.wgsl");
const FINAL_SOURCE: &str = include_str!("shaders/final.wgsl");

/// HDR target attachment order.
pub const SCENE: usize = 0;
pub const BRIGHT: usize = 1;

/// 9-tap Gaussian, centre weight first. Sums to 1 over both sides.
pub const GAUSSIAN_WEIGHTS: [f32; 5] = [0.227027, 0.1945946, 0.1216216, 0.054054, 0.016216];

const BLACK: [f32; 4] = [0.0, 0.0, 0.0, 1.0];

/// Image the bloom composite samples after `iterations` blur passes.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum BloomSource {
    /// No blur ran; the bright-pass attachment is used unblurred.
    BrightPass,
    /// Ping-pong buffer `0` or `1`.
    PingPong(usize),
}

/// Read/write parity of the two bloom buffers.
///
/// Iteration `i` writes buffer `(i + 1) % 2` and reads the other one (or the
/// bright-pass attachment on `i = 0`), so the last write lands in `K % 2`.
pub struct PingPong;

impl PingPong {
    pub const fn write_index(iteration: u32) -> usize {
        ((iteration + 1) % 2) as usize
    }

    /// Source of iteration `iteration`.
    pub const fn read_source(iteration: u32) -> BloomSource {
        if iteration == 0 {
            BloomSource::BrightPass
        } else {
            BloomSource::PingPong(PingPong::write_index(iteration - 1))
        }
    }

    /// Buffer holding the finished bloom after `iterations` passes.
    pub const fn final_source(iterations: u32) -> BloomSource {
        if iterations == 0 {
            BloomSource::BrightPass
        } else {
            BloomSource::PingPong((iterations % 2) as usize)
        }
    }

    /// Pass `iteration` blurs horizontally on even iterations.
    pub const fn horizontal(iteration: u32) -> bool {
        iteration % 2 == 0
    }
}

fn hdr_target(ctx: &mut dyn GpuContext, width: u32, height: u32) -> Target {
    ctx.create_target(&TargetDesc {
        label: "gloam hdr".into(),
        width,
        height,
        color: vec![
            ColorAttachment::new(Format::Rgba16Float, Filter::Linear),
            ColorAttachment::new(Format::Rgba16Float, Filter::Linear),
        ],
        depth: true,
    })
}

fn bloom_targets(ctx: &mut dyn GpuContext, width: u32, height: u32) -> [Target; 2] {
    [0, 1].map(|i| {
        ctx.create_target(&TargetDesc {
            label: format!("gloam bloom {i}"),
            width,
            height,
            color: vec![ColorAttachment::new(Format::Rgba16Float, Filter::Linear)],
            depth: false,
        })
    })
}

/// Blur shader with [`GAUSSIAN_WEIGHTS`] written into its weight array.
fn blur_source() -> String {
    let weights = GAUSSIAN_WEIGHTS.map(|w| format!("{w:?}")).join(", ");
    BLUR_SOURCE.replace("GAUSSIAN_WEIGHTS", &weights)
}

fn quad_program(
    label: &str,
    source: impl Into<Cow<'static, str>>,
    uniforms: UniformLayout,
    pass: Pass,
) -> ProgramDesc {
    ProgramDesc {
        label: label.into(),
        source: source.into(),
        vertex: VertexInput::Quad,
        uniforms,
        textures: pass.units(),
        depth: DepthMode::Off,
        blend: BlendMode::Replace,
    }
}

/// Scene colour + bright-pass target, the bloom pair, and the programs that
/// blur and composite them.
#[derive(Debug)]
pub struct HdrCompositor {
    hdr: Target,
    bloom: [Target; 2],
    blur_program: Program,
    final_program: Program,
    /// Bound in place of attachments an incomplete target does not have.
    blank: Texture,
    iterations: u32,
}

impl HdrCompositor {
    pub fn new(ctx: &mut dyn GpuContext, width: u32, height: u32, iterations: u32) -> Self {
        let blur = quad_program(
            "gloam bloom blur",
            blur_source(),
            UniformLayout::builder().int("horizontal").build(),
            Pass::Bloom,
        );
        let composite = quad_program(
            "gloam composite",
            FINAL_SOURCE,
            UniformLayout::builder().float("exposure").build(),
            Pass::Final,
        );

        Self {
            hdr: hdr_target(ctx, width, height),
            bloom: bloom_targets(ctx, width, height),
            blur_program: ctx.create_program(&blur),
            final_program: ctx.create_program(&composite),
            blank: solid_texture(ctx, "gloam post blank", [0, 0, 0, 255]),
            iterations,
        }
    }

    pub fn resize(&mut self, ctx: &mut dyn GpuContext, width: u32, height: u32) {
        self.hdr = hdr_target(ctx, width, height);
        self.bloom = bloom_targets(ctx, width, height);
    }

    pub fn hdr_target(&self) -> TargetId {
        self.hdr.id()
    }

    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    pub fn is_complete(&self, ctx: &dyn GpuContext) -> bool {
        ctx.target_status(self.hdr.id()).is_complete()
            && self
                .bloom
                .iter()
                .all(|t| ctx.target_status(t.id()).is_complete())
    }

    fn source_texture(&self, ctx: &dyn GpuContext, source: BloomSource) -> Option<TextureId> {
        match source {
            BloomSource::BrightPass => ctx.target_attachment(self.hdr.id(), BRIGHT),
            BloomSource::PingPong(i) => ctx.target_attachment(self.bloom[i].id(), 0),
        }
    }

    fn or_blank(&self, tex: Option<TextureId>) -> TextureId {
        tex.unwrap_or(self.blank.id())
    }

    /// Texture the composite reads as bloom for the configured iteration count.
    pub fn bloom_texture(&self, ctx: &dyn GpuContext) -> Option<TextureId> {
        self.source_texture(ctx, PingPong::final_source(self.iterations))
    }

    /// Binds the HDR target and clears colour and depth.
    pub fn begin_render(&self, ctx: &mut dyn GpuContext) {
        ctx.bind_target(Framebuffer::Offscreen(self.hdr.id()));
        ctx.clear(Clear::color_and_depth(BLACK));
    }

    /// Returns to the screen.
    pub fn end_render(&self, ctx: &mut dyn GpuContext) {
        ctx.bind_target(Framebuffer::Screen);
    }

    /// Separable Gaussian across the ping-pong pair, alternating direction.
    pub fn render_bloom(&self, ctx: &mut dyn GpuContext, quad: MeshId) {
        ctx.use_program(self.blur_program.id());
        for i in 0..self.iterations {
            let dst = &self.bloom[PingPong::write_index(i)];
            ctx.bind_target(Framebuffer::Offscreen(dst.id()));

            ctx.set("horizontal", PingPong::horizontal(i));
            let src = self.source_texture(ctx, PingPong::read_source(i));
            ctx.bind_texture(Slot::BloomSource.unit(), self.or_blank(src));
            ctx.draw(quad, Instances::One);
        }
    }

    /// Tone-maps scene + bloom onto the bound framebuffer.
    pub fn render_final(&self, ctx: &mut dyn GpuContext, quad: MeshId, exposure: f32) {
        ctx.bind_target(Framebuffer::Screen);
        ctx.clear(Clear::color_and_depth(BLACK));

        ctx.use_program(self.final_program.id());
        let scene = ctx.target_attachment(self.hdr.id(), SCENE);
        let bloom = self.bloom_texture(ctx);
        ctx.bind_texture(Slot::Scene.unit(), self.or_blank(scene));
        ctx.bind_texture(Slot::Bloom.unit(), self.or_blank(bloom));
        ctx.set("exposure", exposure);
        ctx.draw(quad, Instances::One);
    }
}
