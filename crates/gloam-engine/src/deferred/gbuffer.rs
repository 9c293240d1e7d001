//! G-Buffer: the multi-attachment target the geometry pass writes.

use std::borrow::Cow;

use glam::Vec3;

use crate::gfx::{
    BlendMode, ColorAttachment, DepthMode, Filter, Format, GpuContext, ProgramDesc, Target,
    TargetDesc, TargetId, TextureId, UniformLayout, VertexInput,
};

use super::bindings::Pass;

const SOURCE: &str = include_str!("shaders/gbuffer.wgsl");

/// Colour attachment order. Matches the geometry shader's `@location`s.
pub const POSITION: usize = 0;
pub const NORMAL: usize = 1;
pub const ALBEDO_SPEC: usize = 2;
pub const EMISSIVE: usize = 3;

/// Surface parameters for one geometry-pass draw.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Material {
    pub color: Vec3,
    /// Specular intensity stored in the albedo attachment's alpha.
    pub specular: f32,
    pub emissive: Vec3,
    /// Multiplied into `color` when set.
    pub texture: Option<TextureId>,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            color: Vec3::ONE,
            specular: 0.5,
            emissive: Vec3::ZERO,
            texture: None,
        }
    }
}

impl Material {
    pub fn color(color: Vec3) -> Self {
        Self {
            color,
            ..Self::default()
        }
    }

    pub fn with_specular(mut self, specular: f32) -> Self {
        self.specular = specular;
        self
    }

    pub fn with_emissive(mut self, emissive: Vec3) -> Self {
        self.emissive = emissive;
        self
    }

    pub fn with_texture(mut self, texture: TextureId) -> Self {
        self.texture = Some(texture);
        self
    }
}

/// World position, world normal, albedo + specular, optional emissive, depth.
///
/// Position and normal need float storage: world coordinates leave `[0, 1]`.
/// Every attachment is written by each geometry draw.
#[derive(Debug)]
pub struct GBuffer {
    target: Target,
    size: (u32, u32),
    emissive: bool,
}

impl GBuffer {
    pub fn new(ctx: &mut dyn GpuContext, width: u32, height: u32, emissive: bool) -> Self {
        let mut color = vec![
            ColorAttachment::new(Format::Rgba16Float, Filter::Nearest),
            ColorAttachment::new(Format::Rgba16Float, Filter::Nearest),
            ColorAttachment::new(Format::Rgba8Unorm, Filter::Nearest),
        ];
        if emissive {
            color.push(ColorAttachment::new(Format::Rgba16Float, Filter::Nearest));
        }

        let target = ctx.create_target(&TargetDesc {
            label: "gloam gbuffer".into(),
            width,
            height,
            color,
            depth: true,
        });
        if ctx.target_status(target.id()).is_complete() {
            log::debug!("gbuffer {width}x{height} (emissive: {emissive})");
        }

        Self {
            target,
            size: (width, height),
            emissive,
        }
    }

    pub fn id(&self) -> TargetId {
        self.target.id()
    }

    pub fn size(&self) -> (u32, u32) {
        self.size
    }

    pub fn has_emissive(&self) -> bool {
        self.emissive
    }

    pub fn is_complete(&self, ctx: &dyn GpuContext) -> bool {
        ctx.target_status(self.id()).is_complete()
    }

    pub fn position(&self, ctx: &dyn GpuContext) -> Option<TextureId> {
        ctx.target_attachment(self.id(), POSITION)
    }

    pub fn normal(&self, ctx: &dyn GpuContext) -> Option<TextureId> {
        ctx.target_attachment(self.id(), NORMAL)
    }

    pub fn albedo_spec(&self, ctx: &dyn GpuContext) -> Option<TextureId> {
        ctx.target_attachment(self.id(), ALBEDO_SPEC)
    }

    /// `None` when the buffer was built without an emissive attachment.
    pub fn emissive(&self, ctx: &dyn GpuContext) -> Option<TextureId> {
        if self.emissive {
            ctx.target_attachment(self.id(), EMISSIVE)
        } else {
            None
        }
    }
}

/// Shader source for a G-Buffer with or without the emissive attachment.
fn source(emissive: bool) -> Cow<'static, str> {
    if emissive {
        Cow::Borrowed(SOURCE)
    } else {
        Cow::Owned(
            SOURCE
                .replace("    @location(3) emissive: vec4<f32>,\n", "")
                .replace("    out.emissive = vec4<f32>(u.emissive, 1.0);\n", ""),
        )
    }
}

pub(crate) fn program_desc(emissive: bool) -> ProgramDesc {
    ProgramDesc {
        label: "gloam geometry".into(),
        source: source(emissive),
        vertex: VertexInput::Mesh,
        uniforms: UniformLayout::builder()
            .mat4("projection")
            .mat4("view")
            .mat4("model")
            .vec3("objectColor")
            .float("specular")
            .vec3("emissive")
            .int("useTexture")
            .build(),
        textures: Pass::Geometry.units(),
        depth: DepthMode::TestWrite,
        blend: BlendMode::Replace,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::recording::RecordingContext;

    // ── target ────────────────────────────────────────────────────────────

    #[test]
    fn emissive_variant_has_four_attachments() {
        let mut ctx = RecordingContext::new();
        let g = GBuffer::new(&mut ctx, 256, 256, true);
        assert!(g.is_complete(&ctx));

        let desc = ctx.target_desc(g.id()).unwrap();
        assert_eq!(desc.color.len(), 4);
        assert!(desc.depth);
        assert_eq!(desc.color[POSITION].format, Format::Rgba16Float);
        assert_eq!(desc.color[NORMAL].format, Format::Rgba16Float);
        assert_eq!(desc.color[ALBEDO_SPEC].format, Format::Rgba8Unorm);
        assert!(g.emissive(&ctx).is_some());
    }

    #[test]
    fn plain_variant_has_no_emissive() {
        let mut ctx = RecordingContext::new();
        let g = GBuffer::new(&mut ctx, 64, 32, false);
        assert_eq!(ctx.target_desc(g.id()).unwrap().color.len(), 3);
        assert_eq!(g.emissive(&ctx), None);
        assert!(g.albedo_spec(&ctx).is_some());
        assert_eq!(g.size(), (64, 32));
    }

    #[test]
    fn zero_size_is_incomplete_but_usable() {
        let mut ctx = RecordingContext::new();
        let g = GBuffer::new(&mut ctx, 0, 256, true);
        assert!(!g.is_complete(&ctx));
        assert_eq!(g.position(&ctx), None);
    }

    // ── program ───────────────────────────────────────────────────────────

    #[test]
    fn uniform_block_matches_shader_struct() {
        let desc = program_desc(true);
        let l = &desc.uniforms;
        assert_eq!(l.get("model").unwrap().offset, 128);
        assert_eq!(l.get("objectColor").unwrap().offset, 192);
        assert_eq!(l.get("specular").unwrap().offset, 204);
        assert_eq!(l.get("emissive").unwrap().offset, 208);
        assert_eq!(l.get("useTexture").unwrap().offset, 220);
        assert_eq!(l.size(), 224);
    }

    #[test]
    fn plain_source_drops_the_emissive_output() {
        assert!(program_desc(true).source.contains("@location(3)"));
        let plain = program_desc(false).source;
        assert!(!plain.contains("@location(3) emissive"));
        assert!(!plain.contains("out.emissive"));
        // Vertex attribute location 3 (instance column) is untouched.
        assert!(plain.contains("@location(3) i0"));
    }
}
