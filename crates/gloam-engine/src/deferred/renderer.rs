//! Frame orchestration: `Geometry → Lighting → Forward → PostProcess`.

use glam::{Mat4, Vec3};

use crate::gfx::{
    BlendMode, Clear, DepthMode, Framebuffer, GpuContext, GpuContextExt, Instances, Program,
    ProgramDesc, Texture, TextureId, UniformKind, UniformLayout, VertexInput,
};

use super::bindings::{Pass, Slot};
use super::config::RendererConfig;
use super::gbuffer::{self, GBuffer, Material};
use super::instanced::InstancedBatch;
use super::light::{MAX_LIGHTS, PointLight};
use super::phase::{PhaseTracker, PhaseViolation, PipelinePhase};
use super::post::HdrCompositor;
use super::primitives::Primitives;
use super::ssao::{SsaoInputs, SsaoStage};
use super::texture::solid_texture;
use super::view::ViewState;

const LIGHTING_SOURCE: &str = include_str!("shaders/lighting.wgsl");
const LIGHT_BOX_SOURCE: &str = include_str!("shaders/light_box.wgsl");

/// G-Buffer clear. Position `w = 0` marks pixels no geometry covered.
const GBUFFER_CLEAR: [f32; 4] = [0.0; 4];

/// Scale of the cube drawn at each light's position.
const MARKER_SCALE: f32 = 0.1;

fn lighting_program_desc() -> ProgramDesc {
    ProgramDesc {
        label: "gloam lighting".into(),
        source: LIGHTING_SOURCE.into(),
        vertex: VertexInput::Quad,
        uniforms: UniformLayout::builder()
            .vec3("viewPos")
            .int("lightCount")
            .struct_array("lights", MAX_LIGHTS as u32, |s| {
                s.member("Position", UniformKind::Vec3)
                    .member("Color", UniformKind::Vec3)
                    .member("Linear", UniformKind::Float)
                    .member("Quadratic", UniformKind::Float);
            })
            .build(),
        textures: Pass::Lighting.units(),
        depth: DepthMode::Off,
        blend: BlendMode::Replace,
    }
}

fn forward_program_desc() -> ProgramDesc {
    ProgramDesc {
        label: "gloam light box".into(),
        source: LIGHT_BOX_SOURCE.into(),
        vertex: VertexInput::Mesh,
        uniforms: UniformLayout::builder()
            .mat4("projection")
            .mat4("view")
            .mat4("model")
            .vec3("lightColor")
            .build(),
        textures: Pass::Forward.units(),
        depth: DepthMode::TestWrite,
        blend: BlendMode::Replace,
    }
}

/// Deferred HDR pipeline. Owns every target and program it draws with;
/// dropping it releases all of them.
///
/// Each frame the caller runs, in order:
/// 1. `begin_geometry_pass`, opaque draws, `end_geometry_pass`
/// 2. `begin_lighting_pass`, `upload_lights`, `end_lighting_pass`
/// 3. `begin_forward_pass`, forward draws, `end_forward_pass`
/// 4. `render_post_process`
///
/// Calls out of this order are logged and recorded as [`PhaseViolation`]s but
/// still executed.
#[derive(Debug)]
pub struct DeferredRenderer {
    config: RendererConfig,
    size: (u32, u32),

    gbuffer: GBuffer,
    ssao: SsaoStage,
    post: HdrCompositor,

    geometry: Program,
    lighting: Program,
    forward: Program,

    primitives: Primitives,
    /// Material texture when none is set.
    white: Texture,
    /// Stand-in for missing attachments: zero everywhere, so it reads as
    /// background.
    blank: Texture,

    phases: PhaseTracker,
    projection: Mat4,
    view: Mat4,
}

impl DeferredRenderer {
    pub fn new(ctx: &mut dyn GpuContext, width: u32, height: u32, config: RendererConfig) -> Self {
        let gbuffer = GBuffer::new(ctx, width, height, config.emissive);
        let ssao = SsaoStage::new(
            ctx,
            width,
            height,
            config.ssao_radius,
            config.ssao_bias,
            config.ssao_seed,
        );
        let post = HdrCompositor::new(ctx, width, height, config.bloom_iterations);

        let geometry = ctx.create_program(&gbuffer::program_desc(config.emissive));
        let lighting = ctx.create_program(&lighting_program_desc());
        let forward = ctx.create_program(&forward_program_desc());

        let white = solid_texture(ctx, "gloam white", [255; 4]);
        let blank = solid_texture(ctx, "gloam blank", [0; 4]);

        log::info!(
            "deferred renderer {width}x{height}: {} bloom passes, emissive {}",
            config.bloom_iterations,
            config.emissive
        );

        Self {
            config,
            size: (width, height),
            gbuffer,
            ssao,
            post,
            geometry,
            lighting,
            forward,
            primitives: Primitives::new(),
            white,
            blank,
            phases: PhaseTracker::new(),
            projection: Mat4::IDENTITY,
            view: Mat4::IDENTITY,
        }
    }

    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    pub fn size(&self) -> (u32, u32) {
        self.size
    }

    pub fn gbuffer(&self) -> &GBuffer {
        &self.gbuffer
    }

    pub fn ssao(&self) -> &SsaoStage {
        &self.ssao
    }

    pub fn post(&self) -> &HdrCompositor {
        &self.post
    }

    /// Open phase (`Idle` between phases).
    pub fn phase(&self) -> PipelinePhase {
        self.phases.current()
    }

    pub fn frames(&self) -> u64 {
        self.phases.frames()
    }

    pub fn violations(&self) -> &[PhaseViolation] {
        self.phases.violations()
    }

    pub fn take_violations(&mut self) -> Vec<PhaseViolation> {
        self.phases.take_violations()
    }

    /// Projection used by the most recent pass.
    pub fn projection(&self) -> Mat4 {
        self.projection
    }

    /// Rebuilds every size-dependent target. A zero extent keeps the current
    /// targets (minimised window).
    pub fn resize(&mut self, ctx: &mut dyn GpuContext, width: u32, height: u32) {
        if (width, height) == self.size {
            return;
        }
        if width == 0 || height == 0 {
            log::debug!("ignoring resize to {width}x{height}");
            return;
        }
        self.gbuffer = GBuffer::new(ctx, width, height, self.config.emissive);
        self.ssao.resize(ctx, width, height);
        self.post.resize(ctx, width, height);
        self.size = (width, height);
        log::debug!("deferred renderer resized to {width}x{height}");
    }

    fn update_matrices(&mut self, view: &ViewState) {
        let (w, h) = self.size;
        self.projection = view.projection(w, h, self.config.near, self.config.far);
        self.view = view.view;
    }

    fn attachment_or_blank(&self, tex: Option<TextureId>) -> TextureId {
        tex.unwrap_or(self.blank.id())
    }

    // ── geometry ──────────────────────────────────────────────────────────

    /// Binds and clears the G-Buffer and activates the geometry program.
    pub fn begin_geometry_pass(&mut self, ctx: &mut dyn GpuContext, view: &ViewState) {
        self.phases.begin(PipelinePhase::Geometry);
        self.update_matrices(view);

        ctx.bind_target(Framebuffer::Offscreen(self.gbuffer.id()));
        ctx.clear(Clear::color_and_depth(GBUFFER_CLEAR));

        ctx.use_program(self.geometry.id());
        ctx.set("projection", self.projection);
        ctx.set("view", self.view);
        ctx.set("model", Mat4::IDENTITY);
    }

    fn apply_material(&self, ctx: &mut dyn GpuContext, material: &Material) {
        ctx.set("objectColor", material.color);
        ctx.set("specular", material.specular);
        ctx.set("emissive", material.emissive);
        ctx.set("useTexture", material.texture.is_some());
        ctx.bind_texture(
            Slot::MaterialAlbedo.unit(),
            material.texture.unwrap_or(self.white.id()),
        );
    }

    /// One unit cube transformed by `model`.
    pub fn draw_cube(&mut self, ctx: &mut dyn GpuContext, model: Mat4, material: &Material) {
        let cube = self.primitives.cube(ctx);
        self.apply_material(ctx, material);
        ctx.set("model", model);
        ctx.draw(cube, Instances::One);
    }

    /// Every instance of `batch` with one material.
    pub fn draw_batch(
        &mut self,
        ctx: &mut dyn GpuContext,
        batch: &InstancedBatch,
        material: &Material,
    ) {
        self.apply_material(ctx, material);
        ctx.set("model", Mat4::IDENTITY);
        batch.draw(ctx);
    }

    pub fn end_geometry_pass(&mut self, ctx: &mut dyn GpuContext) {
        ctx.bind_target(Framebuffer::Screen);
        self.phases.end(PipelinePhase::Geometry);
    }

    // ── lighting ──────────────────────────────────────────────────────────

    /// Runs SSAO, opens the HDR target and binds the G-Buffer for lighting.
    /// No light state survives from earlier frames.
    pub fn begin_lighting_pass(&mut self, ctx: &mut dyn GpuContext, view: &ViewState) {
        self.phases.begin(PipelinePhase::Lighting);
        self.update_matrices(view);
        let quad = self.primitives.quad(ctx);

        let position = self.attachment_or_blank(self.gbuffer.position(ctx));
        let normal = self.attachment_or_blank(self.gbuffer.normal(ctx));
        let albedo = self.attachment_or_blank(self.gbuffer.albedo_spec(ctx));
        let emissive = self.attachment_or_blank(self.gbuffer.emissive(ctx));

        let inputs = SsaoInputs {
            position,
            normal,
            projection: self.projection,
            view: self.view,
        };
        self.ssao.compute(ctx, &inputs, quad);
        self.ssao.blur(ctx, quad);
        let occlusion = self.attachment_or_blank(self.ssao.occlusion_texture(ctx));

        self.post.begin_render(ctx);
        ctx.use_program(self.lighting.id());
        ctx.bind_texture(Slot::Position.unit(), position);
        ctx.bind_texture(Slot::Normal.unit(), normal);
        ctx.bind_texture(Slot::AlbedoSpec.unit(), albedo);
        ctx.bind_texture(Slot::Occlusion.unit(), occlusion);
        ctx.bind_texture(Slot::Emissive.unit(), emissive);

        ctx.set("viewPos", view.position);
        ctx.set("lightCount", 0i32);
    }

    /// Uploads this frame's lights. Lights past [`MAX_LIGHTS`] are dropped.
    pub fn upload_lights(&mut self, ctx: &mut dyn GpuContext, lights: &[PointLight]) {
        if self.phases.current() != PipelinePhase::Lighting {
            log::warn!(
                "upload_lights during {:?}; lights are only read by the lighting pass",
                self.phases.current()
            );
            return;
        }
        if lights.len() > MAX_LIGHTS {
            log::warn!(
                "{} lights submitted, only the first {MAX_LIGHTS} are shaded",
                lights.len()
            );
        }

        let lights = &lights[..lights.len().min(MAX_LIGHTS)];
        for (i, light) in lights.iter().enumerate() {
            ctx.set(&format!("lights[{i}].Position"), light.position);
            ctx.set(&format!("lights[{i}].Color"), light.color);
            ctx.set(&format!("lights[{i}].Linear"), light.linear);
            ctx.set(&format!("lights[{i}].Quadratic"), light.quadratic);
        }
        ctx.set("lightCount", lights.len() as i32);
    }

    /// Draws the full-screen lighting quad. The HDR target stays bound for the
    /// forward pass.
    pub fn end_lighting_pass(&mut self, ctx: &mut dyn GpuContext) {
        let quad = self.primitives.quad(ctx);
        ctx.draw(quad, Instances::One);
        self.phases.end(PipelinePhase::Lighting);
    }

    // ── forward ───────────────────────────────────────────────────────────

    /// Copies G-Buffer depth into the HDR target so forward draws are occluded
    /// by opaque geometry, then activates the forward program.
    pub fn begin_forward_pass(&mut self, ctx: &mut dyn GpuContext, view: &ViewState) {
        self.phases.begin(PipelinePhase::Forward);
        self.update_matrices(view);

        ctx.copy_depth(self.gbuffer.id(), self.post.hdr_target());
        ctx.bind_target(Framebuffer::Offscreen(self.post.hdr_target()));

        ctx.use_program(self.forward.id());
        ctx.set("projection", self.projection);
        ctx.set("view", self.view);
    }

    /// Small cube at the light, in its colour scaled by `marker_intensity`.
    pub fn draw_light_marker(&mut self, ctx: &mut dyn GpuContext, light: &PointLight) {
        let cube = self.primitives.cube(ctx);
        let model = Mat4::from_translation(light.position)
            * Mat4::from_scale(Vec3::splat(MARKER_SCALE));
        ctx.set("model", model);
        ctx.set("lightColor", light.color * self.config.marker_intensity);
        ctx.draw(cube, Instances::One);
    }

    pub fn end_forward_pass(&mut self, ctx: &mut dyn GpuContext) {
        self.post.end_render(ctx);
        self.phases.end(PipelinePhase::Forward);
    }

    // ── post-process ──────────────────────────────────────────────────────

    /// Bloom, then tone-map to the screen.
    pub fn render_post_process(&mut self, ctx: &mut dyn GpuContext) {
        self.phases.begin(PipelinePhase::PostProcess);
        let quad = self.primitives.quad(ctx);
        self.post.render_bloom(ctx, quad);
        self.post.render_final(ctx, quad, self.config.exposure);
        self.phases.end(PipelinePhase::PostProcess);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deferred::post::SCENE;
    use crate::gfx::recording::{Command, DrawRecord, RecordingContext};
    use crate::gfx::{ProgramId, TargetId, TextureUnit};

    fn view() -> ViewState {
        ViewState::look_at(Vec3::new(0.0, 5.0, 15.0), Vec3::ZERO, 45.0)
    }

    fn renderer(ctx: &mut RecordingContext) -> DeferredRenderer {
        DeferredRenderer::new(ctx, 256, 256, RendererConfig::default())
    }

    fn run_frame(r: &mut DeferredRenderer, ctx: &mut RecordingContext, lights: &[PointLight]) {
        let v = view();
        r.begin_geometry_pass(ctx, &v);
        r.end_geometry_pass(ctx);
        r.begin_lighting_pass(ctx, &v);
        r.upload_lights(ctx, lights);
        r.end_lighting_pass(ctx);
        r.begin_forward_pass(ctx, &v);
        r.end_forward_pass(ctx);
        r.render_post_process(ctx);
    }

    fn draws_with(ctx: &RecordingContext, program: ProgramId) -> Vec<&DrawRecord> {
        ctx.draws().filter(|d| d.program == Some(program)).collect()
    }

    fn read_i32(bytes: &[u8], offset: usize) -> i32 {
        bytemuck::pod_read_unaligned(&bytes[offset..offset + 4])
    }

    // ── end to end ────────────────────────────────────────────────────────

    #[test]
    fn empty_frame_runs_every_pass_cleanly() {
        let mut ctx = RecordingContext::new();
        let mut r = renderer(&mut ctx);
        ctx.clear_log();

        run_frame(&mut r, &mut ctx, &[]);

        assert!(r.violations().is_empty());
        assert_eq!(r.frames(), 1);
        assert_eq!(r.phase(), PipelinePhase::Idle);

        // ssao + ssao blur + lighting + 10 bloom + composite
        let draws: Vec<_> = ctx.draws().collect();
        assert_eq!(draws.len(), 14);
        assert!(draws.iter().all(|d| !d.dropped));

        let final_draw = draws.last().unwrap();
        assert_eq!(final_draw.target, Framebuffer::Screen);
        assert_eq!(
            final_draw.textures,
            vec![
                (
                    TextureUnit(0),
                    ctx.target_attachment(r.post().hdr_target(), SCENE)
                ),
                (TextureUnit(1), r.post().bloom_texture(&ctx)),
            ]
        );
        assert_eq!(ctx.bound_target(), Framebuffer::Screen);
    }

    #[test]
    fn every_uniform_write_hits_a_declared_parameter() {
        let mut ctx = RecordingContext::new();
        let mut r = renderer(&mut ctx);
        let batch = InstancedBatch::new(&mut ctx, &[Mat4::IDENTITY; 4]);
        let lights = [PointLight::new(Vec3::Y, Vec3::splat(2.0)); 3];
        let v = view();

        r.begin_geometry_pass(&mut ctx, &v);
        r.draw_cube(&mut ctx, Mat4::IDENTITY, &Material::default());
        r.draw_batch(&mut ctx, &batch, &Material::color(Vec3::X).with_emissive(Vec3::ONE));
        r.end_geometry_pass(&mut ctx);
        r.begin_lighting_pass(&mut ctx, &v);
        r.upload_lights(&mut ctx, &lights);
        r.end_lighting_pass(&mut ctx);
        r.begin_forward_pass(&mut ctx, &v);
        for l in &lights {
            r.draw_light_marker(&mut ctx, l);
        }
        r.end_forward_pass(&mut ctx);
        r.render_post_process(&mut ctx);

        let missed: Vec<_> = ctx
            .commands()
            .iter()
            .filter_map(|c| match c {
                Command::SetUniform {
                    name,
                    written: false,
                    ..
                } => Some(name.clone()),
                _ => None,
            })
            .collect();
        assert!(missed.is_empty(), "unwritten uniforms: {missed:?}");
        assert!(ctx.draws().all(|d| !d.dropped));
        assert!(r.violations().is_empty());
    }

    // ── passes ────────────────────────────────────────────────────────────

    #[test]
    fn lighting_binds_the_gbuffer_contract() {
        let mut ctx = RecordingContext::new();
        let mut r = renderer(&mut ctx);
        run_frame(&mut r, &mut ctx, &[]);

        let draws = draws_with(&ctx, r.lighting.id());
        assert_eq!(draws.len(), 1);
        let g = r.gbuffer();
        assert_eq!(
            draws[0].textures,
            vec![
                (TextureUnit(0), g.position(&ctx)),
                (TextureUnit(1), g.normal(&ctx)),
                (TextureUnit(2), g.albedo_spec(&ctx)),
                (TextureUnit(3), r.ssao().occlusion_texture(&ctx)),
                (TextureUnit(4), g.emissive(&ctx)),
            ]
        );
        assert_eq!(
            draws[0].target,
            Framebuffer::Offscreen(r.post().hdr_target())
        );
    }

    #[test]
    fn lighting_without_emissive_binds_blank() {
        let mut ctx = RecordingContext::new();
        let config = RendererConfig {
            emissive: false,
            ..RendererConfig::default()
        };
        let mut r = DeferredRenderer::new(&mut ctx, 64, 64, config);
        run_frame(&mut r, &mut ctx, &[]);

        let draws = draws_with(&ctx, r.lighting.id());
        assert_eq!(draws[0].textures[4], (TextureUnit(4), Some(r.blank.id())));
    }

    #[test]
    fn light_state_does_not_carry_across_frames() {
        let mut ctx = RecordingContext::new();
        let mut r = renderer(&mut ctx);
        let lights = [PointLight::new(Vec3::ZERO, Vec3::ONE); 3];

        run_frame(&mut r, &mut ctx, &lights);
        run_frame(&mut r, &mut ctx, &[]);

        let draws = draws_with(&ctx, r.lighting.id());
        assert_eq!(draws.len(), 2);
        assert_eq!(read_i32(&draws[0].uniforms, 12), 3);
        assert_eq!(read_i32(&draws[1].uniforms, 12), 0);
    }

    #[test]
    fn excess_lights_are_dropped() {
        let mut ctx = RecordingContext::new();
        let mut r = renderer(&mut ctx);
        let lights = vec![PointLight::new(Vec3::ZERO, Vec3::ONE); MAX_LIGHTS + 8];
        run_frame(&mut r, &mut ctx, &lights);

        let names: Vec<_> = ctx
            .commands()
            .iter()
            .filter_map(|c| match c {
                Command::SetUniform { name, .. } if name.starts_with("lights[") => Some(name),
                _ => None,
            })
            .collect();
        assert_eq!(names.len(), MAX_LIGHTS * 4);
        assert!(!names.iter().any(|n| n.starts_with("lights[64]")));

        let draws = draws_with(&ctx, r.lighting.id());
        assert_eq!(read_i32(&draws[0].uniforms, 12), MAX_LIGHTS as i32);
    }

    #[test]
    fn forward_pass_copies_gbuffer_depth_into_hdr() {
        let mut ctx = RecordingContext::new();
        let mut r = renderer(&mut ctx);
        let v = view();
        r.begin_geometry_pass(&mut ctx, &v);
        r.end_geometry_pass(&mut ctx);
        r.begin_lighting_pass(&mut ctx, &v);
        r.end_lighting_pass(&mut ctx);
        ctx.clear_log();

        r.begin_forward_pass(&mut ctx, &v);
        let hdr: TargetId = r.post().hdr_target();
        assert_eq!(
            &ctx.commands()[..2],
            &[
                Command::CopyDepth {
                    src: r.gbuffer().id(),
                    dst: hdr,
                    ok: true
                },
                Command::BindTarget(Framebuffer::Offscreen(hdr)),
            ]
        );

        r.draw_light_marker(&mut ctx, &PointLight::new(Vec3::ONE, Vec3::splat(0.5)));
        let marker = ctx.draws().last().unwrap();
        assert_eq!(marker.target, Framebuffer::Offscreen(hdr));
        assert_eq!(marker.vertex_count, 36);
    }

    #[test]
    fn marker_colour_is_scaled_by_intensity() {
        let mut ctx = RecordingContext::new();
        let mut r = renderer(&mut ctx);
        let v = view();
        r.begin_geometry_pass(&mut ctx, &v);
        r.end_geometry_pass(&mut ctx);
        r.begin_lighting_pass(&mut ctx, &v);
        r.end_lighting_pass(&mut ctx);
        r.begin_forward_pass(&mut ctx, &v);
        r.draw_light_marker(&mut ctx, &PointLight::new(Vec3::ZERO, Vec3::new(0.5, 0.25, 1.0)));

        let set = ctx.commands().iter().rev().find_map(|c| match c {
            Command::SetUniform { name, value, .. } if name == "lightColor" => Some(*value),
            _ => None,
        });
        assert_eq!(set, Some(Vec3::new(2.0, 1.0, 4.0).into()));
    }

    #[test]
    fn textured_material_binds_its_texture() {
        let mut ctx = RecordingContext::new();
        let mut r = renderer(&mut ctx);
        let tex = solid_texture(&mut ctx, "brick", [200, 100, 50, 255]);

        r.begin_geometry_pass(&mut ctx, &view());
        r.draw_cube(&mut ctx, Mat4::IDENTITY, &Material::default().with_texture(tex.id()));
        r.draw_cube(&mut ctx, Mat4::IDENTITY, &Material::default());

        let draws: Vec<_> = ctx.draws().collect();
        assert_eq!(draws[0].textures, vec![(TextureUnit(0), Some(tex.id()))]);
        assert_eq!(draws[1].textures, vec![(TextureUnit(0), Some(r.white.id()))]);
        // useTexture sits after the two vec3/f32 pairs at offset 220.
        assert_eq!(read_i32(&draws[0].uniforms, 220), 1);
        assert_eq!(read_i32(&draws[1].uniforms, 220), 0);
    }

    // ── phase violations ──────────────────────────────────────────────────

    #[test]
    fn double_begin_is_recorded_and_frame_still_runs() {
        let mut ctx = RecordingContext::new();
        let mut r = renderer(&mut ctx);
        let v = view();
        r.begin_geometry_pass(&mut ctx, &v);
        r.begin_geometry_pass(&mut ctx, &v);
        assert_eq!(
            r.violations(),
            &[PhaseViolation::BeginWhileOpen {
                requested: PipelinePhase::Geometry,
                open: PipelinePhase::Geometry,
            }]
        );

        r.end_geometry_pass(&mut ctx);
        r.begin_lighting_pass(&mut ctx, &v);
        r.end_lighting_pass(&mut ctx);
        r.begin_forward_pass(&mut ctx, &v);
        r.end_forward_pass(&mut ctx);
        r.render_post_process(&mut ctx);
        assert_eq!(r.violations().len(), 1);
        assert_eq!(r.frames(), 1);
    }

    #[test]
    fn skipping_lighting_is_out_of_order() {
        let mut ctx = RecordingContext::new();
        let mut r = renderer(&mut ctx);
        let v = view();
        r.begin_geometry_pass(&mut ctx, &v);
        r.end_geometry_pass(&mut ctx);
        r.begin_forward_pass(&mut ctx, &v);
        assert!(matches!(
            r.take_violations()[..],
            [PhaseViolation::OutOfOrder {
                requested: PipelinePhase::Forward,
                expected: PipelinePhase::Lighting
            }]
        ));
    }

    #[test]
    fn lights_outside_the_lighting_pass_are_ignored() {
        let mut ctx = RecordingContext::new();
        let mut r = renderer(&mut ctx);
        ctx.clear_log();
        r.upload_lights(&mut ctx, &[PointLight::new(Vec3::ZERO, Vec3::ONE)]);
        assert!(ctx.commands().is_empty());
    }

    // ── lifetime ──────────────────────────────────────────────────────────

    #[test]
    fn dropping_the_renderer_releases_everything() {
        let mut ctx = RecordingContext::new();
        let mut r = renderer(&mut ctx);
        run_frame(&mut r, &mut ctx, &[]);
        assert!(ctx.live_resources() > 0);

        drop(r);
        ctx.collect_released();
        assert_eq!(ctx.live_resources(), 0);
    }

    #[test]
    fn resize_rebuilds_targets_at_the_new_size() {
        let mut ctx = RecordingContext::new();
        let mut r = renderer(&mut ctx);
        let old_hdr = r.post().hdr_target();

        r.resize(&mut ctx, 320, 200);
        assert_eq!(r.size(), (320, 200));
        assert_eq!(ctx.target_size(r.gbuffer().id()), Some((320, 200)));
        assert_eq!(ctx.target_size(r.post().hdr_target()), Some((320, 200)));
        assert_ne!(r.post().hdr_target(), old_hdr);
        // gbuffer + 2 ssao + hdr + 2 bloom
        assert_eq!(ctx.collect_released(), 6);

        r.resize(&mut ctx, 0, 200);
        assert_eq!(r.size(), (320, 200));
    }

    #[test]
    fn incomplete_gbuffer_drops_draws_without_panicking() {
        let mut ctx = RecordingContext::with_max_dimension(128);
        let mut r = renderer(&mut ctx);
        assert!(!r.gbuffer().is_complete(&ctx));
        run_frame(&mut r, &mut ctx, &[]);
        assert!(ctx.draws().any(|d| d.dropped));
        assert_eq!(r.frames(), 1);
    }
}
