//! Gloam city: spinning blocks lit by 32 orbiting lights through the deferred
//! pipeline.
//!
//! WASD/QE fly, right-drag looks, wheel zooms, Esc quits.

mod camera;
mod city;
mod lights;

use anyhow::Result;
use gloam_engine::core::{App, AppControl, FrameCtx};
use gloam_engine::deferred::{DeferredRenderer, InstancedBatch, Material, RendererConfig};
use gloam_engine::device::GpuInit;
use gloam_engine::gfx::GpuContext;
use gloam_engine::input::Key;
use gloam_engine::logging::{LoggingConfig, init_logging};
use gloam_engine::window::{Runtime, RuntimeConfig};

use camera::FlyCamera;
use city::CityConfig;
use lights::{LIGHT_COUNT, LightRing};

const LIGHT_SEED: u64 = 13;

/// GPU-side state, created on the first frame once a context exists.
struct Scene {
    renderer: DeferredRenderer,
    floor: InstancedBatch,
}

impl Scene {
    fn new(
        gfx: &mut dyn GpuContext,
        size: (u32, u32),
        config: RendererConfig,
        city: &CityConfig,
    ) -> Self {
        Self {
            renderer: DeferredRenderer::new(gfx, size.0, size.1, config),
            floor: InstancedBatch::new(gfx, &city.floor_transforms()),
        }
    }
}

struct CityApp {
    renderer_config: RendererConfig,
    city: CityConfig,
    camera: FlyCamera,
    lights: LightRing,
    scene: Option<Scene>,
}

impl CityApp {
    fn new() -> Self {
        Self {
            renderer_config: RendererConfig::default(),
            city: CityConfig::default(),
            camera: FlyCamera::default(),
            lights: LightRing::new(LIGHT_COUNT, LIGHT_SEED),
            scene: None,
        }
    }
}

impl App for CityApp {
    fn on_frame(&mut self, ctx: &mut FrameCtx<'_>) -> AppControl {
        if ctx.input_frame.key_pressed(Key::Escape) {
            return AppControl::Exit;
        }

        let (width, height) = ctx.size;
        if self.scene.is_none() {
            self.scene = Some(Scene::new(
                ctx.gfx,
                ctx.size,
                self.renderer_config.clone(),
                &self.city,
            ));
        }
        let Some(scene) = self.scene.as_mut() else {
            return AppControl::Continue;
        };
        // No-op unless the swapchain changed size.
        scene.renderer.resize(ctx.gfx, width, height);

        self.camera.update(ctx.input, ctx.input_frame, ctx.time.dt);
        self.lights.update(ctx.time.elapsed);
        let view = self.camera.view_state();
        let renderer = &mut scene.renderer;
        let gfx = &mut *ctx.gfx;

        renderer.begin_geometry_pass(gfx, &view);
        renderer.draw_batch(gfx, &scene.floor, &Material::color(self.city.floor_color));
        let block = Material::color(self.city.block_color);
        for model in self.city.block_transforms(ctx.time.elapsed) {
            renderer.draw_cube(gfx, model, &block);
        }
        renderer.end_geometry_pass(gfx);

        renderer.begin_lighting_pass(gfx, &view);
        renderer.upload_lights(gfx, self.lights.lights());
        renderer.end_lighting_pass(gfx);

        renderer.begin_forward_pass(gfx, &view);
        for light in self.lights.lights() {
            renderer.draw_light_marker(gfx, light);
        }
        renderer.end_forward_pass(gfx);

        renderer.render_post_process(gfx);

        let violations = renderer.take_violations();
        if !violations.is_empty() {
            log::debug!("{} phase violation(s) this frame", violations.len());
        }
        AppControl::Continue
    }
}

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    Runtime::run(
        RuntimeConfig {
            title: "gloam city".to_string(),
            ..Default::default()
        },
        GpuInit::default(),
        CityApp::new(),
    )
}
