use anyhow::{Context, Result};
use ouroboros::self_referencing;

use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use crate::core::{App, AppControl, FrameCtx};
use crate::device::{Gpu, GpuFrame, GpuInit, SurfaceErrorAction};
use crate::gfx::backend::WgpuContext;
use crate::input::{InputFrame, InputState, translate_window_event};
use crate::time::FrameClock;

/// Window configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub title: String,
    pub initial_size: LogicalSize<f64>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            title: "gloam".to_string(),
            initial_size: LogicalSize::new(1280.0, 720.0),
        }
    }
}

/// Runs an [`App`] in a single window until it exits or the window closes.
pub struct Runtime;

impl Runtime {
    pub fn run<A>(config: RuntimeConfig, gpu_init: GpuInit, app: A) -> Result<()>
    where
        A: App + 'static,
    {
        let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
        let mut state = AppState {
            config,
            gpu_init,
            app,
            entry: None,
            exit_requested: false,
        };

        event_loop
            .run_app(&mut state)
            .context("winit event loop terminated with error")?;

        Ok(())
    }
}

#[self_referencing]
struct WindowEntry {
    input_state: InputState,
    input_frame: InputFrame,
    clock: FrameClock,
    /// Set right after construction, once the device exists.
    gfx: Option<WgpuContext>,

    window: Window,

    #[borrows(window)]
    #[covariant]
    gpu: Gpu<'this>,
}

struct AppState<A: App> {
    config: RuntimeConfig,
    gpu_init: GpuInit,
    app: A,
    entry: Option<WindowEntry>,
    exit_requested: bool,
}

impl<A: App> AppState<A> {
    fn create_entry(&mut self, event_loop: &ActiveEventLoop) -> Result<WindowEntry> {
        let attrs = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(self.config.initial_size);

        let window = event_loop
            .create_window(attrs)
            .context("failed to create window")?;

        let gpu_init = self.gpu_init.clone();
        let mut entry = WindowEntryTryBuilder {
            input_state: InputState::default(),
            input_frame: InputFrame::default(),
            clock: FrameClock::default(),
            gfx: None,
            window,
            gpu_builder: |w| pollster::block_on(Gpu::new(w, gpu_init)),
        }
        .try_build()
        .context("GPU initialization failed")?;

        entry.with_mut(|f| {
            *f.gfx = Some(WgpuContext::new(
                f.gpu.device(),
                f.gpu.queue(),
                f.gpu.surface_format(),
            ));
        });
        Ok(entry)
    }

    fn redraw(&mut self) -> AppControl {
        let (app, Some(entry)) = (&mut self.app, self.entry.as_mut()) else {
            return AppControl::Continue;
        };

        entry.with_mut(|f| {
            let Some(gfx) = f.gfx.as_mut() else {
                return AppControl::Continue;
            };

            let GpuFrame {
                surface_texture,
                view,
                encoder,
            } = match f.gpu.begin_frame() {
                Ok(frame) => frame,
                Err(err) => {
                    return match f.gpu.handle_surface_error(err) {
                        SurfaceErrorAction::Fatal => {
                            log::error!("surface out of memory");
                            AppControl::Exit
                        }
                        _ => AppControl::Continue,
                    };
                }
            };

            let size = f.gpu.size();
            let size = (size.width, size.height);
            gfx.begin_frame(encoder, view, size);

            let control = {
                let mut ctx = FrameCtx {
                    gfx: &mut *gfx,
                    size,
                    window: f.window,
                    input: &*f.input_state,
                    input_frame: &*f.input_frame,
                    time: f.clock.tick(),
                };
                app.on_frame(&mut ctx)
            };
            f.input_frame.clear();

            if let Some(encoder) = gfx.finish_frame() {
                f.window.pre_present_notify();
                f.gpu.present(encoder, surface_texture);
            }
            control
        })
    }

    fn exit(&mut self, event_loop: &ActiveEventLoop) {
        self.exit_requested = true;
        // Drop GPU resources while the window is still alive.
        self.entry = None;
        event_loop.exit();
    }
}

impl<A: App> ApplicationHandler for AppState<A> {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.entry.is_some() || self.exit_requested {
            return;
        }

        match self.create_entry(event_loop) {
            Ok(entry) => {
                entry.with_window(|w| w.request_redraw());
                self.entry = Some(entry);
            }
            Err(e) => {
                log::error!("failed to create window: {e:#}");
                self.exit(event_loop);
            }
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }

        // Continuous redraw; the scene animates every frame.
        event_loop.set_control_flow(ControlFlow::Wait);
        if let Some(entry) = &self.entry {
            entry.with_window(|w| w.request_redraw());
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let (app, Some(entry)) = (&mut self.app, self.entry.as_mut()) else {
            return;
        };

        let control = entry.with_mut(|f| {
            if let Some(ev) = translate_window_event(f.window.scale_factor(), &event) {
                f.input_state.apply(f.input_frame, ev);
            }
            app.on_window_event(&event)
        });
        if control == AppControl::Exit {
            self.exit(event_loop);
            return;
        }

        match event {
            WindowEvent::CloseRequested => self.exit(event_loop),

            WindowEvent::Resized(size) => {
                entry.with_gpu_mut(|gpu| gpu.resize(size));
                entry.with_window(|w| w.request_redraw());
            }

            WindowEvent::ScaleFactorChanged { .. } => {
                let size = entry.with_window(|w| w.inner_size());
                entry.with_gpu_mut(|gpu| gpu.resize(size));
            }

            WindowEvent::RedrawRequested => {
                if self.redraw() == AppControl::Exit {
                    self.exit(event_loop);
                }
            }

            _ => {}
        }
    }
}
