use anyhow::{Context, Result};
use ouroboros::self_referencing;
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use crate::core::{App, AppControl, FrameCtx, WindowCtx};
use crate::device::{Gpu, GpuInit};
use crate::time::FrameClock;

/// Settings for the single window opened by [`Runtime::run`].
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub title: String,
    pub initial_size: LogicalSize<f64>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            title: "tau-draw".to_string(),
            initial_size: LogicalSize::new(1280.0, 720.0),
        }
    }
}

/// Requests an app can make from inside `on_frame`; applied after the frame.
#[derive(Debug, Default)]
pub struct RuntimeCtx {
    exit: bool,
}

impl RuntimeCtx {
    /// Ends the event loop once the current frame has been presented.
    pub fn exit(&mut self) {
        self.exit = true;
    }

    pub fn exit_requested(&self) -> bool {
        self.exit
    }

    /// Folds the app's return value into the buffered requests.
    fn finish(mut self, control: AppControl) -> Self {
        if control == AppControl::Exit {
            self.exit = true;
        }
        self
    }
}

/// Drives one window: event loop, GPU context and frame clock.
pub struct Runtime;

impl Runtime {
    /// Opens the window and calls `app` every frame until it exits or the
    /// window is closed.
    pub fn run<A>(config: RuntimeConfig, gpu_init: GpuInit, app: A) -> Result<()>
    where
        A: App + 'static,
    {
        let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
        // Geometry is rebuilt every frame, so redraw continuously.
        event_loop.set_control_flow(ControlFlow::Poll);

        let mut state = RuntimeState {
            config,
            gpu_init,
            app,
            surface: None,
            exiting: false,
        };
        event_loop
            .run_app(&mut state)
            .context("winit event loop terminated with error")?;

        Ok(())
    }
}

/// Window plus the `Gpu` whose surface borrows it.
#[self_referencing]
struct DrawSurface {
    clock: FrameClock,
    window: Window,
    #[borrows(window)]
    #[covariant]
    gpu: Gpu<'this>,
}

impl DrawSurface {
    fn open(event_loop: &ActiveEventLoop, config: &RuntimeConfig, init: GpuInit) -> Result<Self> {
        let attrs = Window::default_attributes()
            .with_title(config.title.clone())
            .with_inner_size(config.initial_size);
        let window = event_loop
            .create_window(attrs)
            .context("failed to create window")?;

        DrawSurfaceTryBuilder {
            clock: FrameClock::new(),
            window,
            gpu_builder: |w| pollster::block_on(Gpu::new(w, init)),
        }
        .try_build()
        .context("GPU initialization failed")
    }

    fn id(&self) -> WindowId {
        self.with_window(|w| w.id())
    }

    fn request_redraw(&self) {
        self.with_window(|w| w.request_redraw());
    }

    fn resize_to_window(&mut self) {
        let size = self.with_window(|w| w.inner_size());
        self.with_gpu_mut(|gpu| gpu.resize(size));
    }

    /// Ticks the clock and runs one `on_frame`.
    fn frame<A: App>(&mut self, app: &mut A) -> RuntimeCtx {
        let mut runtime = RuntimeCtx::default();
        let control = self.with_mut(|fields| {
            let mut ctx = FrameCtx {
                window: WindowCtx { id: fields.window.id(), window: fields.window },
                gpu: fields.gpu,
                time: fields.clock.tick(),
                runtime: &mut runtime,
            };
            app.on_frame(&mut ctx)
        });
        runtime.finish(control)
    }
}

struct RuntimeState<A> {
    config: RuntimeConfig,
    gpu_init: GpuInit,
    app: A,
    surface: Option<DrawSurface>,
    exiting: bool,
}

impl<A: App> RuntimeState<A> {
    fn shut_down(&mut self, event_loop: &ActiveEventLoop) {
        if !self.exiting {
            log::debug!("runtime shutting down");
        }
        self.exiting = true;
        // Drop the GPU before the window it borrows from goes away with the loop.
        self.surface = None;
        event_loop.exit();
    }
}

impl<A: App> ApplicationHandler for RuntimeState<A> {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.surface.is_some() || self.exiting {
            return;
        }
        match DrawSurface::open(event_loop, &self.config, self.gpu_init.clone()) {
            Ok(surface) => {
                log::debug!("window {:?} opened", surface.id());
                surface.request_redraw();
                self.surface = Some(surface);
            }
            Err(e) => {
                log::error!("failed to open window: {e:#}");
                self.shut_down(event_loop);
            }
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(surface) = &self.surface {
            surface.request_redraw();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, window_id: WindowId, event: WindowEvent) {
        let Some(surface) = self.surface.as_mut() else { return };
        if surface.id() != window_id {
            return;
        }

        if self.app.on_window_event(window_id, &event) == AppControl::Exit {
            self.shut_down(event_loop);
            return;
        }

        match event {
            WindowEvent::CloseRequested => self.shut_down(event_loop),
            WindowEvent::Resized(_) | WindowEvent::ScaleFactorChanged { .. } => {
                surface.resize_to_window();
                surface.request_redraw();
            }
            WindowEvent::RedrawRequested => {
                if surface.frame(&mut self.app).exit_requested() {
                    self.shut_down(event_loop);
                }
            }
            _ => {}
        }
    }
}
