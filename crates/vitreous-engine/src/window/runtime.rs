use anyhow::{Context, Result};
use ouroboros::self_referencing;
use std::collections::HashMap;

use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::{MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use crate::core::{App, AppControl, FrameCtx, ScrollDelta, WindowCtx};
use crate::device::{Gpu, GpuInit};
use crate::time::{Clock, FrameClock, SystemClock};

/// Logical pixels per wheel line.
pub const LINE_HEIGHT_PX: f32 = 40.0;

#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub title: String,
    pub initial_size: LogicalSize<f64>,
    /// Redraw every display frame. Nested glass animates against its
    /// parent each frame, so this is the default.
    pub continuous: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            title: "vitreous".to_string(),
            initial_size: LogicalSize::new(1280.0, 720.0),
            continuous: true,
        }
    }
}

/// Requests an app makes during a callback; applied once it returns.
#[derive(Debug, Default)]
pub struct RuntimeCtx {
    exit: bool,
}

impl RuntimeCtx {
    pub fn exit(&mut self) {
        self.exit = true;
    }

    pub fn exit_requested(&self) -> bool {
        self.exit
    }
}

pub struct Runtime;

impl Runtime {
    /// Runs `app` until its last window closes or it asks to exit.
    pub fn run<A>(initial: RuntimeConfig, gpu_init: GpuInit, app: A) -> Result<()>
    where
        A: 'static + App,
    {
        let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
        let mut state = AppState::new(initial, gpu_init, app);

        event_loop
            .run_app(&mut state)
            .context("winit event loop terminated with error")?;

        Ok(())
    }
}

#[self_referencing]
struct WindowEntry {
    clock: FrameClock,
    continuous: bool,

    window: Window,

    #[borrows(window)]
    #[covariant]
    gpu: Gpu<'this>,
}

struct AppState<A: App + 'static> {
    initial: RuntimeConfig,
    gpu_init: GpuInit,
    app: A,
    wall: SystemClock,

    windows: HashMap<WindowId, WindowEntry>,
    exit_requested: bool,
}

impl<A: App + 'static> AppState<A> {
    fn new(initial: RuntimeConfig, gpu_init: GpuInit, app: A) -> Self {
        Self {
            initial,
            gpu_init,
            app,
            wall: SystemClock,
            windows: HashMap::new(),
            exit_requested: false,
        }
    }

    fn create_window_entry(
        &mut self,
        event_loop: &ActiveEventLoop,
        config: RuntimeConfig,
    ) -> Result<WindowId> {
        let attrs = Window::default_attributes()
            .with_title(config.title)
            .with_inner_size(config.initial_size);

        let window = event_loop
            .create_window(attrs)
            .context("failed to create window")?;

        let id = window.id();
        let gpu_init = self.gpu_init.clone();

        let entry = WindowEntryTryBuilder {
            clock: FrameClock::default(),
            continuous: config.continuous,
            window,
            gpu_builder: |w| pollster::block_on(Gpu::new(w, gpu_init)),
        }
        .try_build()
        .context("GPU initialization failed for window")?;

        // Apps size their layout from the first resize notification.
        let (w, h) = entry.with_window(logical_size);
        self.app.on_resize(id, w, h);

        self.windows.insert(id, entry);
        log::info!("window {id:?} created");
        Ok(id)
    }

    fn stop(&mut self, event_loop: &ActiveEventLoop) {
        self.exit_requested = true;
        event_loop.exit();
    }

    fn finish_frame(&mut self, event_loop: &ActiveEventLoop, ctx: RuntimeCtx) {
        if ctx.exit_requested() {
            self.exit_requested = true;
        }
        if self.exit_requested || self.windows.is_empty() {
            self.stop(event_loop);
        }
    }

    fn request_redraw(&self, id: WindowId) {
        if let Some(entry) = self.windows.get(&id) {
            entry.with_window(Window::request_redraw);
        }
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop, window_id: WindowId) {
        let mut runtime_ctx = RuntimeCtx::default();
        let mut control = AppControl::Continue;
        let now = self.wall.now();

        let (app, windows) = (&mut self.app, &mut self.windows);
        if let Some(entry) = windows.get_mut(&window_id) {
            entry.with_mut(|fields| {
                let mut ctx = FrameCtx {
                    window: WindowCtx {
                        id: window_id,
                        window: fields.window,
                    },
                    gpu: fields.gpu,
                    time: fields.clock.tick_at(now),
                    runtime: &mut runtime_ctx,
                };
                control = app.on_frame(&mut ctx);
            });
        }

        if control == AppControl::Exit {
            runtime_ctx.exit();
        }
        self.finish_frame(event_loop, runtime_ctx);
    }
}

impl<A: App + 'static> ApplicationHandler for AppState<A> {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if !self.windows.is_empty() {
            return;
        }

        match self.create_window_entry(event_loop, self.initial.clone()) {
            Ok(id) => self.request_redraw(id),
            Err(e) => {
                log::error!("failed to create initial window: {e:#}");
                self.stop(event_loop);
            }
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }

        event_loop.set_control_flow(ControlFlow::Wait);
        self.windows
            .values()
            .filter(|entry| entry.with_continuous(|c| *c))
            .for_each(|entry| entry.with_window(Window::request_redraw));
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: WindowId,
        event: WindowEvent,
    ) {
        if self.exit_requested || !self.windows.contains_key(&window_id) {
            return;
        }
        if self.app.on_window_event(window_id, &event) == AppControl::Exit {
            self.stop(event_loop);
            return;
        }

        match &event {
            WindowEvent::CloseRequested => {
                self.windows.remove(&window_id);
                if self.windows.is_empty() {
                    self.stop(event_loop);
                }
            }

            WindowEvent::Resized(_) | WindowEvent::ScaleFactorChanged { .. } => {
                let Some(entry) = self.windows.get_mut(&window_id) else { return; };
                let new_size = entry.with_window(|w| w.inner_size());
                entry.with_gpu_mut(|gpu| gpu.resize(new_size));
                let (w, h) = entry.with_window(logical_size);
                self.app.on_resize(window_id, w, h);
                self.request_redraw(window_id);
            }

            WindowEvent::MouseWheel { delta, .. } => {
                let Some(entry) = self.windows.get(&window_id) else { return; };
                let scale = entry.with_window(|w| w.scale_factor());
                self.app.on_scroll(window_id, scroll_delta(*delta, scale));
                self.request_redraw(window_id);
            }

            WindowEvent::RedrawRequested => self.redraw(event_loop, window_id),

            _ => {}
        }
    }
}

fn logical_size(window: &Window) -> (f32, f32) {
    let logical: LogicalSize<f64> = window.inner_size().to_logical(window.scale_factor());
    (logical.width as f32, logical.height as f32)
}

/// Wheel delta in logical pixels; positive `y` scrolls content up.
fn scroll_delta(delta: MouseScrollDelta, scale_factor: f64) -> ScrollDelta {
    match delta {
        MouseScrollDelta::LineDelta(x, y) => ScrollDelta {
            x: x * LINE_HEIGHT_PX,
            y: y * LINE_HEIGHT_PX,
        },
        MouseScrollDelta::PixelDelta(p) => {
            let logical = p.to_logical::<f64>(scale_factor);
            ScrollDelta {
                x: logical.x as f32,
                y: logical.y as f32,
            }
        }
    }
}
