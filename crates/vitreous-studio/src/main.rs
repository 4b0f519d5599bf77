//! Playground window: a glass card with a nested pill button over a backdrop.
//!
//! Scroll with the wheel to see the button refract the card; resize the
//! window to watch the card reflow.

mod page;

use anyhow::Result;
use winit::window::WindowId;

use vitreous_engine::compose::{GlassRuntime, SurfaceEvent};
use vitreous_engine::config::GlassConfig;
use vitreous_engine::core::{App, AppControl, FrameCtx, ScrollDelta};
use vitreous_engine::coords::Vec2;
use vitreous_engine::device::GpuInit;
use vitreous_engine::logging::{init_logging, LoggingConfig};
use vitreous_engine::render::{GpuBackend, PresentItem, Presenter};
use vitreous_engine::shape::ShapeKind;
use vitreous_engine::text::FontSystem;
use vitreous_engine::window::{Runtime, RuntimeConfig};

use page::{Page, PAGE_TOP};

const BACKDROP: wgpu::Color = wgpu::Color {
    r: 0.09,
    g: 0.16,
    b: 0.32,
    a: 1.0,
};

struct Scene {
    runtime: GlassRuntime<GpuBackend, Page>,
    presenter: Presenter,
}

struct Studio {
    scene: Option<Scene>,
    viewport: (f32, f32),
}

impl Studio {
    fn new() -> Self {
        Self { scene: None, viewport: (0.0, 0.0) }
    }

    /// Builds the card and its button once a device exists.
    fn build_scene(&self, backend: GpuBackend) -> Result<Scene> {
        let mut page = Page::default();
        page.set_viewport(self.viewport.0, self.viewport.1);

        let mut runtime = GlassRuntime::new(backend, page).with_text_measure(load_fonts());

        let card = runtime.create_surface(
            GlassConfig::default()
                .with_corner_radius(44.0)
                .with_tint_opacity(0.1)
                .with_blur_radius(40.0),
        )?;
        let button = runtime
            .create_surface(GlassConfig::button("Liquid glass", 22.0).with_shape(ShapeKind::Pill))?;

        runtime.host_mut().place_card(card, PAGE_TOP);
        runtime.host_mut().place_inset(button, card, Vec2::new(40.0, 40.0));
        runtime.attach(card, button)?;

        Ok(Scene { runtime, presenter: Presenter::new() })
    }
}

impl App for Studio {
    fn on_resize(&mut self, _window_id: WindowId, width: f32, height: f32) {
        self.viewport = (width, height);
        if let Some(scene) = self.scene.as_mut() {
            scene.runtime.host_mut().set_viewport(width, height);
            scene.runtime.notify_resize();
        }
    }

    fn on_scroll(&mut self, _window_id: WindowId, delta: ScrollDelta) {
        if let Some(scene) = self.scene.as_mut() {
            scene.runtime.host_mut().scroll_by(delta.y);
            scene.runtime.notify_scroll();
        }
    }

    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        if self.scene.is_none() {
            match self.build_scene(ctx.gpu.surface_backend()) {
                Ok(scene) => self.scene = Some(scene),
                Err(e) => {
                    log::error!("failed to build scene: {e:#}");
                    return AppControl::Exit;
                }
            }
        }
        let Some(scene) = self.scene.as_mut() else { return AppControl::Exit; };

        let report = scene.runtime.tick();
        for SurfaceEvent::StateChanged { id, from, to } in scene.runtime.take_events() {
            log::info!("{id}: {from:?} -> {to:?}");
        }
        if report.time.frame_index % 600 == 0 {
            log::debug!(
                "frame {}: dt {:.2} ms, drew {:?}",
                report.time.frame_index,
                report.time.dt * 1000.0,
                report.drawn.iter().map(|id| id.raw()).collect::<Vec<_>>()
            );
        }

        let items: Vec<PresentItem> = scene
            .runtime
            .visible_handles()
            .into_iter()
            .map(|h| PresentItem { id: h.id, rect: h.screen_rect })
            .collect();

        let runtime = &scene.runtime;
        let presenter = &mut scene.presenter;
        ctx.render(BACKDROP, |rctx, target| {
            presenter.render(rctx, target, runtime.backend(), &items);
        })
    }
}

fn load_fonts() -> FontSystem {
    let mut fonts = FontSystem::new();
    let found = [
        "/usr/share/fonts/TTF/DejaVuSans.ttf",
        "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
        "/usr/share/fonts/dejavu/DejaVuSans.ttf",
        "/usr/share/fonts/noto/NotoSans-Regular.ttf",
        "/usr/share/fonts/truetype/noto/NotoSans-Regular.ttf",
    ]
    .iter()
    .find_map(|p| std::fs::read(p).ok());

    match found.map(|bytes| fonts.load_font(&bytes)) {
        Some(Ok(_)) => {}
        Some(Err(e)) => log::warn!("{e}; using estimated text widths"),
        None => log::warn!("no system font found; using estimated text widths"),
    }
    fonts
}

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    let config = RuntimeConfig {
        title: "Vitreous Studio".to_string(),
        ..RuntimeConfig::default()
    };
    Runtime::run(config, GpuInit::default(), Studio::new())
}
