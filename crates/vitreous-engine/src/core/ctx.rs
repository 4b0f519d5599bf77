use winit::window::{Window, WindowId};

use crate::coords::Viewport;
use crate::device::{Gpu, SurfaceErrorAction};
use crate::render::{RenderCtx, RenderTarget};
use crate::time::FrameTime;
use crate::window::RuntimeCtx;

use super::app::AppControl;

pub struct WindowCtx<'a> {
    pub id: WindowId,
    pub window: &'a Window,
}

impl<'a> WindowCtx<'a> {
    /// `(width, height)` in logical pixels.
    pub fn logical_size(&self) -> (f32, f32) {
        let logical: winit::dpi::LogicalSize<f64> =
            self.window.inner_size().to_logical(self.window.scale_factor());
        (logical.width as f32, logical.height as f32)
    }

    pub fn request_redraw(&self) {
        self.window.request_redraw();
    }
}

/// Per-frame context passed to [`App::on_frame`](super::App::on_frame).
///
/// `'a` is the callback, `'w` the window borrow held by [`Gpu`].
pub struct FrameCtx<'a, 'w> {
    pub window: WindowCtx<'a>,
    pub gpu: &'a mut Gpu<'w>,
    pub time: FrameTime,
    pub runtime: &'a mut RuntimeCtx,
}

impl<'a, 'w> FrameCtx<'a, 'w> {
    /// Acquires the swapchain image, clears it to `clear`, runs `draw` and
    /// presents.
    ///
    /// Swapchain errors skip the frame; only a fatal one returns
    /// [`AppControl::Exit`].
    pub fn render<F>(&mut self, clear: wgpu::Color, draw: F) -> AppControl
    where
        F: FnOnce(&RenderCtx<'_>, &mut RenderTarget<'_>),
    {
        let (w, h) = self.window.logical_size();

        let mut frame = match self.gpu.begin_frame() {
            Ok(f) => f,
            Err(err) => {
                log::debug!("swapchain: {err}");
                return match self.gpu.handle_surface_error(err) {
                    SurfaceErrorAction::Fatal => AppControl::Exit,
                    _ => AppControl::Continue,
                };
            }
        };

        let rctx = RenderCtx {
            device: self.gpu.device(),
            queue: self.gpu.queue(),
            surface_format: self.gpu.surface_format(),
            viewport: Viewport::new(w, h),
        };

        // The target borrows the encoder; it must be gone before submit.
        {
            let mut target = RenderTarget::from_frame(&mut frame);
            target.clear(clear);
            draw(&rctx, &mut target);
        }

        self.window.window.pre_present_notify();
        self.gpu.submit(frame);
        AppControl::Continue
    }
}
