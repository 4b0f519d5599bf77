use winit::event::WindowEvent;
use winit::window::WindowId;

use super::ctx::FrameCtx;

/// Returned by app callbacks to keep running or shut down.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AppControl {
    Continue,
    Exit,
}

/// Logical-pixel scroll delta. Line deltas are already converted.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ScrollDelta {
    pub x: f32,
    pub y: f32,
}

/// Hooks the window runtime calls into.
///
/// Resize and scroll arrive before the redraw they affect, so an app can
/// forward them to its glass runtime and have the next tick pick them up.
pub trait App {
    /// Raw window events, before the runtime's own handling.
    fn on_window_event(&mut self, window_id: WindowId, event: &WindowEvent) -> AppControl {
        let _ = (window_id, event);
        AppControl::Continue
    }

    /// Window inner size changed, in logical pixels.
    fn on_resize(&mut self, window_id: WindowId, width: f32, height: f32) {
        let _ = (window_id, width, height);
    }

    fn on_scroll(&mut self, window_id: WindowId, delta: ScrollDelta) {
        let _ = (window_id, delta);
    }

    /// One redraw of one window.
    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl;
}
