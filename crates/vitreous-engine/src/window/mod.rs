//! Window and event loop.
//!
//! Owns the `winit` EventLoop and windows, binds each window to a [`Gpu`](crate::device::Gpu)
//! and forwards resize, scroll and redraw to the [`App`](crate::core::App).

mod runtime;

pub use runtime::{Runtime, RuntimeConfig, RuntimeCtx, LINE_HEIGHT_PX};
