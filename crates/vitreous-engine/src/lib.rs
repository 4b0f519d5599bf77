//! Vitreous engine: liquid-glass surfaces on `wgpu`.
//!
//! Glass surfaces are rounded rects, pills or circles that render a glass
//! material into their own offscreen target. A root surface draws a
//! standalone highlight material; a surface nested in another refracts and
//! blurs its parent's rendered target.
//!
//! - [`compose`] owns the surface tree and drives the per-surface lifecycle
//! - [`program`] validates WGSL programs on the CPU before any GPU work
//! - [`render`] is the `wgpu` backend and the swapchain presenter
//! - [`window`] / [`core`] run the `winit` event loop for desktop hosts

pub mod compose;
pub mod config;
pub mod coords;
pub mod core;
pub mod device;
pub mod logging;
pub mod program;
pub mod render;
pub mod shape;
pub mod text;
pub mod time;
pub mod window;
