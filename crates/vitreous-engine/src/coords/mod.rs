//! Coordinate and geometry types shared by shape math, the composition tree
//! and the GPU layer.
//!
//! Canonical CPU space:
//! - Logical pixels
//! - Origin top-left
//! - +X right, +Y down
//!
//! Surface-local math uses normalized coordinates (`0..1` across the surface,
//! y = 0 at the top) scaled by the surface size in pixels.

mod rect;
mod size;
mod vec2;
mod viewport;

pub use rect::Rect;
pub use size::PixelSize;
pub use vec2::Vec2;
pub use viewport::Viewport;
