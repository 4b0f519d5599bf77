//! Shape math for the three glass silhouettes.
//!
//! Everything here is pure and has a WGSL twin in [`wgsl_prelude`]; both
//! shader variants prepend that prelude, so CPU-side classification and the
//! per-pixel silhouette choice are evaluated with the same thresholds.
//!
//! Conventions:
//! - points are normalized surface coordinates (`0..1`, y = 0 at the top)
//! - sizes and radii are in pixels
//! - distances are signed pixels, negative inside the shape

mod classify;
mod sdf;
mod wgsl;

pub use classify::{
    classify_shape, ShapeKind, CIRCLE_RADIUS_EPSILON, PILL_RADIUS_EPSILON, SQUARE_DELTA,
};
pub use sdf::{
    circle_distance, pill_distance, rounded_rect_distance, shape_distance, shape_normal, soft_mask,
};
pub use wgsl::wgsl_prelude;
