use super::{ShapeKind, CIRCLE_RADIUS_EPSILON, PILL_RADIUS_EPSILON, SQUARE_DELTA};

const SHAPE_FUNCTIONS: &str = include_str!("shape.wgsl");

/// WGSL source for the shape math, with thresholds taken from this crate.
///
/// Shader variants are assembled as `prelude + variant body`, so the GPU never
/// carries its own copy of the classification constants.
#[must_use]
pub fn wgsl_prelude() -> String {
    format!(
        "const PILL_RADIUS_EPSILON: f32 = {:?};\n\
         const CIRCLE_RADIUS_EPSILON: f32 = {:?};\n\
         const SQUARE_DELTA: f32 = {:?};\n\
         const SHAPE_ROUNDED_RECT: u32 = {}u;\n\
         const SHAPE_CIRCLE: u32 = {}u;\n\
         const SHAPE_PILL: u32 = {}u;\n\n{}",
        PILL_RADIUS_EPSILON,
        CIRCLE_RADIUS_EPSILON,
        SQUARE_DELTA,
        ShapeKind::RoundedRect.shader_tag(),
        ShapeKind::Circle.shader_tag(),
        ShapeKind::Pill.shader_tag(),
        SHAPE_FUNCTIONS,
    )
}
