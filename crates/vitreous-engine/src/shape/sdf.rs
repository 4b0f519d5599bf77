use crate::coords::Vec2;

use super::{classify_shape, ShapeKind};

/// Signed distance (px) from `coord` to a rounded rectangle filling `size`.
///
/// Corner-offset construction: fold the point into the first quadrant, offset
/// it by the inner (radius-inset) box, then measure outside/inside separately.
/// Radii larger than half the smaller side are not clamped; the inset box
/// inverts and the silhouette degrades visually.
#[must_use]
pub fn rounded_rect_distance(coord: Vec2, size: Vec2, radius: f32) -> f32 {
    let center = size * 0.5;
    let pixel = coord.mul_elem(size);
    let to_corner = (pixel - center).abs() - (center - Vec2::splat(radius));
    let outside = to_corner.max_scalar(0.0).length();
    let inside = to_corner.x.max(to_corner.y).min(0.0);
    outside + inside - radius
}

/// Signed distance (px) from `coord` to a circle of `radius` centered in `size`.
#[must_use]
pub fn circle_distance(coord: Vec2, size: Vec2, radius: f32) -> f32 {
    let pixel = coord.mul_elem(size);
    (pixel - size * 0.5).length() - radius
}

/// Signed distance (px) from `coord` to a horizontal capsule filling `size`.
#[must_use]
pub fn pill_distance(coord: Vec2, size: Vec2, radius: f32) -> f32 {
    let pixel = coord.mul_elem(size);
    match capsule_closest_point(pixel, size, radius) {
        Some(closest) => (pixel - closest).length() - radius,
        // Degenerate axis: the capsule collapses to a circle.
        None => (pixel - size * 0.5).length() - radius,
    }
}

/// Dispatches to the distance function of the classified silhouette.
#[must_use]
pub fn shape_distance(coord: Vec2, size: Vec2, radius: f32) -> f32 {
    match classify_shape(size.x, size.y, radius) {
        ShapeKind::Pill => pill_distance(coord, size, radius),
        ShapeKind::Circle => circle_distance(coord, size, radius),
        ShapeKind::RoundedRect => rounded_rect_distance(coord, size, radius),
    }
}

/// Outward direction used to displace refraction samples.
///
/// Pills use the true capsule normal (away from the closest point on the
/// axis); circles and rounded rects use the radial direction from the center
/// in normalized space. Returns zero at the exact center.
#[must_use]
pub fn shape_normal(coord: Vec2, size: Vec2, radius: f32) -> Vec2 {
    let radial = (coord - Vec2::splat(0.5)).normalize_or(Vec2::zero());
    if classify_shape(size.x, size.y, radius) != ShapeKind::Pill {
        return radial;
    }

    let pixel = coord.mul_elem(size);
    match capsule_closest_point(pixel, size, radius) {
        Some(closest) => (pixel - closest).normalize_or(Vec2::new(0.0, 1.0)),
        None => radial,
    }
}

/// Anti-aliased coverage for a signed distance: `1 - smoothstep(-f, f, d)`.
#[must_use]
pub fn soft_mask(distance: f32, feather: f32) -> f32 {
    1.0 - smoothstep(-feather, feather, distance)
}

fn capsule_closest_point(pixel: Vec2, size: Vec2, radius: f32) -> Option<Vec2> {
    let cy = size.y * 0.5;
    let start = Vec2::new(radius, cy);
    let end = Vec2::new(size.x - radius, cy);
    let axis = end - start;
    if axis.length() <= 0.0 {
        return None;
    }
    let t = ((pixel - start).dot(axis) / axis.dot(axis)).clamp(0.0, 1.0);
    Some(start + axis * t)
}

fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}
