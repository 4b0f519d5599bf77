/// Tolerance (px) between the radius and half the height for a pill.
pub const PILL_RADIUS_EPSILON: f32 = 2.0;

/// Tolerance (px) between the radius and half the smaller side for a circle.
pub const CIRCLE_RADIUS_EPSILON: f32 = 1.0;

/// Minimum width surplus (px) for a pill, and maximum side difference for a circle.
pub const SQUARE_DELTA: f32 = 4.0;

/// Silhouette of a glass surface.
///
/// Used both as authored input (which shape-specific sizing rules apply) and as
/// the derived classification of a resolved size + radius.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub enum ShapeKind {
    #[default]
    RoundedRect,
    Circle,
    Pill,
}

impl ShapeKind {
    /// Numeric tag shared with the shader prelude.
    #[inline]
    pub const fn shader_tag(self) -> u32 {
        match self {
            ShapeKind::RoundedRect => 0,
            ShapeKind::Circle => 1,
            ShapeKind::Pill => 2,
        }
    }
}

/// Classifies a silhouette from its pixel size and corner radius.
///
/// Pill is tested first: a capsule must have its radius at half the height and
/// be clearly wider than tall. A circle needs its radius at half the smaller
/// side and a roughly square box. Everything else is a rounded rectangle.
#[must_use]
pub fn classify_shape(width: f32, height: f32, radius: f32) -> ShapeKind {
    let is_pill = (radius - height * 0.5).abs() < PILL_RADIUS_EPSILON && width > height + SQUARE_DELTA;
    if is_pill {
        return ShapeKind::Pill;
    }

    let min_dim = width.min(height);
    let is_circle =
        (radius - min_dim * 0.5).abs() < CIRCLE_RADIUS_EPSILON && (width - height).abs() < SQUARE_DELTA;
    if is_circle {
        return ShapeKind::Circle;
    }

    ShapeKind::RoundedRect
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── pill ──────────────────────────────────────────────────────────────

    #[test]
    fn capsule_radius_on_wide_box_is_pill() {
        assert_eq!(classify_shape(180.0, 55.0, 27.5), ShapeKind::Pill);
    }

    #[test]
    fn pill_requires_clear_width_surplus() {
        // 4 px wider is not "significantly wider".
        assert_eq!(classify_shape(59.0, 55.0, 27.5), ShapeKind::RoundedRect);
        assert_eq!(classify_shape(59.5, 55.0, 27.5), ShapeKind::Pill);
    }

    #[test]
    fn pill_radius_tolerance_is_two_pixels() {
        assert_eq!(classify_shape(300.0, 100.0, 51.9), ShapeKind::Pill);
        assert_eq!(classify_shape(300.0, 100.0, 52.0), ShapeKind::RoundedRect);
    }

    #[test]
    fn tall_capsule_is_not_a_pill() {
        assert_eq!(classify_shape(55.0, 180.0, 90.0), ShapeKind::RoundedRect);
    }

    // ── circle ────────────────────────────────────────────────────────────

    #[test]
    fn square_with_half_side_radius_is_circle() {
        assert_eq!(classify_shape(55.0, 55.0, 27.5), ShapeKind::Circle);
    }

    #[test]
    fn nearly_square_still_circle() {
        assert_eq!(classify_shape(57.0, 55.0, 27.5), ShapeKind::Circle);
    }

    #[test]
    fn circle_radius_tolerance_is_one_pixel() {
        assert_eq!(classify_shape(100.0, 100.0, 49.1), ShapeKind::Circle);
        assert_eq!(classify_shape(100.0, 100.0, 49.0), ShapeKind::RoundedRect);
    }

    // ── rounded rect ──────────────────────────────────────────────────────

    #[test]
    fn authored_radius_on_panel_is_rounded_rect() {
        assert_eq!(classify_shape(720.0, 200.0, 44.0), ShapeKind::RoundedRect);
    }

    #[test]
    fn zero_size_is_rounded_rect() {
        assert_eq!(classify_shape(0.0, 0.0, 48.0), ShapeKind::RoundedRect);
    }

    // ── purity ────────────────────────────────────────────────────────────

    #[test]
    fn classification_is_stable_over_grid() {
        for w in (0..=400).step_by(17) {
            for h in (1..=200).step_by(13) {
                let (w, h) = (w as f32, h as f32);
                for r in [0.0, w.min(h) * 0.25, w.min(h) * 0.5, h * 0.5] {
                    let first = classify_shape(w, h, r);
                    assert_eq!(first, classify_shape(w, h, r));
                }
            }
        }
    }
}
