use crate::config::ContentExtent;
use crate::coords::{PixelSize, Rect};
use crate::shape::{classify_shape, ShapeKind};

/// Outcome of resolving a measured rect against the authored shape.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ResolvedGeometry {
    pub size: PixelSize,
    pub radius: f32,
    pub shape: ShapeKind,
    /// Extent the host must adopt so its layout matches the target.
    pub forced: Option<ContentExtent>,
}

/// Applies shape overrides to a measured on-display rect.
///
/// The measured extent is rounded up to whole pixels. Circles are forced to a
/// square of the larger side with a half-side radius; pills keep their size
/// and take half the height as radius; rounded rects keep the authored radius.
pub fn resolve_geometry(authored: ShapeKind, authored_radius: f32, measured: Rect) -> ResolvedGeometry {
    let size = PixelSize::from_extent(measured.normalized().size);

    let (size, radius, forced) = match authored {
        ShapeKind::Circle => {
            let side = size.width.max(size.height);
            let radius = side as f32 / 2.0;
            let forced = ContentExtent { width: side as f32, height: side as f32, radius };
            (PixelSize::new(side, side), radius, Some(forced))
        }
        ShapeKind::Pill => {
            let radius = size.height as f32 / 2.0;
            let forced = ContentExtent {
                width: size.width as f32,
                height: size.height as f32,
                radius,
            };
            (size, radius, Some(forced))
        }
        ShapeKind::RoundedRect => (size, authored_radius, None),
    };

    let shape = classify_shape(size.width as f32, size.height as f32, radius);
    ResolvedGeometry { size, radius, shape, forced }
}

/// Screen rect of a resolved surface, keeping the measured center.
pub fn screen_rect(measured: Rect, size: PixelSize) -> Rect {
    Rect::from_center_size(measured.normalized().center(), size.to_vec2())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::Vec2;

    fn r(w: f32, h: f32) -> Rect {
        Rect::new(0.0, 0.0, w, h)
    }

    // ── circle ────────────────────────────────────────────────────────────

    #[test]
    fn circle_forces_square_of_larger_side() {
        let g = resolve_geometry(ShapeKind::Circle, 48.0, r(100.0, 90.4));
        assert_eq!(g.size, PixelSize::new(100, 100));
        assert_eq!(g.radius, 50.0);
        assert_eq!(g.shape, ShapeKind::Circle);
        assert_eq!(g.forced.map(|f| (f.width, f.height)), Some((100.0, 100.0)));
    }

    #[test]
    fn circle_invariant_holds_for_odd_sides() {
        let g = resolve_geometry(ShapeKind::Circle, 0.0, r(55.0, 55.0));
        assert_eq!(g.size.width, g.size.height);
        assert_eq!(g.radius, g.size.width as f32 / 2.0);
        assert_eq!(g.shape, ShapeKind::Circle);
    }

    // ── pill ──────────────────────────────────────────────────────────────

    #[test]
    fn pill_radius_tracks_height() {
        let g = resolve_geometry(ShapeKind::Pill, 48.0, r(720.0, 200.0));
        assert_eq!(g.radius, 100.0);
        assert_eq!(g.shape, ShapeKind::Pill);

        let g = resolve_geometry(ShapeKind::Pill, 48.0, r(900.0, 260.0));
        assert_eq!(g.radius, 130.0);
        assert_eq!(g.size, PixelSize::new(900, 260));
    }

    #[test]
    fn near_square_pill_classifies_as_circle() {
        let g = resolve_geometry(ShapeKind::Pill, 0.0, r(52.0, 50.0));
        assert_eq!(g.radius, 25.0);
        assert_eq!(g.shape, ShapeKind::Circle);
    }

    // ── rounded rect ─────────────────────────────────────────────────────

    #[test]
    fn rounded_rect_keeps_authored_radius_and_rounds_up() {
        let g = resolve_geometry(ShapeKind::RoundedRect, 44.0, r(719.2, 199.5));
        assert_eq!(g.size, PixelSize::new(720, 200));
        assert_eq!(g.radius, 44.0);
        assert_eq!(g.shape, ShapeKind::RoundedRect);
        assert!(g.forced.is_none());
    }

    #[test]
    fn oversized_authored_radius_is_not_clamped() {
        let g = resolve_geometry(ShapeKind::RoundedRect, 500.0, r(100.0, 40.0));
        assert_eq!(g.radius, 500.0);
    }

    #[test]
    fn unmeasured_rect_resolves_to_zero() {
        let g = resolve_geometry(ShapeKind::RoundedRect, 48.0, Rect::default());
        assert!(g.size.is_empty());
    }

    // ── screen rect ───────────────────────────────────────────────────────

    #[test]
    fn screen_rect_keeps_center() {
        let rect = screen_rect(Rect::new(10.0, 10.0, 100.0, 90.0), PixelSize::new(100, 100));
        assert_eq!(rect.center(), Vec2::new(60.0, 55.0));
        assert_eq!(rect.size, Vec2::new(100.0, 100.0));
    }
}
