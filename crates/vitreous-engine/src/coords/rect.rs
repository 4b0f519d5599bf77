use super::Vec2;

/// Axis-aligned rectangle in logical pixels (top-left origin).
///
/// Hosts report a surface's on-display box as a `Rect`; the glass shaders
/// only consume its center and extent.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Rect {
    pub origin: Vec2,
    pub size: Vec2,
}

impl Rect {
    #[inline]
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self {
            origin: Vec2::new(x, y),
            size: Vec2::new(w, h),
        }
    }

    #[inline]
    pub const fn from_origin_size(origin: Vec2, size: Vec2) -> Self {
        Self { origin, size }
    }

    /// Builds a rectangle of `size` centered on `center`.
    #[inline]
    pub fn from_center_size(center: Vec2, size: Vec2) -> Self {
        Self { origin: center - size * 0.5, size }
    }

    #[inline]
    pub fn center(self) -> Vec2 {
        self.origin + self.size * 0.5
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.size.x <= 0.0 || self.size.y <= 0.0
    }

    /// Translates the rectangle by `delta`.
    #[inline]
    pub fn translated(self, delta: Vec2) -> Self {
        Self { origin: self.origin + delta, size: self.size }
    }

    /// Normalizes the rectangle so width/height are non-negative.
    #[inline]
    pub fn normalized(self) -> Self {
        let mut x = self.origin.x;
        let mut y = self.origin.y;
        let mut w = self.size.x;
        let mut h = self.size.y;

        if w < 0.0 {
            x += w;
            w = -w;
        }
        if h < 0.0 {
            y += h;
            h = -h;
        }

        Rect::new(x, y, w, h)
    }
}
