use super::Vec2;

/// Integer extent of a drawing target in pixels.
///
/// `PixelSize::ZERO` is the sentinel returned for surfaces whose geometry has
/// not been resolved yet; callers must tolerate it.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub struct PixelSize {
    pub width: u32,
    pub height: u32,
}

impl PixelSize {
    pub const ZERO: PixelSize = PixelSize { width: 0, height: 0 };

    #[inline]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Rounds a measured logical extent up to whole pixels.
    ///
    /// Negative and non-finite extents collapse to zero.
    #[inline]
    pub fn from_extent(extent: Vec2) -> Self {
        let px = |v: f32| if v.is_finite() && v > 0.0 { v.ceil() as u32 } else { 0 };
        Self::new(px(extent.x), px(extent.y))
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }

    #[inline]
    pub fn to_vec2(self) -> Vec2 {
        Vec2::new(self.width as f32, self.height as f32)
    }
}
