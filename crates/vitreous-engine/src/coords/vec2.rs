use core::ops::{Add, Div, Mul, Neg, Sub};

/// 2D vector in logical pixels (or normalized surface units).
///
/// Component-wise helpers mirror the WGSL built-ins used by the glass shaders
/// so the CPU-side distance functions read the same as their GPU twins.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    #[inline]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    #[inline]
    pub const fn zero() -> Self {
        Self { x: 0.0, y: 0.0 }
    }

    #[inline]
    pub const fn splat(v: f32) -> Self {
        Self { x: v, y: v }
    }

    #[inline]
    pub fn abs(self) -> Self {
        Self::new(self.x.abs(), self.y.abs())
    }

    /// Component-wise maximum with a scalar.
    #[inline]
    pub fn max_scalar(self, v: f32) -> Self {
        Self::new(self.x.max(v), self.y.max(v))
    }

    /// Component-wise product.
    #[inline]
    pub fn mul_elem(self, rhs: Vec2) -> Self {
        Self::new(self.x * rhs.x, self.y * rhs.y)
    }

    #[inline]
    pub fn dot(self, rhs: Vec2) -> f32 {
        self.x * rhs.x + self.y * rhs.y
    }

    #[inline]
    pub fn length(self) -> f32 {
        self.dot(self).sqrt()
    }

    #[inline]
    pub fn min_element(self) -> f32 {
        self.x.min(self.y)
    }

    /// Unit vector in the same direction, or `fallback` for a zero vector.
    #[inline]
    pub fn normalize_or(self, fallback: Vec2) -> Self {
        let len = self.length();
        if len > 0.0 { self / len } else { fallback }
    }

    #[inline]
    pub fn to_array(self) -> [f32; 2] {
        [self.x, self.y]
    }
}

impl Add for Vec2 {
    type Output = Vec2;
    #[inline]
    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Vec2 {
    type Output = Vec2;
    #[inline]
    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f32> for Vec2 {
    type Output = Vec2;
    #[inline]
    fn mul(self, rhs: f32) -> Vec2 {
        Vec2::new(self.x * rhs, self.y * rhs)
    }
}

impl Div<f32> for Vec2 {
    type Output = Vec2;
    #[inline]
    fn div(self, rhs: f32) -> Vec2 {
        Vec2::new(self.x / rhs, self.y / rhs)
    }
}

impl Neg for Vec2 {
    type Output = Vec2;
    #[inline]
    fn neg(self) -> Vec2 {
        Vec2::new(-self.x, -self.y)
    }
}
