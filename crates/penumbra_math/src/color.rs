//! Linear RGBA colour

use core::ops::{Add, Mul, AddAssign};

/// Linear-space RGBA colour
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(C)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const BLACK: Self = Self::rgba(0.0, 0.0, 0.0, 1.0);
    pub const WHITE: Self = Self::rgba(1.0, 1.0, 1.0, 1.0);
    pub const TRANSPARENT: Self = Self::rgba(0.0, 0.0, 0.0, 0.0);

    #[inline]
    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    #[inline]
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self::rgba(r, g, b, 1.0)
    }

    /// Scale the colour channels, leaving alpha untouched
    #[inline]
    pub fn scale_rgb(self, s: f32) -> Self {
        Self::rgba(self.r * s, self.g * s, self.b * s, self.a)
    }

    /// Largest of the three colour channels
    #[inline]
    pub fn max_rgb(self) -> f32 {
        self.r.max(self.g).max(self.b)
    }

    #[inline]
    pub fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }

    #[inline]
    pub fn from_array(c: [f32; 4]) -> Self {
        Self::rgba(c[0], c[1], c[2], c[3])
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

impl Add for Color {
    type Output = Self;
    #[inline] fn add(self, rhs: Self) -> Self { Self::rgba(self.r + rhs.r, self.g + rhs.g, self.b + rhs.b, self.a + rhs.a) }
}
impl AddAssign for Color {
    #[inline] fn add_assign(&mut self, rhs: Self) { *self = *self + rhs; }
}
impl Mul<f32> for Color {
    type Output = Self;
    #[inline] fn mul(self, rhs: f32) -> Self { Self::rgba(self.r * rhs, self.g * rhs, self.b * rhs, self.a * rhs) }
}
impl Mul for Color {
    type Output = Self;
    #[inline] fn mul(self, rhs: Self) -> Self { Self::rgba(self.r * rhs.r, self.g * rhs.g, self.b * rhs.b, self.a * rhs.a) }
}
