//! # penumbra_math - 2D Math Primitives
//!
//! The small set of planar types the lighting pipeline is written against:
//! vectors, linear colours and axis-aligned rectangles.

pub mod vector;
pub mod color;
pub mod rect;

pub use vector::*;
pub use color::*;
pub use rect::*;

/// Common math constants
pub mod consts {
    pub const PI: f32 = core::f32::consts::PI;
    pub const TAU: f32 = PI * 2.0;
    pub const FRAC_PI_2: f32 = PI / 2.0;
    pub const FRAC_PI_4: f32 = PI / 4.0;
    pub const DEG_TO_RAD: f32 = PI / 180.0;
    pub const RAD_TO_DEG: f32 = 180.0 / PI;
    pub const EPSILON: f32 = 1e-6;
    /// `sqrt(8)`, the projection factor that carries a shadow edge past the
    /// light's circle from any angle.
    pub const SQRT_8: f32 = 2.828_427_1;
}

/// Convert degrees to radians
#[inline]
pub fn radians(degrees: f32) -> f32 {
    degrees * consts::DEG_TO_RAD
}

/// Convert radians to degrees
#[inline]
pub fn degrees(radians: f32) -> f32 {
    radians * consts::RAD_TO_DEG
}

/// Linear interpolation
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Clamp value between min and max
#[inline]
pub fn clamp(value: f32, min: f32, max: f32) -> f32 {
    if value < min { min }
    else if value > max { max }
    else { value }
}

/// Smooth step interpolation
#[inline]
pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = clamp((x - edge0) / (edge1 - edge0), 0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Wrap an angle into `(-PI, PI]`
#[inline]
pub fn wrap_angle(angle: f32) -> f32 {
    let mut a = angle % consts::TAU;
    if a <= -consts::PI {
        a += consts::TAU;
    } else if a > consts::PI {
        a -= consts::TAU;
    }
    a
}

/// Fractional part, always in `[0, 1)`
#[inline]
pub fn fract(x: f32) -> f32 {
    x - x.floor()
}

pub mod prelude {
    pub use crate::vector::Vec2;
    pub use crate::color::Color;
    pub use crate::rect::Rect;
    pub use crate::consts::{TAU, SQRT_8};
    pub use crate::{radians, degrees, lerp, clamp, smoothstep, wrap_angle, fract};
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_sqrt_8_constant() {
        assert_relative_eq!(consts::SQRT_8, 8.0_f32.sqrt(), epsilon = 1e-6);
    }

    #[test]
    fn test_wrap_angle() {
        assert_relative_eq!(wrap_angle(consts::TAU + 0.5), 0.5, epsilon = 1e-5);
        assert_relative_eq!(wrap_angle(-consts::PI - 0.25), consts::PI - 0.25, epsilon = 1e-5);
        assert_relative_eq!(wrap_angle(consts::PI), consts::PI, epsilon = 1e-6);
    }

    #[test]
    fn test_smoothstep_edges() {
        assert_eq!(smoothstep(0.0, 1.0, -1.0), 0.0);
        assert_eq!(smoothstep(0.0, 1.0, 2.0), 1.0);
        assert_relative_eq!(smoothstep(0.0, 1.0, 0.5), 0.5);
    }
}
