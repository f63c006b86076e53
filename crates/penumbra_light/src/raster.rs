//! Scanline coverage helpers
//!
//! Coverage is sampled at texel centres. Callers decide what a covered texel
//! receives, so the same walkers serve the channel-masked shadow target and
//! the binary occlusion bitmap.

use penumbra_math::{Rect, Vec2};

/// Half-open texel rectangle `[x0, x1) x [y0, y1)`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PixelRect {
    pub x0: i32,
    pub y0: i32,
    pub x1: i32,
    pub y1: i32,
}

impl PixelRect {
    pub const fn new(x0: i32, y0: i32, x1: i32, y1: i32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    /// Whole texture of `width x height`
    pub fn of_size(width: u32, height: u32) -> Self {
        Self::new(0, 0, width as i32, height as i32)
    }

    /// Texels whose centres fall inside `rect`
    pub fn covering(rect: &Rect) -> Self {
        Self::new(
            (rect.min.x - 0.5).ceil() as i32,
            (rect.min.y - 0.5).ceil() as i32,
            (rect.max.x - 0.5).ceil() as i32,
            (rect.max.y - 0.5).ceil() as i32,
        )
    }

    pub fn intersect(&self, other: &PixelRect) -> PixelRect {
        PixelRect::new(
            self.x0.max(other.x0),
            self.y0.max(other.y0),
            self.x1.min(other.x1),
            self.y1.min(other.y1),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.x0 >= self.x1 || self.y0 >= self.y1
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.x0 && x < self.x1 && y >= self.y0 && y < self.y1
    }

    pub fn area(&self) -> u64 {
        if self.is_empty() {
            0
        } else {
            (self.x1 - self.x0) as u64 * (self.y1 - self.y0) as u64
        }
    }
}

#[inline]
fn texel_center(x: i32, y: i32) -> Vec2 {
    Vec2::new(x as f32 + 0.5, y as f32 + 0.5)
}

/// Visit every texel inside `clip` whose centre lies in the triangle.
/// Either winding is accepted; degenerate triangles cover nothing.
pub fn for_each_in_triangle(tri: [Vec2; 3], clip: &PixelRect, mut visit: impl FnMut(i32, i32)) {
    let [a, b, c] = tri;
    let area = (b - a).perp_dot(c - a);
    if area.abs() < 1e-6 {
        return;
    }

    let min = a.min(b).min(c);
    let max = a.max(b).max(c);
    let bounds = PixelRect::covering(&Rect::new(min, max)).intersect(clip);
    if bounds.is_empty() {
        return;
    }

    let sign = area.signum();
    for y in bounds.y0..bounds.y1 {
        for x in bounds.x0..bounds.x1 {
            let p = texel_center(x, y);
            let w0 = (b - a).perp_dot(p - a) * sign;
            let w1 = (c - b).perp_dot(p - b) * sign;
            let w2 = (a - c).perp_dot(p - c) * sign;
            if w0 >= 0.0 && w1 >= 0.0 && w2 >= 0.0 {
                visit(x, y);
            }
        }
    }
}

/// Visit every texel inside `clip` whose centre lies in `rect`
pub fn for_each_in_rect(rect: &Rect, clip: &PixelRect, mut visit: impl FnMut(i32, i32)) {
    let bounds = PixelRect::covering(rect).intersect(clip);
    for y in bounds.y0..bounds.y1 {
        for x in bounds.x0..bounds.x1 {
            visit(x, y);
        }
    }
}

/// Visit every texel inside `clip` whose centre lies within `radius` of `center`
pub fn for_each_in_disc(center: Vec2, radius: f32, clip: &PixelRect, mut visit: impl FnMut(i32, i32)) {
    if radius <= 0.0 {
        return;
    }
    let r2 = radius * radius;
    let bounds = PixelRect::covering(&Rect::square(center, radius)).intersect(clip);
    for y in bounds.y0..bounds.y1 {
        for x in bounds.x0..bounds.x1 {
            if texel_center(x, y).distance_squared(center) <= r2 {
                visit(x, y);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count_triangle(tri: [Vec2; 3], clip: PixelRect) -> usize {
        let mut n = 0;
        for_each_in_triangle(tri, &clip, |_, _| n += 1);
        n
    }

    #[test]
    fn test_covering_rect() {
        let r = PixelRect::covering(&Rect::new(Vec2::new(1.0, 2.0), Vec2::new(4.0, 6.0)));
        assert_eq!(r, PixelRect::new(1, 2, 4, 6));
        assert_eq!(r.area(), 12);
    }

    #[test]
    fn test_triangle_winding_independent() {
        let clip = PixelRect::of_size(16, 16);
        let a = Vec2::new(0.0, 0.0);
        let b = Vec2::new(8.0, 0.0);
        let c = Vec2::new(0.0, 8.0);
        let cw = count_triangle([a, b, c], clip);
        let ccw = count_triangle([a, c, b], clip);
        assert_eq!(cw, ccw);
        // Texels with x + y <= 7
        assert_eq!(cw, 36);
    }

    #[test]
    fn test_triangle_clipped_by_scissor() {
        let tri = [Vec2::new(0.0, 0.0), Vec2::new(64.0, 0.0), Vec2::new(0.0, 64.0)];
        let mut max_x = 0;
        for_each_in_triangle(tri, &PixelRect::new(0, 0, 4, 4), |x, _| max_x = max_x.max(x));
        assert_eq!(max_x, 3);
    }

    #[test]
    fn test_degenerate_triangle_covers_nothing() {
        let tri = [Vec2::ZERO, Vec2::new(4.0, 4.0), Vec2::new(8.0, 8.0)];
        assert_eq!(count_triangle(tri, PixelRect::of_size(16, 16)), 0);
    }

    #[test]
    fn test_disc_coverage() {
        let mut n = 0;
        for_each_in_disc(Vec2::new(8.0, 8.0), 1.0, &PixelRect::of_size(16, 16), |_, _| n += 1);
        // Centres (7.5|8.5, 7.5|8.5) are within 1.0 of (8, 8)
        assert_eq!(n, 4);
    }
}
