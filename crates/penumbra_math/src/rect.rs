//! Axis-aligned rectangles for bounds, clipping and broad-phase queries

use crate::vector::Vec2;

/// Axis-aligned rectangle, `min` inclusive and `max` the far corner
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rect {
    pub min: Vec2,
    pub max: Vec2,
}

impl Rect {
    /// Empty (inverted) rectangle, the identity for `union`
    pub const EMPTY: Self = Self {
        min: Vec2::new(f32::MAX, f32::MAX),
        max: Vec2::new(f32::MIN, f32::MIN),
    };

    /// Create from min and max corners
    #[inline]
    pub const fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    /// Create from a top-left position and a size
    #[inline]
    pub fn from_position_size(position: Vec2, size: Vec2) -> Self {
        Self::new(position, position + size)
    }

    /// Create from center and half-extents
    #[inline]
    pub fn from_center_half_extents(center: Vec2, half_extents: Vec2) -> Self {
        Self::new(center - half_extents, center + half_extents)
    }

    /// Square of side `2 * half` around `center`
    #[inline]
    pub fn square(center: Vec2, half: f32) -> Self {
        Self::from_center_half_extents(center, Vec2::splat(half))
    }

    #[inline]
    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    #[inline]
    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    #[inline]
    pub fn size(&self) -> Vec2 {
        self.max - self.min
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    /// Inverted or zero-area
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.min.x >= self.max.x || self.min.y >= self.max.y
    }

    /// Check if a point lies inside or on the boundary
    #[inline]
    pub fn contains_point(&self, point: Vec2) -> bool {
        point.x >= self.min.x && point.x <= self.max.x &&
        point.y >= self.min.y && point.y <= self.max.y
    }

    /// Check if another rectangle is fully contained
    #[inline]
    pub fn contains_rect(&self, other: &Rect) -> bool {
        self.contains_point(other.min) && self.contains_point(other.max)
    }

    /// Check if two rectangles overlap or touch
    #[inline]
    pub fn intersects(&self, other: &Rect) -> bool {
        self.min.x <= other.max.x && self.max.x >= other.min.x &&
        self.min.y <= other.max.y && self.max.y >= other.min.y
    }

    /// Clip against another rectangle, `None` when the overlap has no area
    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        let clipped = Rect::new(self.min.max(other.min), self.max.min(other.max));
        if clipped.is_empty() { None } else { Some(clipped) }
    }

    /// Distance from `point` to the nearest point of the rectangle, zero inside
    pub fn distance_to_point(&self, point: Vec2) -> f32 {
        let outside = (self.min - point).max(point - self.max).max(Vec2::ZERO);
        outside.length()
    }

    /// Smallest rectangle containing both
    #[inline]
    pub fn union(&self, other: &Rect) -> Self {
        Self::new(self.min.min(other.min), self.max.max(other.max))
    }

    /// Grow uniformly in all directions
    #[inline]
    pub fn expand(&self, amount: f32) -> Self {
        Self::new(self.min - Vec2::splat(amount), self.max + Vec2::splat(amount))
    }

    /// Move by an offset
    #[inline]
    pub fn translate(&self, offset: Vec2) -> Self {
        Self::new(self.min + offset, self.max + offset)
    }

    /// Corners in winding order: top-left, top-right, bottom-right, bottom-left
    /// (y grows downward)
    pub fn corners(&self) -> [Vec2; 4] {
        [
            self.min,
            Vec2::new(self.max.x, self.min.y),
            self.max,
            Vec2::new(self.min.x, self.max.y),
        ]
    }
}

impl Default for Rect {
    fn default() -> Self {
        Self::EMPTY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_contains_point() {
        let r = Rect::new(Vec2::ZERO, Vec2::splat(16.0));
        assert!(r.contains_point(Vec2::new(8.0, 8.0)));
        assert!(r.contains_point(Vec2::new(16.0, 0.0)));
        assert!(!r.contains_point(Vec2::new(16.5, 8.0)));
    }

    #[test]
    fn test_rect_intersection() {
        let a = Rect::new(Vec2::ZERO, Vec2::splat(16.0));
        let b = Rect::square(Vec2::splat(40.0), 30.0);
        let clipped = a.intersection(&b).unwrap();
        assert_eq!(clipped, Rect::new(Vec2::splat(10.0), Vec2::splat(16.0)));

        let far = Rect::new(Vec2::splat(100.0), Vec2::splat(110.0));
        assert!(a.intersection(&far).is_none());
    }

    #[test]
    fn test_rect_touching_has_no_area() {
        let a = Rect::new(Vec2::ZERO, Vec2::splat(10.0));
        let b = Rect::new(Vec2::new(10.0, 0.0), Vec2::new(20.0, 10.0));
        assert!(a.intersects(&b));
        assert!(a.intersection(&b).is_none());
    }

    #[test]
    fn test_rect_distance_to_point() {
        let r = Rect::new(Vec2::ZERO, Vec2::splat(10.0));
        assert_eq!(r.distance_to_point(Vec2::splat(5.0)), 0.0);
        assert_eq!(r.distance_to_point(Vec2::new(13.0, 5.0)), 3.0);
        assert_eq!(r.distance_to_point(Vec2::new(13.0, 14.0)), 5.0);
    }

    #[test]
    fn test_rect_union_with_empty() {
        let a = Rect::new(Vec2::ONE, Vec2::splat(2.0));
        assert_eq!(Rect::EMPTY.union(&a), a);
    }
}
