//! Silhouette selection and projection for axis-aligned occluders

use penumbra_math::{consts::SQRT_8, Rect, Vec2};

/// One side of an occluder rectangle
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Edge {
    pub a: Vec2,
    pub b: Vec2,
    /// Outward unit normal
    pub normal: Vec2,
}

impl Edge {
    pub fn midpoint(&self) -> Vec2 {
        self.a.lerp(self.b, 0.5)
    }

    /// Whether `point` lies strictly on the outward side
    pub fn faces(&self, point: Vec2) -> bool {
        (point - self.a).dot(self.normal) > 0.0
    }

    /// Whether `point` projects onto the edge along its normal
    pub fn spans(&self, point: Vec2) -> bool {
        if self.normal.x == 0.0 {
            let (lo, hi) = (self.a.x.min(self.b.x), self.a.x.max(self.b.x));
            point.x >= lo && point.x <= hi
        } else {
            let (lo, hi) = (self.a.y.min(self.b.y), self.a.y.max(self.b.y));
            point.y >= lo && point.y <= hi
        }
    }
}

/// The four edges of `rect`, in order: min-y, max-x, max-y, min-x.
/// Neighbouring entries are perpendicular.
pub fn rect_edges(rect: &Rect) -> [Edge; 4] {
    let [c0, c1, c2, c3] = [
        rect.min,
        Vec2::new(rect.max.x, rect.min.y),
        rect.max,
        Vec2::new(rect.min.x, rect.max.y),
    ];
    [
        Edge { a: c0, b: c1, normal: Vec2::new(0.0, -1.0) },
        Edge { a: c1, b: c2, normal: Vec2::new(1.0, 0.0) },
        Edge { a: c2, b: c3, normal: Vec2::new(0.0, 1.0) },
        Edge { a: c3, b: c0, normal: Vec2::new(-1.0, 0.0) },
    ]
}

/// Up to two casting edges of one occluder
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Silhouette {
    edges: [Option<Edge>; 2],
}

impl Silhouette {
    fn push(&mut self, edge: Edge) {
        if self.edges[0].is_none() {
            self.edges[0] = Some(edge);
        } else {
            self.edges[1] = Some(edge);
        }
    }

    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.iter().flatten()
    }

    pub fn len(&self) -> usize {
        self.edges().count()
    }

    pub fn is_empty(&self) -> bool {
        self.edges[0].is_none()
    }
}

/// Pick the silhouette of `rect` as seen from `light`.
///
/// Edges are ranked by the distance from the light to their midpoints. The
/// nearest edge facing the light casts; when the light lies outside that
/// edge's span, the nearer perpendicular edge casts too if it faces the
/// light. A light inside the rectangle sees no facing edge.
pub fn select_silhouette(rect: &Rect, light: Vec2) -> Silhouette {
    let edges = rect_edges(rect);
    let mut order = [0usize, 1, 2, 3];
    order.sort_by(|&i, &j| {
        let di = edges[i].midpoint().distance_squared(light);
        let dj = edges[j].midpoint().distance_squared(light);
        di.total_cmp(&dj).then(i.cmp(&j))
    });

    let mut silhouette = Silhouette::default();
    let Some(&nearest) = order.iter().find(|&&i| edges[i].faces(light)) else {
        return silhouette;
    };
    silhouette.push(edges[nearest]);

    if !edges[nearest].spans(light) {
        let prev = (nearest + 3) % 4;
        let next = (nearest + 1) % 4;
        let side = if edges[prev].midpoint().distance_squared(light)
            <= edges[next].midpoint().distance_squared(light)
        {
            prev
        } else {
            next
        };
        if edges[side].faces(light) {
            silhouette.push(edges[side]);
        }
    }

    silhouette
}

/// Push `point` away from `light` to `radius * sqrt(8)`, which clears the
/// light's bounding square from any angle
#[inline]
pub fn project_point(point: Vec2, light: Vec2, radius: f32) -> Vec2 {
    point + (point - light).normalize() * (radius * SQRT_8)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn rect(x0: f32, y0: f32, x1: f32, y1: f32) -> Rect {
        Rect::new(Vec2::new(x0, y0), Vec2::new(x1, y1))
    }

    #[test]
    fn test_edges_are_outward() {
        let r = rect(0.0, 0.0, 4.0, 2.0);
        for edge in rect_edges(&r) {
            assert!(edge.faces(r.center() + edge.normal * 10.0));
            assert!(!edge.faces(r.center()));
        }
    }

    #[test]
    fn test_light_in_span_casts_one_edge() {
        let s = select_silhouette(&rect(0.0, 0.0, 16.0, 16.0), Vec2::new(8.0, 40.0));
        assert_eq!(s.len(), 1);
        let edge = s.edges().next().unwrap();
        assert_eq!(edge.normal, Vec2::new(0.0, 1.0));
    }

    #[test]
    fn test_diagonal_light_casts_corner_pair() {
        let s = select_silhouette(&rect(10.0, 10.0, 16.0, 16.0), Vec2::new(40.0, 40.0));
        let edges: Vec<_> = s.edges().copied().collect();
        assert_eq!(edges.len(), 2);
        assert_eq!(edges[0].normal, Vec2::new(1.0, 0.0));
        assert_eq!(edges[1].normal, Vec2::new(0.0, 1.0));
        assert!(edges.iter().all(|e| e.a == Vec2::splat(16.0) || e.b == Vec2::splat(16.0)));
    }

    #[test]
    fn test_light_inside_casts_nothing() {
        let s = select_silhouette(&rect(0.0, 0.0, 16.0, 16.0), Vec2::new(5.0, 5.0));
        assert!(s.is_empty());
    }

    #[test]
    fn test_nearest_midpoint_not_facing() {
        // Tall sliver: the short min-y edge is nearer but faces away
        let s = select_silhouette(&rect(0.0, 0.0, 2.0, 100.0), Vec2::new(-0.1, 3.0));
        let edges: Vec<_> = s.edges().copied().collect();
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].normal, Vec2::new(-1.0, 0.0));
    }

    #[test]
    fn test_projection_distance() {
        let light = Vec2::new(40.0, 40.0);
        let p = project_point(Vec2::splat(16.0), light, 30.0);
        let expected = 16.0 - 30.0 * SQRT_8 / 2f32.sqrt();
        assert_relative_eq!(p.x, expected, epsilon = 1e-3);
        assert_relative_eq!(p.y, expected, epsilon = 1e-3);
        assert_relative_eq!(p.distance(Vec2::splat(16.0)), 30.0 * SQRT_8, epsilon = 1e-3);
    }
}
