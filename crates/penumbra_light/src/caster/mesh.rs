//! Shadow geometry buffers
//!
//! Vertices carry the packing mask of the light that emitted them so one
//! shared vertex/index buffer can be rasterized into the packed target in a
//! single submission.

use penumbra_math::{wrap_angle, Rect, Vec2};

use super::silhouette::{project_point, Edge};
use crate::texture::Rgba;

/// Upload-ready shadow vertex
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ShadowVertex {
    /// Position in packed-target texels (world space while staged)
    pub position: [f32; 2],
    /// One-hot channel mask
    pub mask: Rgba,
}

impl ShadowVertex {
    /// Size in bytes
    pub const SIZE: usize = core::mem::size_of::<Self>();

    pub fn new(position: Vec2, mask: Rgba) -> Self {
        Self {
            position: position.to_array(),
            mask,
        }
    }

    pub fn position(&self) -> Vec2 {
        Vec2::from(self.position)
    }
}

/// Indexed triangle list
#[derive(Clone, Debug, Default)]
pub struct ShadowMesh {
    vertices: Vec<ShadowVertex>,
    indices: Vec<u32>,
}

impl ShadowMesh {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-allocate for the configured ceilings
    pub fn with_capacity(vertices: usize, indices: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(vertices),
            indices: Vec::with_capacity(indices),
        }
    }

    pub fn clear(&mut self) {
        self.vertices.clear();
        self.indices.clear();
    }

    pub fn vertices(&self) -> &[ShadowVertex] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    fn push_vertex(&mut self, position: Vec2) -> u32 {
        let index = self.vertices.len() as u32;
        self.vertices.push(ShadowVertex::new(position, [0.0; 4]));
        index
    }

    fn push_triangle(&mut self, a: u32, b: u32, c: u32) {
        self.indices.extend_from_slice(&[a, b, c]);
    }

    /// Extrude one silhouette edge away from `light`.
    ///
    /// Both endpoints are projected to `radius * sqrt(8)` and the angular
    /// sweep between the two projected rays is split into `steps` segments.
    /// The fan is anchored at the edge midpoint: one triangle per segment,
    /// plus two closing triangles back to the original endpoints.
    pub fn push_edge_volume(&mut self, edge: &Edge, light: Vec2, radius: f32, steps: u32) {
        let steps = steps.max(1);
        let qa = project_point(edge.a, light, radius);
        let qb = project_point(edge.b, light, radius);

        let (ra, rb) = (qa.distance(light), qb.distance(light));
        let start = (qa - light).angle();
        let sweep = wrap_angle((qb - light).angle() - start);

        let a = self.push_vertex(edge.a);
        let b = self.push_vertex(edge.b);
        let mid = self.push_vertex(edge.midpoint());

        let first_arc = self.vertices.len() as u32;
        for k in 0..=steps {
            let t = k as f32 / steps as f32;
            let q = if k == 0 {
                qa
            } else if k == steps {
                qb
            } else {
                light + Vec2::from_angle(start + sweep * t) * (ra + (rb - ra) * t)
            };
            self.push_vertex(q);
        }

        for k in 0..steps {
            self.push_triangle(mid, first_arc + k, first_arc + k + 1);
        }
        self.push_triangle(a, first_arc, mid);
        self.push_triangle(b, mid, first_arc + steps);
    }

    /// Solid quad over `rect`
    pub fn push_rect(&mut self, rect: &Rect) {
        let [c0, c1, c2, c3] = rect.corners();
        let base = self.push_vertex(c0);
        self.push_vertex(c1);
        self.push_vertex(c2);
        self.push_vertex(c3);
        self.push_triangle(base, base + 1, base + 2);
        self.push_triangle(base, base + 2, base + 3);
    }

    /// Whether `other` can be appended without exceeding the ceilings
    pub fn fits(&self, other: &ShadowMesh, max_vertices: usize, max_indices: usize) -> bool {
        self.vertices.len() + other.vertices.len() <= max_vertices
            && self.indices.len() + other.indices.len() <= max_indices
    }

    /// Append `other` translated by `offset` and tagged with `mask`.
    /// Returns the first index of the appended range.
    pub fn append_transformed(&mut self, other: &ShadowMesh, offset: Vec2, mask: Rgba) -> u32 {
        let base = self.vertices.len() as u32;
        let first_index = self.indices.len() as u32;
        self.vertices.extend(
            other
                .vertices
                .iter()
                .map(|v| ShadowVertex::new(v.position() + offset, mask)),
        );
        self.indices.extend(other.indices.iter().map(|i| i + base));
        first_index
    }

    /// Triangle corners for `count` indices starting at `first`
    pub fn triangles(&self, first: u32, count: u32) -> impl Iterator<Item = [Vec2; 3]> + '_ {
        let start = (first as usize).min(self.indices.len());
        let end = (start + count as usize).min(self.indices.len());
        self.indices[start..end].chunks_exact(3).map(|tri| {
            [
                self.vertices[tri[0] as usize].position(),
                self.vertices[tri[1] as usize].position(),
                self.vertices[tri[2] as usize].position(),
            ]
        })
    }

    /// Raw vertex bytes for upload
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    /// Raw index bytes for upload
    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::caster::silhouette::rect_edges;
    use approx::assert_relative_eq;
    use penumbra_math::consts::SQRT_8;

    fn right_edge() -> Edge {
        rect_edges(&Rect::new(Vec2::new(10.0, 10.0), Vec2::new(16.0, 16.0)))[1]
    }

    #[test]
    fn test_edge_volume_counts() {
        let mut mesh = ShadowMesh::new();
        mesh.push_edge_volume(&right_edge(), Vec2::new(40.0, 40.0), 30.0, 12);
        assert_eq!(mesh.vertex_count(), 3 + 13);
        assert_eq!(mesh.triangle_count(), 12 + 2);
    }

    #[test]
    fn test_arc_endpoints_are_projections() {
        let light = Vec2::new(40.0, 40.0);
        let edge = right_edge();
        let mut mesh = ShadowMesh::new();
        mesh.push_edge_volume(&edge, light, 30.0, 12);

        let arc = &mesh.vertices()[3..];
        let first = arc[0].position();
        let last = arc[12].position();
        assert_relative_eq!(first.distance(edge.a), 30.0 * SQRT_8, epsilon = 1e-3);
        assert_relative_eq!(last.distance(edge.b), 30.0 * SQRT_8, epsilon = 1e-3);
    }

    #[test]
    fn test_arc_stays_outside_light_bounds() {
        let light = Vec2::new(40.0, 40.0);
        let mut mesh = ShadowMesh::new();
        mesh.push_edge_volume(&right_edge(), light, 30.0, 12);
        let bounds = Rect::square(light, 30.0);
        for v in &mesh.vertices()[3..] {
            assert!(!bounds.contains_point(v.position()));
        }
    }

    #[test]
    fn test_rect_fill() {
        let mut mesh = ShadowMesh::new();
        mesh.push_rect(&Rect::new(Vec2::ZERO, Vec2::splat(4.0)));
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.index_count(), 6);
    }

    #[test]
    fn test_append_transformed_rebases() {
        let mut staged = ShadowMesh::new();
        staged.push_rect(&Rect::new(Vec2::ZERO, Vec2::splat(4.0)));

        let mut mesh = ShadowMesh::new();
        mesh.push_rect(&Rect::new(Vec2::ZERO, Vec2::splat(1.0)));
        let first = mesh.append_transformed(&staged, Vec2::new(100.0, 0.0), [0.0, 1.0, 0.0, 0.0]);

        assert_eq!(first, 6);
        assert_eq!(mesh.indices()[6], 4);
        assert_eq!(mesh.vertices()[4].position(), Vec2::new(100.0, 0.0));
        assert_eq!(mesh.vertices()[4].mask, [0.0, 1.0, 0.0, 0.0]);
        assert_eq!(mesh.triangles(first, 6).count(), 2);
        assert!(!mesh.fits(&staged, 8, 100));
        assert!(mesh.fits(&staged, 12, 18));
    }

    #[test]
    fn test_vertex_layout() {
        assert_eq!(ShadowVertex::SIZE, 24);
        let mut mesh = ShadowMesh::new();
        mesh.push_rect(&Rect::new(Vec2::ZERO, Vec2::ONE));
        assert_eq!(mesh.vertex_bytes().len(), 4 * 24);
        assert_eq!(mesh.index_bytes().len(), 6 * 4);
    }
}
