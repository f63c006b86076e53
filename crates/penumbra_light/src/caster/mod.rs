//! CPU Shadow-Volume Caster
//!
//! Builds triangle shadow volumes per light on the CPU and packs every
//! light's geometry into one shared vertex/index buffer. Each light owns a
//! cell of the packed target and one colour channel within it; the frame's
//! geometry is rasterized in a single submission with per-light scissors.
//!
//! # Frame Sequence
//!
//! ```ignore
//! caster.begin_frame();
//! cells.begin_frame();
//! for (i, light) in lights.iter().enumerate() {
//!     caster.cast_light(i, light, scene, &mut cells, &mut stats);
//! }
//! caster.end_frame(&mut shadow_target);
//! ```
//!
//! A light's geometry is staged while its occluders are processed and only
//! committed once every occluder has been examined, so a `PutOut` found on a
//! late occluder discards everything staged for that light.

mod mesh;
mod silhouette;

pub use mesh::{ShadowMesh, ShadowVertex};
pub use silhouette::{project_point, rect_edges, select_silhouette, Edge, Silhouette};

use penumbra_math::Vec2;

use crate::cells::{LightCell, LightCellAllocator};
use crate::config::{InBoundsBehavior, LightingConfig};
use crate::raster::{for_each_in_triangle, PixelRect};
use crate::scene::{LightInstance, LightScene, OccluderInstance};
use crate::stats::LightingStats;
use crate::texture::RgbaTexture;

/// One light's committed range in the shared shadow buffers
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShadowBatch {
    /// Index of the light in the frame's light list
    pub light: usize,
    pub cell: LightCell,
    /// Texels the range may write
    pub scissor: PixelRect,
    /// World position of the light
    pub position: Vec2,
    /// Radius used for casting
    pub radius: f32,
    pub first_index: u32,
    pub index_count: u32,
}

/// Result of casting one light
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CastOutcome {
    /// Geometry committed; the light is composed this frame
    Committed(LightCell),
    /// An enclosing occluder put the light out
    PutOut,
    /// Every cell and channel is taken
    OverCapacity,
    /// The light's geometry did not fit the scratch buffers
    GeometryOverflow,
    /// Zero radius
    Degenerate,
}

impl CastOutcome {
    pub fn is_committed(&self) -> bool {
        matches!(self, CastOutcome::Committed(_))
    }
}

/// Per-frame shadow geometry builder
pub struct ShadowCaster {
    sweep_steps: u32,
    in_bounds_behavior: InBoundsBehavior,
    max_occluders_per_light: usize,
    max_vertices: usize,
    max_indices: usize,
    max_radius: f32,
    mesh: ShadowMesh,
    staged: ShadowMesh,
    batches: Vec<ShadowBatch>,
    occluders: Vec<OccluderInstance>,
}

impl ShadowCaster {
    pub fn new(config: &LightingConfig) -> Self {
        Self {
            sweep_steps: config.sweep_steps,
            in_bounds_behavior: config.in_bounds_behavior,
            max_occluders_per_light: config.max_occluders_per_light,
            max_vertices: config.max_vertices,
            max_indices: config.max_indices,
            max_radius: config.max_radius as f32,
            mesh: ShadowMesh::with_capacity(config.max_vertices, config.max_indices),
            staged: ShadowMesh::new(),
            batches: Vec::with_capacity(config.max_lights()),
            occluders: Vec::new(),
        }
    }

    /// Reset cursors for a new frame
    pub fn begin_frame(&mut self) {
        self.mesh.clear();
        self.staged.clear();
        self.batches.clear();
    }

    /// Radius a light casts and composes with; never wider than its cell
    pub fn effective_radius(&self, light: &LightInstance) -> f32 {
        light.radius().min(self.max_radius)
    }

    /// Build, stage and commit the shadow geometry for one light
    pub fn cast_light(
        &mut self,
        light_index: usize,
        light: &LightInstance,
        scene: &dyn LightScene,
        cells: &mut LightCellAllocator,
        stats: &mut LightingStats,
    ) -> CastOutcome {
        let radius = self.effective_radius(light);
        if radius <= 0.0 {
            stats.lights_degenerate += 1;
            return CastOutcome::Degenerate;
        }
        if cells.is_full() {
            stats.lights_over_capacity += 1;
            log::debug!("Light {} skipped: packed target full", light_index);
            return CastOutcome::OverCapacity;
        }

        let position = light.position();
        if !self.stage_light(position, radius, scene, stats) {
            self.staged.clear();
            stats.lights_put_out += 1;
            log::debug!("Light {} put out by an enclosing occluder", light_index);
            return CastOutcome::PutOut;
        }

        if !self.mesh.fits(&self.staged, self.max_vertices, self.max_indices) {
            stats.lights_geometry_overflow += 1;
            log::debug!(
                "Light {} dropped: {} vertices / {} indices do not fit",
                light_index,
                self.staged.vertex_count(),
                self.staged.index_count()
            );
            self.staged.clear();
            return CastOutcome::GeometryOverflow;
        }

        let Some(cell) = cells.allocate(light_index) else {
            stats.lights_over_capacity += 1;
            self.staged.clear();
            return CastOutcome::OverCapacity;
        };

        let center = cells.cell_center(&cell);
        let first_index = self.mesh.append_transformed(&self.staged, center - position, cell.mask());
        let index_count = self.staged.index_count() as u32;
        self.batches.push(ShadowBatch {
            light: light_index,
            cell,
            scissor: cells.cell_rect(&cell),
            position,
            radius,
            first_index,
            index_count,
        });

        stats.vertex_count += self.staged.vertex_count() as u32;
        stats.index_count += index_count;
        stats.triangle_count += self.staged.triangle_count() as u32;
        self.staged.clear();

        CastOutcome::Committed(cell)
    }

    /// Stage world-space geometry for every occluder around the light.
    /// Returns false when the light is put out.
    fn stage_light(
        &mut self,
        position: Vec2,
        radius: f32,
        scene: &dyn LightScene,
        stats: &mut LightingStats,
    ) -> bool {
        let bounds = penumbra_math::Rect::square(position, radius);

        self.occluders.clear();
        scene.query_occluders(&bounds, &mut self.occluders);
        self.occluders.sort_by(|a, b| {
            let da = a.bounds.center().distance_squared(position);
            let db = b.bounds.center().distance_squared(position);
            da.total_cmp(&db).then(a.entity.cmp(&b.entity))
        });
        if self.occluders.len() > self.max_occluders_per_light {
            stats.occluders_over_limit += (self.occluders.len() - self.max_occluders_per_light) as u32;
            self.occluders.truncate(self.max_occluders_per_light);
        }

        self.staged.clear();
        for occluder in &self.occluders {
            stats.occluders_considered += 1;
            if !occluder.occluder.casts_shadow_volume() {
                stats.occluders_unsupported += 1;
                continue;
            }
            let Some(clipped) = occluder.bounds.intersection(&bounds) else {
                continue;
            };

            let in_bounds = clipped.contains_point(position);
            if in_bounds {
                match self.in_bounds_behavior {
                    // No edge faces a light inside the rectangle and the
                    // body is not filled, so nothing is emitted
                    InBoundsBehavior::Ignore => {}
                    InBoundsBehavior::Exclude => {
                        stats.occluders_excluded += 1;
                        continue;
                    }
                    InBoundsBehavior::PutOut => return false,
                }
            }

            let silhouette = select_silhouette(&clipped, position);
            for edge in silhouette.edges() {
                self.staged.push_edge_volume(edge, position, radius, self.sweep_steps);
                stats.edges_projected += 1;
            }
            if !in_bounds {
                self.staged.push_rect(&clipped);
            }
        }
        true
    }

    /// Rasterize the frame's geometry into the packed target.
    ///
    /// The target is cleared first; each batch writes only inside its
    /// cell, and channels combine with max blending.
    pub fn end_frame(&self, target: &mut RgbaTexture) {
        target.fill([0.0; 4]);
        let bounds = PixelRect::of_size(target.width(), target.height());

        for batch in &self.batches {
            let clip = batch.scissor.intersect(&bounds);
            let mask = batch.cell.mask();
            for tri in self.mesh.triangles(batch.first_index, batch.index_count) {
                for_each_in_triangle(tri, &clip, |x, y| {
                    let texel = target.get_mut(x as u32, y as u32);
                    for c in 0..4 {
                        texel[c] = texel[c].max(mask[c]);
                    }
                });
            }
        }

        log::debug!(
            "Shadow submission: {} lights, {} vertices, {} indices",
            self.batches.len(),
            self.mesh.vertex_count(),
            self.mesh.index_count()
        );
    }

    /// Committed ranges this frame, in commit order
    pub fn batches(&self) -> &[ShadowBatch] {
        &self.batches
    }

    /// Shared geometry this frame
    pub fn mesh(&self) -> &ShadowMesh {
        &self.mesh
    }
}
