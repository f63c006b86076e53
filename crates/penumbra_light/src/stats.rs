//! Lighting Statistics
//!
//! Per-frame counters for both strategies. Every capacity clamp in the
//! pipeline increments a counter here instead of failing the frame.
//!
//! # Example
//!
//! ```ignore
//! let stats = sequencer.context().stats();
//! if stats.has_drops() {
//!     println!("{}", stats.to_json()?);
//! }
//! ```

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Frame lighting statistics
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LightingStats {
    // === Lights ===
    /// Lights returned by the scene
    pub lights_collected: u32,

    /// Lights that contributed to the lightmap
    pub lights_rendered: u32,

    /// Lights whose bounds miss the view
    pub lights_culled: u32,

    /// Lights beyond the packed target's capacity
    pub lights_over_capacity: u32,

    /// Lights put out by an enclosing occluder
    pub lights_put_out: u32,

    /// Lights whose shadow geometry did not fit the scratch buffers
    pub lights_geometry_overflow: u32,

    /// Lights with a zero radius after flooring
    pub lights_degenerate: u32,

    /// Bloom points added
    pub bloom_points: u32,

    // === Occluders ===
    /// Occluder/light pairs examined
    pub occluders_considered: u32,

    /// Occluders beyond the per-light limit
    pub occluders_over_limit: u32,

    /// Occluders whose mode has no shadow-volume path
    pub occluders_unsupported: u32,

    /// Occluders skipped because they enclosed the light
    pub occluders_excluded: u32,

    // === Geometry ===
    /// Shadow vertices emitted
    pub vertex_count: u32,

    /// Shadow indices emitted
    pub index_count: u32,

    /// Shadow triangles emitted
    pub triangle_count: u32,

    /// Silhouette edges extruded
    pub edges_projected: u32,

    // === Distance field ===
    /// Occlusion bitmap size
    pub occlusion_size: (u32, u32),

    /// Occluder texels written
    pub occlusion_texels: u32,

    /// Frames where the bitmap hit its size ceiling
    pub occlusion_clamped: bool,

    /// Jump-flood rounds executed
    pub jump_flood_rounds: u32,

    /// Rays traced
    pub rays_traced: u64,

    /// Sphere-tracing steps taken over all rays
    pub march_steps: u64,

    /// Rays that ran out of steps before resolving
    pub rays_exhausted: u64,

    // === Passes ===
    /// Passes executed this frame
    pub passes_run: u32,
}

impl LightingStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear every counter for a new frame
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Lights and occluders dropped by any limit
    pub fn dropped_total(&self) -> u32 {
        self.lights_over_capacity
            + self.lights_geometry_overflow
            + self.occluders_over_limit
            + self.occluders_unsupported
    }

    /// Whether any capacity limit clipped this frame
    pub fn has_drops(&self) -> bool {
        self.dropped_total() > 0 || self.occlusion_clamped
    }

    /// Average sphere-tracing steps per ray
    pub fn average_march_steps(&self) -> f32 {
        if self.rays_traced == 0 {
            0.0
        } else {
            self.march_steps as f32 / self.rays_traced as f32
        }
    }

    /// Emit one warning summarizing this frame's drops
    pub fn log_drops(&self) {
        if !self.has_drops() {
            return;
        }
        log::warn!(
            "Lighting limits hit: {} lights over capacity, {} geometry overflow, \
             {} occluders over limit, {} unsupported occluders, occlusion clamped: {}",
            self.lights_over_capacity,
            self.lights_geometry_overflow,
            self.occluders_over_limit,
            self.occluders_unsupported,
            self.occlusion_clamped
        );
    }

    /// One-line summary for overlays
    pub fn summary(&self) -> String {
        format!(
            "lights {}/{} | verts {} | idx {} | rays {} ({:.1} steps) | dropped {}",
            self.lights_rendered,
            self.lights_collected,
            self.vertex_count,
            self.index_count,
            self.rays_traced,
            self.average_march_steps(),
            self.dropped_total()
        )
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reset_clears_counters() {
        let mut stats = LightingStats::new();
        stats.lights_collected = 10;
        stats.occlusion_clamped = true;
        stats.reset();
        assert_eq!(stats, LightingStats::default());
    }

    #[test]
    fn test_drops() {
        let mut stats = LightingStats::new();
        assert!(!stats.has_drops());

        stats.lights_over_capacity = 2;
        stats.occluders_over_limit = 3;
        assert_eq!(stats.dropped_total(), 5);
        assert!(stats.has_drops());
    }

    #[test]
    fn test_put_out_is_not_a_drop() {
        let mut stats = LightingStats::new();
        stats.lights_put_out = 1;
        stats.occluders_excluded = 1;
        assert!(!stats.has_drops());
    }

    #[test]
    fn test_average_steps() {
        let mut stats = LightingStats::new();
        assert_eq!(stats.average_march_steps(), 0.0);
        stats.rays_traced = 4;
        stats.march_steps = 10;
        assert_eq!(stats.average_march_steps(), 2.5);
    }

    #[test]
    fn test_summary_and_json() {
        let mut stats = LightingStats::new();
        stats.lights_collected = 3;
        stats.lights_rendered = 2;
        assert!(stats.summary().starts_with("lights 2/3"));
        assert!(stats.to_json().unwrap().contains("\"lights_rendered\": 2"));
    }
}
