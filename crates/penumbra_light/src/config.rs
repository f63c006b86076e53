//! Lighting Configuration
//!
//! Plain settable values for both lighting strategies, with serde support
//! for hot-reload.

use penumbra_math::Color;
use serde::{Deserialize, Serialize};

use crate::cells::CHANNEL_COUNT;
use crate::error::{LightingError, Result};

/// Which lighting algorithm drives the frame
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LightingStrategy {
    /// CPU-built shadow volumes packed into a shared, channel-masked target
    #[default]
    ShadowVolumes,
    /// Occlusion bitmap, jump-flood distance field and sphere tracing
    DistanceField,
}

/// What happens when a light sits inside an occluder it would be shadowed by
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum InBoundsBehavior {
    /// Cast normally; an enclosing occluder has no outward-facing edge and
    /// contributes nothing
    #[default]
    Ignore,
    /// Skip the enclosing occluder for this light, the light still renders
    Exclude,
    /// Skip the whole light this frame
    PutOut,
}

/// Lightmap resolve for the distance-field strategy
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RayMarchMode {
    /// Per-light soft shadows traced toward each light
    #[default]
    Shadows,
    /// Emitters rasterized into the field, rays gathered per pixel
    GlobalIllumination,
}

/// Global lighting configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightingConfig {
    /// Active algorithm
    pub strategy: LightingStrategy,

    /// Largest light radius in pixels; sizes the packing cells and the
    /// occlusion margin
    pub max_radius: u32,

    /// Packed shadow target width
    pub target_width: u32,

    /// Packed shadow target height
    pub target_height: u32,

    /// Angular subdivisions between a silhouette edge's projected rays
    pub sweep_steps: u32,

    /// Policy for lights enclosed by an occluder
    pub in_bounds_behavior: InBoundsBehavior,

    /// Occluders considered per light; the rest are dropped and counted
    pub max_occluders_per_light: usize,

    /// Shadow vertex scratch ceiling
    pub max_vertices: usize,

    /// Shadow index scratch ceiling
    pub max_indices: usize,

    /// Distance-field lightmap resolve
    pub ray_march_mode: RayMarchMode,

    /// Rays gathered per pixel in global-illumination mode
    pub rays_per_pixel: u32,

    /// Sphere-tracing step limit
    pub max_steps: u32,

    /// Sampled distance at which a ray counts as touching a surface
    pub surface_distance: f32,

    /// Longest distance a ray may travel
    pub max_distance: f32,

    /// Penumbra sharpness for soft shadows (higher = harder)
    pub shadow_softness: f32,

    /// Scale applied to the displacement map when bending rays
    pub refraction_strength: f32,

    /// Radius of the emitter disc rasterized per light in GI mode
    pub gi_emitter_radius: f32,

    /// Ceiling on the occlusion bitmap side length
    pub max_occlusion_side: u32,

    /// Initial lightmap colour before any light is added
    pub ambient: Color,
}

impl Default for LightingConfig {
    fn default() -> Self {
        Self {
            strategy: LightingStrategy::ShadowVolumes,
            max_radius: 128,
            target_width: 1024,
            target_height: 1024,
            sweep_steps: 12,
            in_bounds_behavior: InBoundsBehavior::Ignore,
            max_occluders_per_light: 64,
            max_vertices: 65_536,
            max_indices: 196_608,
            ray_march_mode: RayMarchMode::Shadows,
            rays_per_pixel: 8,
            max_steps: 64,
            surface_distance: 0.5,
            max_distance: 1024.0,
            shadow_softness: 8.0,
            refraction_strength: 0.0,
            gi_emitter_radius: 4.0,
            max_occlusion_side: 4096,
            ambient: Color::rgb(0.05, 0.05, 0.08),
        }
    }
}

impl LightingConfig {
    /// CPU shadow-volume configuration
    pub fn shadow_volumes() -> Self {
        Self::default()
    }

    /// Distance-field soft-shadow configuration
    pub fn distance_field() -> Self {
        Self {
            strategy: LightingStrategy::DistanceField,
            ..Default::default()
        }
    }

    /// Distance-field global-illumination configuration
    pub fn global_illumination() -> Self {
        Self {
            strategy: LightingStrategy::DistanceField,
            ray_march_mode: RayMarchMode::GlobalIllumination,
            rays_per_pixel: 16,
            ..Default::default()
        }
    }

    /// Set the active strategy
    pub fn with_strategy(mut self, strategy: LightingStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Set the maximum light radius
    pub fn with_max_radius(mut self, max_radius: u32) -> Self {
        self.max_radius = max_radius;
        self
    }

    /// Set the packed shadow target size
    pub fn with_target_size(mut self, width: u32, height: u32) -> Self {
        self.target_width = width;
        self.target_height = height;
        self
    }

    /// Set the enclosed-light policy
    pub fn with_in_bounds_behavior(mut self, behavior: InBoundsBehavior) -> Self {
        self.in_bounds_behavior = behavior;
        self
    }

    /// Set the ambient colour
    pub fn with_ambient(mut self, ambient: Color) -> Self {
        self.ambient = ambient;
        self
    }

    /// Side length of one packing cell
    pub fn cell_size(&self) -> u32 {
        self.max_radius.saturating_mul(2)
    }

    /// Cells along the target's width
    pub fn cells_per_row(&self) -> u32 {
        self.target_width / self.cell_size().max(1)
    }

    /// Cells along the target's height
    pub fn cell_rows(&self) -> u32 {
        self.target_height / self.cell_size().max(1)
    }

    /// Lights one frame can hold: every cell times every channel
    pub fn max_lights(&self) -> usize {
        (self.cells_per_row() as usize)
            .saturating_mul(self.cell_rows() as usize)
            .saturating_mul(CHANNEL_COUNT)
    }

    /// Clamp values to valid ranges, failing when no cell fits the target
    pub fn validate(&mut self) -> Result<()> {
        self.max_radius = self.max_radius.max(1);
        self.sweep_steps = self.sweep_steps.clamp(1, 64);
        self.max_occluders_per_light = self.max_occluders_per_light.max(1);
        self.rays_per_pixel = self.rays_per_pixel.clamp(1, 256);
        self.max_steps = self.max_steps.max(1);
        self.surface_distance = self.surface_distance.max(1e-3);
        self.max_distance = self.max_distance.max(self.surface_distance);
        self.shadow_softness = self.shadow_softness.max(0.0);
        self.gi_emitter_radius = self.gi_emitter_radius.max(0.5);
        self.max_occlusion_side = self.max_occlusion_side.max(self.cell_size());

        if self.max_lights() == 0 {
            return Err(LightingError::InvalidConfig(format!(
                "shadow target {}x{} cannot hold a {}px cell",
                self.target_width,
                self.target_height,
                self.cell_size()
            )));
        }
        Ok(())
    }

    /// Serialize for hot-reload
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Restore from hot-reload data
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
