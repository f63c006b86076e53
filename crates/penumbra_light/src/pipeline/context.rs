//! Render context shared by the lighting passes
//!
//! Owns every per-frame buffer and target. Resources are sized from the
//! configuration and grow on first use; they are never shrunk.

use penumbra_math::Rect;

use crate::caster::ShadowCaster;
use crate::cells::LightCellAllocator;
use crate::compose::Lightmap;
use crate::config::LightingConfig;
use crate::error::Result;
use crate::scene::{BloomInstance, LightInstance, LightScene, OccluderInstance};
use crate::sdf::{DisplacementMap, DistanceField, JumpFlood, OcclusionMap};
use crate::stats::LightingStats;
use crate::texture::RgbaTexture;

/// A light selected for ray marching this frame
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct MarchedLight {
    /// Index into the frame's light list
    pub light: usize,
    /// Bounds of the occluders enclosing the light; rays pass through them
    pub enclosure: Option<Rect>,
}

/// Buffers and targets for one lighting pipeline
pub struct RenderContext {
    pub(crate) config: LightingConfig,
    pub(crate) view: Rect,
    pub(crate) frame: u64,

    pub(crate) lights: Vec<LightInstance>,
    pub(crate) blooms: Vec<BloomInstance>,
    pub(crate) occluders: Vec<OccluderInstance>,
    pub(crate) marched: Vec<MarchedLight>,

    // Shadow volumes
    pub(crate) cells: LightCellAllocator,
    pub(crate) caster: ShadowCaster,
    pub(crate) shadow_target: RgbaTexture,

    // Distance field
    pub(crate) occlusion: OcclusionMap,
    pub(crate) flood: JumpFlood,
    pub(crate) field: DistanceField,
    pub(crate) displacement: Option<DisplacementMap>,

    pub(crate) lightmap: Lightmap,
    pub(crate) stats: LightingStats,
}

impl RenderContext {
    /// Validate `config` and size the fixed resources
    pub fn new(mut config: LightingConfig) -> Result<Self> {
        config.validate()?;
        log::info!(
            "Lighting context: {:?}, max radius {}, {} lights over {}x{} cells",
            config.strategy,
            config.max_radius,
            config.max_lights(),
            config.cells_per_row(),
            config.cell_rows()
        );

        Ok(Self {
            cells: LightCellAllocator::new(&config),
            caster: ShadowCaster::new(&config),
            shadow_target: RgbaTexture::new(0, 0, [0.0; 4]),
            occlusion: OcclusionMap::new(),
            flood: JumpFlood::new(0, 0),
            field: DistanceField::new(0, 0, Default::default()),
            displacement: None,
            lightmap: Lightmap::new(),
            stats: LightingStats::new(),
            lights: Vec::with_capacity(config.max_lights()),
            blooms: Vec::new(),
            occluders: Vec::new(),
            marched: Vec::with_capacity(config.max_lights()),
            view: Rect::EMPTY,
            frame: 0,
            config,
        })
    }

    /// Reset per-frame state and clear the lightmap to ambient
    pub fn begin_frame(&mut self, view: Rect) {
        self.frame += 1;
        self.view = view;
        self.stats.reset();
        self.lights.clear();
        self.blooms.clear();
        self.occluders.clear();
        self.marched.clear();
        self.lightmap.begin(view, self.config.ambient);
    }

    /// Collect lights touching the view and every bloom point
    pub(crate) fn gather(&mut self, scene: &dyn LightScene) {
        let mut all = Vec::new();
        scene.collect_lights(&mut all);
        self.stats.lights_collected = all.len() as u32;

        for light in all {
            let bounds = Rect::square(light.position(), self.light_radius(&light));
            if bounds.intersects(&self.view) {
                self.lights.push(light);
            } else {
                self.stats.lights_culled += 1;
            }
        }

        scene.collect_bloom_points(&mut self.blooms);
        self.stats.bloom_points = self.blooms.len() as u32;
    }

    /// Radius a light is drawn with; never beyond `max_radius`
    pub fn light_radius(&self, light: &LightInstance) -> f32 {
        light.radius().min(self.config.max_radius as f32)
    }

    pub fn config(&self) -> &LightingConfig {
        &self.config
    }

    /// World rectangle covered by the lightmap
    pub fn view(&self) -> Rect {
        self.view
    }

    /// Frames begun so far
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Lights kept for this frame, in scene order
    pub fn lights(&self) -> &[LightInstance] {
        &self.lights
    }

    /// Final lighting for the view, ready for the sprite compositor
    pub fn lightmap(&self) -> &Lightmap {
        &self.lightmap
    }

    pub fn stats(&self) -> &LightingStats {
        &self.stats
    }

    /// Packed, channel-masked shadow target
    pub fn shadow_target(&self) -> &RgbaTexture {
        &self.shadow_target
    }

    pub fn cells(&self) -> &LightCellAllocator {
        &self.cells
    }

    pub fn caster(&self) -> &ShadowCaster {
        &self.caster
    }

    pub fn occlusion(&self) -> &OcclusionMap {
        &self.occlusion
    }

    pub fn jump_flood(&self) -> &JumpFlood {
        &self.flood
    }

    pub fn distance_field(&self) -> &DistanceField {
        &self.field
    }

    /// Install or clear the refraction displacement map
    pub fn set_displacement(&mut self, map: Option<DisplacementMap>) {
        self.displacement = map;
    }

    pub fn displacement(&self) -> Option<&DisplacementMap> {
        self.displacement.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{BloomPoint, Light};
    use crate::spatial::SceneIndex;
    use penumbra_math::{Color, Vec2};

    #[test]
    fn test_new_validates() {
        let config = LightingConfig::default().with_target_size(10, 10);
        assert!(RenderContext::new(config).is_err());
    }

    #[test]
    fn test_gather_culls_offscreen_lights() {
        let mut scene = SceneIndex::new();
        let near = scene.spawn_point(Vec2::new(10.0, 10.0));
        scene.add_light(near, Light::new(Color::WHITE, 8.0));
        let far = scene.spawn_point(Vec2::new(500.0, 500.0));
        scene.add_light(far, Light::new(Color::WHITE, 8.0));
        scene.add_bloom(near, BloomPoint::new(Color::WHITE, 2.0));

        let mut ctx = RenderContext::new(LightingConfig::default()).unwrap();
        ctx.begin_frame(Rect::new(Vec2::ZERO, Vec2::splat(64.0)));
        ctx.gather(&scene);

        assert_eq!(ctx.lights().len(), 1);
        assert_eq!(ctx.stats().lights_collected, 2);
        assert_eq!(ctx.stats().lights_culled, 1);
        assert_eq!(ctx.stats().bloom_points, 1);
    }

    #[test]
    fn test_radius_capped_at_max() {
        let ctx = RenderContext::new(LightingConfig::default().with_max_radius(16)).unwrap();
        let light = LightInstance::new(crate::scene::EntityId(0), Vec2::ZERO, Light::new(Color::WHITE, 40.0));
        assert_eq!(ctx.light_radius(&light), 16.0);
    }

    #[test]
    fn test_begin_frame_resets() {
        let mut ctx = RenderContext::new(LightingConfig::default()).unwrap();
        ctx.stats.lights_collected = 5;
        ctx.begin_frame(Rect::new(Vec2::ZERO, Vec2::splat(8.0)));
        assert_eq!(ctx.frame(), 1);
        assert_eq!(ctx.stats().lights_collected, 0);
        assert_eq!(ctx.lightmap().dimensions(), (8, 8));
    }
}
