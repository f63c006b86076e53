//! Occlusion bitmap
//!
//! Binary mask of every occluder shape over the view plus a `max_radius`
//! margin, so occluders just outside the frame still shadow lights inside
//! it. In global-illumination mode emitters are written too, with their
//! colour kept in a parallel emission texture.

use penumbra_math::{Color, Rect, Vec2};

use crate::components::{OcclusionMode, SpriteMask};
use crate::raster::{for_each_in_disc, for_each_in_rect, PixelRect};
use crate::scene::{LightScene, OccluderInstance};
use crate::texture::{MaskTexture, RgbaTexture};

/// Occluder mask and emitter colour over a world region
#[derive(Clone, Debug)]
pub struct OcclusionMap {
    mask: MaskTexture,
    emission: RgbaTexture,
    origin: Vec2,
}

impl OcclusionMap {
    pub fn new() -> Self {
        Self {
            mask: MaskTexture::new(0, 0, 0),
            emission: RgbaTexture::new(0, 0, [0.0; 4]),
            origin: Vec2::ZERO,
        }
    }

    /// Size the bitmap to cover `region` and clear it.
    ///
    /// Each side is capped at `max_side`. Returns whether the cap applied.
    pub fn begin(&mut self, region: Rect, max_side: u32) -> bool {
        let want_w = region.width().max(0.0).ceil() as u32;
        let want_h = region.height().max(0.0).ceil() as u32;
        let width = want_w.min(max_side);
        let height = want_h.min(max_side);

        if self.mask.ensure_size(width, height, 0) {
            log::debug!("Occlusion bitmap grown to {}x{}", width, height);
        }
        self.emission.ensure_size(width, height, [0.0; 4]);

        // Keep the capped bitmap centred on the region
        let trim = Vec2::new((want_w - width) as f32, (want_h - height) as f32) * 0.5;
        self.origin = region.min + trim;
        width != want_w || height != want_h
    }

    /// World position of texel (0, 0)'s corner
    pub fn origin(&self) -> Vec2 {
        self.origin
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.mask.dimensions()
    }

    pub fn mask(&self) -> &MaskTexture {
        &self.mask
    }

    pub fn emission(&self) -> &RgbaTexture {
        &self.emission
    }

    /// World region covered by the bitmap
    pub fn world_bounds(&self) -> Rect {
        let (w, h) = self.dimensions();
        Rect::from_position_size(self.origin, Vec2::new(w as f32, h as f32))
    }

    pub fn is_occluded(&self, x: u32, y: u32) -> bool {
        self.mask.get(x, y) != 0
    }

    /// Whether the texel under a world position is set; false outside
    pub fn is_occluded_at(&self, p: Vec2) -> bool {
        let local = (p - self.origin).floor();
        self.mask
            .try_get(local.x as i32, local.y as i32)
            .is_some_and(|m| m != 0)
    }

    fn clip(&self) -> PixelRect {
        let (w, h) = self.dimensions();
        PixelRect::of_size(w, h)
    }

    fn local(&self, world: &Rect) -> Rect {
        world.translate(-self.origin)
    }

    fn mark(&mut self, x: i32, y: i32) {
        self.mask.set(x as u32, y as u32, 1);
        self.emission.set(x as u32, y as u32, [0.0; 4]);
    }

    /// Write one occluder's shape. Returns the texels written.
    pub fn rasterize_occluder(&mut self, occluder: &OccluderInstance, scene: &dyn LightScene) -> u32 {
        let clip = self.clip();
        let bounds = self.local(&occluder.bounds);
        let mut written = 0;

        match &occluder.occluder.mode {
            OcclusionMode::EntityRectangle => {
                for_each_in_rect(&bounds, &clip, |x, y| {
                    self.mark(x, y);
                    written += 1;
                });
            }
            OcclusionMode::Circle { radius } => {
                for_each_in_disc(bounds.center(), *radius, &clip, |x, y| {
                    self.mark(x, y);
                    written += 1;
                });
            }
            OcclusionMode::SpriteComponent => match scene.sprite_silhouette(occluder.entity) {
                Some(mask) => written = self.rasterize_sprite(&bounds, &mask),
                None => {
                    log::debug!("Entity {:?} has no sprite silhouette, using its bounds", occluder.entity);
                    for_each_in_rect(&bounds, &clip, |x, y| {
                        self.mark(x, y);
                        written += 1;
                    });
                }
            },
            OcclusionMode::CustomSprite(mask) => written = self.rasterize_sprite(&bounds, mask),
        }
        written
    }

    /// Stretch a sprite silhouette over `bounds` (bitmap-local)
    fn rasterize_sprite(&mut self, bounds: &Rect, mask: &SpriteMask) -> u32 {
        if mask.width == 0 || mask.height == 0 || bounds.is_empty() {
            return 0;
        }
        let clip = self.clip();
        let scale = Vec2::new(
            mask.width as f32 / bounds.width(),
            mask.height as f32 / bounds.height(),
        );
        let mut written = 0;
        for_each_in_rect(bounds, &clip, |x, y| {
            let local = Vec2::new(x as f32 + 0.5, y as f32 + 0.5) - bounds.min;
            let u = ((local.x * scale.x) as u32).min(mask.width - 1);
            let v = ((local.y * scale.y) as u32).min(mask.height - 1);
            if mask.is_solid(u, v) {
                self.mark(x, y);
                written += 1;
            }
        });
        written
    }

    /// Write a light emitter disc; emitters seed the distance field too
    pub fn rasterize_emitter(&mut self, center: Vec2, radius: f32, color: Color) -> u32 {
        let clip = self.clip();
        let local = center - self.origin;
        let texel = color.to_array();
        let mut written = 0;
        for_each_in_disc(local, radius, &clip, |x, y| {
            self.mask.set(x as u32, y as u32, 1);
            let e = self.emission.get_mut(x as u32, y as u32);
            for c in 0..3 {
                e[c] += texel[c];
            }
            e[3] = 1.0;
            written += 1;
        });
        written
    }
}

impl Default for OcclusionMap {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::LightOccluder;
    use crate::scene::EntityId;
    use crate::spatial::SceneIndex;
    use std::sync::Arc;

    fn occluder(bounds: Rect, occluder: LightOccluder) -> OccluderInstance {
        OccluderInstance::new(EntityId(1), bounds, occluder)
    }

    fn rect(x0: f32, y0: f32, x1: f32, y1: f32) -> Rect {
        Rect::new(Vec2::new(x0, y0), Vec2::new(x1, y1))
    }

    #[test]
    fn test_begin_covers_region() {
        let mut map = OcclusionMap::new();
        let clamped = map.begin(rect(-10.0, -10.0, 22.0, 14.0), 4096);
        assert!(!clamped);
        assert_eq!(map.dimensions(), (32, 24));
        assert_eq!(map.origin(), Vec2::splat(-10.0));
    }

    #[test]
    fn test_begin_clamps_to_ceiling() {
        let mut map = OcclusionMap::new();
        assert!(map.begin(rect(0.0, 0.0, 100.0, 20.0), 64));
        assert_eq!(map.dimensions(), (64, 20));
        assert_eq!(map.origin(), Vec2::new(18.0, 0.0));
    }

    #[test]
    fn test_rectangle_in_world_space() {
        let scene = SceneIndex::new();
        let mut map = OcclusionMap::new();
        map.begin(rect(-8.0, -8.0, 8.0, 8.0), 4096);
        let n = map.rasterize_occluder(&occluder(rect(0.0, 0.0, 2.0, 2.0), LightOccluder::rectangle()), &scene);
        assert_eq!(n, 4);
        assert!(map.is_occluded(8, 8));
        assert!(map.is_occluded(9, 9));
        assert!(!map.is_occluded(10, 8));
        assert!(map.is_occluded_at(Vec2::new(1.5, 0.5)));
        assert!(!map.is_occluded_at(Vec2::new(2.5, 0.5)));
        assert!(!map.is_occluded_at(Vec2::new(-100.0, 0.0)));
    }

    #[test]
    fn test_circle() {
        let scene = SceneIndex::new();
        let mut map = OcclusionMap::new();
        map.begin(rect(0.0, 0.0, 16.0, 16.0), 4096);
        map.rasterize_occluder(&occluder(rect(4.0, 4.0, 12.0, 12.0), LightOccluder::circle(2.0)), &scene);
        assert!(map.is_occluded(8, 8));
        assert!(!map.is_occluded(4, 4));
    }

    #[test]
    fn test_custom_sprite_stretches() {
        let scene = SceneIndex::new();
        // Left column solid, right column clear
        let mask = SpriteMask::new(2, 1, vec![255, 0]).unwrap();
        let mut map = OcclusionMap::new();
        map.begin(rect(0.0, 0.0, 8.0, 8.0), 4096);
        let n = map.rasterize_occluder(
            &occluder(rect(0.0, 0.0, 8.0, 4.0), LightOccluder::custom_sprite(Arc::new(mask))),
            &scene,
        );
        assert_eq!(n, 16);
        assert!(map.is_occluded(3, 0));
        assert!(!map.is_occluded(4, 0));
    }

    #[test]
    fn test_sprite_component_resolves_through_scene() {
        let mut scene = SceneIndex::new();
        let e = scene.spawn_rect(rect(0.0, 0.0, 4.0, 4.0));
        scene.add_occluder(e, LightOccluder::sprite());
        scene.set_sprite(e, Arc::new(SpriteMask::new(1, 1, vec![0]).unwrap()));

        let mut map = OcclusionMap::new();
        map.begin(rect(0.0, 0.0, 8.0, 8.0), 4096);
        let inst = OccluderInstance::new(e, rect(0.0, 0.0, 4.0, 4.0), LightOccluder::sprite());
        assert_eq!(map.rasterize_occluder(&inst, &scene), 0);

        // Without a silhouette the bounds are used
        let other = OccluderInstance::new(EntityId(99), rect(0.0, 0.0, 4.0, 4.0), LightOccluder::sprite());
        assert_eq!(map.rasterize_occluder(&other, &scene), 16);
    }

    #[test]
    fn test_emitter_writes_mask_and_colour() {
        let mut map = OcclusionMap::new();
        map.begin(rect(0.0, 0.0, 16.0, 16.0), 4096);
        let n = map.rasterize_emitter(Vec2::splat(8.0), 2.0, Color::rgb(1.0, 0.5, 0.0));
        assert!(n > 0);
        assert!(map.is_occluded(8, 8));
        assert_eq!(map.emission().get(8, 8), [1.0, 0.5, 0.0, 1.0]);
        assert_eq!(map.emission().get(0, 0), [0.0; 4]);
    }
}
