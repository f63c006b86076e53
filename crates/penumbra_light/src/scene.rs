//! Scene collaborator interface
//!
//! The lighting core never owns entities. Each frame it asks the scene for
//! the active lighting components, already resolved to world space, and for
//! occluders overlapping a region.

use std::sync::Arc;

use penumbra_math::{Rect, Vec2};
use serde::{Deserialize, Serialize};

use crate::components::{BloomPoint, Light, LightOccluder, SpriteMask};

/// Identifier of the entity owning a component
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(pub u64);

/// A light resolved against its owner
#[derive(Clone, Debug)]
pub struct LightInstance {
    pub entity: EntityId,
    /// World position of the owner
    pub owner_position: Vec2,
    pub light: Light,
}

impl LightInstance {
    pub fn new(entity: EntityId, owner_position: Vec2, light: Light) -> Self {
        Self { entity, owner_position, light }
    }

    /// World position of the light
    pub fn position(&self) -> Vec2 {
        self.owner_position + self.light.offset
    }

    /// Whole-pixel radius; shadow and cell edges stay on the raster grid
    pub fn radius(&self) -> f32 {
        self.light.radius.max(0.0).floor()
    }

    /// Bounding square of the light
    pub fn bounds(&self) -> Rect {
        Rect::square(self.position(), self.radius())
    }
}

/// An occluder resolved against its owner
#[derive(Clone, Debug)]
pub struct OccluderInstance {
    pub entity: EntityId,
    /// World bounds of the owner
    pub bounds: Rect,
    pub occluder: LightOccluder,
}

impl OccluderInstance {
    pub fn new(entity: EntityId, bounds: Rect, occluder: LightOccluder) -> Self {
        Self { entity, bounds, occluder }
    }
}

/// A bloom point resolved against its owner
#[derive(Clone, Debug)]
pub struct BloomInstance {
    pub entity: EntityId,
    pub owner_position: Vec2,
    pub bloom: BloomPoint,
}

impl BloomInstance {
    pub fn new(entity: EntityId, owner_position: Vec2, bloom: BloomPoint) -> Self {
        Self { entity, owner_position, bloom }
    }

    pub fn position(&self) -> Vec2 {
        self.owner_position + self.bloom.offset
    }
}

/// Scene services consumed by the lighting passes
///
/// Enumeration order is not required to be stable between frames.
pub trait LightScene {
    /// Append every active light
    fn collect_lights(&self, out: &mut Vec<LightInstance>);

    /// Append every active bloom point
    fn collect_bloom_points(&self, out: &mut Vec<BloomInstance>);

    /// Append every active occluder
    fn collect_occluders(&self, out: &mut Vec<OccluderInstance>);

    /// Append occluders whose owner bounds intersect `region`
    ///
    /// Defaults to filtering [`LightScene::collect_occluders`]; scenes with
    /// a broad-phase should override it.
    fn query_occluders(&self, region: &Rect, out: &mut Vec<OccluderInstance>) {
        let mut all = Vec::new();
        self.collect_occluders(&mut all);
        out.extend(all.into_iter().filter(|o| o.bounds.intersects(region)));
    }

    /// Sprite silhouette of an entity, for [`crate::components::OcclusionMode::SpriteComponent`]
    fn sprite_silhouette(&self, entity: EntityId) -> Option<Arc<SpriteMask>>;
}
