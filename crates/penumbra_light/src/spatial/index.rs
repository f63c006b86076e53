//! In-memory scene backed by the BVH broad-phase

use std::collections::BTreeMap;
use std::sync::Arc;

use penumbra_math::{Rect, Vec2};

use super::bvh::Bvh;
use crate::components::{BloomPoint, Light, LightOccluder, SpriteMask};
use crate::scene::{BloomInstance, EntityId, LightInstance, LightScene, OccluderInstance};

/// Owner transform
#[derive(Clone, Copy, Debug)]
struct EntityRecord {
    position: Vec2,
    bounds: Rect,
}

/// Minimal entity store implementing [`LightScene`]
///
/// Occluder queries go through the BVH once [`SceneIndex::rebuild`] has run
/// after the last change; until then they fall back to a linear scan.
#[derive(Debug, Default)]
pub struct SceneIndex {
    entities: BTreeMap<EntityId, EntityRecord>,
    lights: Vec<(EntityId, Light)>,
    blooms: Vec<(EntityId, BloomPoint)>,
    occluders: Vec<(EntityId, LightOccluder)>,
    sprites: BTreeMap<EntityId, Arc<SpriteMask>>,
    bvh: Bvh,
    next_id: u64,
    dirty: bool,
}

impl SceneIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an entity at `position` with `bounds`
    pub fn spawn(&mut self, position: Vec2, bounds: Rect) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        self.entities.insert(id, EntityRecord { position, bounds });
        self.dirty = true;
        id
    }

    /// Create an entity whose position is the centre of `bounds`
    pub fn spawn_rect(&mut self, bounds: Rect) -> EntityId {
        self.spawn(bounds.center(), bounds)
    }

    /// Create a point entity
    pub fn spawn_point(&mut self, position: Vec2) -> EntityId {
        self.spawn(position, Rect::new(position, position))
    }

    /// Move an entity
    pub fn set_transform(&mut self, entity: EntityId, position: Vec2, bounds: Rect) {
        if let Some(record) = self.entities.get_mut(&entity) {
            record.position = position;
            record.bounds = bounds;
            self.dirty = true;
        }
    }

    /// Remove an entity and every component it owns
    pub fn despawn(&mut self, entity: EntityId) {
        self.entities.remove(&entity);
        self.lights.retain(|(e, _)| *e != entity);
        self.blooms.retain(|(e, _)| *e != entity);
        self.occluders.retain(|(e, _)| *e != entity);
        self.sprites.remove(&entity);
        self.dirty = true;
    }

    pub fn add_light(&mut self, entity: EntityId, light: Light) {
        self.lights.push((entity, light));
    }

    pub fn add_bloom(&mut self, entity: EntityId, bloom: BloomPoint) {
        self.blooms.push((entity, bloom));
    }

    pub fn add_occluder(&mut self, entity: EntityId, occluder: LightOccluder) {
        self.occluders.push((entity, occluder));
        self.dirty = true;
    }

    pub fn set_sprite(&mut self, entity: EntityId, mask: Arc<SpriteMask>) {
        self.sprites.insert(entity, mask);
    }

    /// Rebuild the occluder BVH
    pub fn rebuild(&mut self) {
        let items: Vec<(usize, Rect)> = self
            .occluders
            .iter()
            .enumerate()
            .filter_map(|(i, (e, _))| self.entities.get(e).map(|r| (i, r.bounds)))
            .collect();
        self.bvh.build(&items);
        self.dirty = false;
        log::debug!("Rebuilt occluder BVH: {} items, {} nodes", items.len(), self.bvh.node_count());
    }

    /// Whether queries are served by the BVH
    pub fn is_indexed(&self) -> bool {
        !self.dirty
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    fn occluder_instance(&self, index: usize) -> Option<OccluderInstance> {
        let (entity, occluder) = self.occluders.get(index)?;
        let record = self.entities.get(entity)?;
        Some(OccluderInstance::new(*entity, record.bounds, occluder.clone()))
    }
}

impl LightScene for SceneIndex {
    fn collect_lights(&self, out: &mut Vec<LightInstance>) {
        out.extend(self.lights.iter().filter_map(|(e, light)| {
            self.entities
                .get(e)
                .map(|r| LightInstance::new(*e, r.position, light.clone()))
        }));
    }

    fn collect_bloom_points(&self, out: &mut Vec<BloomInstance>) {
        out.extend(self.blooms.iter().filter_map(|(e, bloom)| {
            self.entities
                .get(e)
                .map(|r| BloomInstance::new(*e, r.position, bloom.clone()))
        }));
    }

    fn collect_occluders(&self, out: &mut Vec<OccluderInstance>) {
        out.extend((0..self.occluders.len()).filter_map(|i| self.occluder_instance(i)));
    }

    fn query_occluders(&self, region: &Rect, out: &mut Vec<OccluderInstance>) {
        if self.dirty {
            let mut all = Vec::new();
            self.collect_occluders(&mut all);
            out.extend(all.into_iter().filter(|o| o.bounds.intersects(region)));
            return;
        }

        let mut hits = Vec::new();
        self.bvh.query_rect(region, &mut hits);
        // Tree order is not insertion order; keep results deterministic
        hits.sort_unstable();
        out.extend(hits.into_iter().filter_map(|i| self.occluder_instance(i)));
    }

    fn sprite_silhouette(&self, entity: EntityId) -> Option<Arc<SpriteMask>> {
        self.sprites.get(&entity).cloned()
    }
}
