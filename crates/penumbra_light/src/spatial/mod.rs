//! Spatial Broad-Phase
//!
//! A 2D bounding volume hierarchy and an in-memory scene built on it.
//!
//! # Example
//!
//! ```ignore
//! use penumbra_light::spatial::SceneIndex;
//!
//! let mut scene = SceneIndex::new();
//! let wall = scene.spawn_rect(Rect::new(Vec2::ZERO, Vec2::splat(16.0)));
//! scene.add_occluder(wall, LightOccluder::rectangle());
//! scene.rebuild();
//!
//! let mut hits = Vec::new();
//! scene.query_occluders(&Rect::square(Vec2::splat(20.0), 10.0), &mut hits);
//! ```

mod bvh;
mod index;

pub use bvh::*;
pub use index::*;
