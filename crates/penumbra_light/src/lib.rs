//! # penumbra_light - 2D Dynamic Lighting
//!
//! Real-time lights and shadows for 2D scenes, with two interchangeable
//! strategies behind one pass pipeline:
//!
//! - **Shadow volumes**: CPU-built triangle shadow geometry per light,
//!   packed into one shared target by cell and colour channel
//! - **Distance field**: occluders rasterized into a bitmap, a jump-flood
//!   distance field, and sphere-traced soft shadows or global illumination
//!
//! ## Architecture
//!
//! 1. **Scene**: the host supplies lights, occluders and bloom points
//!    through [`scene::LightScene`]
//! 2. **Passes**: occlusion, shadow (or distance), lightmap; run one at a
//!    time by [`pipeline::PassSequencer`]
//! 3. **Lightmap**: a view-sized target cleared to ambient, handed to the
//!    sprite compositor
//!
//! ## Example
//!
//! ```ignore
//! use penumbra_light::prelude::*;
//!
//! let mut scene = SceneIndex::new();
//! let torch = scene.spawn_point(Vec2::new(64.0, 64.0));
//! scene.add_light(torch, Light::new(Color::rgb(1.0, 0.8, 0.5), 96.0));
//! let crate_box = scene.spawn_rect(Rect::new(Vec2::new(80.0, 60.0), Vec2::new(96.0, 76.0)));
//! scene.add_occluder(crate_box, LightOccluder::rectangle());
//! scene.rebuild();
//!
//! let mut lighting = PassSequencer::for_strategy(LightingConfig::shadow_volumes())?;
//! let stats = lighting.run_frame(&scene, Rect::new(Vec2::ZERO, Vec2::new(320.0, 180.0)))?;
//! println!("{}", stats.summary());
//! ```

pub mod caster;
pub mod cells;
pub mod components;
pub mod compose;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod raster;
pub mod scene;
pub mod sdf;
pub mod spatial;
pub mod stats;
pub mod texture;

pub use cells::{LightCell, LightCellAllocator, CHANNEL_COUNT};
pub use components::{BloomPoint, Light, LightOccluder, OcclusionMode, SpriteMask};
pub use compose::Lightmap;
pub use config::{InBoundsBehavior, LightingConfig, LightingStrategy, RayMarchMode};
pub use error::{LightingError, Result};
pub use pipeline::{LightingPass, PassSequencer, PassSlot, RenderContext};
pub use scene::{BloomInstance, EntityId, LightInstance, LightScene, OccluderInstance};
pub use stats::LightingStats;

/// Prelude for common imports
pub mod prelude {
    pub use crate::components::{BloomPoint, Light, LightOccluder, OcclusionMode, SpriteMask};
    pub use crate::config::{InBoundsBehavior, LightingConfig, LightingStrategy, RayMarchMode};
    pub use crate::error::{LightingError, Result};
    pub use crate::pipeline::{LightingPass, PassSequencer, PassSlot, RenderContext};
    pub use crate::scene::{EntityId, LightScene};
    pub use crate::spatial::SceneIndex;
    pub use crate::stats::LightingStats;
    pub use penumbra_math::prelude::*;
}
