//! Lighting Pipeline
//!
//! An explicit, ordered list of passes over a shared [`RenderContext`].
//! Passes fill three slots in fixed order: occlusion, then shadow (or
//! distance), then lightmap. Only one pass runs at a time, and each pass
//! reads the complete output of the passes before it.
//!
//! # Example
//!
//! ```ignore
//! use penumbra_light::prelude::*;
//!
//! let mut sequencer = PassSequencer::for_strategy(LightingConfig::shadow_volumes())?;
//!
//! // Each frame
//! sequencer.run_frame(&scene, camera_rect)?;
//! let lightmap = sequencer.context().lightmap();
//! ```

mod context;
mod passes;
mod sequencer;

pub use context::RenderContext;
pub use passes::{
    DistanceFieldPass, LightGatherPass, OcclusionRasterPass, RayMarchPass, ShadowCastPass,
    ShadowComposePass,
};
pub use sequencer::PassSequencer;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::scene::LightScene;

/// Fixed pipeline position of a pass
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PassSlot {
    /// Occluder collection or rasterization
    Occlusion,
    /// Shadow volumes or distance field
    Shadow,
    /// Lightmap resolve
    Lightmap,
}

impl PassSlot {
    /// All slots in execution order
    pub const ORDER: [PassSlot; 3] = [PassSlot::Occlusion, PassSlot::Shadow, PassSlot::Lightmap];
}

/// A render pass driven by the [`PassSequencer`]
///
/// `begin`, `render` and `end` run back to back for one pass before the
/// next pass begins.
pub trait LightingPass {
    /// Unique pass name
    fn name(&self) -> &str;

    /// Slot the pass belongs to
    fn slot(&self) -> PassSlot;

    /// Bind and clear the pass's targets
    fn begin(&mut self, _ctx: &mut RenderContext, _scene: &dyn LightScene) -> Result<()> {
        Ok(())
    }

    /// Do the pass's work
    fn render(&mut self, ctx: &mut RenderContext, scene: &dyn LightScene) -> Result<()>;

    /// Resolve and hand results to the next pass
    fn end(&mut self, _ctx: &mut RenderContext, _scene: &dyn LightScene) -> Result<()> {
        Ok(())
    }
}
