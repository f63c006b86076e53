//! Distance-Field Ray Marcher
//!
//! Occluders are rasterized into a binary bitmap, the jump-flood algorithm
//! turns the bitmap into a nearest-occluder distance field, and lights are
//! resolved by sphere tracing against that field.
//!
//! # Frame Sequence
//!
//! ```ignore
//! occlusion.begin(view.expand(max_radius), max_side);
//! for occluder in &occluders {
//!     occlusion.rasterize_occluder(occluder, scene);
//! }
//! flood.resize(w, h);
//! flood.seed(occlusion.mask())?;
//! flood.run();
//! flood.finalize(&mut field)?;
//! let shadow = trace_to_light(&field, pixel, light_pos, &params, None);
//! ```

mod jump_flood;
mod march;
mod occlusion;

pub use jump_flood::{DistanceField, JumpFlood, SeedTexel, SeedTexture};
pub use march::{
    gather_emission, interleaved_gradient_noise, sphere_trace, trace_to_enclosed_light,
    trace_to_light, DisplacementMap, DistanceSampler, Gather, MarchParams, MarchResult,
    Refraction,
};
pub use occlusion::OcclusionMap;
