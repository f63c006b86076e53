//! Standard lighting passes for both strategies

use penumbra_math::{Rect, Vec2};

use crate::config::{InBoundsBehavior, RayMarchMode};
use crate::error::Result;
use crate::scene::{LightScene, OccluderInstance};
use crate::sdf::{
    gather_emission, trace_to_enclosed_light, trace_to_light, DisplacementMap, MarchParams,
    Refraction,
};

use super::context::{MarchedLight, RenderContext};
use super::{LightingPass, PassSlot};

/// Add every bloom point on top of the lit result
fn add_bloom(ctx: &mut RenderContext) {
    for bloom in &ctx.blooms {
        ctx.lightmap.add_bloom(bloom);
    }
}

fn refraction(displacement: &Option<DisplacementMap>, strength: f32) -> Option<Refraction<'_>> {
    if strength == 0.0 {
        return None;
    }
    displacement.as_ref().map(|map| Refraction { map, strength })
}

// ============================================================================
// Shadow volumes
// ============================================================================

/// Collects the frame's lights and bloom points, culling lights off view
#[derive(Debug, Default)]
pub struct LightGatherPass;

impl LightingPass for LightGatherPass {
    fn name(&self) -> &str {
        "light_gather"
    }

    fn slot(&self) -> PassSlot {
        PassSlot::Occlusion
    }

    fn render(&mut self, ctx: &mut RenderContext, scene: &dyn LightScene) -> Result<()> {
        ctx.gather(scene);
        Ok(())
    }
}

/// Builds every light's shadow volumes and rasterizes the packed target
#[derive(Debug, Default)]
pub struct ShadowCastPass;

impl LightingPass for ShadowCastPass {
    fn name(&self) -> &str {
        "shadow_cast"
    }

    fn slot(&self) -> PassSlot {
        PassSlot::Shadow
    }

    fn begin(&mut self, ctx: &mut RenderContext, _scene: &dyn LightScene) -> Result<()> {
        let size = (ctx.config.target_width, ctx.config.target_height);
        if ctx.shadow_target.dimensions() != size {
            ctx.shadow_target.ensure_size(size.0, size.1, [0.0; 4]);
        }
        ctx.caster.begin_frame();
        ctx.cells.begin_frame();
        Ok(())
    }

    fn render(&mut self, ctx: &mut RenderContext, scene: &dyn LightScene) -> Result<()> {
        for (i, light) in ctx.lights.iter().enumerate() {
            ctx.caster.cast_light(i, light, scene, &mut ctx.cells, &mut ctx.stats);
        }
        Ok(())
    }

    fn end(&mut self, ctx: &mut RenderContext, _scene: &dyn LightScene) -> Result<()> {
        ctx.caster.end_frame(&mut ctx.shadow_target);
        Ok(())
    }
}

/// Draws each committed light through its shadow cell into the lightmap
#[derive(Debug, Default)]
pub struct ShadowComposePass;

impl LightingPass for ShadowComposePass {
    fn name(&self) -> &str {
        "shadow_compose"
    }

    fn slot(&self) -> PassSlot {
        PassSlot::Lightmap
    }

    fn render(&mut self, ctx: &mut RenderContext, _scene: &dyn LightScene) -> Result<()> {
        for batch in ctx.caster.batches() {
            let light = &ctx.lights[batch.light];
            ctx.lightmap.compose_shadowed(&light.light, batch, &ctx.shadow_target);
            ctx.stats.lights_rendered += 1;
        }
        add_bloom(ctx);
        Ok(())
    }

    fn end(&mut self, ctx: &mut RenderContext, _scene: &dyn LightScene) -> Result<()> {
        ctx.stats.log_drops();
        Ok(())
    }
}

// ============================================================================
// Distance field
// ============================================================================

/// Rasterizes occluders (and emitters in GI mode) into the occlusion bitmap
#[derive(Debug, Default)]
pub struct OcclusionRasterPass;

impl OcclusionRasterPass {
    /// Pick the lights to march, applying the light limit and the
    /// enclosed-light policy
    fn select_lights(ctx: &mut RenderContext) {
        let max_lights = ctx.config.max_lights();
        let max_radius = ctx.config.max_radius as f32;

        for (i, light) in ctx.lights.iter().enumerate() {
            if light.radius().min(max_radius) <= 0.0 {
                ctx.stats.lights_degenerate += 1;
                continue;
            }
            if ctx.marched.len() >= max_lights {
                ctx.stats.lights_over_capacity += 1;
                continue;
            }

            let position = light.position();
            let enclosure = if ctx.occlusion.is_occluded_at(position) {
                match ctx.config.in_bounds_behavior {
                    InBoundsBehavior::Ignore => {}
                    InBoundsBehavior::Exclude => ctx.stats.occluders_excluded += 1,
                    InBoundsBehavior::PutOut => {
                        ctx.stats.lights_put_out += 1;
                        continue;
                    }
                }
                Some(Self::enclosure_of(&ctx.occluders, position))
            } else {
                None
            };
            ctx.marched.push(MarchedLight { light: i, enclosure });
        }
    }

    /// Union of the occluder bounds containing `position`, or the texel
    /// under it when no bounds do
    fn enclosure_of(occluders: &[OccluderInstance], position: Vec2) -> Rect {
        occluders
            .iter()
            .filter(|o| o.bounds.contains_point(position))
            .map(|o| o.bounds)
            .reduce(|a, b| a.union(&b))
            .unwrap_or_else(|| Rect::from_position_size(position.floor(), Vec2::ONE))
    }
}

impl LightingPass for OcclusionRasterPass {
    fn name(&self) -> &str {
        "occlusion_raster"
    }

    fn slot(&self) -> PassSlot {
        PassSlot::Occlusion
    }

    fn begin(&mut self, ctx: &mut RenderContext, scene: &dyn LightScene) -> Result<()> {
        ctx.gather(scene);
        let region = ctx.view.expand(ctx.config.max_radius as f32);
        ctx.stats.occlusion_clamped = ctx.occlusion.begin(region, ctx.config.max_occlusion_side);
        ctx.stats.occlusion_size = ctx.occlusion.dimensions();
        Ok(())
    }

    fn render(&mut self, ctx: &mut RenderContext, scene: &dyn LightScene) -> Result<()> {
        ctx.occluders.clear();
        scene.query_occluders(&ctx.occlusion.world_bounds(), &mut ctx.occluders);
        for occluder in &ctx.occluders {
            ctx.stats.occluders_considered += 1;
            ctx.stats.occlusion_texels += ctx.occlusion.rasterize_occluder(occluder, scene);
        }

        Self::select_lights(ctx);

        if ctx.config.ray_march_mode == RayMarchMode::GlobalIllumination {
            let radius = ctx.config.gi_emitter_radius;
            for marched in &ctx.marched {
                let light = &ctx.lights[marched.light];
                let color = light.light.color.scale_rgb(light.light.volume);
                ctx.occlusion.rasterize_emitter(light.position(), radius, color);
            }
        }
        Ok(())
    }
}

/// Seeds, floods and finalizes the distance field
#[derive(Debug, Default)]
pub struct DistanceFieldPass;

impl LightingPass for DistanceFieldPass {
    fn name(&self) -> &str {
        "distance_field"
    }

    fn slot(&self) -> PassSlot {
        PassSlot::Shadow
    }

    fn begin(&mut self, ctx: &mut RenderContext, _scene: &dyn LightScene) -> Result<()> {
        let (width, height) = ctx.occlusion.dimensions();
        ctx.flood.resize(width, height);
        ctx.field.resize(width, height, ctx.occlusion.origin());
        ctx.flood.seed(ctx.occlusion.mask())?;
        Ok(())
    }

    fn render(&mut self, ctx: &mut RenderContext, _scene: &dyn LightScene) -> Result<()> {
        ctx.stats.jump_flood_rounds = ctx.flood.run();
        Ok(())
    }

    fn end(&mut self, ctx: &mut RenderContext, _scene: &dyn LightScene) -> Result<()> {
        ctx.flood.finalize(&mut ctx.field)
    }
}

/// Resolves the lightmap by sphere tracing the distance field
#[derive(Debug, Default)]
pub struct RayMarchPass;

impl RayMarchPass {
    fn shade_shadows(ctx: &mut RenderContext) {
        let params = MarchParams::from_config(&ctx.config);
        let max_radius = ctx.config.max_radius as f32;
        let refraction = refraction(&ctx.displacement, ctx.config.refraction_strength);
        let (mut rays, mut steps, mut exhausted) = (0u64, 0u64, 0u64);

        for marched in &ctx.marched {
            let light = &ctx.lights[marched.light];
            let position = light.position();
            let radius = light.radius().min(max_radius);
            let field = &ctx.field;
            let enclosure = marched.enclosure;

            ctx.lightmap.add_light(&light.light, position, radius, |world| {
                let result = match enclosure {
                    Some(rect) => {
                        trace_to_enclosed_light(field, world, position, rect, &params, refraction)
                    }
                    None => trace_to_light(field, world, position, &params, refraction),
                };
                rays += 1;
                steps += result.steps as u64;
                if result.exhausted {
                    exhausted += 1;
                }
                result.visibility
            });
            ctx.stats.lights_rendered += 1;
        }

        ctx.stats.rays_traced += rays;
        ctx.stats.march_steps += steps;
        ctx.stats.rays_exhausted += exhausted;
    }

    fn shade_global_illumination(ctx: &mut RenderContext) {
        let params = MarchParams::from_config(&ctx.config);
        let rays = ctx.config.rays_per_pixel;
        let refraction = refraction(&ctx.displacement, ctx.config.refraction_strength);
        let (width, height) = ctx.lightmap.dimensions();

        for y in 0..height {
            for x in 0..width {
                let p = ctx.lightmap.texel_world(x as i32, y as i32);
                let gather = gather_emission(
                    &ctx.field,
                    &ctx.flood,
                    &ctx.occlusion,
                    p,
                    (x, y),
                    rays,
                    &params,
                    refraction,
                );
                ctx.lightmap.add(x as i32, y as i32, gather.radiance, 1.0);
                ctx.stats.rays_traced += rays as u64;
                ctx.stats.march_steps += gather.steps;
                ctx.stats.rays_exhausted += gather.exhausted as u64;
            }
        }
        ctx.stats.lights_rendered = ctx.marched.len() as u32;
    }
}

impl LightingPass for RayMarchPass {
    fn name(&self) -> &str {
        "ray_march"
    }

    fn slot(&self) -> PassSlot {
        PassSlot::Lightmap
    }

    fn render(&mut self, ctx: &mut RenderContext, _scene: &dyn LightScene) -> Result<()> {
        match ctx.config.ray_march_mode {
            RayMarchMode::Shadows => Self::shade_shadows(ctx),
            RayMarchMode::GlobalIllumination => Self::shade_global_illumination(ctx),
        }
        add_bloom(ctx);
        Ok(())
    }

    fn end(&mut self, ctx: &mut RenderContext, _scene: &dyn LightScene) -> Result<()> {
        ctx.stats.log_drops();
        Ok(())
    }
}
