//! Sphere tracing against the distance field

use penumbra_math::{consts::TAU, fract, Color, Rect, Vec2};

use super::jump_flood::{DistanceField, JumpFlood};
use super::occlusion::OcclusionMap;
use crate::config::LightingConfig;

/// Anything that reports the distance to the nearest surface
pub trait DistanceSampler {
    fn distance(&self, p: Vec2) -> f32;
}

impl DistanceSampler for DistanceField {
    fn distance(&self, p: Vec2) -> f32 {
        self.sample(p)
    }
}

impl<F: Fn(Vec2) -> f32> DistanceSampler for F {
    fn distance(&self, p: Vec2) -> f32 {
        self(p)
    }
}

/// Ray-march limits
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MarchParams {
    pub max_steps: u32,
    pub surface_distance: f32,
    pub max_distance: f32,
    /// Penumbra sharpness `k` in `min(k * h / t)`
    pub softness: f32,
}

impl MarchParams {
    pub fn from_config(config: &LightingConfig) -> Self {
        Self {
            max_steps: config.max_steps,
            surface_distance: config.surface_distance,
            max_distance: config.max_distance,
            softness: config.shadow_softness,
        }
    }

    pub fn with_max_distance(mut self, max_distance: f32) -> Self {
        self.max_distance = max_distance;
        self
    }
}

impl Default for MarchParams {
    fn default() -> Self {
        Self::from_config(&LightingConfig::default())
    }
}

/// Outcome of one traced ray
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MarchResult {
    /// Came within `surface_distance` of a surface
    pub hit: bool,
    /// Ran out of steps without resolving
    pub exhausted: bool,
    /// Distance samples taken
    pub steps: u32,
    /// Path length travelled
    pub distance: f32,
    /// Where the march stopped
    pub position: Vec2,
    /// Soft-shadow visibility along the path, 0 when hit
    pub visibility: f32,
}

/// Per-texel 2D offsets that bend marching rays
#[derive(Clone, Debug, PartialEq)]
pub struct DisplacementMap {
    width: u32,
    height: u32,
    origin: Vec2,
    offsets: Vec<Vec2>,
}

impl DisplacementMap {
    /// Zero displacement over `width x height` texels starting at `origin`
    pub fn new(width: u32, height: u32, origin: Vec2) -> Self {
        Self {
            width,
            height,
            origin,
            offsets: vec![Vec2::ZERO; (width * height) as usize],
        }
    }

    /// Fill from a function of the texel centre's world position
    pub fn from_fn(width: u32, height: u32, origin: Vec2, f: impl Fn(Vec2) -> Vec2) -> Self {
        let mut map = Self::new(width, height, origin);
        for y in 0..height {
            for x in 0..width {
                let p = origin + Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
                map.set(x, y, f(p));
            }
        }
        map
    }

    pub fn set(&mut self, x: u32, y: u32, offset: Vec2) {
        if x < self.width && y < self.height {
            self.offsets[(y * self.width + x) as usize] = offset;
        }
    }

    /// Offset at a world position, zero outside the map
    pub fn sample(&self, p: Vec2) -> Vec2 {
        let local = (p - self.origin).floor();
        if local.x < 0.0 || local.y < 0.0 {
            return Vec2::ZERO;
        }
        let (x, y) = (local.x as u32, local.y as u32);
        if x >= self.width || y >= self.height {
            return Vec2::ZERO;
        }
        self.offsets[(y * self.width + x) as usize]
    }
}

/// Displacement applied to a march, scaled by `strength`
#[derive(Clone, Copy, Debug)]
pub struct Refraction<'a> {
    pub map: &'a DisplacementMap,
    pub strength: f32,
}

/// Step along `direction` by the sampled distance until a surface is
/// within `surface_distance`, the path exceeds `max_distance`, or
/// `max_steps` samples have been taken.
///
/// Every non-hit step advances by more than `surface_distance`, so a
/// surface `d` away is reached in at most `ceil(d / surface_distance)`
/// samples.
pub fn sphere_trace(
    sampler: &impl DistanceSampler,
    origin: Vec2,
    direction: Vec2,
    params: &MarchParams,
    refraction: Option<Refraction<'_>>,
) -> MarchResult {
    march(sampler, origin, direction, params, refraction, None)
}

/// Slack between a sampled distance and the true distance to an enclosure,
/// covering texel quantization of the field
const ENCLOSURE_SLACK: f32 = 1.5;

fn march(
    sampler: &impl DistanceSampler,
    origin: Vec2,
    direction: Vec2,
    params: &MarchParams,
    refraction: Option<Refraction<'_>>,
    enclosure: Option<Rect>,
) -> MarchResult {
    let mut dir = direction.normalize();
    let mut position = origin;
    let mut travelled = 0.0f32;
    let mut visibility = 1.0f32;

    for step in 1..=params.max_steps {
        let h = sampler.distance(position);
        // Samples dominated by the enclosure neither block nor soften
        let at_enclosure = enclosure
            .is_some_and(|rect| rect.distance_to_point(position) <= h + ENCLOSURE_SLACK);

        if h <= params.surface_distance {
            if at_enclosure {
                return MarchResult {
                    hit: false,
                    exhausted: false,
                    steps: step,
                    distance: travelled,
                    position,
                    visibility: visibility.clamp(0.0, 1.0),
                };
            }
            return MarchResult {
                hit: true,
                exhausted: false,
                steps: step,
                distance: travelled,
                position,
                visibility: 0.0,
            };
        }
        if travelled > 0.0 && params.softness > 0.0 && !at_enclosure {
            visibility = visibility.min(params.softness * h / travelled);
        }

        if let Some(r) = refraction {
            let bent = (dir + r.map.sample(position) * r.strength).normalize();
            if bent != Vec2::ZERO {
                dir = bent;
            }
        }

        let advance = h.min(params.max_distance - travelled);
        travelled += advance;
        position = position + dir * advance;

        if travelled >= params.max_distance {
            return MarchResult {
                hit: false,
                exhausted: false,
                steps: step,
                distance: travelled,
                position,
                visibility: visibility.clamp(0.0, 1.0),
            };
        }
    }

    MarchResult {
        hit: false,
        exhausted: true,
        steps: params.max_steps,
        distance: travelled,
        position,
        visibility: visibility.clamp(0.0, 1.0),
    }
}

/// Trace from a surface point toward a light; the march ends at the light
pub fn trace_to_light(
    sampler: &impl DistanceSampler,
    from: Vec2,
    light: Vec2,
    params: &MarchParams,
    refraction: Option<Refraction<'_>>,
) -> MarchResult {
    trace_toward(sampler, from, light, params, refraction, None)
}

/// Trace toward a light that sits inside `enclosure`.
///
/// The enclosing occluder is transparent to the ray: reaching it counts as
/// reaching the light, and its proximity does not soften the shadow. Every
/// other occluder shadows as usual.
pub fn trace_to_enclosed_light(
    sampler: &impl DistanceSampler,
    from: Vec2,
    light: Vec2,
    enclosure: Rect,
    params: &MarchParams,
    refraction: Option<Refraction<'_>>,
) -> MarchResult {
    trace_toward(sampler, from, light, params, refraction, Some(enclosure))
}

fn trace_toward(
    sampler: &impl DistanceSampler,
    from: Vec2,
    light: Vec2,
    params: &MarchParams,
    refraction: Option<Refraction<'_>>,
    enclosure: Option<Rect>,
) -> MarchResult {
    let to_light = light - from;
    let limit = to_light.length().min(params.max_distance);
    if limit <= 0.0 {
        return MarchResult {
            hit: false,
            exhausted: false,
            steps: 0,
            distance: 0.0,
            position: from,
            visibility: 1.0,
        };
    }
    march(sampler, from, to_light, &params.with_max_distance(limit), refraction, enclosure)
}

/// Deterministic per-pixel rotation in `[0, 1)`
#[inline]
pub fn interleaved_gradient_noise(x: u32, y: u32) -> f32 {
    fract(52.982_918_9 * fract(0.067_110_56 * x as f32 + 0.005_837_15 * y as f32))
}

/// Emission gathered at a hit point, read from its nearest emitter seed
fn emission_at(hit: Vec2, field: &DistanceField, seeds: &JumpFlood, occlusion: &OcclusionMap) -> Color {
    let (x, y) = field.texel_of(hit);
    let (w, h) = field.dimensions();
    if x < 0 || y < 0 || x as u32 >= w || y as u32 >= h {
        return Color::TRANSPARENT;
    }
    match seeds.nearest_seed(x as u32, y as u32) {
        Some((sx, sy)) => Color::from_array(occlusion.emission().get(sx, sy)),
        None => Color::TRANSPARENT,
    }
}

/// Sum of one pixel's gathered rays
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Gather {
    pub radiance: Color,
    pub steps: u64,
    pub exhausted: u32,
}

/// Average emission seen by `rays` evenly spaced rays from `p`, rotated
/// by the pixel's interleaved-gradient offset
#[allow(clippy::too_many_arguments)]
pub fn gather_emission(
    field: &DistanceField,
    seeds: &JumpFlood,
    occlusion: &OcclusionMap,
    p: Vec2,
    pixel: (u32, u32),
    rays: u32,
    params: &MarchParams,
    refraction: Option<Refraction<'_>>,
) -> Gather {
    let rays = rays.max(1);
    let offset = interleaved_gradient_noise(pixel.0, pixel.1);
    let mut radiance = Color::TRANSPARENT;
    let mut steps = 0u64;
    let mut exhausted = 0u32;

    for i in 0..rays {
        let angle = (i as f32 + offset) / rays as f32 * TAU;
        let result = sphere_trace(field, p, Vec2::from_angle(angle), params, refraction);
        steps += result.steps as u64;
        if result.exhausted {
            exhausted += 1;
        }
        if result.hit {
            radiance += emission_at(result.position, field, seeds, occlusion);
        }
    }

    Gather {
        radiance: radiance * (1.0 / rays as f32),
        steps,
        exhausted,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wall_at(d: f32) -> impl Fn(Vec2) -> f32 {
        move |p: Vec2| (d - p.x).max(0.0)
    }

    fn params(surface: f32, max_steps: u32) -> MarchParams {
        MarchParams {
            max_steps,
            surface_distance: surface,
            max_distance: 1000.0,
            softness: 8.0,
        }
    }

    #[test]
    fn test_exact_field_hits_in_two_steps() {
        let r = sphere_trace(&wall_at(10.0), Vec2::ZERO, Vec2::X, &params(0.5, 64), None);
        assert!(r.hit);
        assert_eq!(r.steps, 2);
        assert_eq!(r.visibility, 0.0);
    }

    #[test]
    fn test_step_bound_with_conservative_field() {
        for &(d, s) in &[(10.0f32, 0.5f32), (7.3, 0.25), (3.0, 1.0), (0.4, 0.5)] {
            // Under-estimating sampler forces many small steps
            let sampler = move |p: Vec2| (d - p.x).max(0.0) * 0.5;
            let r = sphere_trace(&sampler, Vec2::ZERO, Vec2::X, &params(s, 10_000), None);
            assert!(r.hit);
            assert!(r.steps <= (d / s).ceil() as u32, "d={} s={} steps={}", d, s, r.steps);
        }
    }

    #[test]
    fn test_never_exceeds_max_steps() {
        let sampler = |p: Vec2| (100.0 - p.x).max(0.0) * 0.1;
        let r = sphere_trace(&sampler, Vec2::ZERO, Vec2::X, &params(0.01, 16), None);
        assert!(!r.hit);
        assert!(r.exhausted);
        assert_eq!(r.steps, 16);
    }

    #[test]
    fn test_max_distance_stops_miss() {
        let open = |_: Vec2| 3.0f32;
        let p = params(0.5, 64).with_max_distance(10.0);
        let r = sphere_trace(&open, Vec2::ZERO, Vec2::Y, &p, None);
        assert!(!r.hit);
        assert!(!r.exhausted);
        assert_eq!(r.distance, 10.0);
        assert_eq!(r.steps, 4);
    }

    #[test]
    fn test_trace_to_light_stops_at_light() {
        // Wall behind the light must not shadow it
        let r = trace_to_light(&wall_at(20.0), Vec2::ZERO, Vec2::new(10.0, 0.0), &params(0.5, 64), None);
        assert!(!r.hit);
        assert!(r.visibility > 0.0);
    }

    #[test]
    fn test_enclosure_is_transparent() {
        // Light inside a box spanning x 8..12; a separate wall at x = 30
        let pillar = Rect::new(Vec2::new(8.0, -2.0), Vec2::new(12.0, 2.0));
        let wall = Rect::new(Vec2::new(28.0, -50.0), Vec2::new(30.0, 50.0));
        let scene = move |p: Vec2| pillar.distance_to_point(p).min(wall.distance_to_point(p));
        let light = Vec2::new(10.0, 0.0);
        let p = params(0.5, 64);

        let blocked = trace_to_light(&scene, Vec2::new(0.0, 0.0), light, &p, None);
        assert!(blocked.hit);

        let open = trace_to_enclosed_light(&scene, Vec2::new(0.0, 0.0), light, pillar, &p, None);
        assert!(!open.hit);
        assert_eq!(open.visibility, 1.0);

        // The other wall still shadows
        let behind = trace_to_enclosed_light(&scene, Vec2::new(40.0, 0.0), light, pillar, &p, None);
        assert!(behind.hit);
        assert_eq!(behind.visibility, 0.0);
    }

    #[test]
    fn test_soft_shadow_darkens_near_grazing() {
        // Occluder disc of radius 2 at (10, 3): ray along x passes 1 unit away
        let disc = |p: Vec2| (p.distance(Vec2::new(10.0, 3.0)) - 2.0).max(0.0);
        let near = trace_to_light(&disc, Vec2::ZERO, Vec2::new(20.0, 0.0), &params(0.1, 128), None);
        let far = trace_to_light(&disc, Vec2::new(0.0, -10.0), Vec2::new(20.0, -10.0), &params(0.1, 128), None);
        assert!(!near.hit);
        assert!(near.visibility < far.visibility);
    }

    #[test]
    fn test_refraction_bends_path() {
        let open = |_: Vec2| 1.0f32;
        let map = DisplacementMap::from_fn(32, 32, Vec2::ZERO, |_| Vec2::new(0.0, 1.0));
        let refraction = Refraction { map: &map, strength: 1.0 };
        let p = params(0.5, 8).with_max_distance(4.0);
        let straight = sphere_trace(&open, Vec2::splat(8.0), Vec2::X, &p, None);
        let bent = sphere_trace(&open, Vec2::splat(8.0), Vec2::X, &p, Some(refraction));
        assert_eq!(straight.position.y, 8.0);
        assert!(bent.position.y > 8.0);
    }

    #[test]
    fn test_displacement_outside_is_zero() {
        let map = DisplacementMap::from_fn(4, 4, Vec2::ZERO, |_| Vec2::ONE);
        assert_eq!(map.sample(Vec2::splat(2.0)), Vec2::ONE);
        assert_eq!(map.sample(Vec2::splat(-1.0)), Vec2::ZERO);
        assert_eq!(map.sample(Vec2::splat(5.0)), Vec2::ZERO);
    }

    #[test]
    fn test_noise_range() {
        for y in 0..16 {
            for x in 0..16 {
                let n = interleaved_gradient_noise(x, y);
                assert!((0.0..1.0).contains(&n));
            }
        }
    }

    #[test]
    fn test_gather_sees_emitter() {
        let mut occlusion = OcclusionMap::new();
        occlusion.begin(Rect::new(Vec2::ZERO, Vec2::splat(32.0)), 4096);
        occlusion.rasterize_emitter(Vec2::splat(16.0), 12.0, Color::rgb(1.0, 0.0, 0.0));

        let mut seeds = JumpFlood::new(32, 32);
        seeds.seed(occlusion.mask()).unwrap();
        seeds.run();
        let mut field = DistanceField::new(32, 32, Vec2::ZERO);
        seeds.finalize(&mut field).unwrap();

        // Inside the emitter every ray hits immediately
        let inside = gather_emission(&field, &seeds, &occlusion, Vec2::splat(16.5), (16, 16), 8, &params(0.5, 32), None);
        assert_eq!(inside.radiance.r, 1.0);
        assert_eq!(inside.steps, 8);

        // From a corner only some rays reach it
        let corner = gather_emission(&field, &seeds, &occlusion, Vec2::splat(1.5), (1, 1), 16, &params(0.5, 64), None);
        assert!(corner.radiance.r > 0.0);
        assert!(corner.radiance.r < 1.0);
    }
}
