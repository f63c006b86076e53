//! Lightmap Composition
//!
//! Shapes each light's contribution (cone, radial fade, start gate) and
//! accumulates it into a view-sized lightmap cleared to the ambient colour.
//! The CPU strategy samples the packed shadow target through the light's
//! cell; the distance-field strategy supplies its own visibility.

use penumbra_math::{wrap_angle, Color, Rect, Vec2};

use crate::caster::ShadowBatch;
use crate::components::Light;
use crate::raster::PixelRect;
use crate::scene::BloomInstance;
use crate::texture::RgbaTexture;

/// Angular attenuation for a direction, in radians
pub fn cone_term(light: &Light, direction: f32) -> f32 {
    if light.is_omni() {
        return 1.0;
    }
    let half = light.angle * 0.5;
    let inner = (half - light.falloff_angle).max(0.0);
    let delta = wrap_angle(direction - light.rotation).abs();
    if delta <= inner {
        1.0
    } else if delta >= half {
        0.0
    } else {
        1.0 - (delta - inner) / (half - inner)
    }
}

/// Radial attenuation at `distance` from a light of `radius`
pub fn radial_term(light: &Light, distance: f32, radius: f32) -> f32 {
    if radius <= 0.0 || distance >= radius || distance < light.start_distance {
        return 0.0;
    }
    let fade_in = if light.start_fade > 0.0 {
        ((distance - light.start_distance) / light.start_fade).min(1.0)
    } else {
        1.0
    };
    let base = 1.0 - distance / radius;
    base.powf(light.shadow_falloff.max(0.0)) * fade_in
}

/// Unshadowed intensity at `offset` from the light centre
pub fn light_term(light: &Light, offset: Vec2, radius: f32) -> f32 {
    let distance = offset.length();
    let radial = radial_term(light, distance, radius);
    if radial <= 0.0 {
        return 0.0;
    }
    radial * cone_term(light, offset.angle())
}

/// View-sized accumulation target handed to the sprite compositor
#[derive(Clone, Debug)]
pub struct Lightmap {
    texture: RgbaTexture,
    view: Rect,
}

impl Lightmap {
    pub fn new() -> Self {
        Self {
            texture: RgbaTexture::new(0, 0, [0.0; 4]),
            view: Rect::EMPTY,
        }
    }

    /// Size to `view` (one texel per world unit) and clear to `ambient`
    pub fn begin(&mut self, view: Rect, ambient: Color) {
        let width = view.width().max(0.0).ceil() as u32;
        let height = view.height().max(0.0).ceil() as u32;
        if self.texture.ensure_size(width, height, ambient.to_array()) {
            log::debug!("Lightmap grown to {}x{}", width, height);
        }
        self.view = view;
    }

    pub fn view(&self) -> Rect {
        self.view
    }

    pub fn texture(&self) -> &RgbaTexture {
        &self.texture
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.texture.dimensions()
    }

    /// World position of a texel centre
    #[inline]
    pub fn texel_world(&self, x: i32, y: i32) -> Vec2 {
        self.view.min + Vec2::new(x as f32 + 0.5, y as f32 + 0.5)
    }

    /// Texels whose centres fall inside a world rectangle
    pub fn texels_covering(&self, world: &Rect) -> PixelRect {
        let (w, h) = self.texture.dimensions();
        PixelRect::covering(&world.translate(-self.view.min)).intersect(&PixelRect::of_size(w, h))
    }

    pub fn get(&self, x: u32, y: u32) -> Color {
        Color::from_array(self.texture.get(x, y))
    }

    /// Colour at a world position, `None` outside the view
    pub fn sample_world(&self, p: Vec2) -> Option<Color> {
        let local = (p - self.view.min).floor();
        self.texture
            .try_get(local.x as i32, local.y as i32)
            .map(Color::from_array)
    }

    /// Add `color * scale` to a texel's RGB
    #[inline]
    pub fn add(&mut self, x: i32, y: i32, color: Color, scale: f32) {
        let texel = self.texture.get_mut(x as u32, y as u32);
        texel[0] += color.r * scale;
        texel[1] += color.g * scale;
        texel[2] += color.b * scale;
    }

    /// Draw a light's bounding quad, attenuated by `visibility(world)`
    pub fn add_light(
        &mut self,
        light: &Light,
        position: Vec2,
        radius: f32,
        mut visibility: impl FnMut(Vec2) -> f32,
    ) {
        let tint = light.color.scale_rgb(light.volume);
        let bounds = self.texels_covering(&Rect::square(position, radius));
        for y in bounds.y0..bounds.y1 {
            for x in bounds.x0..bounds.x1 {
                let world = self.texel_world(x, y);
                let term = light_term(light, world - position, radius);
                if term <= 0.0 {
                    continue;
                }
                let visible = visibility(world);
                if visible > 0.0 {
                    self.add(x, y, tint, term * visible);
                }
            }
        }
    }

    /// Draw a light through its packed shadow cell
    pub fn compose_shadowed(&mut self, light: &Light, batch: &ShadowBatch, shadow: &RgbaTexture) {
        let channel = batch.cell.channel;
        let scissor = batch.scissor;
        let half = (scissor.x1 - scissor.x0) as f32 * 0.5;
        let center = Vec2::new(scissor.x0 as f32 + half, scissor.y0 as f32 + half);
        let origin = batch.position;

        self.add_light(light, batch.position, batch.radius, |world| {
            let cell = (center + (world - origin)).floor();
            let x = (cell.x as i32).clamp(scissor.x0, scissor.x1 - 1);
            let y = (cell.y as i32).clamp(scissor.y0, scissor.y1 - 1);
            match shadow.try_get(x, y) {
                Some(texel) => 1.0 - texel[channel],
                None => 1.0,
            }
        });
    }

    /// Additive glow that ignores shadows
    pub fn add_bloom(&mut self, bloom: &BloomInstance) {
        let radius = bloom.bloom.radius;
        if radius <= 0.0 {
            return;
        }
        let center = bloom.position();
        let tint = bloom.bloom.color.scale_rgb(bloom.bloom.volume);
        let bounds = self.texels_covering(&Rect::square(center, radius));
        for y in bounds.y0..bounds.y1 {
            for x in bounds.x0..bounds.x1 {
                let d = self.texel_world(x, y).distance(center);
                if d < radius {
                    self.add(x, y, tint, 1.0 - d / radius);
                }
            }
        }
    }
}

impl Default for Lightmap {
    fn default() -> Self {
        Self::new()
    }
}
