//! Lighting components attached to scene entities
//!
//! Components carry no world position of their own: the owning entity
//! supplies it each frame through [`crate::scene::LightScene`].

use std::sync::Arc;

use penumbra_math::{consts::TAU, Color, Vec2};
use serde::{Deserialize, Serialize};

/// A point or cone light
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Light {
    /// Offset from the owning entity's position
    pub offset: Vec2,
    /// Light colour (linear RGB)
    pub color: Color,
    /// Radius as authored; floored to whole pixels on every read
    pub radius: f32,
    /// Cone axis in radians
    pub rotation: f32,
    /// Full cone angle in radians (`TAU` = omnidirectional)
    pub angle: f32,
    /// Angular band at the cone edge over which the light fades out
    pub falloff_angle: f32,
    /// Distance from the centre where the light begins
    pub start_distance: f32,
    /// Fade-in width after `start_distance`
    pub start_fade: f32,
    /// Intensity multiplier
    pub volume: f32,
    /// Exponent on the radial fade toward the radius
    pub shadow_falloff: f32,
}

impl Light {
    /// Omnidirectional light with default shaping
    pub fn new(color: Color, radius: f32) -> Self {
        Self {
            offset: Vec2::ZERO,
            color,
            radius,
            rotation: 0.0,
            angle: TAU,
            falloff_angle: 0.0,
            start_distance: 0.0,
            start_fade: 0.0,
            volume: 1.0,
            shadow_falloff: 1.0,
        }
    }

    pub fn with_offset(mut self, offset: Vec2) -> Self {
        self.offset = offset;
        self
    }

    /// Restrict to a cone around `rotation`
    pub fn with_cone(mut self, rotation: f32, angle: f32, falloff_angle: f32) -> Self {
        self.rotation = rotation;
        self.angle = angle;
        self.falloff_angle = falloff_angle;
        self
    }

    pub fn with_start(mut self, start_distance: f32, start_fade: f32) -> Self {
        self.start_distance = start_distance;
        self.start_fade = start_fade;
        self
    }

    pub fn with_volume(mut self, volume: f32) -> Self {
        self.volume = volume;
        self
    }

    pub fn with_shadow_falloff(mut self, exponent: f32) -> Self {
        self.shadow_falloff = exponent;
        self
    }

    /// Whether the cone covers the full circle
    pub fn is_omni(&self) -> bool {
        self.angle >= TAU
    }
}

impl Default for Light {
    fn default() -> Self {
        Self::new(Color::WHITE, 64.0)
    }
}

/// Shape an occluder contributes to the lighting passes
#[derive(Clone, Debug, Default, PartialEq)]
pub enum OcclusionMode {
    /// The owning entity's bounding rectangle
    #[default]
    EntityRectangle,
    /// Disc centred on the owning entity
    Circle { radius: f32 },
    /// Silhouette of the entity's sprite, resolved through the scene
    SpriteComponent,
    /// Silhouette of a sprite owned by the occluder
    CustomSprite(Arc<SpriteMask>),
}

/// An opaque shape that blocks light
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LightOccluder {
    pub mode: OcclusionMode,
}

impl LightOccluder {
    pub fn rectangle() -> Self {
        Self { mode: OcclusionMode::EntityRectangle }
    }

    pub fn circle(radius: f32) -> Self {
        Self { mode: OcclusionMode::Circle { radius } }
    }

    pub fn sprite() -> Self {
        Self { mode: OcclusionMode::SpriteComponent }
    }

    pub fn custom_sprite(mask: Arc<SpriteMask>) -> Self {
        Self { mode: OcclusionMode::CustomSprite(mask) }
    }

    /// Only axis-aligned rectangles cast CPU shadow volumes
    pub fn casts_shadow_volume(&self) -> bool {
        matches!(self.mode, OcclusionMode::EntityRectangle)
    }
}

/// A glow that ignores shadows and is added on top of the lightmap
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BloomPoint {
    pub offset: Vec2,
    pub radius: f32,
    pub color: Color,
    pub volume: f32,
}

impl BloomPoint {
    pub fn new(color: Color, radius: f32) -> Self {
        Self {
            offset: Vec2::ZERO,
            radius,
            color,
            volume: 1.0,
        }
    }

    pub fn with_volume(mut self, volume: f32) -> Self {
        self.volume = volume;
        self
    }
}

/// Alpha silhouette of a sprite, one byte per texel
#[derive(Clone, Debug, PartialEq)]
pub struct SpriteMask {
    pub width: u32,
    pub height: u32,
    pub alpha: Vec<u8>,
    /// Minimum alpha that counts as solid
    pub threshold: u8,
}

impl SpriteMask {
    /// Build from alpha bytes; `alpha.len()` must equal `width * height`
    pub fn new(width: u32, height: u32, alpha: Vec<u8>) -> Option<Self> {
        if alpha.len() != (width * height) as usize {
            return None;
        }
        Some(Self { width, height, alpha, threshold: 128 })
    }

    /// Fully solid mask
    pub fn solid(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            alpha: vec![255; (width * height) as usize],
            threshold: 128,
        }
    }

    pub fn with_threshold(mut self, threshold: u8) -> Self {
        self.threshold = threshold;
        self
    }

    /// Whether the texel at (x, y) blocks light
    pub fn is_solid(&self, x: u32, y: u32) -> bool {
        if x >= self.width || y >= self.height {
            return false;
        }
        self.alpha[(y * self.width + x) as usize] >= self.threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_light_defaults_to_omni() {
        let light = Light::new(Color::WHITE, 32.0);
        assert!(light.is_omni());
        assert!(!light.with_cone(0.0, 1.0, 0.1).is_omni());
    }

    #[test]
    fn test_only_rectangles_cast_volumes() {
        assert!(LightOccluder::rectangle().casts_shadow_volume());
        assert!(!LightOccluder::circle(4.0).casts_shadow_volume());
        assert!(!LightOccluder::sprite().casts_shadow_volume());
    }

    #[test]
    fn test_sprite_mask_threshold() {
        let mask = SpriteMask::new(2, 1, vec![10, 200]).unwrap().with_threshold(100);
        assert!(!mask.is_solid(0, 0));
        assert!(mask.is_solid(1, 0));
        assert!(!mask.is_solid(2, 0));
        assert!(SpriteMask::new(2, 2, vec![0; 3]).is_none());
    }
}
