//! Jump-flood nearest-seed propagation
//!
//! Every occluder texel seeds itself; `ceil(log2(max_side))` rounds then
//! spread nearest-seed coordinates at halving step lengths. Each round reads
//! only the previous round's complete output: rounds write the back buffer
//! and the buffers swap before the next round starts.

use penumbra_math::Vec2;

use crate::error::{LightingError, Result};
use crate::texture::{MaskTexture, ScalarTexture, Texture2D};

/// Nearest-seed coordinate of one texel, upload-ready
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SeedTexel {
    pub x: f32,
    pub y: f32,
}

impl SeedTexel {
    /// No seed found yet
    pub const EMPTY: Self = Self { x: -1.0, y: -1.0 };

    pub fn at(x: u32, y: u32) -> Self {
        Self { x: x as f32, y: y as f32 }
    }

    #[inline]
    pub fn is_seed(&self) -> bool {
        self.x >= 0.0
    }

    #[inline]
    fn distance_squared(&self, x: u32, y: u32) -> f32 {
        let dx = self.x - x as f32;
        let dy = self.y - y as f32;
        dx * dx + dy * dy
    }
}

pub type SeedTexture = Texture2D<SeedTexel>;

const NEIGHBOURS: [(i32, i32); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

/// Ping-pong seed buffers
#[derive(Clone, Debug)]
pub struct JumpFlood {
    front: SeedTexture,
    back: SeedTexture,
    rounds_run: u32,
}

impl JumpFlood {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            front: SeedTexture::new(width, height, SeedTexel::EMPTY),
            back: SeedTexture::new(width, height, SeedTexel::EMPTY),
            rounds_run: 0,
        }
    }

    /// Wrap existing buffers, which must share dimensions
    pub fn from_buffers(front: SeedTexture, back: SeedTexture) -> Result<Self> {
        front.check_same_size(&back)?;
        Ok(Self { front, back, rounds_run: 0 })
    }

    /// Resize both buffers together, clearing them
    pub fn resize(&mut self, width: u32, height: u32) {
        self.front.ensure_size(width, height, SeedTexel::EMPTY);
        self.back.ensure_size(width, height, SeedTexel::EMPTY);
        self.rounds_run = 0;
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.front.dimensions()
    }

    /// `ceil(log2(max(width, height)))`
    pub fn round_count(width: u32, height: u32) -> u32 {
        let side = width.max(height);
        if side <= 1 {
            0
        } else {
            u32::BITS - (side - 1).leading_zeros()
        }
    }

    /// Step length of round `round` for a grid whose longest side is `side`
    pub fn step_for_round(side: u32, round: u32) -> u32 {
        (side.next_power_of_two() >> (round + 1)).max(1)
    }

    /// Seed every set texel of `mask` with its own coordinate.
    /// Returns the seed count.
    pub fn seed(&mut self, mask: &MaskTexture) -> Result<u32> {
        if mask.dimensions() != self.dimensions() {
            return Err(LightingError::DimensionMismatch {
                expected: self.dimensions(),
                found: mask.dimensions(),
            });
        }

        let (width, height) = self.dimensions();
        let mut seeds = 0;
        for y in 0..height {
            for x in 0..width {
                let texel = if mask.get(x, y) != 0 {
                    seeds += 1;
                    SeedTexel::at(x, y)
                } else {
                    SeedTexel::EMPTY
                };
                self.front.set(x, y, texel);
            }
        }
        self.rounds_run = 0;
        Ok(seeds)
    }

    /// Run every round. Returns the number of rounds executed.
    pub fn run(&mut self) -> u32 {
        let (width, height) = self.dimensions();
        let rounds = Self::round_count(width, height);
        let side = width.max(height);
        for round in 0..rounds {
            self.round(Self::step_for_round(side, round));
        }
        log::debug!("Jump flood: {} rounds over {}x{}", rounds, width, height);
        rounds
    }

    fn round(&mut self, step: u32) {
        let (width, height) = self.dimensions();
        let step = step as i32;

        for y in 0..height {
            for x in 0..width {
                let mut best = self.front.get(x, y);
                let mut best_d = if best.is_seed() {
                    best.distance_squared(x, y)
                } else {
                    f32::INFINITY
                };

                for (dx, dy) in NEIGHBOURS {
                    let sx = x as i32 + dx * step;
                    let sy = y as i32 + dy * step;
                    let Some(candidate) = self.front.try_get(sx, sy) else {
                        continue;
                    };
                    if !candidate.is_seed() {
                        continue;
                    }
                    let d = candidate.distance_squared(x, y);
                    if d < best_d {
                        best = candidate;
                        best_d = d;
                    }
                }
                self.back.set(x, y, best);
            }
        }

        std::mem::swap(&mut self.front, &mut self.back);
        self.rounds_run += 1;
    }

    /// Rounds executed since the last seeding
    pub fn rounds_run(&self) -> u32 {
        self.rounds_run
    }

    /// Current nearest-seed buffer
    pub fn seeds(&self) -> &SeedTexture {
        &self.front
    }

    /// Nearest seed recorded for a texel
    pub fn nearest_seed(&self, x: u32, y: u32) -> Option<(u32, u32)> {
        let s = self.front.get(x, y);
        s.is_seed().then(|| (s.x as u32, s.y as u32))
    }

    /// Convert nearest-seed coordinates into Euclidean distances
    pub fn finalize(&self, field: &mut DistanceField) -> Result<()> {
        self.front.check_same_size(&field.distances)?;
        let (width, height) = self.dimensions();
        for y in 0..height {
            for x in 0..width {
                let s = self.front.get(x, y);
                let d = if s.is_seed() {
                    s.distance_squared(x, y).sqrt()
                } else {
                    f32::INFINITY
                };
                field.distances.set(x, y, d);
            }
        }
        Ok(())
    }
}

/// Distance from each texel centre to the nearest occluder texel centre
#[derive(Clone, Debug)]
pub struct DistanceField {
    distances: ScalarTexture,
    origin: Vec2,
}

impl DistanceField {
    pub fn new(width: u32, height: u32, origin: Vec2) -> Self {
        Self {
            distances: ScalarTexture::new(width, height, f32::INFINITY),
            origin,
        }
    }

    /// Resize and move, keeping the allocation
    pub fn resize(&mut self, width: u32, height: u32, origin: Vec2) {
        self.distances.ensure_size(width, height, f32::INFINITY);
        self.origin = origin;
    }

    pub fn origin(&self) -> Vec2 {
        self.origin
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.distances.dimensions()
    }

    pub fn texture(&self) -> &ScalarTexture {
        &self.distances
    }

    pub fn distance_at(&self, x: u32, y: u32) -> f32 {
        self.distances.get(x, y)
    }

    /// Texel containing a world position
    pub fn texel_of(&self, p: Vec2) -> (i32, i32) {
        let local = (p - self.origin).floor();
        (local.x as i32, local.y as i32)
    }

    /// Distance at a world position; infinite outside the field
    pub fn sample(&self, p: Vec2) -> f32 {
        let (x, y) = self.texel_of(p);
        self.distances.try_get(x, y).unwrap_or(f32::INFINITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flood(width: u32, height: u32, seeds: &[(u32, u32)]) -> (JumpFlood, DistanceField) {
        let mut mask = MaskTexture::new(width, height, 0);
        for &(x, y) in seeds {
            mask.set(x, y, 1);
        }
        let mut jf = JumpFlood::new(width, height);
        jf.seed(&mask).unwrap();
        jf.run();
        let mut field = DistanceField::new(width, height, Vec2::ZERO);
        jf.finalize(&mut field).unwrap();
        (jf, field)
    }

    #[test]
    fn test_round_count() {
        assert_eq!(JumpFlood::round_count(1, 1), 0);
        assert_eq!(JumpFlood::round_count(2, 1), 1);
        assert_eq!(JumpFlood::round_count(16, 16), 4);
        assert_eq!(JumpFlood::round_count(17, 3), 5);
        assert_eq!(JumpFlood::round_count(1024, 600), 10);
    }

    #[test]
    fn test_steps_halve_to_one() {
        let steps: Vec<u32> = (0..4).map(|i| JumpFlood::step_for_round(16, i)).collect();
        assert_eq!(steps, vec![8, 4, 2, 1]);
        let steps: Vec<u32> = (0..5).map(|i| JumpFlood::step_for_round(17, i)).collect();
        assert_eq!(steps, vec![16, 8, 4, 2, 1]);
    }

    #[test]
    fn test_mismatched_buffers_rejected() {
        let front = SeedTexture::new(8, 8, SeedTexel::EMPTY);
        let back = SeedTexture::new(8, 4, SeedTexel::EMPTY);
        assert!(matches!(
            JumpFlood::from_buffers(front, back),
            Err(LightingError::DimensionMismatch { expected: (8, 8), found: (8, 4) })
        ));
    }

    #[test]
    fn test_seed_mask_size_checked() {
        let mut jf = JumpFlood::new(8, 8);
        assert!(jf.seed(&MaskTexture::new(4, 4, 0)).is_err());
    }

    #[test]
    fn test_single_seed_is_exact() {
        let (jf, field) = flood(16, 16, &[(5, 9)]);
        assert_eq!(jf.rounds_run(), 4);
        for y in 0..16u32 {
            for x in 0..16u32 {
                let expected = ((x as f32 - 5.0).powi(2) + (y as f32 - 9.0).powi(2)).sqrt();
                assert!((field.distance_at(x, y) - expected).abs() < 1e-4);
                assert_eq!(jf.nearest_seed(x, y), Some((5, 9)));
            }
        }
    }

    #[test]
    fn test_empty_mask_is_infinite() {
        let (_, field) = flood(4, 4, &[]);
        assert!(field.distance_at(2, 2).is_infinite());
    }

    #[test]
    fn test_sample_world() {
        let mut field = DistanceField::new(4, 4, Vec2::new(10.0, 10.0));
        field.distances.set(1, 2, 3.0);
        assert_eq!(field.sample(Vec2::new(11.5, 12.9)), 3.0);
        assert!(field.sample(Vec2::new(0.0, 0.0)).is_infinite());
    }

    #[test]
    fn test_seed_bytes() {
        let jf = JumpFlood::new(2, 2);
        assert_eq!(jf.seeds().as_bytes().len(), 4 * 8);
    }
}
