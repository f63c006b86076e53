//! Render Targets
//!
//! CPU-side 2D targets used by every pass. Pixel formats are plain `Copy`
//! texel types; `Pod` texels can be viewed as bytes for upload.

use crate::error::{LightingError, Result};

/// RGBA float texel
pub type Rgba = [f32; 4];

/// Row-major 2D texel grid
#[derive(Clone, Debug, PartialEq)]
pub struct Texture2D<T> {
    width: u32,
    height: u32,
    data: Vec<T>,
}

/// Packed shadow target and lightmap format
pub type RgbaTexture = Texture2D<Rgba>;
/// Binary occlusion bitmap
pub type MaskTexture = Texture2D<u8>;
/// Single-channel float target
pub type ScalarTexture = Texture2D<f32>;

impl<T> Texture2D<T> {
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    #[inline]
    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as u32) < self.width && (y as u32) < self.height
    }

    /// Fail unless `other` has the same dimensions
    pub fn check_same_size<U>(&self, other: &Texture2D<U>) -> Result<()> {
        if self.dimensions() != other.dimensions() {
            return Err(LightingError::DimensionMismatch {
                expected: self.dimensions(),
                found: other.dimensions(),
            });
        }
        Ok(())
    }
}

impl<T: Copy> Texture2D<T> {
    /// Create a texture filled with `fill`
    pub fn new(width: u32, height: u32, fill: T) -> Self {
        Self {
            width,
            height,
            data: vec![fill; (width as usize) * (height as usize)],
        }
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    /// Texel at (x, y); panics when out of bounds
    #[inline]
    pub fn get(&self, x: u32, y: u32) -> T {
        self.data[self.index(x, y)]
    }

    /// Texel at signed coordinates, `None` outside the texture
    #[inline]
    pub fn try_get(&self, x: i32, y: i32) -> Option<T> {
        if self.in_bounds(x, y) {
            Some(self.get(x as u32, y as u32))
        } else {
            None
        }
    }

    #[inline]
    pub fn get_mut(&mut self, x: u32, y: u32) -> &mut T {
        let i = self.index(x, y);
        &mut self.data[i]
    }

    #[inline]
    pub fn set(&mut self, x: u32, y: u32, value: T) {
        let i = self.index(x, y);
        self.data[i] = value;
    }

    /// Clear every texel to `value`
    pub fn fill(&mut self, value: T) {
        self.data.fill(value);
    }

    /// Resize to exactly `width x height`, discarding contents
    pub fn reset(&mut self, width: u32, height: u32, fill: T) {
        self.width = width;
        self.height = height;
        self.data.clear();
        self.data.resize((width as usize) * (height as usize), fill);
    }

    /// Grow storage so `width x height` fits, never shrinking the allocation.
    /// Returns whether the backing store had to grow.
    pub fn ensure_size(&mut self, width: u32, height: u32, fill: T) -> bool {
        let needed = (width as usize) * (height as usize);
        let grew = needed > self.data.capacity();
        self.reset(width, height, fill);
        grew
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }
}

impl<T: bytemuck::Pod> Texture2D<T> {
    /// Raw bytes for upload
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.data)
    }
}
