//! Light-Cell Allocation
//!
//! Packs several lights into one shared shadow target. Packing index `i`
//! selects colour channel `i % CHANNEL_COUNT` and spatial cell
//! `i / CHANNEL_COUNT`, so up to four lights share one cell footprint
//! without colliding.
//!
//! # Target Organization
//!
//! Cells are `cell_size` squares laid out row-major across the target:
//!
//! ```text
//! +--------+--------+--------+
//! | cell 0 | cell 1 | cell 2 |   each cell: R, G, B, A = four lights
//! +--------+--------+--------+
//! | cell 3 | ...    |        |
//! ```

use penumbra_math::Vec2;
use serde::{Deserialize, Serialize};

use crate::config::LightingConfig;
use crate::raster::PixelRect;
use crate::texture::Rgba;

/// Colour channels available for packing
pub const CHANNEL_COUNT: usize = 4;

/// One-hot write masks, indexed by channel
pub const CHANNEL_MASKS: [Rgba; CHANNEL_COUNT] = [
    [1.0, 0.0, 0.0, 0.0],
    [0.0, 1.0, 0.0, 0.0],
    [0.0, 0.0, 1.0, 0.0],
    [0.0, 0.0, 0.0, 1.0],
];

/// Per-frame assignment of a light to a packed region
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LightCell {
    /// Packing index (assignment order this frame)
    pub index: usize,
    /// Index of the light in the frame's light list
    pub light: usize,
    /// Spatial cell
    pub cell: u32,
    /// Top-left texel of the cell
    pub origin: (u32, u32),
    /// Channel in `0..CHANNEL_COUNT`
    pub channel: usize,
}

impl LightCell {
    /// Write mask for this light's channel
    pub fn mask(&self) -> Rgba {
        CHANNEL_MASKS[self.channel]
    }
}

/// Cell allocator statistics
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CellStats {
    /// Cells handed out this frame
    pub assigned_this_frame: u32,
    /// Requests refused because the target was full
    pub refused_this_frame: u32,
    /// Peak assignments seen in any frame
    pub peak_assigned: u32,
}

/// Deterministic light-to-cell packer
#[derive(Clone, Debug)]
pub struct LightCellAllocator {
    cell_size: u32,
    cells_per_row: u32,
    cell_rows: u32,
    assigned: Vec<LightCell>,
    stats: CellStats,
}

impl LightCellAllocator {
    /// Create an allocator for the packed target described by `config`
    pub fn new(config: &LightingConfig) -> Self {
        Self::with_layout(config.cell_size(), config.cells_per_row(), config.cell_rows())
    }

    /// Create from an explicit layout
    pub fn with_layout(cell_size: u32, cells_per_row: u32, cell_rows: u32) -> Self {
        let capacity = (cells_per_row * cell_rows) as usize * CHANNEL_COUNT;
        Self {
            cell_size,
            cells_per_row,
            cell_rows,
            assigned: Vec::with_capacity(capacity),
            stats: CellStats::default(),
        }
    }

    /// Start a new frame; previous assignments are discarded
    pub fn begin_frame(&mut self) {
        self.assigned.clear();
        self.stats.assigned_this_frame = 0;
        self.stats.refused_this_frame = 0;
    }

    /// Lights the target can hold
    pub fn max_lights(&self) -> usize {
        (self.cells_per_row * self.cell_rows) as usize * CHANNEL_COUNT
    }

    pub fn cell_size(&self) -> u32 {
        self.cell_size
    }

    /// Pure placement of packing index `index`
    pub fn placement(&self, index: usize) -> Option<((u32, u32), usize)> {
        if index >= self.max_lights() || self.cells_per_row == 0 {
            return None;
        }
        let cell = (index / CHANNEL_COUNT) as u32;
        let col = cell % self.cells_per_row;
        let row = cell / self.cells_per_row;
        Some(((col * self.cell_size, row * self.cell_size), index % CHANNEL_COUNT))
    }

    /// Assign the next packed region to `light`
    ///
    /// Returns `None` once the target is full.
    pub fn allocate(&mut self, light: usize) -> Option<LightCell> {
        let index = self.assigned.len();
        let Some((origin, channel)) = self.placement(index) else {
            self.stats.refused_this_frame += 1;
            return None;
        };

        let cell = LightCell {
            index,
            light,
            cell: (index / CHANNEL_COUNT) as u32,
            origin,
            channel,
        };
        self.assigned.push(cell);
        self.stats.assigned_this_frame += 1;
        self.stats.peak_assigned = self.stats.peak_assigned.max(self.stats.assigned_this_frame);
        Some(cell)
    }

    /// Whether another light fits this frame
    pub fn is_full(&self) -> bool {
        self.assigned.len() >= self.max_lights()
    }

    /// Assignments made this frame, in order
    pub fn cells(&self) -> &[LightCell] {
        &self.assigned
    }

    /// Assignment for a frame light, if it has one
    pub fn cell_for_light(&self, light: usize) -> Option<&LightCell> {
        self.assigned.iter().find(|c| c.light == light)
    }

    /// Texel region of a cell, used as the light's scissor
    pub fn cell_rect(&self, cell: &LightCell) -> PixelRect {
        let (x, y) = cell.origin;
        PixelRect::new(
            x as i32,
            y as i32,
            (x + self.cell_size) as i32,
            (y + self.cell_size) as i32,
        )
    }

    /// Texel-space centre of a cell; a light's position maps here
    pub fn cell_center(&self, cell: &LightCell) -> Vec2 {
        let half = self.cell_size as f32 * 0.5;
        Vec2::new(cell.origin.0 as f32 + half, cell.origin.1 as f32 + half)
    }

    pub fn stats(&self) -> &CellStats {
        &self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_then_cell() {
        let mut alloc = LightCellAllocator::with_layout(64, 2, 2);
        alloc.begin_frame();

        let placements: Vec<_> = (0..6).map(|i| alloc.allocate(i).unwrap()).collect();
        assert_eq!(placements[0].channel, 0);
        assert_eq!(placements[3].channel, 3);
        assert_eq!(placements[3].origin, (0, 0));
        assert_eq!(placements[4].channel, 0);
        assert_eq!(placements[4].origin, (64, 0));
        assert_eq!(placements[5].cell, 1);
    }

    #[test]
    fn test_rows_wrap() {
        let alloc = LightCellAllocator::with_layout(64, 2, 2);
        assert_eq!(alloc.placement(8), Some(((0, 64), 0)));
        assert_eq!(alloc.placement(15), Some(((64, 64), 3)));
        assert_eq!(alloc.placement(16), None);
    }

    #[test]
    fn test_full_allocator_refuses() {
        let mut alloc = LightCellAllocator::with_layout(64, 1, 1);
        alloc.begin_frame();
        for i in 0..4 {
            assert!(alloc.allocate(i).is_some());
        }
        assert!(alloc.is_full());
        assert!(alloc.allocate(4).is_none());
        assert_eq!(alloc.stats().refused_this_frame, 1);

        alloc.begin_frame();
        assert!(alloc.cells().is_empty());
        assert_eq!(alloc.stats().peak_assigned, 4);
    }

    #[test]
    fn test_no_two_lights_share_cell_and_channel() {
        let config = LightingConfig::default();
        let mut alloc = LightCellAllocator::new(&config);
        alloc.begin_frame();
        while alloc.allocate(alloc.cells().len()).is_some() {}

        let mut seen = std::collections::BTreeSet::new();
        for cell in alloc.cells() {
            assert!(seen.insert((cell.origin, cell.channel)));
        }
        assert_eq!(seen.len(), config.max_lights());
    }

    #[test]
    fn test_cell_geometry() {
        let mut alloc = LightCellAllocator::with_layout(32, 4, 1);
        alloc.begin_frame();
        for i in 0..5 {
            alloc.allocate(i);
        }
        let cell = alloc.cell_for_light(4).copied().unwrap();
        assert_eq!(alloc.cell_rect(&cell), PixelRect::new(32, 0, 64, 32));
        assert_eq!(alloc.cell_center(&cell), Vec2::new(48.0, 16.0));
        assert_eq!(cell.mask(), [1.0, 0.0, 0.0, 0.0]);
    }
}
