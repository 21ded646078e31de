//! Point-to-voxel binning.

mod grid;

pub use grid::{CellIndex, DenseGrid};

use crate::config::VoxelConfig;
use crate::error::Result;
use glam::UVec3;
use tracing::debug;
use voxdet_data::Point;

/// Binary occupancy over the voxel bounds.
pub type VoxelGrid = DenseGrid<u8>;

/// Bins points into a fixed occupancy grid.
#[derive(Debug, Clone)]
pub struct Voxelizer {
    config: VoxelConfig,
    shape: UVec3,
}

impl Voxelizer {
    /// Fails with a config error for a non-positive resolution or bounds that
    /// give an empty axis.
    pub fn new(config: VoxelConfig) -> Result<Self> {
        let shape = config.bounds.shape(config.resolution)?;
        Ok(Self { config, shape })
    }

    pub fn config(&self) -> &VoxelConfig {
        &self.config
    }

    pub fn shape(&self) -> UVec3 {
        self.shape
    }

    /// Cell a point falls in, if inside the bounds.
    pub fn cell_of(&self, point: &Point) -> Option<CellIndex> {
        self.config
            .bounds
            .cell_of(point.position, self.config.resolution, self.shape)
    }

    /// Mark every cell holding at least one point. Points outside the bounds
    /// are skipped; repeated hits on a cell leave it at 1.
    pub fn voxelize(&self, points: &[Point]) -> VoxelGrid {
        let mut grid = VoxelGrid::new(self.shape);
        let mut outside = 0usize;
        for point in points {
            match self.cell_of(point) {
                Some(cell) => {
                    grid.set(cell, 1);
                }
                None => outside += 1,
            }
        }
        debug!(
            "Voxelized {} points into {} occupied cells of {:?} ({} outside bounds)",
            points.len(),
            grid.count_nonzero(),
            self.shape.to_array(),
            outside
        );
        grid
    }
}
