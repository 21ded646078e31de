//! Training targets: objectness map and corner regression.
//!
//! Each box is assigned one cell of a map that is `scale` times coarser than
//! the voxel grid and covers the same bounds. The objectness map flags
//! assigned cells; the corner targets hold each box's corners relative to
//! its cell's anchor (minimum corner). Boxes whose cell falls outside the
//! map are dropped from both.

mod corners;
mod objectness;
mod sphere;

pub use corners::{CORNER_CHANNELS, CornerTargetMap, CornerTargets, corner_to_train};
pub use objectness::{ObjectnessMap, create_objectness_label};

use crate::config::{AnchorPoint, TargetConfig, VoxelConfig};
use crate::error::{Result, TrainError};
use crate::voxel::{CellIndex, VoxelGrid};
use glam::{UVec3, Vec3};
use tracing::debug;
use voxdet_data::{BoxSize, Corners};

/// Objectness map and corner targets built from one box set.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingTargets {
    pub objectness: ObjectnessMap,
    pub corners: CornerTargets,
}

impl TrainingTargets {
    /// Targets for a frame with no boxes.
    pub fn empty(map_shape: UVec3) -> Self {
        Self {
            objectness: ObjectnessMap::new(map_shape),
            corners: CornerTargets::default(),
        }
    }

    pub fn positive_cells(&self) -> usize {
        self.objectness.count_nonzero()
    }

    pub fn dense_corners(&self) -> CornerTargetMap {
        self.corners.dense(self.objectness.shape())
    }
}

/// Encodes sensor-frame boxes against a voxel configuration.
#[derive(Debug, Clone)]
pub struct TargetEncoder {
    voxel: VoxelConfig,
    config: TargetConfig,
    map_resolution: f32,
    map_shape: UVec3,
}

impl TargetEncoder {
    pub fn new(voxel: VoxelConfig, config: TargetConfig) -> Result<Self> {
        config.validate()?;
        let map_resolution = voxel.resolution * config.scale as f32;
        let map_shape = voxel.bounds.shape(map_resolution)?;
        Ok(Self {
            voxel,
            config,
            map_resolution,
            map_shape,
        })
    }

    pub fn map_shape(&self) -> UVec3 {
        self.map_shape
    }

    pub fn map_resolution(&self) -> f32 {
        self.map_resolution
    }

    /// Point of a box that is mapped to a cell.
    pub fn anchor_point(&self, center: Vec3, size: &BoxSize) -> Vec3 {
        match self.config.anchor {
            AnchorPoint::BoxBase => center,
            AnchorPoint::MidHeight => center + Vec3::Z * (size.height * 0.5),
        }
    }

    /// Map cell of each box, in input order; `None` outside the map.
    ///
    /// `voxels` feeds the densest-neighbour search and is ignored for direct
    /// mapping.
    pub fn center_to_sphere(
        &self,
        centers: &[Vec3],
        sizes: &[BoxSize],
        voxels: Option<&VoxelGrid>,
    ) -> Result<Vec<Option<CellIndex>>> {
        if centers.len() != sizes.len() {
            return Err(TrainError::Shape(format!(
                "{} centers, {} sizes",
                centers.len(),
                sizes.len()
            )));
        }
        let density = voxels.map(|v| sphere::density_map(v, self.config.scale, self.map_shape));
        Ok(centers
            .iter()
            .zip(sizes)
            .map(|(c, s)| {
                let direct = self.voxel.bounds.cell_of(
                    self.anchor_point(*c, s),
                    self.map_resolution,
                    self.map_shape,
                )?;
                Some(sphere::refine(direct, self.config.search, density.as_ref()))
            })
            .collect())
    }

    /// World position of a cell's anchor.
    pub fn sphere_to_center(&self, cell: CellIndex) -> Vec3 {
        self.voxel.bounds.anchor_of(cell, self.map_resolution)
    }

    pub fn objectness(&self, cells: &[Option<CellIndex>]) -> ObjectnessMap {
        create_objectness_label(cells.iter().flatten(), self.map_shape)
    }

    pub fn corner_targets(&self, corners: &[Corners], cells: &[Option<CellIndex>]) -> CornerTargets {
        corner_to_train(corners, cells, &self.voxel.bounds, self.map_resolution)
    }

    /// Full encoding of one frame's boxes.
    pub fn encode(
        &self,
        centers: &[Vec3],
        sizes: &[BoxSize],
        corners: &[Corners],
        voxels: Option<&VoxelGrid>,
    ) -> Result<TrainingTargets> {
        if corners.len() != centers.len() {
            return Err(TrainError::Shape(format!(
                "{} centers, {} corner sets",
                centers.len(),
                corners.len()
            )));
        }
        let cells = self.center_to_sphere(centers, sizes, voxels)?;
        let dropped = cells.iter().filter(|c| c.is_none()).count();
        if dropped > 0 {
            debug!("{} of {} boxes fall outside the objectness map", dropped, cells.len());
        }
        Ok(TrainingTargets {
            objectness: self.objectness(&cells),
            corners: self.corner_targets(corners, &cells),
        })
    }
}
