//! Corner regression targets relative to anchor cells.

use crate::config::GridBounds;
use crate::voxel::{CellIndex, DenseGrid};
use glam::{UVec3, Vec3};
use voxdet_data::{CORNER_COUNT, Corners};

/// Values per cell in the dense corner map.
pub const CORNER_CHANNELS: usize = CORNER_COUNT * 3;

/// Dense per-cell corner targets, zero away from positive cells.
pub type CornerTargetMap = DenseGrid<[f32; CORNER_CHANNELS]>;

/// Per-box corner offsets from the anchor of the box's assigned cell.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CornerTargets {
    /// Shape `(n, 8, 3)`.
    pub offsets: Vec<[Vec3; CORNER_COUNT]>,
    /// Assigned cell of each entry.
    pub cells: Vec<CellIndex>,
    /// Index of each entry's box in the input sequence.
    pub box_indices: Vec<usize>,
}

impl CornerTargets {
    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// Shape `(n, 24)`, corner-major.
    pub fn flatten(&self) -> Vec<[f32; CORNER_CHANNELS]> {
        self.offsets.iter().map(|o| Corners(*o).to_flat()).collect()
    }

    /// Scatter into a dense map. A later box overwrites an earlier one that
    /// shares its cell.
    pub fn dense(&self, shape: UVec3) -> CornerTargetMap {
        let mut map = CornerTargetMap::new(shape);
        for (offsets, cell) in self.offsets.iter().zip(&self.cells) {
            map.set(*cell, Corners(*offsets).to_flat());
        }
        map
    }
}

/// Offsets of each box's corners from its cell anchor
/// (`cell * resolution + bounds.min`). Boxes with no cell are left out.
pub fn corner_to_train(
    corners: &[Corners],
    cells: &[Option<CellIndex>],
    bounds: &GridBounds,
    resolution: f32,
) -> CornerTargets {
    let mut targets = CornerTargets::default();
    for (i, (corner, cell)) in corners.iter().zip(cells).enumerate() {
        let Some(cell) = *cell else { continue };
        let anchor = bounds.anchor_of(cell, resolution);
        targets.offsets.push(corner.0.map(|c| c - anchor));
        targets.cells.push(cell);
        targets.box_indices.push(i);
    }
    targets
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn sample_corners(base: Vec3) -> Corners {
        let mut pts = [Vec3::ZERO; CORNER_COUNT];
        for (i, p) in pts.iter_mut().enumerate() {
            *p = base + Vec3::new(i as f32 * 0.1, -(i as f32) * 0.2, 0.05);
        }
        Corners(pts)
    }

    #[test]
    fn test_anchor_round_trip() {
        let bounds = GridBounds::default();
        let resolution = 0.8;
        let corners = [sample_corners(Vec3::new(12.3, -4.1, -1.2))];
        let cell = UVec3::new(15, 57, 4);
        let targets = corner_to_train(&corners, &[Some(cell)], &bounds, resolution);
        let anchor = bounds.anchor_of(cell, resolution);
        for (offset, original) in targets.offsets[0].iter().zip(corners[0].points()) {
            let rebuilt = *offset + anchor;
            assert_abs_diff_eq!(rebuilt.x, original.x, epsilon = 1e-4);
            assert_abs_diff_eq!(rebuilt.y, original.y, epsilon = 1e-4);
            assert_abs_diff_eq!(rebuilt.z, original.z, epsilon = 1e-4);
        }
    }

    #[test]
    fn test_unassigned_boxes_excluded() {
        let corners = [sample_corners(Vec3::ZERO), sample_corners(Vec3::ONE)];
        let targets = corner_to_train(
            &corners,
            &[None, Some(UVec3::ZERO)],
            &GridBounds::symmetric(2.0),
            1.0,
        );
        assert_eq!(targets.len(), 1);
        assert_eq!(targets.box_indices, vec![1]);
        assert_eq!(targets.flatten()[0][0], 1.0 + 2.0);
    }

    #[test]
    fn test_dense_scatter() {
        let corners = [sample_corners(Vec3::ZERO)];
        let cell = UVec3::new(1, 0, 1);
        let targets = corner_to_train(&corners, &[Some(cell)], &GridBounds::symmetric(2.0), 1.0);
        let dense = targets.dense(UVec3::splat(4));
        assert_eq!(dense.get(cell), Some(&targets.flatten()[0]));
        assert!(dense.get(UVec3::ZERO).unwrap().iter().all(|v| *v == 0.0));
    }
}
