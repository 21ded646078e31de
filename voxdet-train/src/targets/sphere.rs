//! Mapping box anchors to objectness cells.

use crate::config::SphereSearch;
use crate::voxel::{CellIndex, DenseGrid, VoxelGrid};
use glam::UVec3;

/// Occupied voxels per map cell, for a map `scale` times coarser than the
/// voxel grid over the same bounds.
pub(crate) fn density_map(voxels: &VoxelGrid, scale: u32, map_shape: UVec3) -> DenseGrid<u32> {
    let mut density = DenseGrid::<u32>::new(map_shape);
    for (cell, value) in voxels.iter() {
        if *value == 0 {
            continue;
        }
        if let Some(count) = density.get_mut(cell / scale) {
            *count += 1;
        }
    }
    density
}

/// Apply the configured search around a directly mapped cell.
pub(crate) fn refine(direct: CellIndex, search: SphereSearch, density: Option<&DenseGrid<u32>>) -> CellIndex {
    match (search, density) {
        (SphereSearch::DensestNeighbor { radius }, Some(density)) if radius > 0 => {
            densest_neighbor(direct, radius, density)
        }
        _ => direct,
    }
}

fn densest_neighbor(direct: CellIndex, radius: u32, density: &DenseGrid<u32>) -> CellIndex {
    let shape = density.shape();
    let lo = direct.saturating_sub(UVec3::splat(radius));
    let hi = direct
        .saturating_add(UVec3::splat(radius))
        .min(shape.saturating_sub(UVec3::ONE));

    let mut best = direct;
    let mut best_count = density.get(direct).copied().unwrap_or(0);
    for x in lo.x..=hi.x {
        for y in lo.y..=hi.y {
            for z in lo.z..=hi.z {
                let cell = UVec3::new(x, y, z);
                let count = density.get(cell).copied().unwrap_or(0);
                if count > best_count {
                    best = cell;
                    best_count = count;
                }
            }
        }
    }
    best
}
