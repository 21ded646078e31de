//! Binary objectness maps.

use crate::voxel::{CellIndex, DenseGrid};
use glam::UVec3;

/// 1 at cells that anchor an object, 0 elsewhere.
pub type ObjectnessMap = DenseGrid<u8>;

/// Mark every listed cell. Duplicates collapse; out-of-range cells are skipped.
pub fn create_objectness_label<'a>(
    cells: impl IntoIterator<Item = &'a CellIndex>,
    shape: UVec3,
) -> ObjectnessMap {
    let mut map = ObjectnessMap::new(shape);
    for cell in cells {
        map.set(*cell, 1);
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicates_collapse() {
        let cells = [UVec3::new(1, 2, 0), UVec3::new(1, 2, 0), UVec3::new(0, 0, 1)];
        let map = create_objectness_label(&cells, UVec3::new(2, 3, 2));
        assert_eq!(map.count_nonzero(), 2);
        assert_eq!(map.get(UVec3::new(1, 2, 0)), Some(&1));
    }

    #[test]
    fn test_out_of_range_cell_skipped() {
        let map = create_objectness_label(&[UVec3::new(5, 0, 0)], UVec3::splat(2));
        assert_eq!(map.count_nonzero(), 0);
    }
}
