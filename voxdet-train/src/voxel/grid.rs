//! Dense, x-major 3D grids.

use glam::UVec3;

/// Integer cell coordinates `(x, y, z)`.
pub type CellIndex = UVec3;

/// A dense 3D array with one `T` per cell.
///
/// Storage is x-major: `data[(x * ny + y) * nz + z]`, matching a C-ordered
/// `(nx, ny, nz)` tensor.
#[derive(Debug, Clone, PartialEq)]
pub struct DenseGrid<T> {
    shape: UVec3,
    data: Vec<T>,
}

impl<T: Clone + Default> DenseGrid<T> {
    /// A grid of `shape` filled with `T::default()`.
    pub fn new(shape: UVec3) -> Self {
        let len = shape.x as usize * shape.y as usize * shape.z as usize;
        Self {
            shape,
            data: vec![T::default(); len],
        }
    }
}

impl<T> DenseGrid<T> {
    pub fn shape(&self) -> UVec3 {
        self.shape
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn contains(&self, cell: CellIndex) -> bool {
        cell.cmplt(self.shape).all()
    }

    fn offset(&self, cell: CellIndex) -> usize {
        let (ny, nz) = (self.shape.y as usize, self.shape.z as usize);
        (cell.x as usize * ny + cell.y as usize) * nz + cell.z as usize
    }

    pub fn get(&self, cell: CellIndex) -> Option<&T> {
        if self.contains(cell) {
            Some(&self.data[self.offset(cell)])
        } else {
            None
        }
    }

    pub fn get_mut(&mut self, cell: CellIndex) -> Option<&mut T> {
        if self.contains(cell) {
            let offset = self.offset(cell);
            Some(&mut self.data[offset])
        } else {
            None
        }
    }

    /// Write `value` at `cell`. Returns false (and writes nothing) when the
    /// cell is out of range.
    pub fn set(&mut self, cell: CellIndex, value: T) -> bool {
        match self.get_mut(cell) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    /// Flat x-major view.
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    fn cell_at(&self, offset: usize) -> CellIndex {
        let (ny, nz) = (self.shape.y as usize, self.shape.z as usize);
        let z = offset % nz;
        let y = (offset / nz) % ny;
        let x = offset / (ny * nz);
        UVec3::new(x as u32, y as u32, z as u32)
    }

    /// Every cell with its value, in storage order.
    pub fn iter(&self) -> impl Iterator<Item = (CellIndex, &T)> {
        self.data
            .iter()
            .enumerate()
            .map(|(i, v)| (self.cell_at(i), v))
    }
}

impl DenseGrid<u8> {
    pub fn count_nonzero(&self) -> usize {
        self.data.iter().filter(|v| **v != 0).count()
    }

    /// Cells holding a nonzero value, in storage order.
    pub fn nonzero_cells(&self) -> Vec<CellIndex> {
        self.iter()
            .filter(|(_, v)| **v != 0)
            .map(|(c, _)| c)
            .collect()
    }

    /// Values as `f32`, the dtype a network input expects.
    pub fn to_f32(&self) -> Vec<f32> {
        self.data.iter().map(|v| *v as f32).collect()
    }
}
