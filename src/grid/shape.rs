//! Grid extents, flattened indexing and axis bookkeeping.

use serde::{Deserialize, Serialize};

/// Extents of a batched grid.
///
/// Data is stored flat with indexing `((b * depth + k) * height + j) * width + i`,
/// so `i` (X) is the fastest varying index. 2D grids have `depth == 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridShape {
    /// Number of independent simulation instances.
    pub batch: usize,
    /// Cells along X.
    pub width: usize,
    /// Cells along Y.
    pub height: usize,
    /// Cells along Z. 1 for 2D grids.
    pub depth: usize,
}

impl GridShape {
    /// Create a 2D shape (depth = 1).
    pub fn new_2d(batch: usize, width: usize, height: usize) -> Self {
        Self {
            batch,
            width,
            height,
            depth: 1,
        }
    }

    /// Create a 3D shape.
    pub fn new_3d(batch: usize, width: usize, height: usize, depth: usize) -> Self {
        Self {
            batch,
            width,
            height,
            depth,
        }
    }

    /// Check if this is a 3D grid (depth > 1).
    #[inline]
    pub fn is_3d(&self) -> bool {
        self.depth > 1
    }

    /// Number of spatial dimensions (2 or 3).
    #[inline]
    pub fn dims(&self) -> usize {
        if self.is_3d() { 3 } else { 2 }
    }

    /// True if any extent is zero.
    pub fn is_empty(&self) -> bool {
        self.batch == 0 || self.width == 0 || self.height == 0 || self.depth == 0
    }

    /// Cells in a single batch element.
    #[inline]
    pub fn cells_per_batch(&self) -> usize {
        self.width * self.height * self.depth
    }

    /// Total number of cells over all batch elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.batch * self.cells_per_batch()
    }

    /// Extent along an axis.
    #[inline]
    pub fn extent(&self, axis: Axis) -> usize {
        match axis {
            Axis::X => self.width,
            Axis::Y => self.height,
            Axis::Z => self.depth,
        }
    }

    /// Smallest extent over the active axes.
    pub fn min_extent(&self) -> usize {
        Axis::active(self.is_3d())
            .iter()
            .map(|&a| self.extent(a))
            .min()
            .unwrap_or(0)
    }

    /// Flat index of cell `(i, j, k)` in batch `b`.
    #[inline]
    pub fn idx(&self, i: usize, j: usize, k: usize, b: usize) -> usize {
        debug_assert!(i < self.width && j < self.height && k < self.depth && b < self.batch);
        ((b * self.depth + k) * self.height + j) * self.width + i
    }

    /// Flat index of a cell.
    #[inline]
    pub fn cell_idx(&self, cell: CellIndex) -> usize {
        self.idx(cell.i, cell.j, cell.k, cell.b)
    }

    /// Inverse of [`GridShape::idx`].
    #[inline]
    pub fn cell(&self, idx: usize) -> CellIndex {
        let i = idx % self.width;
        let rest = idx / self.width;
        let j = rest % self.height;
        let rest = rest / self.height;
        let k = rest % self.depth;
        let b = rest / self.depth;
        CellIndex { i, j, k, b }
    }

    /// Check whether a signed cell coordinate lies inside the spatial domain.
    #[inline]
    pub fn in_bounds(&self, i: i32, j: i32, k: i32) -> bool {
        i >= 0
            && j >= 0
            && k >= 0
            && (i as usize) < self.width
            && (j as usize) < self.height
            && (k as usize) < self.depth
    }

    /// Clamp a signed coordinate along `axis` into `[0, extent - 1]`.
    #[inline]
    pub fn clamp_to_grid(&self, v: i32, axis: Axis) -> usize {
        let max = self.extent(axis).saturating_sub(1) as i32;
        v.clamp(0, max) as usize
    }

    /// Flat index of a signed coordinate after clamping every axis to the grid.
    #[inline]
    pub fn clamped_idx(&self, i: i32, j: i32, k: i32, b: usize) -> usize {
        self.idx(
            self.clamp_to_grid(i, Axis::X),
            self.clamp_to_grid(j, Axis::Y),
            self.clamp_to_grid(k, Axis::Z),
            b,
        )
    }

    /// True if the cell lies within `width` cells of the domain edge.
    ///
    /// The Z axis only counts for 3D grids.
    pub fn is_boundary(&self, cell: CellIndex, width: usize) -> bool {
        let near = |v: usize, extent: usize| v < width || v + width >= extent;
        near(cell.i, self.width)
            || near(cell.j, self.height)
            || (self.is_3d() && near(cell.k, self.depth))
    }
}

/// Integer coordinate of one cell in one batch element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellIndex {
    pub i: usize,
    pub j: usize,
    pub k: usize,
    pub b: usize,
}

impl CellIndex {
    pub fn new(i: usize, j: usize, k: usize, b: usize) -> Self {
        Self { i, j, k, b }
    }

    /// Cell center in cell units.
    #[inline]
    pub fn center(&self) -> [f32; 3] {
        [
            self.i as f32 + 0.5,
            self.j as f32 + 0.5,
            self.k as f32 + 0.5,
        ]
    }

    /// Signed spatial coordinate, shifted by `offset`.
    #[inline]
    pub fn offset(&self, offset: [i32; 3]) -> (i32, i32, i32) {
        (
            self.i as i32 + offset[0],
            self.j as i32 + offset[1],
            self.k as i32 + offset[2],
        )
    }
}

/// Spatial axis. Also names the velocity component stored on faces normal to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    /// Axes used by a 2D or 3D grid.
    #[inline]
    pub fn active(is_3d: bool) -> &'static [Axis] {
        if is_3d { &Self::ALL } else { &Self::ALL[..2] }
    }

    /// Component index (0, 1, 2).
    #[inline]
    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }

    /// Unit cell offset along this axis.
    #[inline]
    pub fn unit(self) -> [i32; 3] {
        let mut u = [0; 3];
        u[self.index()] = 1;
        u
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_idx_roundtrip() {
        let shape = GridShape::new_3d(2, 5, 4, 3);
        for idx in 0..shape.len() {
            let cell = shape.cell(idx);
            assert_eq!(shape.cell_idx(cell), idx);
        }
        assert_eq!(shape.idx(1, 2, 1, 1), ((3 + 1) * 4 + 2) * 5 + 1);
    }

    #[test]
    fn test_boundary_2d_ignores_z() {
        let shape = GridShape::new_2d(1, 5, 3);
        assert!(!shape.is_boundary(CellIndex::new(2, 1, 0, 0), 1));
        assert!(shape.is_boundary(CellIndex::new(0, 1, 0, 0), 1));
        assert!(shape.is_boundary(CellIndex::new(4, 1, 0, 0), 1));
        assert!(shape.is_boundary(CellIndex::new(2, 2, 0, 0), 1));
        assert!(!shape.is_boundary(CellIndex::new(0, 0, 0, 0), 0));
    }

    #[test]
    fn test_clamp_to_grid() {
        let shape = GridShape::new_2d(1, 4, 6);
        assert_eq!(shape.clamp_to_grid(-3, Axis::X), 0);
        assert_eq!(shape.clamp_to_grid(9, Axis::X), 3);
        assert_eq!(shape.clamp_to_grid(9, Axis::Y), 5);
        assert_eq!(shape.clamp_to_grid(4, Axis::Z), 0);
        assert_eq!(shape.min_extent(), 4);
    }
}
