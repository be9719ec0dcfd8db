//! Cell-centered scalar grid.

use super::{CellIndex, FlagGrid, GridError, GridShape, InterpolationOrder, interp};

/// Scalar value per cell, per batch element.
#[derive(Debug, Clone, PartialEq)]
pub struct RealGrid {
    shape: GridShape,
    data: Vec<f32>,
}

impl RealGrid {
    /// Create a grid with every cell set to `fill`.
    pub fn new(shape: GridShape, fill: f32) -> Self {
        Self {
            shape,
            data: vec![fill; shape.len()],
        }
    }

    pub fn zeros(shape: GridShape) -> Self {
        Self::new(shape, 0.0)
    }

    /// Wrap existing data laid out as described on [`GridShape`].
    pub fn from_data(shape: GridShape, data: Vec<f32>) -> Result<Self, GridError> {
        GridError::check_len(shape, data.len())?;
        Ok(Self { shape, data })
    }

    /// Build a grid by evaluating `f` at every cell.
    pub fn from_fn(shape: GridShape, f: impl Fn(CellIndex) -> f32) -> Self {
        let data = (0..shape.len()).map(|idx| f(shape.cell(idx))).collect();
        Self { shape, data }
    }

    #[inline]
    pub fn shape(&self) -> GridShape {
        self.shape
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [f32] {
        &mut self.data
    }

    #[inline]
    pub fn at(&self, cell: CellIndex) -> f32 {
        self.data[self.shape.cell_idx(cell)]
    }

    /// Value at a signed coordinate, clamped to the grid.
    #[inline]
    pub fn get_clamped(&self, i: i32, j: i32, k: i32, b: usize) -> f32 {
        self.data[self.shape.clamped_idx(i, j, k, b)]
    }

    pub fn set(&mut self, cell: CellIndex, value: f32) {
        let idx = self.shape.cell_idx(cell);
        self.data[idx] = value;
    }

    /// Copy all values from another grid of the same shape.
    pub fn copy_from(&mut self, other: &RealGrid) {
        self.data.copy_from_slice(&other.data);
    }

    /// Interpolate at `pos` (cell units) in batch `b`, reading any cell.
    pub fn interpolate(&self, pos: [f32; 3], order: InterpolationOrder, b: usize) -> f32 {
        let fetch = |n: usize| self.data[n];
        match order {
            InterpolationOrder::Linear => interp::linear(self.shape, b, pos, fetch),
            InterpolationOrder::Cubic => interp::cubic(self.shape, b, pos, fetch),
        }
    }

    /// Interpolate at `pos` using fluid cells only.
    ///
    /// Returns `None` when no fluid cell contributes to the stencil.
    pub fn interpolate_fluid(
        &self,
        flags: &FlagGrid,
        pos: [f32; 3],
        order: InterpolationOrder,
        b: usize,
    ) -> Option<f32> {
        let fetch = |n: usize| self.data[n];
        let accept = |i: i32, j: i32, k: i32| flags.is_fluid(i, j, k, b);
        match order {
            InterpolationOrder::Linear => interp::linear_masked(self.shape, b, pos, fetch, accept),
            InterpolationOrder::Cubic => interp::cubic_masked(self.shape, b, pos, fetch, accept),
        }
    }

    /// Sum over all cells.
    pub fn sum(&self) -> f32 {
        self.data.iter().sum()
    }

    /// Minimum and maximum value (`(inf, -inf)` for an empty grid).
    pub fn min_max(&self) -> (f32, f32) {
        self.data
            .iter()
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::CellType;

    #[test]
    fn test_interpolate_fluid_skips_obstacles() {
        let shape = GridShape::new_2d(1, 4, 1);
        let grid = RealGrid::from_data(shape, vec![1.0, 2.0, 100.0, 4.0]).unwrap();
        let mut flags = FlagGrid::new(shape, CellType::Fluid);
        flags.set(CellIndex::new(2, 0, 0, 0), CellType::Obstacle);

        let plain = grid.interpolate([2.0, 0.5, 0.5], InterpolationOrder::Linear, 0);
        assert!((plain - 51.0).abs() < 1e-5);

        let fluid = grid
            .interpolate_fluid(&flags, [2.0, 0.5, 0.5], InterpolationOrder::Linear, 0)
            .unwrap();
        assert!((fluid - 2.0).abs() < 1e-5, "got {}", fluid);
    }

    #[test]
    fn test_batches_are_separate() {
        let shape = GridShape::new_2d(2, 3, 3);
        let grid = RealGrid::from_fn(shape, |c| c.b as f32 * 10.0);
        let v0 = grid.interpolate([1.2, 1.7, 0.5], InterpolationOrder::Cubic, 0);
        let v1 = grid.interpolate([1.2, 1.7, 0.5], InterpolationOrder::Cubic, 1);
        assert!(v0.abs() < 1e-6);
        assert!((v1 - 10.0).abs() < 1e-5);
    }

    #[test]
    fn test_min_max_and_sum() {
        let shape = GridShape::new_2d(1, 2, 2);
        let grid = RealGrid::from_data(shape, vec![-1.0, 3.0, 0.5, 2.0]).unwrap();
        assert_eq!(grid.min_max(), (-1.0, 3.0));
        assert!((grid.sum() - 4.5).abs() < 1e-6);
    }
}
