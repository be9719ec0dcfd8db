//! Cell classification (fluid / obstacle / empty).

use serde::{Deserialize, Serialize};

use super::{CellIndex, GridError, GridShape};

/// State of a single cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum CellType {
    #[default]
    Fluid = 1,
    Obstacle = 2,
    Empty = 4,
}

/// Per-cell flags for every batch element.
///
/// Queries outside the domain report [`CellType::Obstacle`].
#[derive(Debug, Clone, PartialEq)]
pub struct FlagGrid {
    shape: GridShape,
    data: Vec<CellType>,
}

impl FlagGrid {
    /// Create a grid with every cell set to `fill`.
    pub fn new(shape: GridShape, fill: CellType) -> Self {
        Self {
            shape,
            data: vec![fill; shape.len()],
        }
    }

    /// Wrap existing flag data.
    pub fn from_data(shape: GridShape, data: Vec<CellType>) -> Result<Self, GridError> {
        GridError::check_len(shape, data.len())?;
        Ok(Self { shape, data })
    }

    /// Fluid domain enclosed by a solid border of `border` cells.
    pub fn with_solid_border(shape: GridShape, border: usize) -> Self {
        let mut flags = Self::new(shape, CellType::Fluid);
        for idx in 0..shape.len() {
            if shape.is_boundary(shape.cell(idx), border) {
                flags.data[idx] = CellType::Obstacle;
            }
        }
        flags
    }

    #[inline]
    pub fn shape(&self) -> GridShape {
        self.shape
    }

    #[inline]
    pub fn is_3d(&self) -> bool {
        self.shape.is_3d()
    }

    pub fn data(&self) -> &[CellType] {
        &self.data
    }

    /// Cell type at a signed coordinate.
    #[inline]
    pub fn get(&self, i: i32, j: i32, k: i32, b: usize) -> CellType {
        if self.shape.in_bounds(i, j, k) {
            self.data[self.shape.idx(i as usize, j as usize, k as usize, b)]
        } else {
            CellType::Obstacle
        }
    }

    #[inline]
    pub fn at(&self, cell: CellIndex) -> CellType {
        self.data[self.shape.cell_idx(cell)]
    }

    pub fn set(&mut self, cell: CellIndex, value: CellType) {
        let idx = self.shape.cell_idx(cell);
        self.data[idx] = value;
    }

    #[inline]
    pub fn is_fluid(&self, i: i32, j: i32, k: i32, b: usize) -> bool {
        self.get(i, j, k, b) == CellType::Fluid
    }

    #[inline]
    pub fn is_obstacle(&self, i: i32, j: i32, k: i32, b: usize) -> bool {
        self.get(i, j, k, b) == CellType::Obstacle
    }

    #[inline]
    pub fn is_empty(&self, i: i32, j: i32, k: i32, b: usize) -> bool {
        self.get(i, j, k, b) == CellType::Empty
    }

    #[inline]
    pub fn is_fluid_at(&self, cell: CellIndex) -> bool {
        self.at(cell) == CellType::Fluid
    }

    #[inline]
    pub fn is_obstacle_at(&self, cell: CellIndex) -> bool {
        self.at(cell) == CellType::Obstacle
    }

    /// Number of cells of a given type (all batch elements).
    pub fn count(&self, cell_type: CellType) -> usize {
        self.data.iter().filter(|&&c| c == cell_type).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_out_of_domain_is_obstacle() {
        let flags = FlagGrid::new(GridShape::new_2d(1, 4, 4), CellType::Fluid);
        assert!(flags.is_fluid(0, 0, 0, 0));
        assert!(flags.is_obstacle(-1, 0, 0, 0));
        assert!(flags.is_obstacle(4, 0, 0, 0));
        assert!(flags.is_obstacle(0, 0, 1, 0));
    }

    #[test]
    fn test_solid_border() {
        let shape = GridShape::new_2d(2, 6, 5);
        let flags = FlagGrid::with_solid_border(shape, 1);
        assert_eq!(flags.count(CellType::Fluid), 2 * 4 * 3);
        assert!(flags.is_obstacle(0, 2, 0, 1));
        assert!(flags.is_fluid(1, 1, 0, 1));
    }

    #[test]
    fn test_from_data_rejects_wrong_length() {
        let shape = GridShape::new_2d(1, 3, 3);
        assert!(FlagGrid::from_data(shape, vec![CellType::Empty; 8]).is_err());
        assert!(FlagGrid::from_data(shape, vec![CellType::Empty; 9]).is_ok());
    }
}
