//! Per-cell vector grid, used to record traced sample positions.

use super::{CellIndex, GridError, GridShape};

#[derive(Debug, Clone, PartialEq)]
pub struct VecGrid {
    shape: GridShape,
    data: Vec<[f32; 3]>,
}

impl VecGrid {
    pub fn new(shape: GridShape) -> Self {
        Self {
            shape,
            data: vec![[0.0; 3]; shape.len()],
        }
    }

    pub fn from_data(shape: GridShape, data: Vec<[f32; 3]>) -> Result<Self, GridError> {
        GridError::check_len(shape, data.len())?;
        Ok(Self { shape, data })
    }

    #[inline]
    pub fn shape(&self) -> GridShape {
        self.shape
    }

    pub fn data(&self) -> &[[f32; 3]] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [[f32; 3]] {
        &mut self.data
    }

    #[inline]
    pub fn at(&self, cell: CellIndex) -> [f32; 3] {
        self.data[self.shape.cell_idx(cell)]
    }

    pub fn set(&mut self, cell: CellIndex, value: [f32; 3]) {
        let idx = self.shape.cell_idx(cell);
        self.data[idx] = value;
    }
}
