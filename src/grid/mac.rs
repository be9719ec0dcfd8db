//! Staggered (MAC) velocity grid.
//!
//! Component `c` of cell `(i, j, k)` is the velocity through the lower face of
//! that cell along axis `c`. Each component is a lattice of its own; kernels
//! trace and sample it in its own index frame, so no half-cell shift is needed
//! between the trace origin and the lookup.

use super::{Axis, CellIndex, GridError, GridShape, InterpolationOrder, interp};

/// Face velocities for every batch element. 2D grids keep the Z slot at zero.
#[derive(Debug, Clone, PartialEq)]
pub struct MacGrid {
    shape: GridShape,
    data: Vec<[f32; 3]>,
}

impl MacGrid {
    /// Zero velocity everywhere.
    pub fn new(shape: GridShape) -> Self {
        Self {
            shape,
            data: vec![[0.0; 3]; shape.len()],
        }
    }

    /// The same face velocity on every face.
    pub fn uniform(shape: GridShape, velocity: [f32; 3]) -> Self {
        let mut v = velocity;
        if !shape.is_3d() {
            v[2] = 0.0;
        }
        Self {
            shape,
            data: vec![v; shape.len()],
        }
    }

    /// Wrap interleaved per-cell face velocities.
    pub fn from_data(shape: GridShape, data: Vec<[f32; 3]>) -> Result<Self, GridError> {
        GridError::check_len(shape, data.len())?;
        Ok(Self { shape, data })
    }

    /// Build from one flat buffer per component (2 in 2D, 3 in 3D).
    pub fn from_components(shape: GridShape, components: &[Vec<f32>]) -> Result<Self, GridError> {
        if components.len() != shape.dims() {
            return Err(GridError::ComponentCount {
                dims: shape.dims(),
                actual: components.len(),
            });
        }
        for c in components {
            GridError::check_len(shape, c.len())?;
        }
        let data = (0..shape.len())
            .map(|idx| {
                let mut v = [0.0f32; 3];
                for (slot, comp) in v.iter_mut().zip(components) {
                    *slot = comp[idx];
                }
                v
            })
            .collect();
        Ok(Self { shape, data })
    }

    #[inline]
    pub fn shape(&self) -> GridShape {
        self.shape
    }

    #[inline]
    pub fn is_3d(&self) -> bool {
        self.shape.is_3d()
    }

    pub fn data(&self) -> &[[f32; 3]] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [[f32; 3]] {
        &mut self.data
    }

    /// All face components stored at a cell.
    #[inline]
    pub fn at(&self, cell: CellIndex) -> [f32; 3] {
        self.data[self.shape.cell_idx(cell)]
    }

    pub fn set(&mut self, cell: CellIndex, value: [f32; 3]) {
        let idx = self.shape.cell_idx(cell);
        self.data[idx] = value;
    }

    /// One component at a signed coordinate, clamped to the grid.
    #[inline]
    pub fn get_clamped(&self, axis: Axis, i: i32, j: i32, k: i32, b: usize) -> f32 {
        self.data[self.shape.clamped_idx(i, j, k, b)][axis.index()]
    }

    /// Velocity at the cell center: average of the two faces along each axis.
    pub fn centered(&self, cell: CellIndex) -> [f32; 3] {
        let mut v = [0.0f32; 3];
        for &axis in Axis::active(self.is_3d()) {
            let (i, j, k) = cell.offset(axis.unit());
            let lower = self.data[self.shape.cell_idx(cell)][axis.index()];
            let upper = self.get_clamped(axis, i, j, k, cell.b);
            v[axis.index()] = 0.5 * (lower + upper);
        }
        v
    }

    /// Full velocity vector at the lower face of `cell` normal to `face`.
    ///
    /// The normal component is stored directly; each tangential component is
    /// the average of the four samples straddling the face.
    pub fn at_face(&self, face: Axis, cell: CellIndex) -> [f32; 3] {
        let mut v = [0.0f32; 3];
        let back = face.unit().map(|d| -d);
        for &comp in Axis::active(self.is_3d()) {
            v[comp.index()] = if comp == face {
                self.data[self.shape.cell_idx(cell)][comp.index()]
            } else {
                let up = comp.unit();
                let mut sum = 0.0f32;
                for da in [[0; 3], back] {
                    for dc in [[0; 3], up] {
                        let (i, j, k) =
                            cell.offset([da[0] + dc[0], da[1] + dc[1], da[2] + dc[2]]);
                        sum += self.get_clamped(comp, i, j, k, cell.b);
                    }
                }
                0.25 * sum
            };
        }
        v
    }

    /// Interpolate one component at `pos`, expressed in that component's lattice.
    pub fn interpolate_component(
        &self,
        axis: Axis,
        pos: [f32; 3],
        order: InterpolationOrder,
        b: usize,
    ) -> f32 {
        let c = axis.index();
        let fetch = |n: usize| self.data[n][c];
        match order {
            InterpolationOrder::Linear => interp::linear(self.shape, b, pos, fetch),
            InterpolationOrder::Cubic => interp::cubic(self.shape, b, pos, fetch),
        }
    }

    /// Largest absolute face velocity component.
    pub fn max_abs(&self) -> f32 {
        self.data
            .iter()
            .flat_map(|v| v.iter())
            .fold(0.0f32, |m, &x| m.max(x.abs()))
    }
}
