//! Grid module - Batched 2D/3D storage consumed by the advection kernels.

mod flags;
pub mod interp;
mod mac;
mod real;
mod shape;
mod vec;

pub use flags::*;
pub use interp::InterpolationOrder;
pub use mac::*;
pub use real::*;
pub use shape::*;
pub use vec::*;

/// Grid construction errors.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GridError {
    #[error("Grid data has {actual} cells but shape {shape:?} holds {expected}")]
    DataLength {
        shape: GridShape,
        expected: usize,
        actual: usize,
    },
    #[error("A {dims}D velocity grid needs {dims} components, got {actual}")]
    ComponentCount { dims: usize, actual: usize },
}

impl GridError {
    pub(crate) fn check_len(shape: GridShape, actual: usize) -> Result<(), Self> {
        if shape.len() == actual {
            Ok(())
        } else {
            Err(GridError::DataLength {
                shape,
                expected: shape.len(),
                actual,
            })
        }
    }
}
