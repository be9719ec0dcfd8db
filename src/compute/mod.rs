//! Compute module - Tracing, sampling and advection kernels.

mod advect;
mod line_trace;
mod maccormack;
mod semi_lagrange;
mod simulation;

pub use advect::*;
pub use line_trace::*;
pub use maccormack::*;
pub use semi_lagrange::*;
pub use simulation::*;
