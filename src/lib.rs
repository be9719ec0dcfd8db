//! Fluid Advect - Semi-Lagrangian and MacCormack advection on MAC grids.
//!
//! This crate transports cell-centered scalars and staggered (MAC) velocity
//! fields through a velocity field over one time step, on batched 2D or 3D
//! grids whose cells are marked fluid, obstacle or empty. Backward traces are
//! clipped at solid geometry, and the second-order MacCormack scheme is
//! clamped to local extrema so it stays stable next to walls and free space.
//!
//! # Architecture
//!
//! The crate is split into three modules:
//!
//! - `grid`: Flag, scalar, staggered-velocity and position grids
//! - `compute`: Line tracing, samplers, MacCormack correction, orchestrators
//! - `schema`: Configuration types and scenes
//!
//! # Example
//!
//! ```rust,no_run
//! use fluid_advect::{
//!     compute::{AdvectionPropagator, SimulationState, SimulationStats},
//!     schema::SimulationConfig,
//! };
//!
//! // Default scene: a blob carried past a round obstacle
//! let config = SimulationConfig::default();
//! let mut state = SimulationState::from_config(&config).unwrap();
//!
//! let mut propagator = AdvectionPropagator::new(config).unwrap();
//! propagator.run(&mut state, 100).unwrap();
//!
//! let stats = SimulationStats::from_state(&state);
//! println!("Total density after 100 steps: {}", stats.total_density);
//! ```
//!
//! Single calls go through [`compute::advect_scalar`] and
//! [`compute::advect_vel`], with caller-owned destination and scratch buffers.

pub mod compute;
pub mod grid;
pub mod schema;

// Re-export commonly used types
pub use compute::{AdvectError, AdvectionPropagator, SimulationState, SimulationStats};
pub use compute::{advect_scalar, advect_vel};
pub use grid::{CellType, FlagGrid, GridShape, MacGrid, RealGrid, VecGrid};
pub use schema::{AdvectionConfig, AdvectionMethod, Scene, SimulationConfig};
