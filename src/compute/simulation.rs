//! Simulation driver - repeated density and velocity advection.
//!
//! Owns the destination and scratch buffers the advection kernels need, so a
//! step allocates nothing.

use log::{debug, warn};

use crate::grid::{FlagGrid, GridShape, MacGrid, RealGrid, VecGrid};
use crate::schema::{AdvectionConfig, ConfigError, SimulationConfig};

use super::{AdvectError, advect_scalar, advect_vel};

/// Simulation state container.
///
/// All fields share one [`GridShape`]; batch elements evolve independently.
#[derive(Debug, Clone)]
pub struct SimulationState {
    /// Cell classification (static over the run).
    pub flags: FlagGrid,
    /// Staggered velocity.
    pub velocity: MacGrid,
    /// Passive scalar carried by the flow.
    pub density: RealGrid,
    /// Current simulation time.
    pub time: f32,
    /// Step count.
    pub step: u64,
}

impl SimulationState {
    /// Create the initial state from the configured scene.
    pub fn from_config(config: &SimulationConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let grids = config.scene.build(shape_of(config));
        Ok(Self {
            flags: grids.flags,
            velocity: grids.velocity,
            density: grids.density,
            time: 0.0,
            step: 0,
        })
    }

    /// Grid shape shared by every field.
    #[inline]
    pub fn shape(&self) -> GridShape {
        self.flags.shape()
    }

    /// Check if this is a 3D simulation.
    #[inline]
    pub fn is_3d(&self) -> bool {
        self.shape().is_3d()
    }

    /// Total density over all batch elements.
    pub fn total_density(&self) -> f32 {
        self.density.sum()
    }
}

fn shape_of(config: &SimulationConfig) -> GridShape {
    if config.is_3d() {
        GridShape::new_3d(config.batch, config.width, config.height, config.depth)
    } else {
        GridShape::new_2d(config.batch, config.width, config.height)
    }
}

/// Scratch buffers for MacCormack scalar advection.
#[derive(Debug, Clone)]
pub struct ScalarScratch {
    pub fwd: RealGrid,
    pub bwd: RealGrid,
    pub fwd_pos: VecGrid,
    pub bwd_pos: VecGrid,
}

impl ScalarScratch {
    pub fn new(shape: GridShape) -> Self {
        Self {
            fwd: RealGrid::zeros(shape),
            bwd: RealGrid::zeros(shape),
            fwd_pos: VecGrid::new(shape),
            bwd_pos: VecGrid::new(shape),
        }
    }
}

/// Scratch buffers for MacCormack velocity advection.
#[derive(Debug, Clone)]
pub struct VelocityScratch {
    pub fwd: MacGrid,
    pub bwd: MacGrid,
}

impl VelocityScratch {
    pub fn new(shape: GridShape) -> Self {
        Self {
            fwd: MacGrid::new(shape),
            bwd: MacGrid::new(shape),
        }
    }
}

/// CPU advection propagator.
///
/// Each step advects the density through the current velocity, then
/// self-advects the velocity, and swaps the results into the state.
pub struct AdvectionPropagator {
    config: SimulationConfig,
    density_options: AdvectionConfig,
    velocity_options: AdvectionConfig,
    /// Pre-allocated buffer for the next density (reused each step).
    next_density: RealGrid,
    /// Pre-allocated buffer for the next velocity (reused each step).
    next_velocity: MacGrid,
    scalar_scratch: ScalarScratch,
    velocity_scratch: VelocityScratch,
}

impl AdvectionPropagator {
    /// Create new propagator from configuration.
    pub fn new(config: SimulationConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let shape = shape_of(&config);
        let density_options = config.density_options();
        let velocity_options = config.velocity_options();

        Ok(Self {
            density_options,
            velocity_options,
            next_density: RealGrid::zeros(shape),
            next_velocity: MacGrid::new(shape),
            scalar_scratch: ScalarScratch::new(shape),
            velocity_scratch: VelocityScratch::new(shape),
            config,
        })
    }

    /// Perform one simulation step.
    pub fn step(&mut self, state: &mut SimulationState) -> Result<(), AdvectError> {
        let dt = self.config.dt;

        let cfl = state.velocity.max_abs() * dt;
        if cfl > 1.0 {
            warn!(
                "CFL number {:.3} exceeds 1 at step {}; traces cross more than one cell",
                cfl, state.step
            );
        }

        advect_scalar(
            dt,
            &state.flags,
            &state.velocity,
            &state.density,
            &mut self.next_density,
            &mut self.scalar_scratch.fwd,
            &mut self.scalar_scratch.bwd,
            &mut self.scalar_scratch.fwd_pos,
            &mut self.scalar_scratch.bwd_pos,
            &self.density_options,
        )?;

        advect_vel(
            dt,
            &state.flags,
            &state.velocity,
            &mut self.next_velocity,
            &mut self.velocity_scratch.fwd,
            &mut self.velocity_scratch.bwd,
            &self.velocity_options,
        )?;

        // Swap fields (no allocation, just pointer swap)
        std::mem::swap(&mut state.density, &mut self.next_density);
        std::mem::swap(&mut state.velocity, &mut self.next_velocity);
        state.time += dt;
        state.step += 1;
        debug!("step {} done (t = {})", state.step, state.time);
        Ok(())
    }

    /// Run simulation for specified number of steps.
    pub fn run(&mut self, state: &mut SimulationState, steps: u64) -> Result<(), AdvectError> {
        for _ in 0..steps {
            self.step(state)?;
        }
        Ok(())
    }

    /// Get configuration reference.
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }
}

/// Simulation statistics for monitoring.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SimulationStats {
    pub total_density: f32,
    pub max_density: f32,
    pub min_density: f32,
    pub mean_density: f32,
    /// Cells with density above `1e-6`.
    pub active_cells: usize,
    pub fluid_cells: usize,
    /// Largest absolute face velocity.
    pub max_velocity: f32,
}

impl SimulationStats {
    /// Compute statistics from state.
    pub fn from_state(state: &SimulationState) -> Self {
        let mut total_density = 0.0f32;
        let mut max_density = f32::NEG_INFINITY;
        let mut min_density = f32::INFINITY;
        let mut active_cells = 0usize;

        for &v in state.density.data() {
            total_density += v;
            max_density = max_density.max(v);
            min_density = min_density.min(v);
            if v > 1e-6 {
                active_cells += 1;
            }
        }

        let count = state.density.data().len().max(1);
        Self {
            total_density,
            max_density,
            min_density,
            mean_density: total_density / count as f32,
            active_cells,
            fluid_cells: state.flags.count(crate::grid::CellType::Fluid),
            max_velocity: state.velocity.max_abs(),
        }
    }
}
