//! Advection orchestrators.
//!
//! [`advect_scalar`] and [`advect_vel`] validate their buffers, then run either
//! a single Euler pass or the three MacCormack passes (forward, backward,
//! correct + clamp). Each pass is a rayon parallel loop over the flattened
//! `(b, k, j, i)` index of its output buffer. The end of a pass is the barrier
//! the next pass relies on.

use log::{debug, trace};
use rayon::prelude::*;

use crate::grid::{CellIndex, FlagGrid, GridShape, MacGrid, RealGrid, VecGrid};
use crate::schema::{AdvectionConfig, AdvectionMethod, ConfigError};

use super::{
    TraceSettings, maccormack_clamp, maccormack_clamp_mac, maccormack_correct,
    maccormack_correct_mac, semi_lagrange_euler, semi_lagrange_mac, semi_lagrange_mac_plain,
};

/// Errors reported before any cell is written.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AdvectError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("{field} has shape {actual:?}, expected {expected:?}")]
    ShapeMismatch {
        field: &'static str,
        expected: GridShape,
        actual: GridShape,
    },
    #[error("is_3d = {is_3d} does not match grid depth {depth}")]
    DimensionMismatch { is_3d: bool, depth: usize },
    #[error("Boundary width {width} leaves no interior on a grid with smallest extent {min_extent}")]
    BoundaryTooWide { width: usize, min_extent: usize },
    #[error("Time step must be finite, got {0}")]
    NonFiniteTimeStep(f32),
}

/// Check call preconditions and derive the per-cell sampling options.
fn validate(
    dt: f32,
    flags: &FlagGrid,
    fields: &[(&'static str, GridShape)],
    config: &AdvectionConfig,
) -> Result<TraceSettings, AdvectError> {
    config.validate()?;
    let settings = TraceSettings::try_from(config)?;

    if !dt.is_finite() {
        return Err(AdvectError::NonFiniteTimeStep(dt));
    }

    let shape = flags.shape();
    if config.is_3d != shape.is_3d() {
        return Err(AdvectError::DimensionMismatch {
            is_3d: config.is_3d,
            depth: shape.depth,
        });
    }

    for &(field, actual) in fields {
        if actual != shape {
            return Err(AdvectError::ShapeMismatch {
                field,
                expected: shape,
                actual,
            });
        }
    }

    let min_extent = shape.min_extent();
    if config.boundary_width.saturating_mul(2) >= min_extent {
        return Err(AdvectError::BoundaryTooWide {
            width: config.boundary_width,
            min_extent,
        });
    }

    Ok(settings)
}

/// Cells inside the boundary margin and obstacle cells are copied, not advected.
#[inline]
fn is_skipped(flags: &FlagGrid, cell: CellIndex, boundary_width: usize) -> bool {
    flags.shape().is_boundary(cell, boundary_width) || flags.is_obstacle_at(cell)
}

/// Advect a cell-centered scalar through the staggered velocity `vel`.
///
/// `fwd`, `bwd`, `fwd_pos` and `bwd_pos` are caller-owned scratch buffers; the
/// MacCormack method fills all four, Euler leaves them untouched. `dst` is
/// fully overwritten.
///
/// # Arguments
/// * `dt` - Time step (cells per unit velocity)
/// * `flags` - Cell classification; its shape is the reference for every buffer
/// * `vel` - Staggered velocity
/// * `src` - Scalar being advected
/// * `dst` - Output scalar
/// * `config` - Method and sampling options
#[allow(clippy::too_many_arguments)]
pub fn advect_scalar(
    dt: f32,
    flags: &FlagGrid,
    vel: &MacGrid,
    src: &RealGrid,
    dst: &mut RealGrid,
    fwd: &mut RealGrid,
    bwd: &mut RealGrid,
    fwd_pos: &mut VecGrid,
    bwd_pos: &mut VecGrid,
    config: &AdvectionConfig,
) -> Result<(), AdvectError> {
    let settings = validate(
        dt,
        flags,
        &[
            ("vel", vel.shape()),
            ("src", src.shape()),
            ("dst", dst.shape()),
            ("fwd", fwd.shape()),
            ("bwd", bwd.shape()),
            ("fwd_pos", fwd_pos.shape()),
            ("bwd_pos", bwd_pos.shape()),
        ],
        config,
    )?;

    let shape = flags.shape();
    let bnd = config.boundary_width;
    debug!(
        "advect_scalar: method={} shape={:?} dt={} order={}",
        config.method, shape, dt, config.order_space
    );

    match config.method {
        AdvectionMethod::Euler => {
            dst.data_mut()
                .par_iter_mut()
                .enumerate()
                .for_each(|(idx, out)| {
                    let cell = shape.cell(idx);
                    *out = if is_skipped(flags, cell, bnd) {
                        src.at(cell)
                    } else {
                        semi_lagrange_euler(flags, vel, src, dt, cell, settings, None)
                    };
                });
        }
        AdvectionMethod::MacCormack => {
            scalar_trace_pass(dt, flags, vel, src, src, fwd, fwd_pos, bnd, settings);
            trace!("advect_scalar: forward pass done");

            scalar_trace_pass(-dt, flags, vel, fwd, src, bwd, bwd_pos, bnd, settings);
            trace!("advect_scalar: backward pass done");

            let fwd: &RealGrid = fwd;
            let bwd: &RealGrid = bwd;
            let fwd_pos: &VecGrid = fwd_pos;
            let strength = config.maccormack_strength;
            dst.data_mut()
                .par_iter_mut()
                .enumerate()
                .for_each(|(idx, out)| {
                    let cell = shape.cell(idx);
                    if is_skipped(flags, cell, bnd) {
                        *out = src.at(cell);
                        return;
                    }
                    let corrected = maccormack_correct(flags, src, fwd, bwd, strength, cell);
                    *out = if config.is_levelset {
                        corrected
                    } else if flags.is_fluid_at(cell) {
                        maccormack_clamp(
                            flags,
                            corrected,
                            src,
                            fwd,
                            fwd_pos,
                            settings.sample_outside_fluid,
                            cell,
                        )
                    } else {
                        fwd.at(cell)
                    };
                });
            trace!("advect_scalar: correction pass done");
        }
    }

    Ok(())
}

/// One position-saving Euler pass of `from` into `out`.
///
/// Skipped cells receive the value of `orig` and their own center.
#[allow(clippy::too_many_arguments)]
fn scalar_trace_pass(
    dt: f32,
    flags: &FlagGrid,
    vel: &MacGrid,
    from: &RealGrid,
    orig: &RealGrid,
    out: &mut RealGrid,
    out_pos: &mut VecGrid,
    bnd: usize,
    settings: TraceSettings,
) {
    let shape = flags.shape();
    out.data_mut()
        .par_iter_mut()
        .zip(out_pos.data_mut().par_iter_mut())
        .enumerate()
        .for_each(|(idx, (value, pos))| {
            let cell = shape.cell(idx);
            if is_skipped(flags, cell, bnd) {
                *value = orig.at(cell);
                *pos = cell.center();
            } else {
                *value = semi_lagrange_euler(flags, vel, from, dt, cell, settings, Some(pos));
            }
        });
}

/// Self-advect the staggered velocity `vel`, one component at a time.
///
/// `fwd` and `bwd` are caller-owned scratch buffers used by the MacCormack
/// method. `dst` is fully overwritten.
pub fn advect_vel(
    dt: f32,
    flags: &FlagGrid,
    vel: &MacGrid,
    dst: &mut MacGrid,
    fwd: &mut MacGrid,
    bwd: &mut MacGrid,
    config: &AdvectionConfig,
) -> Result<(), AdvectError> {
    let settings = validate(
        dt,
        flags,
        &[
            ("vel", vel.shape()),
            ("dst", dst.shape()),
            ("fwd", fwd.shape()),
            ("bwd", bwd.shape()),
        ],
        config,
    )?;

    let shape = flags.shape();
    let bnd = config.boundary_width;
    debug!(
        "advect_vel: method={} shape={:?} dt={} order={}",
        config.method, shape, dt, config.order_space
    );

    match config.method {
        AdvectionMethod::Euler => {
            mac_trace_pass(dt, flags, vel, vel, vel, dst, bnd, settings);
        }
        AdvectionMethod::MacCormack => {
            mac_trace_pass(dt, flags, vel, vel, vel, fwd, bnd, settings);
            trace!("advect_vel: forward pass done");

            mac_trace_pass(-dt, flags, vel, fwd, vel, bwd, bnd, settings);
            trace!("advect_vel: backward pass done");

            let fwd: &MacGrid = fwd;
            let bwd: &MacGrid = bwd;
            let strength = config.maccormack_strength;
            dst.data_mut()
                .par_iter_mut()
                .enumerate()
                .for_each(|(idx, out)| {
                    let cell = shape.cell(idx);
                    *out = if is_skipped(flags, cell, bnd) {
                        vel.at(cell)
                    } else if flags.is_fluid_at(cell) {
                        let corrected = maccormack_correct_mac(flags, vel, fwd, bwd, strength, cell);
                        maccormack_clamp_mac(flags, vel, corrected, vel, fwd, dt, cell)
                    } else {
                        fwd.at(cell)
                    };
                });
            trace!("advect_vel: correction pass done");
        }
    }

    Ok(())
}

/// One Euler pass of the staggered field `from` into `out`.
///
/// Without line tracing this is the plain staggered sampler.
#[allow(clippy::too_many_arguments)]
fn mac_trace_pass(
    dt: f32,
    flags: &FlagGrid,
    vel: &MacGrid,
    from: &MacGrid,
    orig: &MacGrid,
    out: &mut MacGrid,
    bnd: usize,
    settings: TraceSettings,
) {
    let shape = flags.shape();
    out.data_mut()
        .par_iter_mut()
        .enumerate()
        .for_each(|(idx, value)| {
            let cell = shape.cell(idx);
            *value = if is_skipped(flags, cell, bnd) {
                orig.at(cell)
            } else if settings.line_trace {
                semi_lagrange_mac(flags, vel, from, dt, cell, settings)
            } else {
                semi_lagrange_mac_plain(flags, vel, from, dt, settings.order, cell)
            };
        });
}
