//! MacCormack correction and clamping.
//!
//! The forward pass advects `old` into `fwd`; the backward pass advects `fwd`
//! with the time-reversed velocity into `bwd`. Half the round-trip error
//! `old - bwd` estimates the first-order truncation error and is added back to
//! `fwd`. The corrected value may overshoot the range of the source values it
//! was built from, so it is clamped into the local extrema around the traced
//! position, falling back to `fwd` when no valid neighbour exists.

use crate::grid::{Axis, CellIndex, FlagGrid, MacGrid, RealGrid, VecGrid};

/// Lower-corner-relative offsets of the multi-linear stencil.
const CORNERS_2D: [[i32; 3]; 4] = [[0, 0, 0], [1, 0, 0], [0, 1, 0], [1, 1, 0]];

const CORNERS_3D: [[i32; 3]; 8] = [
    [0, 0, 0],
    [1, 0, 0],
    [0, 1, 0],
    [1, 1, 0],
    [0, 0, 1],
    [1, 0, 1],
    [0, 1, 1],
    [1, 1, 1],
];

/// Running min/max update with strict comparisons.
#[inline]
pub fn get_min_max(minv: &mut f32, maxv: &mut f32, val: f32) {
    if val < *minv {
        *minv = val;
    }
    if val > *maxv {
        *maxv = val;
    }
}

/// Second-order corrected scalar: `fwd + strength * 0.5 * (old - bwd)`.
///
/// Only fluid cells are corrected; other cells keep `fwd`.
pub fn maccormack_correct(
    flags: &FlagGrid,
    old: &RealGrid,
    fwd: &RealGrid,
    bwd: &RealGrid,
    strength: f32,
    cell: CellIndex,
) -> f32 {
    let dst = fwd.at(cell);
    if flags.is_fluid_at(cell) {
        dst + strength * 0.5 * (old.at(cell) - bwd.at(cell))
    } else {
        dst
    }
}

/// Extrema of `src` over the 3x3(x3) block around the cell containing `pos`.
///
/// Out-of-domain cells are skipped, and so are non-fluid cells unless
/// `sample_outside_fluid` is set. Returns `None` if nothing qualifies, in which
/// case no clamp should be performed.
pub fn get_clamp_bounds(
    src: &RealGrid,
    pos: [f32; 3],
    b: usize,
    flags: &FlagGrid,
    sample_outside_fluid: bool,
) -> Option<(f32, f32)> {
    let shape = src.shape();
    let i0 = shape.clamp_to_grid(pos[0] as i32, Axis::X) as i32;
    let j0 = shape.clamp_to_grid(pos[1] as i32, Axis::Y) as i32;
    let (k_lo, k_hi) = if shape.is_3d() {
        let k0 = shape.clamp_to_grid(pos[2] as i32, Axis::Z) as i32;
        (k0 - 1, k0 + 1)
    } else {
        (0, 0)
    };

    let mut minv = f32::INFINITY;
    let mut maxv = f32::NEG_INFINITY;
    let mut ncells = 0usize;
    for k in k_lo..=k_hi {
        for j in j0 - 1..=j0 + 1 {
            for i in i0 - 1..=i0 + 1 {
                if !shape.in_bounds(i, j, k) {
                    continue;
                }
                if sample_outside_fluid || flags.is_fluid(i, j, k, b) {
                    get_min_max(&mut minv, &mut maxv, src.get_clamped(i, j, k, b));
                    ncells += 1;
                }
            }
        }
    }

    (ncells > 0).then_some((minv, maxv))
}

/// Clamp a corrected scalar into the extrema around the forward-traced position.
///
/// Falls back to the Euler estimate `fwd` when the neighbourhood holds no
/// valid cell. A value equal to `fwd` (zero strength or zero correction) is
/// returned as is: the sampler may have produced it from the cell's own value,
/// which the searched neighbourhood need not contain.
pub fn maccormack_clamp(
    flags: &FlagGrid,
    corrected: f32,
    src: &RealGrid,
    fwd: &RealGrid,
    fwd_pos: &VecGrid,
    sample_outside_fluid: bool,
    cell: CellIndex,
) -> f32 {
    let euler = fwd.at(cell);
    if corrected == euler {
        return euler;
    }
    match get_clamp_bounds(src, fwd_pos.at(cell), cell.b, flags, sample_outside_fluid) {
        Some((clamp_min, clamp_max)) => corrected.min(clamp_max).max(clamp_min),
        None => euler,
    }
}

/// Corrected staggered velocity.
///
/// Component `c` is corrected only if the cell and its lower neighbour along
/// `c` (which share the face) are both fluid; otherwise it keeps `fwd`.
pub fn maccormack_correct_mac(
    flags: &FlagGrid,
    old: &MacGrid,
    fwd: &MacGrid,
    bwd: &MacGrid,
    strength: f32,
    cell: CellIndex,
) -> [f32; 3] {
    let f = fwd.at(cell);
    if !flags.is_fluid_at(cell) {
        return f;
    }

    let o = old.at(cell);
    let bw = bwd.at(cell);
    let mut dst = f;
    for &axis in Axis::active(flags.is_3d()) {
        let (i, j, k) = cell.offset(axis.unit().map(|d| -d));
        if flags.is_fluid(i, j, k, cell.b) {
            let c = axis.index();
            dst[c] = f[c] + strength * 0.5 * (o[c] - bw[c]);
        }
    }
    dst
}

/// Clamp one velocity component into the extrema of `orig` at the corners of
/// the lattice cell holding the backward-traced sample.
///
/// `center` is the cell center in the component's lattice and `step` the
/// displacement `vel * dt` at that component's face. Returns `fwd` when the
/// corrected value equals it, or when the grid is too small to hold a full
/// stencil along some axis.
pub fn clamp_component_mac(
    axis: Axis,
    corrected: f32,
    orig: &MacGrid,
    fwd: f32,
    center: [f32; 3],
    step: [f32; 3],
    b: usize,
) -> f32 {
    if corrected == fwd {
        return fwd;
    }

    let shape = orig.shape();
    let is_3d = shape.is_3d();

    let mut base = [0i32; 3];
    for &a in Axis::active(is_3d) {
        let upper = shape.extent(a) as i32 - 2;
        if upper < 0 {
            return fwd;
        }
        let n = a.index();
        let p = center[n] - step[n] - 0.5;
        base[n] = (p.floor() as i32).clamp(0, upper);
    }

    let corners: &[[i32; 3]] = if is_3d { &CORNERS_3D } else { &CORNERS_2D };
    let mut minv = f32::MAX;
    let mut maxv = -f32::MAX;
    for off in corners {
        let v = orig.get_clamped(axis, base[0] + off[0], base[1] + off[1], base[2] + off[2], b);
        get_min_max(&mut minv, &mut maxv, v);
    }

    corrected.min(maxv).max(minv)
}

/// Clamp every component of a corrected staggered velocity.
pub fn maccormack_clamp_mac(
    flags: &FlagGrid,
    vel: &MacGrid,
    corrected: [f32; 3],
    orig: &MacGrid,
    fwd: &MacGrid,
    dt: f32,
    cell: CellIndex,
) -> [f32; 3] {
    let f = fwd.at(cell);
    let center = cell.center();
    let mut dst = corrected;
    for &axis in Axis::active(flags.is_3d()) {
        let face = vel.at_face(axis, cell);
        let step = [face[0] * dt, face[1] * dt, face[2] * dt];
        let c = axis.index();
        dst[c] = clamp_component_mac(axis, corrected[c], orig, f[c], center, step, cell.b);
    }
    dst
}
