//! Interpolation of cell-centered lattices.
//!
//! Positions are in cell units: cell `(i, j, k)` has its sample at
//! `(i + 0.5, j + 0.5, k + 0.5)`. Lookups clamp indices to the grid, so
//! positions outside the domain read the nearest boundary cells. The Z
//! coordinate is ignored on 2D grids.

use serde::{Deserialize, Serialize};

use super::GridShape;

/// Total accepted weight below which a masked interpolation reports no data.
const MIN_MASKED_WEIGHT: f32 = 1e-6;

/// Spatial interpolation order (`order_space`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum InterpolationOrder {
    /// Multi-linear over the 2^d surrounding samples.
    #[default]
    Linear,
    /// Catmull-Rom cubic over the 4^d surrounding samples.
    Cubic,
}

impl InterpolationOrder {
    /// Map the numeric order (1 = linear, 2 = cubic).
    pub fn from_order_space(order: u8) -> Option<Self> {
        match order {
            1 => Some(Self::Linear),
            2 => Some(Self::Cubic),
            _ => None,
        }
    }

    pub fn order_space(self) -> u8 {
        match self {
            Self::Linear => 1,
            Self::Cubic => 2,
        }
    }
}

/// Cell containing `pos` (floor of every active coordinate).
#[inline]
pub fn containing_cell(pos: [f32; 3], is_3d: bool) -> (i32, i32, i32) {
    let k = if is_3d { pos[2].floor() as i32 } else { 0 };
    (pos[0].floor() as i32, pos[1].floor() as i32, k)
}

/// Lower corner and fractional offsets of the multi-linear stencil around `pos`.
#[derive(Debug, Clone, Copy)]
struct LinearStencil {
    base: [i32; 3],
    frac: [f32; 3],
    dims: usize,
}

impl LinearStencil {
    fn new(shape: GridShape, pos: [f32; 3]) -> Self {
        let dims = shape.dims();
        let mut base = [0i32; 3];
        let mut frac = [0.0f32; 3];
        for a in 0..dims {
            let p = pos[a] - 0.5;
            let f = p.floor();
            base[a] = f as i32;
            frac[a] = p - f;
        }
        Self { base, frac, dims }
    }

    /// Corner coordinates with their weights.
    fn corners(self) -> impl Iterator<Item = ([i32; 3], f32)> {
        (0..1usize << self.dims).map(move |mask| {
            let mut corner = self.base;
            let mut weight = 1.0f32;
            for a in 0..self.dims {
                if (mask >> a) & 1 == 1 {
                    corner[a] += 1;
                    weight *= self.frac[a];
                } else {
                    weight *= 1.0 - self.frac[a];
                }
            }
            (corner, weight)
        })
    }
}

/// Clamp a corner into the grid, returning the clamped signed coordinate.
#[inline]
fn clamp_corner(shape: GridShape, c: [i32; 3]) -> (i32, i32, i32) {
    let dims = shape.dims();
    let mut out = [0i32; 3];
    for a in 0..dims {
        let max = [shape.width, shape.height, shape.depth][a] as i32 - 1;
        out[a] = c[a].clamp(0, max);
    }
    (out[0], out[1], out[2])
}

/// Multi-linear interpolation of the lattice read through `fetch(flat_idx)`.
pub fn linear(shape: GridShape, b: usize, pos: [f32; 3], fetch: impl Fn(usize) -> f32) -> f32 {
    LinearStencil::new(shape, pos)
        .corners()
        .map(|(c, w)| {
            let (i, j, k) = clamp_corner(shape, c);
            w * fetch(shape.idx(i as usize, j as usize, k as usize, b))
        })
        .sum()
}

/// Multi-linear interpolation using only samples for which `accept(i, j, k)`
/// holds; the remaining weights are renormalised.
///
/// Returns `None` when no accepted sample carries weight.
pub fn linear_masked(
    shape: GridShape,
    b: usize,
    pos: [f32; 3],
    fetch: impl Fn(usize) -> f32,
    accept: impl Fn(i32, i32, i32) -> bool,
) -> Option<f32> {
    let mut value = 0.0f32;
    let mut total = 0.0f32;
    for (c, w) in LinearStencil::new(shape, pos).corners() {
        let (i, j, k) = clamp_corner(shape, c);
        if accept(i, j, k) {
            value += w * fetch(shape.idx(i as usize, j as usize, k as usize, b));
            total += w;
        }
    }
    (total > MIN_MASKED_WEIGHT).then(|| value / total)
}

/// Catmull-Rom spline through `p[1]..p[2]` at parameter `t` in `[0, 1)`.
#[inline]
fn catmull_rom(p: [f32; 4], t: f32) -> f32 {
    let t2 = t * t;
    let t3 = t2 * t;
    0.5 * (2.0 * p[1]
        + (p[2] - p[0]) * t
        + (2.0 * p[0] - 5.0 * p[1] + 4.0 * p[2] - p[3]) * t2
        + (3.0 * p[1] - p[0] - 3.0 * p[2] + p[3]) * t3)
}

/// Catmull-Rom cubic interpolation of the lattice read through `fetch(flat_idx)`.
pub fn cubic(shape: GridShape, b: usize, pos: [f32; 3], fetch: impl Fn(usize) -> f32) -> f32 {
    let stencil = LinearStencil::new(shape, pos);
    let [bi, bj, bk] = stencil.base;
    let [tx, ty, tz] = stencil.frac;

    let plane = |k: i32| -> f32 {
        let mut rows = [0.0f32; 4];
        for (dj, row) in rows.iter_mut().enumerate() {
            let j = bj + dj as i32 - 1;
            let mut samples = [0.0f32; 4];
            for (di, s) in samples.iter_mut().enumerate() {
                let i = bi + di as i32 - 1;
                *s = fetch(shape.clamped_idx(i, j, k, b));
            }
            *row = catmull_rom(samples, tx);
        }
        catmull_rom(rows, ty)
    };

    if shape.is_3d() {
        let mut planes = [0.0f32; 4];
        for (dk, p) in planes.iter_mut().enumerate() {
            *p = plane(bk + dk as i32 - 1);
        }
        catmull_rom(planes, tz)
    } else {
        plane(0)
    }
}

/// Cubic interpolation when every stencil sample is accepted, otherwise the
/// masked linear estimate.
pub fn cubic_masked(
    shape: GridShape,
    b: usize,
    pos: [f32; 3],
    fetch: impl Fn(usize) -> f32,
    accept: impl Fn(i32, i32, i32) -> bool,
) -> Option<f32> {
    let stencil = LinearStencil::new(shape, pos);
    let [bi, bj, bk] = stencil.base;
    let (k_lo, k_hi) = if shape.is_3d() { (bk - 1, bk + 2) } else { (0, 0) };

    let full = (k_lo..=k_hi).all(|k| {
        (bj - 1..=bj + 2).all(|j| {
            (bi - 1..=bi + 2).all(|i| {
                let (ci, cj, ck) = clamp_corner(shape, [i, j, k]);
                accept(ci, cj, ck)
            })
        })
    });

    if full {
        Some(cubic(shape, b, pos, fetch))
    } else {
        linear_masked(shape, b, pos, fetch, accept)
    }
}
