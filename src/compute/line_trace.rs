//! Obstacle-aware clipping of backward traces.
//!
//! A semi-Lagrangian trace routinely ends inside solid geometry or outside the
//! domain, where the source field holds no meaningful data. The tracer walks
//! the cells crossed by the segment (3D-DDA) and stops just short of the first
//! blocked cell.

use crate::grid::FlagGrid;

/// Distance (in cells) kept between a clipped end point and the blocking face.
pub const HIT_MARGIN: f32 = 1e-5;

/// Displacements shorter than this are not traced.
const MIN_TRACE_LENGTH: f32 = 1e-6;

/// Result of a line trace.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineTrace {
    /// End position after clipping.
    pub end: [f32; 3],
    /// True if the segment was shortened (or the start itself was blocked).
    pub clipped: bool,
}

#[inline]
fn is_blocked(flags: &FlagGrid, cell: [i32; 3], b: usize) -> bool {
    flags.is_obstacle(cell[0], cell[1], cell[2], b)
}

/// Trace from `start` along `delta` and clip at the first obstacle or domain face.
///
/// If the start cell is blocked, or the displacement is not finite (NaN, or
/// too long to measure in `f32`), the trace degenerates to `start`.
pub fn calc_line_trace(start: [f32; 3], delta: [f32; 3], flags: &FlagGrid, b: usize) -> LineTrace {
    let dims = flags.shape().dims();
    let mut delta = delta;
    if dims == 2 {
        delta[2] = 0.0;
    }

    let mut cell = [0i32; 3];
    for a in 0..dims {
        cell[a] = start[a].floor() as i32;
    }
    if is_blocked(flags, cell, b) {
        return LineTrace {
            end: start,
            clipped: true,
        };
    }

    let length = delta[0].hypot(delta[1]).hypot(delta[2]);
    if !length.is_finite() {
        return LineTrace {
            end: start,
            clipped: true,
        };
    }
    let unclipped = [start[0] + delta[0], start[1] + delta[1], start[2] + delta[2]];
    if length < MIN_TRACE_LENGTH {
        return LineTrace {
            end: unclipped,
            clipped: false,
        };
    }
    let dir = delta.map(|d| d / length);

    // Distance along the ray to the next face crossing per axis, and the
    // distance between successive crossings.
    let mut step = [0i32; 3];
    let mut t_max = [f32::INFINITY; 3];
    let mut t_delta = [f32::INFINITY; 3];
    for a in 0..dims {
        if dir[a] > 0.0 {
            step[a] = 1;
            t_max[a] = ((cell[a] + 1) as f32 - start[a]) / dir[a];
            t_delta[a] = 1.0 / dir[a];
        } else if dir[a] < 0.0 {
            step[a] = -1;
            t_max[a] = (cell[a] as f32 - start[a]) / dir[a];
            t_delta[a] = -1.0 / dir[a];
        }
    }

    loop {
        let mut axis = 0;
        for a in 1..dims {
            if t_max[a] < t_max[axis] {
                axis = a;
            }
        }
        let t = t_max[axis];
        if !t.is_finite() || t > length {
            break;
        }

        cell[axis] += step[axis];
        if is_blocked(flags, cell, b) {
            let t_stop = (t - HIT_MARGIN).max(0.0);
            return LineTrace {
                end: [
                    start[0] + dir[0] * t_stop,
                    start[1] + dir[1] * t_stop,
                    start[2] + dir[2] * t_stop,
                ],
                clipped: true,
            };
        }
        t_max[axis] += t_delta[axis];
    }

    LineTrace {
        end: unclipped,
        clipped: false,
    }
}

/// Backward position from `start` along `delta`, line traced when `line_trace` is set.
#[inline]
pub fn trace_position(
    start: [f32; 3],
    delta: [f32; 3],
    flags: &FlagGrid,
    b: usize,
    line_trace: bool,
) -> [f32; 3] {
    if line_trace {
        calc_line_trace(start, delta, flags, b).end
    } else {
        [start[0] + delta[0], start[1] + delta[1], start[2] + delta[2]]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{CellIndex, CellType, GridShape};

    fn open_2d(width: usize, height: usize) -> FlagGrid {
        FlagGrid::new(GridShape::new_2d(1, width, height), CellType::Fluid)
    }

    #[test]
    fn test_unobstructed_trace_is_unchanged() {
        let flags = open_2d(10, 10);
        let trace = calc_line_trace([5.5, 5.5, 0.5], [-2.3, 1.1, 0.0], &flags, 0);
        assert!(!trace.clipped);
        assert!((trace.end[0] - 3.2).abs() < 1e-6);
        assert!((trace.end[1] - 6.6).abs() < 1e-6);
    }

    #[test]
    fn test_blocked_start_degenerates() {
        let mut flags = open_2d(5, 5);
        flags.set(CellIndex::new(2, 2, 0, 0), CellType::Obstacle);
        let trace = calc_line_trace([2.5, 2.5, 0.5], [-1.0, 0.0, 0.0], &flags, 0);
        assert!(trace.clipped);
        assert_eq!(trace.end, [2.5, 2.5, 0.5]);
    }

    #[test]
    fn test_stops_before_obstacle_face() {
        let mut flags = open_2d(5, 3);
        flags.set(CellIndex::new(2, 1, 0, 0), CellType::Obstacle);
        let trace = calc_line_trace([3.5, 1.5, 0.5], [-1.0, 0.0, 0.0], &flags, 0);
        assert!(trace.clipped);
        assert!(trace.end[0] > 3.0);
        assert!((trace.end[0] - 3.0).abs() < 1e-4);
        assert_eq!(trace.end[1], 1.5);
    }

    #[test]
    fn test_stays_inside_domain() {
        let flags = open_2d(4, 4);
        let trace = calc_line_trace([0.5, 2.5, 0.5], [-3.0, 0.0, 0.0], &flags, 0);
        assert!(trace.clipped);
        assert!(trace.end[0] > 0.0 && trace.end[0] < 1e-3);

        let trace = calc_line_trace([2.5, 3.5, 0.5], [0.0, 5.0, 0.0], &flags, 0);
        assert!(trace.end[1] < 4.0);
    }

    #[test]
    fn test_diagonal_trace_3d() {
        let shape = GridShape::new_3d(1, 6, 6, 6);
        let mut flags = FlagGrid::new(shape, CellType::Fluid);
        flags.set(CellIndex::new(2, 2, 2, 0), CellType::Obstacle);
        let start = [3.5, 3.5, 3.5];
        let trace = calc_line_trace(start, [-2.0, -2.0, -2.0], &flags, 0);
        assert!(trace.clipped);
        // Enters the blocked cell through its corner at (3, 3, 3)
        for a in 0..3 {
            assert!(trace.end[a] >= 3.0 - 1e-4, "axis {} end {}", a, trace.end[a]);
        }

        // Different batch element has no obstacle
        let shape2 = GridShape::new_3d(2, 6, 6, 6);
        let mut flags2 = FlagGrid::new(shape2, CellType::Fluid);
        flags2.set(CellIndex::new(2, 2, 2, 0), CellType::Obstacle);
        let trace = calc_line_trace(start, [-2.0, -2.0, -2.0], &flags2, 1);
        assert!(!trace.clipped);
    }

    #[test]
    fn test_huge_displacement_terminates() {
        let flags = open_2d(8, 8);
        let trace = calc_line_trace([3.5, 3.5, 0.5], [-1e20, 0.0, 0.0], &flags, 0);
        assert!(trace.clipped);
        assert!(trace.end[0] >= 0.0 && trace.end[0] < 1e-3, "end {:?}", trace.end);
        assert_eq!(trace.end[1], 3.5);

        let trace = calc_line_trace([3.5, 3.5, 0.5], [3e38, 3e38, 0.0], &flags, 0);
        assert!(trace.clipped);
        assert_eq!(trace.end, [3.5, 3.5, 0.5]);
    }

    #[test]
    fn test_nan_displacement_degenerates() {
        let flags = open_2d(8, 8);
        let trace = calc_line_trace([3.5, 3.5, 0.5], [f32::NAN, -1.0, 0.0], &flags, 0);
        assert!(trace.clipped);
        assert_eq!(trace.end, [3.5, 3.5, 0.5]);
    }

    #[test]
    fn test_zero_displacement() {
        let flags = open_2d(4, 4);
        let trace = calc_line_trace([1.5, 1.5, 0.5], [0.0, -0.0, 0.0], &flags, 0);
        assert!(!trace.clipped);
        assert_eq!(trace.end, [1.5, 1.5, 0.5]);
    }
}
