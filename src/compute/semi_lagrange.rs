//! Semi-Lagrangian (backward Euler trace) samplers.
//!
//! Each sampler computes the value one cell receives in a single advection
//! step: trace the cell center backward through the velocity field, then
//! interpolate the source field at the traced position.

use crate::grid::interp::containing_cell;
use crate::grid::{Axis, CellIndex, FlagGrid, InterpolationOrder, MacGrid, RealGrid};
use crate::schema::{AdvectionConfig, ConfigError};

use super::trace_position;

/// Sampling options shared by every cell of one advection call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TraceSettings {
    /// Interpolation order used for the final lookup.
    pub order: InterpolationOrder,
    /// Clip traces at obstacles and the domain edge.
    pub line_trace: bool,
    /// Allow scalar lookups to read non-fluid cells.
    pub sample_outside_fluid: bool,
}

impl Default for TraceSettings {
    fn default() -> Self {
        Self {
            order: InterpolationOrder::Linear,
            line_trace: true,
            sample_outside_fluid: false,
        }
    }
}

impl TryFrom<&AdvectionConfig> for TraceSettings {
    type Error = ConfigError;

    fn try_from(config: &AdvectionConfig) -> Result<Self, Self::Error> {
        let order = InterpolationOrder::from_order_space(config.order_space)
            .ok_or(ConfigError::InvalidOrderSpace(config.order_space))?;
        Ok(Self {
            order,
            line_trace: config.line_trace,
            sample_outside_fluid: config.sample_outside_fluid,
        })
    }
}

#[inline]
fn scaled(v: [f32; 3], s: f32) -> [f32; 3] {
    [v[0] * s, v[1] * s, v[2] * s]
}

/// Euler step for a cell-centered scalar.
///
/// Non-fluid cells are not advected and return their source value. When
/// `saved_pos` is given, the traced sample position is written to it (the cell
/// center for non-fluid cells); the MacCormack clamp searches around it.
///
/// Without `sample_outside_fluid`, only fluid cells contribute to the lookup,
/// and a trace that ends in a non-fluid cell yields the source value of `cell`.
pub fn semi_lagrange_euler(
    flags: &FlagGrid,
    vel: &MacGrid,
    src: &RealGrid,
    dt: f32,
    cell: CellIndex,
    settings: TraceSettings,
    saved_pos: Option<&mut [f32; 3]>,
) -> f32 {
    let center = cell.center();
    if !flags.is_fluid_at(cell) {
        if let Some(p) = saved_pos {
            *p = center;
        }
        return src.at(cell);
    }

    let displacement = scaled(vel.centered(cell), -dt);
    let pos = trace_position(center, displacement, flags, cell.b, settings.line_trace);
    if let Some(p) = saved_pos {
        *p = pos;
    }

    if settings.sample_outside_fluid {
        return src.interpolate(pos, settings.order, cell.b);
    }

    let (i, j, k) = containing_cell(pos, flags.is_3d());
    if !flags.is_fluid(i, j, k, cell.b) {
        return src.at(cell);
    }
    src.interpolate_fluid(flags, pos, settings.order, cell.b)
        .unwrap_or_else(|| src.at(cell))
}

/// Euler step for every component of a staggered velocity field.
///
/// Component `c` is traced from the cell center with the full velocity at its
/// own face and looked up in its own lattice. Non-fluid cells return their
/// source velocity. Velocity lookups may read any cell.
pub fn semi_lagrange_mac(
    flags: &FlagGrid,
    vel: &MacGrid,
    src: &MacGrid,
    dt: f32,
    cell: CellIndex,
    settings: TraceSettings,
) -> [f32; 3] {
    if !flags.is_fluid_at(cell) {
        return src.at(cell);
    }

    let center = cell.center();
    let mut out = [0.0f32; 3];
    for &axis in Axis::active(flags.is_3d()) {
        let displacement = scaled(vel.at_face(axis, cell), -dt);
        let pos = trace_position(center, displacement, flags, cell.b, settings.line_trace);
        out[axis.index()] = src.interpolate_component(axis, pos, settings.order, cell.b);
    }
    out
}

/// Plain staggered Euler step: [`semi_lagrange_mac`] without line tracing.
///
/// The velocity passes use this when `line_trace` is off.
pub fn semi_lagrange_mac_plain(
    flags: &FlagGrid,
    vel: &MacGrid,
    src: &MacGrid,
    dt: f32,
    order: InterpolationOrder,
    cell: CellIndex,
) -> [f32; 3] {
    let settings = TraceSettings {
        order,
        line_trace: false,
        sample_outside_fluid: true,
    };
    semi_lagrange_mac(flags, vel, src, dt, cell, settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{CellType, GridShape};

    fn row_setup() -> (GridShape, FlagGrid, MacGrid, RealGrid) {
        let shape = GridShape::new_2d(1, 5, 3);
        let flags = FlagGrid::new(shape, CellType::Fluid);
        let vel = MacGrid::uniform(shape, [1.0, 0.0, 0.0]);
        let src = RealGrid::from_fn(shape, |c| c.i as f32);
        (shape, flags, vel, src)
    }

    #[test]
    fn test_uniform_shift() {
        let (_, flags, vel, src) = row_setup();
        let settings = TraceSettings::default();
        for i in 1..4 {
            let cell = CellIndex::new(i, 1, 0, 0);
            let v = semi_lagrange_euler(&flags, &vel, &src, 1.0, cell, settings, None);
            assert!((v - (i as f32 - 1.0)).abs() < 1e-6, "cell {} got {}", i, v);
        }
    }

    #[test]
    fn test_saves_position() {
        let (_, flags, vel, src) = row_setup();
        let mut pos = [0.0f32; 3];
        let v = semi_lagrange_euler(
            &flags,
            &vel,
            &src,
            0.5,
            CellIndex::new(2, 1, 0, 0),
            TraceSettings::default(),
            Some(&mut pos),
        );
        assert!((pos[0] - 2.0).abs() < 1e-6);
        assert_eq!(pos[1], 1.5);
        assert!((v - 1.5).abs() < 1e-6);
    }

    #[test]
    fn test_non_fluid_cell_not_advected() {
        let (_, mut flags, vel, src) = row_setup();
        let cell = CellIndex::new(2, 1, 0, 0);
        flags.set(cell, CellType::Empty);
        let mut pos = [0.0f32; 3];
        let settings = TraceSettings::default();
        let v = semi_lagrange_euler(&flags, &vel, &src, 1.0, cell, settings, Some(&mut pos));
        assert_eq!(v, 2.0);
        assert_eq!(pos, cell.center());
    }

    #[test]
    fn test_landing_outside_fluid_policy() {
        let (_, mut flags, vel, src) = row_setup();
        // Empty cells do not stop the line trace
        flags.set(CellIndex::new(1, 1, 0, 0), CellType::Empty);
        let cell = CellIndex::new(2, 1, 0, 0);

        let restricted =
            semi_lagrange_euler(&flags, &vel, &src, 1.0, cell, TraceSettings::default(), None);
        assert_eq!(restricted, 2.0);

        let open = TraceSettings {
            sample_outside_fluid: true,
            ..TraceSettings::default()
        };
        let v = semi_lagrange_euler(&flags, &vel, &src, 1.0, cell, open, None);
        assert!((v - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_mac_uniform_field_preserved() {
        let shape = GridShape::new_3d(1, 6, 6, 6);
        let flags = FlagGrid::new(shape, CellType::Fluid);
        let vel = MacGrid::uniform(shape, [0.7, -0.4, 0.2]);
        for settings in [
            TraceSettings::default(),
            TraceSettings {
                order: InterpolationOrder::Cubic,
                ..TraceSettings::default()
            },
        ] {
            let cell = CellIndex::new(3, 3, 3, 0);
            let out = semi_lagrange_mac(&flags, &vel, &vel, 1.0, cell, settings);
            assert!((out[0] - 0.7).abs() < 1e-5);
            assert!((out[1] + 0.4).abs() < 1e-5);
            assert!((out[2] - 0.2).abs() < 1e-5);
        }
    }

    #[test]
    fn test_mac_component_shift() {
        let shape = GridShape::new_2d(1, 6, 4);
        let flags = FlagGrid::new(shape, CellType::Fluid);
        let vel = MacGrid::uniform(shape, [1.0, 0.0, 0.0]);
        let src = MacGrid::from_components(
            shape,
            &[
                (0..shape.len()).map(|n| shape.cell(n).i as f32).collect(),
                vec![3.0; shape.len()],
            ],
        )
        .unwrap();
        let out = semi_lagrange_mac_plain(
            &flags,
            &vel,
            &src,
            1.0,
            InterpolationOrder::Linear,
            CellIndex::new(3, 2, 0, 0),
        );
        assert!((out[0] - 2.0).abs() < 1e-6);
        assert!((out[1] - 3.0).abs() < 1e-6);
        assert_eq!(out[2], 0.0);
    }

    #[test]
    fn test_settings_from_config() {
        let mut config = AdvectionConfig::default();
        config.order_space = 2;
        config.line_trace = false;
        let settings = TraceSettings::try_from(&config).unwrap();
        assert_eq!(settings.order, InterpolationOrder::Cubic);
        assert!(!settings.line_trace);

        config.order_space = 0;
        assert!(TraceSettings::try_from(&config).is_err());
    }
}
