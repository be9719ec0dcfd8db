//! Scene types for initializing advection runs.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::grid::{Axis, CellIndex, CellType, FlagGrid, GridShape, MacGrid, RealGrid};

fn default_true() -> bool {
    true
}

/// Complete description of the initial flags, velocity and density.
///
/// Positions and sizes are fractions of the grid extent (0.0-1.0). The Z
/// coordinate is ignored for 2D grids. Every batch element receives the same
/// scene, except for noise which is seeded per element.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scene {
    /// Surround the domain with a one-cell solid wall.
    #[serde(default = "default_true")]
    pub solid_border: bool,
    /// Solid geometry inside the domain.
    #[serde(default)]
    pub obstacles: Vec<Obstacle>,
    /// Initial velocity field.
    #[serde(default)]
    pub velocity: VelocityPattern,
    /// Initial density, accumulated pattern by pattern.
    #[serde(default)]
    pub density: Vec<DensityPattern>,
}

impl Default for Scene {
    fn default() -> Self {
        Self {
            solid_border: true,
            obstacles: vec![Obstacle::Sphere {
                center: (0.65, 0.5, 0.5),
                radius: 0.08,
            }],
            velocity: VelocityPattern::Uniform {
                velocity: [1.0, 0.0, 0.0],
            },
            density: vec![DensityPattern::GaussianBlob {
                center: (0.3, 0.5, 0.5),
                radius: 0.1,
                amplitude: 1.0,
            }],
        }
    }
}

/// Solid geometry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Obstacle {
    /// Axis-aligned box between two corners.
    Box {
        min: (f32, f32, f32),
        max: (f32, f32, f32),
    },
    /// Sphere (circle in 2D). Radius is a fraction of the smallest extent.
    Sphere { center: (f32, f32, f32), radius: f32 },
}

/// Initial velocity.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum VelocityPattern {
    /// Fluid at rest.
    #[default]
    Zero,
    /// The same velocity on every face, in cells per unit time.
    Uniform { velocity: [f32; 3] },
    /// Rigid rotation about the Z axis through `center`, in radians per unit time.
    Vortex { center: (f32, f32), angular_speed: f32 },
}

/// Initial density contribution.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DensityPattern {
    /// Gaussian blob. Radius is a fraction of the smallest extent.
    GaussianBlob {
        center: (f32, f32, f32),
        radius: f32,
        amplitude: f32,
    },
    /// Constant value inside an axis-aligned box.
    Box {
        min: (f32, f32, f32),
        max: (f32, f32, f32),
        value: f32,
    },
    /// Uniform random noise in `[0, amplitude)`.
    Noise {
        amplitude: f32,
        /// Random seed; batch element `b` uses `seed + b`.
        seed: u64,
    },
}

/// Grids produced from a [`Scene`].
#[derive(Debug, Clone)]
pub struct SceneGrids {
    pub flags: FlagGrid,
    pub velocity: MacGrid,
    pub density: RealGrid,
}

impl Scene {
    /// Rasterize the scene onto a grid of the given shape.
    pub fn build(&self, shape: GridShape) -> SceneGrids {
        let flags = self.build_flags(shape);
        let velocity = self.build_velocity(shape, &flags);
        let density = self.build_density(shape, &flags);
        SceneGrids {
            flags,
            velocity,
            density,
        }
    }

    fn build_flags(&self, shape: GridShape) -> FlagGrid {
        let mut flags = if self.solid_border {
            FlagGrid::with_solid_border(shape, 1)
        } else {
            FlagGrid::new(shape, CellType::Fluid)
        };

        for idx in 0..shape.len() {
            let cell = shape.cell(idx);
            let p = normalized_center(shape, cell);
            if self.obstacles.iter().any(|o| o.contains(shape, p)) {
                flags.set(cell, CellType::Obstacle);
            }
        }
        flags
    }

    fn build_velocity(&self, shape: GridShape, flags: &FlagGrid) -> MacGrid {
        let mut vel = match &self.velocity {
            VelocityPattern::Zero => MacGrid::new(shape),
            VelocityPattern::Uniform { velocity } => MacGrid::uniform(shape, *velocity),
            VelocityPattern::Vortex {
                center,
                angular_speed,
            } => {
                let cx = center.0 * shape.width as f32;
                let cy = center.1 * shape.height as f32;
                let mut vel = MacGrid::new(shape);
                for idx in 0..shape.len() {
                    let cell = shape.cell(idx);
                    // u lives on (i, j + 0.5), v on (i + 0.5, j)
                    let u = -angular_speed * (cell.j as f32 + 0.5 - cy);
                    let v = angular_speed * (cell.i as f32 + 0.5 - cx);
                    vel.set(cell, [u, v, 0.0]);
                }
                vel
            }
        };

        // Faces touching a solid cell carry no flow.
        for idx in 0..shape.len() {
            let cell = shape.cell(idx);
            let mut v = vel.at(cell);
            for &axis in Axis::active(shape.is_3d()) {
                let back = axis.unit().map(|d| -d);
                let (i, j, k) = cell.offset(back);
                let lower_solid = shape.in_bounds(i, j, k) && flags.is_obstacle(i, j, k, cell.b);
                if flags.is_obstacle_at(cell) || lower_solid {
                    v[axis.index()] = 0.0;
                }
            }
            vel.set(cell, v);
        }
        vel
    }

    fn build_density(&self, shape: GridShape, flags: &FlagGrid) -> RealGrid {
        let mut density = RealGrid::zeros(shape);
        let min_dim = shape.min_extent() as f32;

        for pattern in &self.density {
            match pattern {
                DensityPattern::GaussianBlob {
                    center,
                    radius,
                    amplitude,
                } => {
                    let c = denormalize(shape, *center);
                    let r = radius * min_dim;
                    let sigma_sq = (r / 2.0).powi(2);
                    for idx in 0..shape.len() {
                        let cell = shape.cell(idx);
                        let p = cell.center();
                        let dist_sq = distance_sq(shape, p, c);
                        let value = amplitude * (-dist_sq / (2.0 * sigma_sq)).exp();
                        density.data_mut()[idx] += value;
                    }
                }
                DensityPattern::Box { min, max, value } => {
                    for idx in 0..shape.len() {
                        let p = normalized_center(shape, shape.cell(idx));
                        if in_box(shape, p, *min, *max) {
                            density.data_mut()[idx] += value;
                        }
                    }
                }
                DensityPattern::Noise { amplitude, seed } => {
                    let per_batch = shape.cells_per_batch();
                    for (b, chunk) in density.data_mut().chunks_mut(per_batch).enumerate() {
                        let mut rng = StdRng::seed_from_u64(seed.wrapping_add(b as u64));
                        for v in chunk.iter_mut() {
                            *v += amplitude * rng.gen_range(0.0f32..1.0);
                        }
                    }
                }
            }
        }

        for idx in 0..shape.len() {
            if flags.is_obstacle_at(shape.cell(idx)) {
                density.data_mut()[idx] = 0.0;
            }
        }
        density
    }
}

impl Obstacle {
    /// Check whether a normalized position lies inside the obstacle.
    fn contains(&self, shape: GridShape, p: (f32, f32, f32)) -> bool {
        match self {
            Obstacle::Box { min, max } => in_box(shape, p, *min, *max),
            Obstacle::Sphere { center, radius } => {
                let r = radius * shape.min_extent() as f32;
                let a = denormalize(shape, p);
                let c = denormalize(shape, *center);
                distance_sq(shape, a, c) <= r * r
            }
        }
    }
}

/// Cell center as a fraction of the grid extent.
fn normalized_center(shape: GridShape, cell: CellIndex) -> (f32, f32, f32) {
    let c = cell.center();
    (
        c[0] / shape.width as f32,
        c[1] / shape.height as f32,
        c[2] / shape.depth as f32,
    )
}

/// Fractional position to cell units.
fn denormalize(shape: GridShape, p: (f32, f32, f32)) -> [f32; 3] {
    [
        p.0 * shape.width as f32,
        p.1 * shape.height as f32,
        p.2 * shape.depth as f32,
    ]
}

fn distance_sq(shape: GridShape, a: [f32; 3], b: [f32; 3]) -> f32 {
    Axis::active(shape.is_3d())
        .iter()
        .map(|&axis| {
            let d = a[axis.index()] - b[axis.index()];
            d * d
        })
        .sum()
}

fn in_box(
    shape: GridShape,
    p: (f32, f32, f32),
    min: (f32, f32, f32),
    max: (f32, f32, f32),
) -> bool {
    let inside_xy = p.0 >= min.0 && p.0 <= max.0 && p.1 >= min.1 && p.1 <= max.1;
    inside_xy && (!shape.is_3d() || (p.2 >= min.2 && p.2 <= max.2))
}
