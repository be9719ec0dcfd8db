//! Configuration types for advection runs.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::Scene;

/// Default depth for 2D simulations.
fn default_depth() -> usize {
    1
}

fn default_batch() -> usize {
    1
}

fn default_boundary_width() -> usize {
    1
}

fn default_strength() -> f32 {
    1.0
}

fn default_order_space() -> u8 {
    1
}

fn default_true() -> bool {
    true
}

/// Advection scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdvectionMethod {
    /// Single backward semi-Lagrangian step (first order).
    Euler,
    /// Forward + backward passes with correction and clamping (second order).
    #[default]
    MacCormack,
}

impl FromStr for AdvectionMethod {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "euler" => Ok(AdvectionMethod::Euler),
            "maccormack" => Ok(AdvectionMethod::MacCormack),
            other => Err(ConfigError::UnknownMethod(other.to_string())),
        }
    }
}

impl fmt::Display for AdvectionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AdvectionMethod::Euler => f.write_str("euler"),
            AdvectionMethod::MacCormack => f.write_str("maccormack"),
        }
    }
}

/// Options for a single `advect_scalar` / `advect_vel` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdvectionConfig {
    /// Whether the grids are 3D. Must agree with the grid depth.
    #[serde(default)]
    pub is_3d: bool,
    /// Euler or MacCormack.
    #[serde(default)]
    pub method: AdvectionMethod,
    /// Cells within this distance of the domain edge are copied, not advected.
    #[serde(default = "default_boundary_width")]
    pub boundary_width: usize,
    /// Allow scalar sampling to read non-fluid cells.
    #[serde(default)]
    pub sample_outside_fluid: bool,
    /// Scale of the MacCormack correction term (0 = Euler, 1 = full).
    #[serde(default = "default_strength")]
    pub maccormack_strength: f32,
    /// Spatial interpolation order: 1 = linear, 2 = cubic.
    #[serde(default = "default_order_space")]
    pub order_space: u8,
    /// Clip backward traces at obstacles and the domain edge.
    #[serde(default = "default_true")]
    pub line_trace: bool,
    /// Treat the scalar as a level set: apply the correction without clamping.
    #[serde(default)]
    pub is_levelset: bool,
}

impl Default for AdvectionConfig {
    fn default() -> Self {
        Self {
            is_3d: false,
            method: AdvectionMethod::default(),
            boundary_width: default_boundary_width(),
            sample_outside_fluid: false,
            maccormack_strength: default_strength(),
            order_space: default_order_space(),
            line_trace: true,
            is_levelset: false,
        }
    }
}

impl AdvectionConfig {
    /// Euler configuration with default options.
    pub fn euler() -> Self {
        Self {
            method: AdvectionMethod::Euler,
            ..Self::default()
        }
    }

    /// MacCormack configuration with default options.
    pub fn maccormack() -> Self {
        Self {
            method: AdvectionMethod::MacCormack,
            ..Self::default()
        }
    }

    /// Validate option values (grid-independent checks only).
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.maccormack_strength) {
            return Err(ConfigError::InvalidStrength(self.maccormack_strength));
        }
        if !matches!(self.order_space, 1 | 2) {
            return Err(ConfigError::InvalidOrderSpace(self.order_space));
        }
        Ok(())
    }
}

/// Top-level configuration for the simulation driver.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Grid width in cells (X dimension).
    pub width: usize,
    /// Grid height in cells (Y dimension).
    pub height: usize,
    /// Grid depth in cells (Z dimension). Use 1 for 2D simulations.
    #[serde(default = "default_depth")]
    pub depth: usize,
    /// Number of independent simulation instances.
    #[serde(default = "default_batch")]
    pub batch: usize,
    /// Time step size in cells per unit velocity.
    pub dt: f32,
    /// Options for density advection. `is_3d` is taken from `depth`.
    #[serde(default)]
    pub density: AdvectionConfig,
    /// Options for velocity self-advection. `is_3d` is taken from `depth`.
    #[serde(default)]
    pub velocity: AdvectionConfig,
    /// Initial flags, velocity and density.
    #[serde(default)]
    pub scene: Scene,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            width: 128,
            height: 128,
            depth: 1,
            batch: 1,
            dt: 0.5,
            density: AdvectionConfig::default(),
            velocity: AdvectionConfig::default(),
            scene: Scene::default(),
        }
    }
}

impl SimulationConfig {
    /// Check if this is a 3D simulation (depth > 1).
    #[inline]
    pub fn is_3d(&self) -> bool {
        self.depth > 1
    }

    /// Get total grid size over all batch elements.
    #[inline]
    pub fn grid_size(&self) -> usize {
        self.width * self.height * self.depth * self.batch
    }

    /// Density options with `is_3d` filled in from the grid.
    pub fn density_options(&self) -> AdvectionConfig {
        AdvectionConfig {
            is_3d: self.is_3d(),
            ..self.density.clone()
        }
    }

    /// Velocity options with `is_3d` filled in from the grid.
    pub fn velocity_options(&self) -> AdvectionConfig {
        AdvectionConfig {
            is_3d: self.is_3d(),
            ..self.velocity.clone()
        }
    }

    /// Validate configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 || self.depth == 0 {
            return Err(ConfigError::InvalidDimensions);
        }
        if self.batch == 0 {
            return Err(ConfigError::InvalidBatch);
        }
        if !self.dt.is_finite() || self.dt <= 0.0 {
            return Err(ConfigError::InvalidTimeStep);
        }
        self.density.validate()?;
        self.velocity.validate()?;
        Ok(())
    }
}

/// Configuration validation errors.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("Grid dimensions (width, height, depth) must be non-zero")]
    InvalidDimensions,
    #[error("Batch count must be non-zero")]
    InvalidBatch,
    #[error("Time step must be positive and finite")]
    InvalidTimeStep,
    #[error("MacCormack strength must be in [0, 1], got {0}")]
    InvalidStrength(f32),
    #[error("order_space must be 1 or 2, got {0}")]
    InvalidOrderSpace(u8),
    #[error("Unknown advection method '{0}' (expected 'euler' or 'maccormack')")]
    UnknownMethod(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(SimulationConfig::default().validate().is_ok());
        assert!(AdvectionConfig::default().validate().is_ok());
    }

    #[test]
    fn test_method_from_str() {
        assert_eq!("euler".parse::<AdvectionMethod>(), Ok(AdvectionMethod::Euler));
        assert_eq!(
            "maccormack".parse::<AdvectionMethod>(),
            Ok(AdvectionMethod::MacCormack)
        );
        assert_eq!(
            "rk4".parse::<AdvectionMethod>(),
            Err(ConfigError::UnknownMethod("rk4".to_string()))
        );
        assert_eq!(AdvectionMethod::MacCormack.to_string(), "maccormack");
    }

    #[test]
    fn test_invalid_options_rejected() {
        let mut cfg = AdvectionConfig::default();
        cfg.maccormack_strength = 1.5;
        assert_eq!(cfg.validate(), Err(ConfigError::InvalidStrength(1.5)));

        let mut cfg = AdvectionConfig::default();
        cfg.maccormack_strength = f32::NAN;
        assert!(cfg.validate().is_err());

        let mut cfg = AdvectionConfig::default();
        cfg.order_space = 3;
        assert_eq!(cfg.validate(), Err(ConfigError::InvalidOrderSpace(3)));

        let mut sim = SimulationConfig::default();
        sim.dt = f32::INFINITY;
        assert_eq!(sim.validate(), Err(ConfigError::InvalidTimeStep));
        sim.dt = 0.1;
        sim.batch = 0;
        assert_eq!(sim.validate(), Err(ConfigError::InvalidBatch));
    }

    #[test]
    fn test_json_defaults() {
        let cfg: AdvectionConfig = serde_json::from_str(r#"{"method": "euler"}"#).unwrap();
        assert_eq!(cfg.method, AdvectionMethod::Euler);
        assert_eq!(cfg.boundary_width, 1);
        assert_eq!(cfg.maccormack_strength, 1.0);
        assert!(cfg.line_trace);
        assert!(!cfg.sample_outside_fluid);

        let bad = serde_json::from_str::<AdvectionConfig>(r#"{"method": "upwind"}"#);
        assert!(bad.is_err());
    }

    #[test]
    fn test_options_take_dimensionality_from_depth() {
        let sim = SimulationConfig {
            depth: 8,
            ..SimulationConfig::default()
        };
        assert!(sim.density_options().is_3d);
        assert!(sim.velocity_options().is_3d);
        assert!(!SimulationConfig::default().density_options().is_3d);
    }

    #[test]
    fn test_config_file_roundtrip() {
        use std::io::Write;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sim.json");
        let config = SimulationConfig {
            width: 32,
            height: 16,
            density: AdvectionConfig::euler(),
            ..SimulationConfig::default()
        };
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(serde_json::to_string_pretty(&config).unwrap().as_bytes())
            .unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let loaded: SimulationConfig = serde_json::from_str(&text).unwrap();
        assert_eq!(loaded.width, 32);
        assert_eq!(loaded.height, 16);
        assert_eq!(loaded.density, config.density);
        assert!(loaded.validate().is_ok());
    }
}
