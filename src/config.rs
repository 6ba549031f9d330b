use std::path::Path;

use log::warn;
use serde::Deserialize;

use crate::error::{SimError, SimResult};
use crate::solver::Obstacle;

/// Default config file looked up by [`load`].
pub const CONFIG_FILE: &str = "macflow.yaml";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub width: usize,
    pub height: usize,
    /// Cell size in meters.
    pub dx: f64,
    pub density: f64,
    /// Dynamic viscosity; diffusion uses `viscosity / density`.
    pub viscosity: f64,
    pub time_step: f64,
    pub diffusion_iterations: usize,
    pub pressure_iterations: usize,
    pub enable_vorticity_confinement: bool,
    pub vorticity_strength: f64,
    pub inflow: InflowConfig,
    pub outflow: OutflowConfig,
    pub max_simulation_time: f64,
    /// Steps between `info!` progress lines.
    pub output_interval: u64,
    pub gravity: [f64; 2],
    pub buoyancy_factor: f64,
    pub ambient_temperature: f64,
    /// When set, projections stop early once the residual drops below it.
    pub pressure_tolerance: Option<f64>,
    pub convergence_check_interval: usize,
    pub periodic_x: bool,
    /// Streamline seed spacing in cells; 0 picks one from the grid size.
    pub streamline_spacing: usize,
    /// RMS divergence above which a step fails with `SimError::Diverged`.
    pub divergence_limit: Option<f64>,
    pub obstacles: Vec<Obstacle>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct InflowConfig {
    pub velocity: [f64; 2],
    pub temperature: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutflowConfig {
    pub pressure: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            width: 100,
            height: 50,
            dx: 0.02,
            density: 1.0,
            viscosity: 0.001,
            time_step: 0.01,
            diffusion_iterations: 20,
            pressure_iterations: 40,
            enable_vorticity_confinement: false,
            vorticity_strength: 0.3,
            inflow: InflowConfig::default(),
            outflow: OutflowConfig::default(),
            max_simulation_time: 10.0,
            output_interval: 10,
            gravity: [0.0, -9.81],
            buoyancy_factor: 0.0,
            ambient_temperature: 298.0,
            pressure_tolerance: None,
            convergence_check_interval: 10,
            periodic_x: false,
            streamline_spacing: 0,
            divergence_limit: None,
            obstacles: Vec::new(),
        }
    }
}

impl Default for InflowConfig {
    fn default() -> Self {
        Self {
            velocity: [1.0, 0.0],
            temperature: 298.0,
        }
    }
}

impl Default for OutflowConfig {
    fn default() -> Self {
        Self { pressure: 0.0 }
    }
}

fn positive(field: &'static str, value: f64) -> SimResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(SimError::config(field, format!("must be a finite value > 0, got {value}")))
    }
}

fn finite(field: &'static str, value: f64) -> SimResult<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(SimError::config(field, format!("must be finite, got {value}")))
    }
}

impl Config {
    /// Reject grids and parameters the solver cannot run with.
    pub fn validate(&self) -> SimResult<()> {
        if self.width < 3 {
            return Err(SimError::config("width", format!("must be >= 3, got {}", self.width)));
        }
        if self.height < 3 {
            return Err(SimError::config("height", format!("must be >= 3, got {}", self.height)));
        }
        positive("dx", self.dx)?;
        positive("time_step", self.time_step)?;
        positive("density", self.density)?;
        finite("viscosity", self.viscosity)?;
        if self.viscosity < 0.0 {
            return Err(SimError::config("viscosity", format!("must be >= 0, got {}", self.viscosity)));
        }
        if self.diffusion_iterations == 0 {
            return Err(SimError::config("diffusion_iterations", "must be >= 1"));
        }
        if self.pressure_iterations == 0 {
            return Err(SimError::config("pressure_iterations", "must be >= 1"));
        }
        if self.convergence_check_interval == 0 {
            return Err(SimError::config("convergence_check_interval", "must be >= 1"));
        }
        finite("vorticity_strength", self.vorticity_strength)?;
        finite("inflow.velocity", self.inflow.velocity[0])?;
        finite("inflow.velocity", self.inflow.velocity[1])?;
        finite("inflow.temperature", self.inflow.temperature)?;
        finite("outflow.pressure", self.outflow.pressure)?;
        finite("gravity", self.gravity[0])?;
        finite("gravity", self.gravity[1])?;
        finite("buoyancy_factor", self.buoyancy_factor)?;
        finite("ambient_temperature", self.ambient_temperature)?;
        if let Some(tol) = self.pressure_tolerance {
            positive("pressure_tolerance", tol)?;
        }
        if let Some(limit) = self.divergence_limit {
            positive("divergence_limit", limit)?;
        }
        Ok(())
    }

    /// Seed spacing for streamlines, resolving the automatic setting.
    pub fn effective_streamline_spacing(&self) -> usize {
        if self.streamline_spacing > 0 {
            self.streamline_spacing
        } else {
            (self.width.min(self.height) / 10).max(1)
        }
    }
}

/// Read, parse and validate a YAML config file.
pub fn load_from(path: impl AsRef<Path>) -> SimResult<Config> {
    let contents = std::fs::read_to_string(path)?;
    let cfg: Config = serde_yaml::from_str(&contents)?;
    cfg.validate()?;
    Ok(cfg)
}

/// Load `macflow.yaml` from the working directory, falling back to defaults.
pub fn load() -> Config {
    let path = Path::new(CONFIG_FILE);
    if !path.exists() {
        return Config::default();
    }
    match load_from(path) {
        Ok(cfg) => cfg,
        Err(e) => {
            warn!("failed to load {CONFIG_FILE}: {e}; using defaults");
            Config::default()
        }
    }
}
