use crate::config::Config;

/// Temperature diffuses at this fraction of the momentum diffusion rate.
pub const THERMAL_DIFFUSION_RATIO: f64 = 0.1;

/// How the Poisson equation is solved during projection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PressureSolve {
    /// Always run this many Gauss-Seidel sweeps.
    Fixed { iterations: usize },
    /// Sweep until the residual is below `tolerance`, checking every
    /// `check_interval` sweeps, for at most `max_iterations`.
    Adaptive {
        max_iterations: usize,
        tolerance: f64,
        check_interval: usize,
    },
}

/// Solver parameters for one simulation step.
#[derive(Debug, Clone, PartialEq)]
pub struct SolverParams {
    pub diffuse_iter: usize,
    pub pressure: PressureSolve,
    /// Confinement strength epsilon; `None` disables the pass.
    pub confinement: Option<f64>,
    pub gravity: (f64, f64),
    pub buoyancy: f64,
    pub ambient_temperature: f64,
}

impl Default for SolverParams {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl SolverParams {
    pub fn from_config(cfg: &Config) -> Self {
        let pressure = match cfg.pressure_tolerance {
            Some(tolerance) => PressureSolve::Adaptive {
                max_iterations: cfg.pressure_iterations,
                tolerance,
                check_interval: cfg.convergence_check_interval,
            },
            None => PressureSolve::Fixed { iterations: cfg.pressure_iterations },
        };
        Self {
            diffuse_iter: cfg.diffusion_iterations,
            pressure,
            confinement: cfg.enable_vorticity_confinement.then_some(cfg.vorticity_strength),
            gravity: (cfg.gravity[0], cfg.gravity[1]),
            buoyancy: cfg.buoyancy_factor,
            ambient_temperature: cfg.ambient_temperature,
        }
    }
}

/// Velocity diffusion coefficient alpha = dt * nu / dx^2, nu = viscosity / density.
pub fn velocity_alpha(dt: f64, viscosity: f64, density: f64, dx: f64) -> f64 {
    dt * (viscosity / density) / (dx * dx)
}
