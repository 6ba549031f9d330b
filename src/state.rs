use std::collections::VecDeque;

/// Default fluid temperature in kelvin.
pub const DEFAULT_TEMPERATURE: f64 = 298.0;

/// Maximum number of convergence samples kept in [`SimulationState`].
pub const HISTORY_CAP: usize = 1000;

/// Index of cell-centered sample `(i, j)` in a `width x height` array.
#[inline(always)]
pub const fn cell_idx(i: usize, j: usize, width: usize) -> usize {
    j * width + i
}

/// Index of u-face `(i, j)`; u arrays are `height x (width + 1)`.
#[inline(always)]
pub const fn u_idx(i: usize, j: usize, width: usize) -> usize {
    j * (width + 1) + i
}

/// Index of v-face `(i, j)`; v arrays are `(height + 1) x width`.
#[inline(always)]
pub const fn v_idx(i: usize, j: usize, width: usize) -> usize {
    j * width + i
}

/// Staggered (MAC) field storage.
///
/// `u` lives on vertical cell faces, `v` on horizontal faces, scalars at cell
/// centers. All arrays, including the scratch buffers used by the operators,
/// are allocated here once and never resized.
#[derive(Clone, Debug)]
pub struct Field {
    pub width: usize,
    pub height: usize,
    pub dx: f64,
    pub dt: f64,
    pub density: f64,
    pub viscosity: f64,
    pub u: Vec<f64>,
    pub v: Vec<f64>,
    pub pressure: Vec<f64>,
    pub divergence: Vec<f64>,
    pub vorticity: Vec<f64>,
    pub temperature: Vec<f64>,
    /// Previous-state buffer for u (diffusion source / advection snapshot).
    pub u0: Vec<f64>,
    /// Previous-state buffer for v.
    pub v0: Vec<f64>,
    /// Previous-state buffer for temperature.
    pub temperature0: Vec<f64>,
    /// Poisson right-hand side.
    pub rhs: Vec<f64>,
    /// |vorticity|, used by confinement.
    pub vorticity_abs: Vec<f64>,
}

impl Field {
    /// Zero-filled staggered arrays; temperature starts at 298 K.
    pub fn new(width: usize, height: usize, density: f64, viscosity: f64, dx: f64, dt: f64) -> Self {
        debug_assert!(width >= 3 && height >= 3, "grid must be at least 3x3");
        let cells = width * height;
        let u_len = (width + 1) * height;
        let v_len = width * (height + 1);
        Self {
            width,
            height,
            dx,
            dt,
            density,
            viscosity,
            u: vec![0.0; u_len],
            v: vec![0.0; v_len],
            pressure: vec![0.0; cells],
            divergence: vec![0.0; cells],
            vorticity: vec![0.0; cells],
            temperature: vec![DEFAULT_TEMPERATURE; cells],
            u0: vec![0.0; u_len],
            v0: vec![0.0; v_len],
            temperature0: vec![0.0; cells],
            rhs: vec![0.0; cells],
            vorticity_abs: vec![0.0; cells],
        }
    }

    /// Uniform velocity `v0`, temperature `t0`, zero pressure.
    pub fn initialize(&mut self, v0: (f64, f64), t0: f64) {
        self.u.fill(v0.0);
        self.v.fill(v0.1);
        self.temperature.fill(t0);
        self.pressure.fill(0.0);
        self.divergence.fill(0.0);
        self.vorticity.fill(0.0);
    }

    pub fn u_at(&self, i: usize, j: usize) -> f64 {
        self.u[u_idx(i, j, self.width)]
    }

    pub fn v_at(&self, i: usize, j: usize) -> f64 {
        self.v[v_idx(i, j, self.width)]
    }

    /// Velocity at the center of cell `(i, j)`, averaged from its faces.
    pub fn cell_velocity(&self, i: usize, j: usize) -> (f64, f64) {
        let w = self.width;
        let uc = 0.5 * (self.u[u_idx(i, j, w)] + self.u[u_idx(i + 1, j, w)]);
        let vc = 0.5 * (self.v[v_idx(i, j, w)] + self.v[v_idx(i, j + 1, w)]);
        (uc, vc)
    }

    pub fn cell_speed(&self, i: usize, j: usize) -> f64 {
        let (uc, vc) = self.cell_velocity(i, j);
        (uc * uc + vc * vc).sqrt()
    }
}

/// One entry of the convergence history.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ConvergenceSample {
    pub step: u64,
    pub time: f64,
    /// RMS divergence over fluid cells after the step.
    pub divergence: f64,
}

/// Run bookkeeping and derived statistics, mutated only by `step()`/`reset()`.
#[derive(Clone, Debug, Default)]
pub struct SimulationState {
    pub time: f64,
    pub step_count: u64,
    pub is_running: bool,
    pub convergence_history: VecDeque<ConvergenceSample>,
    pub avg_divergence: f64,
    pub max_velocity: f64,
    pub max_vorticity: f64,
    pub reynolds_number: f64,
    pub kinetic_energy: f64,
}

impl SimulationState {
    /// Append a sample, evicting the oldest beyond [`HISTORY_CAP`].
    pub fn push_sample(&mut self, sample: ConvergenceSample) {
        if self.convergence_history.len() == HISTORY_CAP {
            self.convergence_history.pop_front();
        }
        self.convergence_history.push_back(sample);
    }
}
