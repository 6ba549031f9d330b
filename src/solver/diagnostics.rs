use crate::state::{cell_idx, u_idx, v_idx, Field};
use super::boundary::{Boundary, CellType};

/// Iterator over the FLUID cells of the grid.
fn fluid_cells(bnd: &Boundary) -> impl Iterator<Item = (usize, usize)> + '_ {
    let w = bnd.width();
    bnd.cells()
        .iter()
        .enumerate()
        .filter(|(_, &c)| c == CellType::Fluid)
        .map(move |(k, _)| (k % w, k / w))
}

/// RMS of the staggered divergence over FLUID cells; the solver's health metric.
pub fn rms_divergence(field: &Field, bnd: &Boundary) -> f64 {
    let w = field.width;
    let mut sum = 0.0;
    let mut count = 0usize;
    for (i, j) in fluid_cells(bnd) {
        let d = (field.u[u_idx(i + 1, j, w)] - field.u[u_idx(i, j, w)]
            + field.v[v_idx(i, j + 1, w)] - field.v[v_idx(i, j, w)])
            / field.dx;
        sum += d * d;
        count += 1;
    }
    if count > 0 { (sum / count as f64).sqrt() } else { 0.0 }
}

/// Running maximum that keeps a NaN once one is seen; `f64::max` would drop it.
fn nan_max(m: f64, s: f64) -> f64 {
    if s.is_nan() || s > m { s } else { m }
}

/// Largest cell-centered speed over FLUID cells. NaN if any speed is NaN.
pub fn max_speed(field: &Field, bnd: &Boundary) -> f64 {
    fluid_cells(bnd)
        .map(|(i, j)| field.cell_speed(i, j))
        .fold(0.0_f64, nan_max)
}

/// Largest |vorticity| over FLUID cells. Reads `field.vorticity` as stored.
pub fn max_vorticity(field: &Field, bnd: &Boundary) -> f64 {
    fluid_cells(bnd)
        .map(|(i, j)| field.vorticity[cell_idx(i, j, field.width)].abs())
        .fold(0.0_f64, nan_max)
}

/// Re = V * L / (mu / rho), with L = min(width, height) * dx and V = |inflow velocity|.
pub fn reynolds_number(
    inflow_velocity: (f64, f64),
    width: usize,
    height: usize,
    dx: f64,
    viscosity: f64,
    density: f64,
) -> f64 {
    let characteristic_velocity = inflow_velocity.0.hypot(inflow_velocity.1);
    let characteristic_length = width.min(height) as f64 * dx;
    characteristic_velocity * characteristic_length / (viscosity / density)
}

/// Total kinetic energy over FLUID cells: KE = 0.5 * rho * sum(|v|^2) * dx^2.
pub fn kinetic_energy(field: &Field, bnd: &Boundary) -> f64 {
    let sum: f64 = fluid_cells(bnd)
        .map(|(i, j)| {
            let (uc, vc) = field.cell_velocity(i, j);
            uc * uc + vc * vc
        })
        .sum();
    0.5 * field.density * sum * field.dx * field.dx
}
