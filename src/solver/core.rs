use log::warn;

use crate::state::{cell_idx, u_idx, v_idx, Field};
use super::boundary::{average_into_solids, set_bnd, Boundary, CellType, FieldType};
use super::params::PressureSolve;

/// Outcome of an adaptive pressure solve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PressureSolveReport {
    /// Sweeps actually performed.
    pub iterations: usize,
    /// RMS residual over fluid cells, in divergence units (1/s): the
    /// divergence the velocity correction would leave behind.
    pub residual: f64,
    pub converged: bool,
}

/// Column count of the array backing `field_type` on a `width`-wide grid.
#[inline]
fn stride(field_type: FieldType, width: usize) -> usize {
    match field_type {
        FieldType::U => width + 1,
        _ => width,
    }
}

/// Interior sample ranges `(i_lo..i_hi, j_lo..j_hi)` swept by the solvers.
#[inline]
fn interior(field_type: FieldType, width: usize, height: usize) -> (usize, usize, usize, usize) {
    match field_type {
        FieldType::U => (1, width, 1, height - 1),
        FieldType::V => (1, width - 1, 1, height),
        _ => (1, width - 1, 1, height - 1),
    }
}

/// One in-place Gauss-Seidel sweep of x = (x0 + a * neighbors) / c.
/// Solid cells are skipped for cell-centered fields.
fn gs_sweep(field_type: FieldType, x: &mut [f64], x0: &[f64], a: f64, c_inv: f64, bnd: &Boundary) {
    let (w, h) = (bnd.width(), bnd.height());
    let s = stride(field_type, w);
    let (i_lo, i_hi, j_lo, j_hi) = interior(field_type, w, h);
    let skip_solids = !field_type.is_velocity();
    for j in j_lo..j_hi {
        for i in i_lo..i_hi {
            if skip_solids && bnd.is_solid(i, j) {
                continue;
            }
            let ii = j * s + i;
            let neighbors = x[ii - 1] + x[ii + 1] + x[ii - s] + x[ii + s];
            x[ii] = (x0[ii] + a * neighbors) * c_inv;
        }
    }
}

/// Gauss-Seidel iterative linear solver.
/// Solves: x[i,j] = (x0[i,j] + a * (neighbors)) / c, re-applying the
/// boundary pass after every sweep.
pub fn lin_solve(field_type: FieldType, x: &mut [f64], x0: &[f64], a: f64, c: f64, iter: usize, bnd: &Boundary) {
    let c_inv = 1.0 / c;
    for _ in 0..iter {
        gs_sweep(field_type, x, x0, a, c_inv, bnd);
        set_bnd(field_type, x, bnd);
    }
}

/// Implicit diffusion: solves (I - alpha * Laplacian) x = x0.
/// c = 1 + 4 * alpha
pub fn diffuse(field_type: FieldType, x: &mut [f64], x0: &[f64], alpha: f64, iter: usize, bnd: &Boundary) {
    let c = 1.0 + 4.0 * alpha;
    // Initialize x from x0
    x.copy_from_slice(x0);
    lin_solve(field_type, x, x0, alpha, c, iter, bnd);
}

/// Bilinear interpolation at fractional index `(x, y)` of a `cols x rows` array.
/// Positions are clamped into the array.
pub(crate) fn bilinear(src: &[f64], cols: usize, rows: usize, x: f64, y: f64) -> f64 {
    let x = x.clamp(0.0, (cols - 1) as f64);
    let y = y.clamp(0.0, (rows - 1) as f64);
    let i0 = (x.floor() as usize).min(cols - 2);
    let j0 = (y.floor() as usize).min(rows - 2);
    let s1 = x - i0 as f64;
    let s0 = 1.0 - s1;
    let t1 = y - j0 as f64;
    let t0 = 1.0 - t1;
    let at = |i: usize, j: usize| src[j * cols + i];
    s0 * (t0 * at(i0, j0) + t1 * at(i0, j0 + 1)) + s1 * (t0 * at(i0 + 1, j0) + t1 * at(i0 + 1, j0 + 1))
}

/// Backtrace from `(x, y)` along `(vx, vy)` and sample `src` there.
/// The departure point is kept inside [0.5, dim - 1.5] so the stencil stays in bounds.
#[inline]
fn backtrace(src: &[f64], cols: usize, rows: usize, x: f64, y: f64, vx: f64, vy: f64, dt_dx: f64) -> f64 {
    let px = (x - dt_dx * vx).clamp(0.5, cols as f64 - 1.5);
    let py = (y - dt_dx * vy).clamp(0.5, rows as f64 - 1.5);
    bilinear(src, cols, rows, px, py)
}

/// Semi-Lagrangian advection of the velocity faces.
/// Snapshots `u`/`v` into `u0`/`v0`, then resamples every interior face.
pub fn advect_velocity(field: &mut Field, bnd: &Boundary) {
    let (w, h) = (field.width, field.height);
    let dt_dx = field.dt / field.dx;
    field.u0.copy_from_slice(&field.u);
    field.v0.copy_from_slice(&field.v);
    let (u0, v0) = (&field.u0, &field.v0);

    // u: the v sample at a u face is the mean of the four surrounding v faces
    for j in 1..(h - 1) {
        for i in 1..w {
            let vx = u0[u_idx(i, j, w)];
            let vy = 0.25
                * (v0[v_idx(i - 1, j, w)] + v0[v_idx(i, j, w)] + v0[v_idx(i - 1, j + 1, w)] + v0[v_idx(i, j + 1, w)]);
            field.u[u_idx(i, j, w)] = backtrace(u0, w + 1, h, i as f64, j as f64, vx, vy, dt_dx);
        }
    }
    set_bnd(FieldType::U, &mut field.u, bnd);

    for j in 1..h {
        for i in 1..(w - 1) {
            let vx = 0.25
                * (u0[u_idx(i, j - 1, w)] + u0[u_idx(i + 1, j - 1, w)] + u0[u_idx(i, j, w)] + u0[u_idx(i + 1, j, w)]);
            let vy = v0[v_idx(i, j, w)];
            field.v[v_idx(i, j, w)] = backtrace(v0, w, h + 1, i as f64, j as f64, vx, vy, dt_dx);
        }
    }
    set_bnd(FieldType::V, &mut field.v, bnd);
}

/// Semi-Lagrangian advection of temperature by the pre-advection velocity
/// (`u0`/`v0`), so call after [`advect_velocity`].
pub fn advect_temperature(field: &mut Field, bnd: &Boundary) {
    let (w, h) = (field.width, field.height);
    let dt_dx = field.dt / field.dx;
    field.temperature0.copy_from_slice(&field.temperature);
    for j in 1..(h - 1) {
        for i in 1..(w - 1) {
            let vx = 0.5 * (field.u0[u_idx(i, j, w)] + field.u0[u_idx(i + 1, j, w)]);
            let vy = 0.5 * (field.v0[v_idx(i, j, w)] + field.v0[v_idx(i, j + 1, w)]);
            field.temperature[cell_idx(i, j, w)] =
                backtrace(&field.temperature0, w, h, i as f64, j as f64, vx, vy, dt_dx);
        }
    }
    set_bnd(FieldType::Temperature, &mut field.temperature, bnd);
}

/// Staggered divergence per cell; zero in solids, zero-gradient on the border.
pub fn compute_divergence(field: &mut Field, bnd: &Boundary) {
    let (w, h) = (field.width, field.height);
    let inv_dx = 1.0 / field.dx;
    for j in 1..(h - 1) {
        for i in 1..(w - 1) {
            field.divergence[cell_idx(i, j, w)] = if bnd.is_solid(i, j) {
                0.0
            } else {
                (field.u[u_idx(i + 1, j, w)] - field.u[u_idx(i, j, w)]
                    + field.v[v_idx(i, j + 1, w)] - field.v[v_idx(i, j, w)])
                    * inv_dx
            };
        }
    }
    set_bnd(FieldType::Scalar, &mut field.divergence, bnd);
}

/// Poisson right-hand side: rhs = -dx^2 * (rho / dt) * div.
fn fill_rhs(field: &mut Field) {
    let scale = -field.dx * field.dx * field.density / field.dt;
    for (r, &d) in field.rhs.iter_mut().zip(field.divergence.iter()) {
        *r = scale * d;
    }
}

/// Fixed-count Poisson solve, warm-started from the current pressure.
/// Expects `divergence` to be current.
pub fn solve_pressure(field: &mut Field, bnd: &Boundary, iter: usize) {
    average_into_solids(&mut field.pressure, bnd);
    fill_rhs(field);
    lin_solve(FieldType::Pressure, &mut field.pressure, &field.rhs, 1.0, 4.0, iter, bnd);
}

/// RMS over fluid cells of the post-correction divergence implied by the
/// current pressure iterate.
fn pressure_residual(field: &Field, bnd: &Boundary) -> f64 {
    let (w, h) = (field.width, field.height);
    let p = &field.pressure;
    let scale = field.dt / (field.density * field.dx * field.dx);
    let mut sum = 0.0;
    let mut count = 0usize;
    for j in 1..(h - 1) {
        for i in 1..(w - 1) {
            if bnd.get(i, j) != CellType::Fluid {
                continue;
            }
            let ii = cell_idx(i, j, w);
            let r = p[ii - 1] + p[ii + 1] + p[ii - w] + p[ii + w] + field.rhs[ii] - 4.0 * p[ii];
            sum += (scale * r) * (scale * r);
            count += 1;
        }
    }
    if count > 0 { (sum / count as f64).sqrt() } else { 0.0 }
}

/// Poisson solve that stops early once the residual drops below `tolerance`.
/// The residual is only evaluated every `check_interval` sweeps (and after
/// the last one).
pub fn adaptive_pressure_solve(
    field: &mut Field,
    bnd: &Boundary,
    max_iter: usize,
    tolerance: f64,
    check_interval: usize,
) -> PressureSolveReport {
    let check_interval = check_interval.max(1);
    average_into_solids(&mut field.pressure, bnd);
    fill_rhs(field);

    let mut report = PressureSolveReport { iterations: 0, residual: f64::INFINITY, converged: false };
    for it in 1..=max_iter {
        gs_sweep(FieldType::Pressure, &mut field.pressure, &field.rhs, 1.0, 0.25, bnd);
        set_bnd(FieldType::Pressure, &mut field.pressure, bnd);
        report.iterations = it;
        if it % check_interval == 0 || it == max_iter {
            report.residual = pressure_residual(field, bnd);
            if report.residual < tolerance {
                report.converged = true;
                break;
            }
        }
    }
    if !report.converged {
        warn!(
            "pressure solve did not converge: residual {:.3e} after {} iterations (tol {:.1e})",
            report.residual, report.iterations, tolerance
        );
    }
    report
}

/// Velocity correction u -= dt / (rho * dx) * grad p.
/// Faces touching a solid cell are forced to zero instead.
pub fn apply_pressure_gradient(field: &mut Field, bnd: &Boundary) {
    let (w, h) = (field.width, field.height);
    let k = field.dt / (field.density * field.dx);
    let p = &field.pressure;

    for j in 1..(h - 1) {
        for i in 1..w {
            let ui = u_idx(i, j, w);
            if bnd.is_solid(i - 1, j) || bnd.is_solid(i, j) {
                field.u[ui] = 0.0;
            } else {
                field.u[ui] -= k * (p[cell_idx(i, j, w)] - p[cell_idx(i - 1, j, w)]);
            }
        }
    }
    for j in 1..h {
        for i in 1..(w - 1) {
            let vi = v_idx(i, j, w);
            if bnd.is_solid(i, j - 1) || bnd.is_solid(i, j) {
                field.v[vi] = 0.0;
            } else {
                field.v[vi] -= k * (p[cell_idx(i, j, w)] - p[cell_idx(i, j - 1, w)]);
            }
        }
    }
    set_bnd(FieldType::U, &mut field.u, bnd);
    set_bnd(FieldType::V, &mut field.v, bnd);
}

/// Pressure projection: enforces incompressibility (divergence-free velocity field).
/// Returns the solve report when the adaptive solver is in use.
pub fn project(field: &mut Field, bnd: &Boundary, solve: PressureSolve) -> Option<PressureSolveReport> {
    compute_divergence(field, bnd);
    let report = match solve {
        PressureSolve::Fixed { iterations } => {
            solve_pressure(field, bnd, iterations);
            None
        }
        PressureSolve::Adaptive { max_iterations, tolerance, check_interval } => {
            Some(adaptive_pressure_solve(field, bnd, max_iterations, tolerance, check_interval))
        }
    };
    apply_pressure_gradient(field, bnd);
    report
}
