use crate::state::{cell_idx, u_idx, v_idx, Field};
use super::boundary::{set_bnd, Boundary, FieldType};

/// Gradient magnitudes below this skip the confinement force.
const GRADIENT_EPS: f64 = 1e-10;

/// Curl omega = dv/dx - du/dy at cell centers.
///
/// Central differences of the face-averaged cell velocities. Zero inside
/// solids, zero-gradient on the outer border.
pub fn compute_vorticity(field: &mut Field, bnd: &Boundary) {
    let (w, h) = (field.width, field.height);
    let inv_2dx = 0.5 / field.dx;
    let (u, v) = (&field.u, &field.v);
    let uc = |i: usize, j: usize| 0.5 * (u[u_idx(i, j, w)] + u[u_idx(i + 1, j, w)]);
    let vc = |i: usize, j: usize| 0.5 * (v[v_idx(i, j, w)] + v[v_idx(i, j + 1, w)]);

    for j in 1..(h - 1) {
        for i in 1..(w - 1) {
            field.vorticity[cell_idx(i, j, w)] = if bnd.is_solid(i, j) {
                0.0
            } else {
                (vc(i + 1, j) - vc(i - 1, j)) * inv_2dx - (uc(i, j + 1) - uc(i, j - 1)) * inv_2dx
            };
        }
    }
    set_bnd(FieldType::Scalar, &mut field.vorticity, bnd);
}

/// Vorticity confinement: re-injects small-scale rotation lost to numerical
/// dissipation (Fedkiw et al. 2001).
///
/// f = epsilon * dx * omega * (n_y, -n_x), where n is the normalized gradient
/// of |omega|. Half of `dt * f` goes to each face adjacent to the cell.
/// Uses `field.vorticity_abs` as scratch.
pub fn vorticity_confinement(field: &mut Field, bnd: &Boundary, epsilon: f64) {
    compute_vorticity(field, bnd);
    let (w, h) = (field.width, field.height);
    for (a, &omega) in field.vorticity_abs.iter_mut().zip(field.vorticity.iter()) {
        *a = omega.abs();
    }

    let inv_2dx = 0.5 / field.dx;
    let scale = 0.5 * field.dt * epsilon * field.dx;
    // Cells next to the border read the zero-gradient copy of |omega|.
    for j in 1..(h - 1) {
        for i in 1..(w - 1) {
            if bnd.is_solid(i, j) {
                continue;
            }
            let abs = &field.vorticity_abs;
            let eta_x = (abs[cell_idx(i + 1, j, w)] - abs[cell_idx(i - 1, j, w)]) * inv_2dx;
            let eta_y = (abs[cell_idx(i, j + 1, w)] - abs[cell_idx(i, j - 1, w)]) * inv_2dx;
            let len = (eta_x * eta_x + eta_y * eta_y).sqrt();
            if len < GRADIENT_EPS {
                continue;
            }
            let (nx, ny) = (eta_x / len, eta_y / len);
            let omega = field.vorticity[cell_idx(i, j, w)];
            // 2D cross product N x omega
            let fx = scale * omega * ny;
            let fy = -scale * omega * nx;
            field.u[u_idx(i, j, w)] += fx;
            field.u[u_idx(i + 1, j, w)] += fx;
            field.v[v_idx(i, j, w)] += fy;
            field.v[v_idx(i, j + 1, w)] += fy;
        }
    }
    set_bnd(FieldType::U, &mut field.u, bnd);
    set_bnd(FieldType::V, &mut field.v, bnd);
}
