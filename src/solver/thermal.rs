use crate::state::{cell_idx, u_idx, v_idx, Field};
use super::boundary::{set_bnd, Boundary, FieldType};

/// Body forces: gravity on both components, Boussinesq buoyancy on v.
///
/// v += dt * (g_y + buoyancy * (T_face - T_ambient)), with T_face the mean of
/// the two cells sharing the face; u += dt * g_x.
pub fn apply_external_forces(
    field: &mut Field,
    bnd: &Boundary,
    gravity: (f64, f64),
    buoyancy: f64,
    ambient_temperature: f64,
) {
    let (w, h) = (field.width, field.height);
    let dt = field.dt;

    if gravity.0 != 0.0 {
        for j in 1..(h - 1) {
            for i in 1..w {
                field.u[u_idx(i, j, w)] += dt * gravity.0;
            }
        }
    }

    for j in 1..h {
        for i in 1..(w - 1) {
            let t_face = 0.5 * (field.temperature[cell_idx(i, j - 1, w)] + field.temperature[cell_idx(i, j, w)]);
            field.v[v_idx(i, j, w)] += dt * (gravity.1 + buoyancy * (t_face - ambient_temperature));
        }
    }

    set_bnd(FieldType::U, &mut field.u, bnd);
    set_bnd(FieldType::V, &mut field.v, bnd);
}
