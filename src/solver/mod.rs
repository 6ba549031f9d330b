mod boundary;
mod core;
pub mod diagnostics;
mod obstacle;
mod params;
mod thermal;
mod vorticity;

// Re-export public API
pub use boundary::{set_bnd, Boundary, CellType, FieldType, Inflow, Outflow};
pub use self::core::{
    adaptive_pressure_solve, advect_temperature, advect_velocity, apply_pressure_gradient, compute_divergence,
    diffuse, lin_solve, project, solve_pressure, PressureSolveReport,
};
pub use obstacle::Obstacle;
pub use params::{velocity_alpha, PressureSolve, SolverParams, THERMAL_DIFFUSION_RATIO};
pub use thermal::apply_external_forces;
pub use vorticity::{compute_vorticity, vorticity_confinement};

pub(crate) use self::core::bilinear;

use crate::state::Field;

/// Full fluid simulation step.
///
/// Returns the report of the last adaptive pressure solve, if any.
pub fn fluid_step(field: &mut Field, bnd: &Boundary, params: &SolverParams) -> Option<PressureSolveReport> {
    let alpha = velocity_alpha(field.dt, field.viscosity, field.density, field.dx);

    // 1. Diffuse velocity and temperature
    field.u0.copy_from_slice(&field.u);
    field.v0.copy_from_slice(&field.v);
    field.temperature0.copy_from_slice(&field.temperature);
    diffuse(FieldType::U, &mut field.u, &field.u0, alpha, params.diffuse_iter, bnd);
    diffuse(FieldType::V, &mut field.v, &field.v0, alpha, params.diffuse_iter, bnd);
    diffuse(
        FieldType::Temperature,
        &mut field.temperature,
        &field.temperature0,
        alpha * THERMAL_DIFFUSION_RATIO,
        params.diffuse_iter,
        bnd,
    );

    // 2. Project the diffused velocity
    let first = project(field, bnd, params.pressure);

    // 3. Advect velocity and temperature
    advect_velocity(field, bnd);
    advect_temperature(field, bnd);

    // 4. Project again after advection
    let second = project(field, bnd, params.pressure);

    // 5. Vorticity confinement
    if let Some(epsilon) = params.confinement {
        vorticity_confinement(field, bnd, epsilon);
    }

    // 6. Vorticity for diagnostics and output
    compute_vorticity(field, bnd);

    // 7. Body forces last, so the next step's diffusion sees them
    apply_external_forces(field, bnd, params.gravity, params.buoyancy, params.ambient_temperature);

    second.or(first)
}
