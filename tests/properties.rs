use std::f64::consts::PI;

use approx::{assert_abs_diff_eq, assert_relative_eq};
use macflow::solver::{
    advect_temperature, advect_velocity, diagnostics, project, set_bnd, Boundary, CellType, FieldType, Inflow,
    Obstacle, Outflow, PressureSolve,
};
use macflow::state::{cell_idx, u_idx, v_idx};
use macflow::{Config, Field, Simulator};

fn quiet_config(width: usize, height: usize) -> Config {
    Config {
        width,
        height,
        dx: 0.05,
        time_step: 0.01,
        viscosity: 0.0,
        gravity: [0.0, 0.0],
        buoyancy_factor: 0.0,
        enable_vorticity_confinement: false,
        max_simulation_time: 100.0,
        ..Config::default()
    }
}

fn channel(w: usize, h: usize) -> Boundary {
    Boundary::new(w, h, Inflow { velocity: (0.0, 0.0), temperature: 298.0 }, Outflow { pressure: 0.0 })
}

/// Smooth sin-sin velocity (dx = 0.1) with the boundary pass applied.
fn smooth_field(bnd: &Boundary, amplitude: f64) -> Field {
    let (w, h) = (bnd.width(), bnd.height());
    let mut field = Field::new(w, h, 1.0, 0.0, 0.1, 0.01);
    for j in 1..(h - 1) {
        for i in 1..w {
            let (x, y) = (i as f64 / w as f64, (j as f64 + 0.5) / h as f64);
            field.u[u_idx(i, j, w)] = amplitude * (2.0 * PI * x).sin() * (PI * y).sin();
        }
    }
    for j in 1..h {
        for i in 1..(w - 1) {
            let (x, y) = ((i as f64 + 0.5) / w as f64, j as f64 / h as f64);
            field.v[v_idx(i, j, w)] = amplitude * (PI * x).sin() * (2.0 * PI * y).sin();
        }
    }
    set_bnd(FieldType::U, &mut field.u, bnd);
    set_bnd(FieldType::V, &mut field.v, bnd);
    field
}

#[test]
fn test_projection_with_default_iterations_meets_bound() {
    // Default pressure_iterations. Projection is linear in the velocity, and
    // this amplitude starts at RMS ~5e-3 and ends near 2.4e-4.
    let iterations = Config::default().pressure_iterations;
    assert_eq!(iterations, 40);
    let bnd = channel(12, 12);
    let mut field = smooth_field(&bnd, 0.001);
    let before = diagnostics::rms_divergence(&field, &bnd);
    assert!(before > 1e-3, "field should start divergent, RMS = {:e}", before);

    project(&mut field, &bnd, PressureSolve::Fixed { iterations });
    let rms = diagnostics::rms_divergence(&field, &bnd);
    assert!(rms < 1e-3, "RMS divergence after {} iterations = {:e}", iterations, rms);
    assert!(rms < 0.1 * before, "projection should cut divergence tenfold: {:e} -> {:e}", before, rms);
}

#[test]
fn test_projection_converges_with_many_iterations() {
    let bnd = channel(12, 12);
    let mut field = smooth_field(&bnd, 0.01);
    project(&mut field, &bnd, PressureSolve::Fixed { iterations: 2000 });
    let rms = diagnostics::rms_divergence(&field, &bnd);
    assert!(rms < 1e-8, "RMS divergence after 2000 iterations = {:e}", rms);
}

#[test]
fn test_no_slip_holds_after_steps() {
    let cfg = Config {
        width: 40,
        height: 20,
        dx: 0.05,
        max_simulation_time: 100.0,
        enable_vorticity_confinement: true,
        ..Config::default()
    };
    let mut sim = Simulator::new(cfg).unwrap();
    sim.add_circular_obstacle(10.0, 10.0, 3.0).unwrap();
    sim.add_rectangular_obstacle(22.0, 4.0, 24.0, 9.0).unwrap();
    sim.run_until_stopped(Some(15)).unwrap();

    let (field, bnd) = (sim.field(), sim.boundary());
    let w = field.width;
    for j in 0..field.height {
        for i in 0..w {
            if bnd.is_solid(i, j) {
                assert_eq!(field.u[u_idx(i, j, w)], 0.0, "u west face of ({}, {})", i, j);
                assert_eq!(field.u[u_idx(i + 1, j, w)], 0.0, "u east face of ({}, {})", i, j);
                assert_eq!(field.v[v_idx(i, j, w)], 0.0, "v south face of ({}, {})", i, j);
                assert_eq!(field.v[v_idx(i, j + 1, w)], 0.0, "v north face of ({}, {})", i, j);
            }
        }
    }
}

#[test]
fn test_uniform_flow_is_steady() {
    let cfg = quiet_config(30, 12);
    let mut sim = Simulator::new(cfg).unwrap();
    sim.run_until_stopped(Some(50)).unwrap();

    let field = sim.field();
    let (w, h) = (field.width, field.height);
    for j in 1..(h - 1) {
        for i in 0..=w {
            assert_abs_diff_eq!(field.u[u_idx(i, j, w)], 1.0, epsilon = 1e-12);
        }
    }
    for &v in &field.v {
        assert_abs_diff_eq!(v, 0.0, epsilon = 1e-12);
    }
    assert!(sim.state().avg_divergence < 1e-10);
}

#[test]
fn test_zero_velocity_advection_is_identity() {
    let (w, h) = (14, 9);
    let bnd = channel(w, h);
    let mut field = Field::new(w, h, 1.0, 0.0, 0.1, 0.5);
    for j in 0..h {
        for i in 0..w {
            field.temperature[cell_idx(i, j, w)] = 290.0 + ((i * 7 + j * 3) % 11) as f64;
        }
    }
    set_bnd(FieldType::Temperature, &mut field.temperature, &bnd);
    let before = field.temperature.clone();

    advect_velocity(&mut field, &bnd);
    advect_temperature(&mut field, &bnd);
    assert_eq!(field.temperature, before);
}

#[test]
fn test_initialization_round_trip() {
    let mut cfg = quiet_config(16, 10);
    cfg.inflow.velocity = [0.7, 0.2];
    cfg.inflow.temperature = 305.0;
    let sim = Simulator::new(cfg).unwrap();
    let field = sim.field();
    let (w, h) = (field.width, field.height);

    for j in 1..(h - 1) {
        for i in 1..w {
            assert_eq!(field.u[u_idx(i, j, w)], 0.7, "u at face ({}, {})", i, j);
        }
        for i in 1..(w - 1) {
            assert_eq!(field.temperature[cell_idx(i, j, w)], 305.0, "T at ({}, {})", i, j);
        }
    }
    // v faces touching the solid walls are zeroed by the boundary pass
    for j in 2..(h - 1) {
        for i in 1..(w - 1) {
            assert_eq!(field.v[v_idx(i, j, w)], 0.2, "v at face ({}, {})", i, j);
        }
    }
    assert!(field.pressure.iter().all(|&p| p == 0.0));
}

#[test]
fn test_reynolds_number_regression() {
    let cfg = Config {
        width: 100,
        height: 50,
        dx: 0.02,
        viscosity: 0.001,
        density: 1.0,
        max_simulation_time: 100.0,
        ..Config::default()
    };
    let mut sim = Simulator::new(cfg).unwrap();
    sim.run_until_stopped(Some(1)).unwrap();
    let re = sim.state().reynolds_number;
    assert_relative_eq!(re, 1000.0, max_relative = 1e-12);
    assert_eq!(re, 1.0 * (50.0 * 0.02) / (0.001 / 1.0));
}

#[test]
fn test_obstacle_union() {
    let cfg = quiet_config(30, 20);
    let mut sim = Simulator::new(cfg).unwrap();
    let default_layout = sim.boundary().clone();
    let circle = Obstacle::Circle { cx: 10.0, cy: 10.0, r: 4.0 };
    let rect = Obstacle::Rect { x1: 12.0, y1: 6.0, x2: 18.0, y2: 12.0 };
    sim.add_obstacle(circle).unwrap();
    sim.add_obstacle(rect).unwrap();

    let bnd = sim.boundary();
    let mut overlap = 0;
    for j in 0..20 {
        for i in 0..30 {
            let covered = circle.covers(i, j) || rect.covers(i, j);
            if circle.covers(i, j) && rect.covers(i, j) {
                overlap += 1;
            }
            if covered {
                assert_eq!(bnd.get(i, j), CellType::Solid, "covered cell ({}, {})", i, j);
            } else {
                assert_eq!(bnd.get(i, j), default_layout.get(i, j), "untouched cell ({}, {})", i, j);
            }
        }
    }
    assert!(overlap > 0, "footprints should overlap for this test to mean anything");
}

#[test]
fn test_periodic_wrap_between_edges() {
    let (w, h) = (10, 8);
    let inflow = Inflow { velocity: (0.0, 0.0), temperature: 298.0 };
    let outflow = Outflow { pressure: 0.0 };

    // x-periodic channel: v written at the right interior edge shows up on the left edge
    let bnd = Boundary::new_periodic_x(w, h, inflow, outflow);
    let mut v = vec![0.0; w * (h + 1)];
    v[v_idx(w - 2, 3, w)] = 1.25;
    set_bnd(FieldType::V, &mut v, &bnd);
    assert_eq!(v[v_idx(0, 3, w)], 1.25);

    let mut u = vec![0.0; (w + 1) * h];
    u[u_idx(1, 4, w)] = -0.5;
    set_bnd(FieldType::U, &mut u, &bnd);
    assert_eq!(u[u_idx(w - 1, 4, w)], -0.5);

    let mut p = vec![0.0; w * h];
    p[cell_idx(w - 2, 2, w)] = 3.0;
    set_bnd(FieldType::Pressure, &mut p, &bnd);
    assert_eq!(p[cell_idx(0, 2, w)], 3.0);

    let mut t = vec![298.0; w * h];
    t[cell_idx(1, 5, w)] = 310.0;
    set_bnd(FieldType::Temperature, &mut t, &bnd);
    assert_eq!(t[cell_idx(w - 1, 5, w)], 310.0);
}

#[test]
fn test_periodic_channel_runs() {
    let cfg = Config { periodic_x: true, ..quiet_config(24, 10) };
    let mut sim = Simulator::new(cfg).unwrap();
    assert_eq!(sim.boundary().count(CellType::Inflow), 0);
    assert_eq!(sim.boundary().get(0, 5), CellType::Periodic);
    sim.run_until_stopped(Some(20)).unwrap();
    assert!(sim.state().max_velocity.is_finite());
    assert!(sim.state().avg_divergence < 1e-6, "div {}", sim.state().avg_divergence);
}
