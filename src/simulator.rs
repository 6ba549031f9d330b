use log::{debug, error, info};

use crate::config::Config;
use crate::error::{SimError, SimResult};
use crate::snapshot::{fill_visualization, probe, ProbeData, VisualizationData};
use crate::solver::{
    self, compute_divergence, diagnostics, fluid_step, set_bnd, Boundary, FieldType, Inflow, Obstacle, Outflow,
    PressureSolveReport, SolverParams,
};
use crate::state::{ConvergenceSample, Field, SimulationState};

/// Owns one field/boundary pair and drives it step by step.
///
/// Commands: [`start`](Self::start), [`stop`](Self::stop),
/// [`toggle_pause`](Self::toggle_pause), [`reset`](Self::reset),
/// [`step`](Self::step) and the obstacle commands. Everything else is a
/// read-only query.
pub struct Simulator {
    config: Config,
    params: SolverParams,
    field: Field,
    boundary: Boundary,
    obstacles: Vec<Obstacle>,
    state: SimulationState,
    last_pressure_report: Option<PressureSolveReport>,
}

impl Simulator {
    /// Validate `config` and build a stopped simulator with its obstacles applied.
    pub fn new(config: Config) -> SimResult<Self> {
        config.validate()?;
        for obstacle in &config.obstacles {
            validate_obstacle(obstacle)?;
        }
        let field = Field::new(
            config.width,
            config.height,
            config.density,
            config.viscosity,
            config.dx,
            config.time_step,
        );
        let boundary = default_boundary(&config);
        let mut sim = Self {
            params: SolverParams::from_config(&config),
            obstacles: config.obstacles.clone(),
            config,
            field,
            boundary,
            state: SimulationState::default(),
            last_pressure_report: None,
        };
        sim.reset();
        Ok(sim)
    }

    /// Reinitialize the field from the inflow profile, rebuild the boundary
    /// with every obstacle, and clear run statistics.
    pub fn reset(&mut self) {
        let v0 = (self.config.inflow.velocity[0], self.config.inflow.velocity[1]);
        self.field.initialize(v0, self.config.inflow.temperature);
        self.rebuild_boundary();
        self.state = SimulationState::default();
        self.last_pressure_report = None;
        info!(
            "reset: {}x{} grid, dx={}, dt={}, {} obstacle(s)",
            self.field.width,
            self.field.height,
            self.field.dx,
            self.field.dt,
            self.obstacles.len()
        );
    }

    /// Fresh default boundary plus every obstacle in insertion order; the
    /// boundary passes are re-applied so the field honours the new layout.
    fn rebuild_boundary(&mut self) {
        self.boundary = default_boundary(&self.config);
        for obstacle in &self.obstacles {
            obstacle.apply(&mut self.boundary);
        }
        set_bnd(FieldType::U, &mut self.field.u, &self.boundary);
        set_bnd(FieldType::V, &mut self.field.v, &self.boundary);
        set_bnd(FieldType::Temperature, &mut self.field.temperature, &self.boundary);
        set_bnd(FieldType::Pressure, &mut self.field.pressure, &self.boundary);
    }

    pub fn start(&mut self) {
        if !self.state.is_running {
            self.state.is_running = true;
            info!("simulation started at t={:.4}", self.state.time);
        }
    }

    pub fn stop(&mut self) {
        if self.state.is_running {
            self.state.is_running = false;
            info!("simulation stopped at t={:.4} after {} steps", self.state.time, self.state.step_count);
        }
    }

    pub fn toggle_pause(&mut self) {
        if self.state.is_running {
            self.stop();
        } else {
            self.start();
        }
    }

    pub fn is_running(&self) -> bool {
        self.state.is_running
    }

    /// Advance one time step. Returns `Ok(false)` without touching anything
    /// when the simulation is stopped.
    ///
    /// On a non-finite or runaway divergence the simulation is stopped and
    /// [`SimError::Diverged`] is returned.
    pub fn step(&mut self) -> SimResult<bool> {
        if !self.state.is_running {
            return Ok(false);
        }

        if let Some(report) = fluid_step(&mut self.field, &self.boundary, &self.params) {
            self.last_pressure_report = Some(report);
        }
        self.state.time += self.field.dt;
        self.state.step_count += 1;
        self.update_stats();

        let step = self.state.step_count;
        let divergence = self.state.avg_divergence;
        self.state.push_sample(ConvergenceSample { step, time: self.state.time, divergence });
        debug!(
            "step {}: t={:.4} div_rms={:.3e} max|u|={:.4}",
            step, self.state.time, divergence, self.state.max_velocity
        );

        let over_limit = self.config.divergence_limit.is_some_and(|limit| divergence > limit);
        if !divergence.is_finite() || !self.state.max_velocity.is_finite() || over_limit {
            self.state.is_running = false;
            error!("simulation diverged at step {}: RMS divergence {:e}", step, divergence);
            return Err(SimError::Diverged { step, divergence });
        }

        if self.config.output_interval > 0 && step % self.config.output_interval == 0 {
            info!(
                "step {}: t={:.3} div_rms={:.3e} max|u|={:.4} max|w|={:.4} KE={:.4e} Re={:.1}",
                step,
                self.state.time,
                divergence,
                self.state.max_velocity,
                self.state.max_vorticity,
                self.state.kinetic_energy,
                self.state.reynolds_number
            );
        }

        if self.state.time >= self.config.max_simulation_time {
            self.state.is_running = false;
            info!(
                "reached max simulation time {:.3} after {} steps",
                self.config.max_simulation_time, step
            );
        }
        Ok(true)
    }

    fn update_stats(&mut self) {
        let (field, bnd) = (&self.field, &self.boundary);
        self.state.avg_divergence = diagnostics::rms_divergence(field, bnd);
        self.state.max_velocity = diagnostics::max_speed(field, bnd);
        self.state.max_vorticity = diagnostics::max_vorticity(field, bnd);
        self.state.kinetic_energy = diagnostics::kinetic_energy(field, bnd);
        self.state.reynolds_number = self.reynolds_number();
    }

    /// Start (if needed) and step until the run stops on its own, or until
    /// `max_steps` steps have been taken. Returns the number of steps run.
    pub fn run_until_stopped(&mut self, max_steps: Option<u64>) -> SimResult<u64> {
        self.start();
        let mut steps = 0;
        while self.state.is_running && max_steps.map_or(true, |max| steps < max) {
            self.step()?;
            steps += 1;
        }
        Ok(steps)
    }

    pub fn add_circular_obstacle(&mut self, cx: f64, cy: f64, r: f64) -> SimResult<()> {
        self.add_obstacle(Obstacle::Circle { cx, cy, r })
    }

    pub fn add_rectangular_obstacle(&mut self, x1: f64, y1: f64, x2: f64, y2: f64) -> SimResult<()> {
        self.add_obstacle(Obstacle::Rect { x1, y1, x2, y2 })
    }

    /// Append an obstacle and rebuild the boundary from scratch.
    pub fn add_obstacle(&mut self, obstacle: Obstacle) -> SimResult<()> {
        validate_obstacle(&obstacle)?;
        self.obstacles.push(obstacle);
        self.rebuild_boundary();
        debug!("added obstacle {:?}; {} solid cells", obstacle, self.boundary.count(solver::CellType::Solid));
        Ok(())
    }

    /// Remove every obstacle and reset the simulation.
    pub fn clear_obstacles(&mut self) {
        self.obstacles.clear();
        self.reset();
    }

    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    pub fn field(&self) -> &Field {
        &self.field
    }

    pub fn boundary(&self) -> &Boundary {
        &self.boundary
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// RMS divergence over fluid cells for the current velocity.
    pub fn check_divergence_convergence(&self) -> f64 {
        diagnostics::rms_divergence(&self.field, &self.boundary)
    }

    /// Re = |inflow velocity| * min(width, height) * dx / (viscosity / density).
    pub fn reynolds_number(&self) -> f64 {
        let c = &self.config;
        diagnostics::reynolds_number(
            (c.inflow.velocity[0], c.inflow.velocity[1]),
            c.width,
            c.height,
            c.dx,
            c.viscosity,
            c.density,
        )
    }

    /// Solve for pressure against the current divergence with early exit at
    /// `tolerance`, using the configured check interval. Velocities are left
    /// untouched.
    pub fn adaptive_pressure_solve(&mut self, max_iter: usize, tolerance: f64) -> PressureSolveReport {
        compute_divergence(&mut self.field, &self.boundary);
        let report = solver::adaptive_pressure_solve(
            &mut self.field,
            &self.boundary,
            max_iter,
            tolerance,
            self.config.convergence_check_interval,
        );
        self.last_pressure_report = Some(report);
        report
    }

    /// Report of the most recent adaptive pressure solve, if one has run.
    pub fn last_pressure_report(&self) -> Option<PressureSolveReport> {
        self.last_pressure_report
    }

    pub fn visualization_data(&self) -> VisualizationData {
        let mut data = VisualizationData::default();
        self.visualization_data_into(&mut data);
        data
    }

    /// Refill a caller-owned snapshot without reallocating once it is sized.
    pub fn visualization_data_into(&self, dst: &mut VisualizationData) {
        fill_visualization(dst, &self.field, &self.boundary, self.config.effective_streamline_spacing());
    }

    /// Interpolated values at physical coordinates `(x, y)` in meters.
    pub fn probe_data(&self, x: f64, y: f64) -> ProbeData {
        probe(&self.field, &self.boundary, x, y)
    }
}

fn default_boundary(config: &Config) -> Boundary {
    let inflow = Inflow {
        velocity: (config.inflow.velocity[0], config.inflow.velocity[1]),
        temperature: config.inflow.temperature,
    };
    let outflow = Outflow { pressure: config.outflow.pressure };
    if config.periodic_x {
        Boundary::new_periodic_x(config.width, config.height, inflow, outflow)
    } else {
        Boundary::new(config.width, config.height, inflow, outflow)
    }
}

fn validate_obstacle(obstacle: &Obstacle) -> SimResult<()> {
    let ok = match *obstacle {
        Obstacle::Circle { cx, cy, r } => cx.is_finite() && cy.is_finite() && r.is_finite() && r >= 0.0,
        Obstacle::Rect { x1, y1, x2, y2 } => [x1, y1, x2, y2].iter().all(|v| v.is_finite()),
    };
    if ok {
        Ok(())
    } else {
        Err(SimError::config("obstacles", format!("invalid obstacle {obstacle:?}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::CellType;
    use crate::state::{u_idx, HISTORY_CAP};

    fn small_config() -> Config {
        Config {
            width: 20,
            height: 10,
            dx: 0.05,
            time_step: 0.01,
            max_simulation_time: 1.0,
            ..Config::default()
        }
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let err = Simulator::new(Config { width: 2, ..small_config() }).err();
        assert!(matches!(err, Some(SimError::Configuration { field: "width", .. })), "got {:?}", err);
        let err = Simulator::new(Config { time_step: 0.0, ..small_config() }).err();
        assert!(matches!(err, Some(SimError::Configuration { field: "time_step", .. })), "got {:?}", err);
    }

    #[test]
    fn test_step_is_noop_when_stopped() {
        let mut sim = Simulator::new(small_config()).unwrap();
        let before = sim.field().u.clone();
        assert!(!sim.step().unwrap());
        assert_eq!(sim.state().step_count, 0);
        assert_eq!(sim.field().u, before);
    }

    #[test]
    fn test_lifecycle_toggles() {
        let mut sim = Simulator::new(small_config()).unwrap();
        assert!(!sim.is_running());
        sim.start();
        assert!(sim.is_running());
        sim.toggle_pause();
        assert!(!sim.is_running());
        sim.toggle_pause();
        assert!(sim.is_running());
        sim.stop();
        assert!(!sim.is_running());
    }

    #[test]
    fn test_step_advances_time_and_history() {
        let mut sim = Simulator::new(small_config()).unwrap();
        sim.start();
        for _ in 0..3 {
            assert!(sim.step().unwrap());
        }
        let state = sim.state();
        assert_eq!(state.step_count, 3);
        assert!((state.time - 0.03).abs() < 1e-12, "time {}", state.time);
        assert_eq!(state.convergence_history.len(), 3);
        assert_eq!(state.convergence_history.back().map(|s| s.step), Some(3));
        assert!(state.max_velocity > 0.0);
        assert!(state.reynolds_number > 0.0);
    }

    #[test]
    fn test_stops_at_max_simulation_time() {
        let cfg = Config { max_simulation_time: 0.05, ..small_config() };
        let mut sim = Simulator::new(cfg).unwrap();
        let steps = sim.run_until_stopped(Some(100)).unwrap();
        assert!(!sim.is_running());
        assert!((5..=6).contains(&steps), "expected ~5 steps, ran {}", steps);
        assert!(sim.state().time >= 0.05 - 1e-12);
    }

    #[test]
    fn test_run_until_stopped_respects_step_cap() {
        let mut sim = Simulator::new(small_config()).unwrap();
        assert_eq!(sim.run_until_stopped(Some(4)).unwrap(), 4);
        assert!(sim.is_running(), "cap reached before max time, still running");
    }

    #[test]
    fn test_reset_clears_state() {
        let mut sim = Simulator::new(small_config()).unwrap();
        sim.run_until_stopped(Some(3)).unwrap();
        sim.reset();
        let state = sim.state();
        assert_eq!(state.step_count, 0);
        assert_eq!(state.time, 0.0);
        assert!(!state.is_running);
        assert!(state.convergence_history.is_empty());
        assert_eq!(sim.field().u[u_idx(10, 5, 20)], 1.0, "interior back at inflow velocity");
    }

    #[test]
    fn test_obstacles_rebuild_and_clear() {
        let mut sim = Simulator::new(small_config()).unwrap();
        let base_solids = sim.boundary().count(CellType::Solid);
        sim.add_circular_obstacle(6.0, 5.0, 1.0).unwrap();
        sim.add_rectangular_obstacle(12.0, 3.0, 13.0, 6.0).unwrap();
        assert_eq!(sim.obstacles().len(), 2);
        assert_eq!(sim.boundary().count(CellType::Solid), base_solids + 5 + 8);
        assert_eq!(sim.field().u[u_idx(6, 5, 20)], 0.0, "no-slip applied immediately");

        sim.clear_obstacles();
        assert!(sim.obstacles().is_empty());
        assert_eq!(sim.boundary().count(CellType::Solid), base_solids);
        assert_eq!(sim.field().u[u_idx(6, 5, 20)], 1.0);
    }

    #[test]
    fn test_invalid_obstacle_rejected() {
        let mut sim = Simulator::new(small_config()).unwrap();
        assert!(sim.add_circular_obstacle(5.0, 5.0, -1.0).is_err());
        assert!(sim.add_rectangular_obstacle(f64::NAN, 0.0, 1.0, 1.0).is_err());
        assert!(sim.obstacles().is_empty());
    }

    #[test]
    fn test_divergence_limit_stops_run() {
        // Limit far below the inevitable round-off divergence of a real flow
        let cfg = Config { divergence_limit: Some(1e-300), ..small_config() };
        let mut sim = Simulator::new(cfg).unwrap();
        sim.add_circular_obstacle(6.0, 5.0, 2.0).unwrap();
        sim.start();
        match sim.step() {
            Err(SimError::Diverged { step, .. }) => assert_eq!(step, 1),
            other => panic!("expected divergence error, got {:?}", other),
        }
        assert!(!sim.is_running());
    }

    #[test]
    fn test_nan_field_stops_run() {
        let mut sim = Simulator::new(small_config()).unwrap();
        sim.field.u[u_idx(8, 5, 20)] = f64::NAN;
        sim.start();
        match sim.step() {
            Err(SimError::Diverged { step, divergence }) => {
                assert_eq!(step, 1);
                assert!(divergence.is_nan(), "divergence {}", divergence);
            }
            other => panic!("expected divergence error, got {:?}", other),
        }
        assert!(sim.state().max_velocity.is_nan(), "max speed should carry the NaN");
        assert!(!sim.is_running());
    }

    #[test]
    fn test_adaptive_solve_records_report() {
        let cfg = Config { pressure_tolerance: Some(1e-6), pressure_iterations: 500, ..small_config() };
        let mut sim = Simulator::new(cfg).unwrap();
        assert!(sim.last_pressure_report().is_none());
        sim.start();
        sim.step().unwrap();
        assert!(sim.last_pressure_report().is_some());

        let report = sim.adaptive_pressure_solve(30, 0.0);
        assert_eq!(report.iterations, 30);
        assert!(!report.converged);
        assert_eq!(sim.last_pressure_report(), Some(report));
    }

    #[test]
    fn test_history_capped() {
        let cfg = Config { width: 6, height: 5, gravity: [0.0, 0.0], max_simulation_time: 1e9, ..small_config() };
        let mut sim = Simulator::new(cfg).unwrap();
        sim.run_until_stopped(Some(HISTORY_CAP as u64 + 20)).unwrap();
        let history = &sim.state().convergence_history;
        assert_eq!(history.len(), HISTORY_CAP);
        assert_eq!(history.front().map(|s| s.step), Some(21));
    }

    #[test]
    fn test_probe_and_visualization_queries() {
        let sim = Simulator::new(small_config()).unwrap();
        let p = sim.probe_data(0.5, 0.25);
        assert!(p.is_valid);
        assert!((p.u - 1.0).abs() < 1e-12, "probe u {}", p.u);
        assert!(!sim.probe_data(0.5, 0.01).is_valid, "bottom wall is solid");

        let data = sim.visualization_data();
        assert_eq!((data.width, data.height), (20, 10));
        assert!(!data.streamline_seeds.is_empty());
    }
}
