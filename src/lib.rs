//! 2D incompressible Navier-Stokes on a staggered (MAC) grid.
//!
//! [`Simulator`] owns the field and boundary and runs the step sequence;
//! the free functions in [`solver`] operate on plain [`Field`]/[`Boundary`]
//! values and can be used on their own.

pub mod config;
pub mod error;
pub mod simulator;
pub mod snapshot;
pub mod solver;
pub mod state;

pub use config::Config;
pub use error::{SimError, SimResult};
pub use simulator::Simulator;
pub use snapshot::{FieldStats, ProbeData, VisualizationData};
pub use solver::{Boundary, CellType, Obstacle, PressureSolveReport};
pub use state::{ConvergenceSample, Field, SimulationState};
