// tagvision_sim/src/prelude.rs

// Re-export the entire tagvision_core prelude so you can easily access
// pure types like `RigidTransform`, `FieldMap`, `TagVision`, etc.
pub use tagvision_core::prelude::*;

// Re-export common simulation-specific types.
pub use crate::error::SimError;
pub use crate::simulation::config::structs::*;
pub use crate::simulation::config::{load_scenario, scenario_figment};
pub use crate::simulation::core::prng::SimulationRng;
pub use crate::simulation::core::runner::{RunMode, RunOptions, RunSummary, SimulationRunner};
pub use crate::simulation::core::trajectory::Trajectory;
pub use crate::simulation::plugins::debugging::state_error::{ErrorStats, ErrorSummary};
pub use crate::simulation::plugins::sensors::camera::SyntheticCamera;
