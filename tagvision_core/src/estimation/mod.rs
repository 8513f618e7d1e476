// tagvision_core/src/estimation/mod.rs

pub mod estimator;
pub mod filters;
pub mod selection;

pub use estimator::PoseEstimator;
pub use filters::{filter_ambiguous, retain_unambiguous};
pub use selection::{rank, select_best, SortMode};
