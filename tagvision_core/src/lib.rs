// tagvision_core/src/lib.rs

// Public modules of the fiducial pose library.
pub mod cache;
pub mod error;
pub mod estimation;
pub mod geometry;
pub mod mapping;
pub mod messages;
pub mod prelude;
pub mod types;
pub mod vision;
