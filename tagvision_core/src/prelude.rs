// tagvision_core/src/prelude.rs

// --- Core Abstractions ---
pub use crate::error::VisionError;
pub use crate::types::{FrameSource, TagId};

// --- Core Data Structures ---
pub use crate::geometry::{CameraMount, Pose3, RigidTransform};
pub use crate::mapping::{FieldDimensions, FieldMap};
pub use crate::messages::{Detection, FrameResult, PoseEstimate};

// --- Runtime pieces ---
pub use crate::cache::DetectionCache;
pub use crate::estimation::{filter_ambiguous, rank, select_best, PoseEstimator, SortMode};
pub use crate::vision::TagVision;
