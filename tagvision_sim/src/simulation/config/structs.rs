// tagvision_sim/src/simulation/config/structs.rs

use nalgebra::{UnitQuaternion, Vector3};
use serde::Deserialize;
use std::path::PathBuf;

use tagvision_core::estimation::SortMode;
use tagvision_core::geometry::RigidTransform;
use tagvision_core::types::TagId;

use crate::simulation::core::trajectory::Trajectory;
use crate::simulation::utils::serde_helpers;

// =========================================================================
// == Top-Level Configuration ==
// =========================================================================

/// # ScenarioConfig
/// Root of the data parsed from a `scenario.toml` file.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)] // Fail if the TOML has fields not in our struct
pub struct ScenarioConfig {
    #[serde(default)] // Use default if the [simulation] section is missing
    pub simulation: Simulation,

    #[serde(default)]
    pub camera: CameraConfig,

    #[serde(default)]
    pub vision: VisionConfig,

    #[serde(default)]
    pub field: FieldConfig,

    #[serde(default)]
    pub robot: RobotConfig,
}

// =========================================================================
// == Configuration Sub-Structs ==
// =========================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct Simulation {
    /// Optional seed for the pseudo-random number generator for determinism.
    pub seed: Option<u64>,
    /// Simulated time covered by one run, in seconds.
    pub duration_seconds: f64,
    /// Rate of the robot control loop, in Hz.
    pub control_rate_hz: f64,
    /// Simulated seconds per wall-clock second; 0 runs as fast as possible.
    pub time_scale: f64,
}

impl Default for Simulation {
    fn default() -> Self {
        Self {
            seed: None,
            duration_seconds: 10.0,
            control_rate_hz: 50.0,
            time_scale: 1.0,
        }
    }
}

/// Configuration parameters for the simulated fiducial camera.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct CameraConfig {
    /// A unique name for this camera (e.g., "front_camera").
    pub name: String,
    /// Frames per second delivered by the pipeline.
    pub rate_hz: f64,
    /// Mean capture-to-publish latency, in milliseconds.
    pub latency_ms: f64,
    pub latency_jitter_ms: f64,
    /// Robot→camera transform.
    pub mount: Pose,
    pub horizontal_fov_deg: f64,
    pub vertical_fov_deg: f64,
    /// Tags farther than this (meters) are not detected.
    pub max_range: f64,
    /// Printed tag edge length, in meters.
    pub tag_size: f64,
    /// Translation noise standard deviation per meter of range, per axis.
    pub translation_noise_per_meter: f64,
    /// Rotation noise standard deviation per axis, in degrees.
    pub rotation_noise_deg: f64,
    pub ambiguity_base: f64,
    pub ambiguity_per_meter: f64,
    pub ambiguity_noise: f64,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            name: "front_camera".to_string(),
            rate_hz: 30.0,
            latency_ms: 25.0,
            latency_jitter_ms: 0.0,
            mount: Pose::default(),
            horizontal_fov_deg: 70.0,
            vertical_fov_deg: 50.0,
            max_range: 6.0,
            tag_size: 0.1651,
            translation_noise_per_meter: 0.0,
            rotation_noise_deg: 0.0,
            ambiguity_base: 0.02,
            ambiguity_per_meter: 0.03,
            ambiguity_noise: 0.0,
        }
    }
}

/// How the control loop queries the vision facade.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct VisionConfig {
    pub max_ambiguity: f64,
    pub sort_mode: SortMode,
    /// Policy hint forwarded to the selector (used by `weighted`).
    pub sort_extra: f64,
    /// Frames older than this many seconds are not trusted.
    pub max_frame_age_s: f64,
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            max_ambiguity: 0.2,
            sort_mode: SortMode::default(),
            sort_extra: 0.0,
            max_frame_age_s: 0.5,
        }
    }
}

/// Tag poses on the field. Inline tags override entries of the same id in
/// `layout_file`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldConfig {
    /// Field layout JSON, relative to the scenario file.
    #[serde(default)]
    pub layout_file: Option<PathBuf>,

    // The TOML has `[[field.tags]]`, which becomes a Vec of TagConfig structs.
    #[serde(default)]
    pub tags: Vec<TagConfig>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TagConfig {
    pub id: TagId,
    #[serde(deserialize_with = "serde_helpers::vec3_from_array::deserialize")]
    pub translation: Vector3<f64>,
    #[serde(deserialize_with = "serde_helpers::quat_from_euler_deg::deserialize", default)]
    pub rotation: UnitQuaternion<f64>,
}

impl TagConfig {
    pub fn to_pose(&self) -> RigidTransform {
        RigidTransform::new(self.translation, self.rotation)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RobotConfig {
    #[serde(default)]
    pub trajectory: Trajectory,
}

// =========================================================================
// == Helper Structs for Nested Configuration ==
// =========================================================================

#[derive(Deserialize, Debug, Clone, Copy, Default)]
#[serde(deny_unknown_fields)]
pub struct Pose {
    #[serde(deserialize_with = "serde_helpers::vec3_from_array::deserialize", default)]
    pub translation: Vector3<f64>,

    #[serde(deserialize_with = "serde_helpers::quat_from_euler_deg::deserialize", default)]
    pub rotation: UnitQuaternion<f64>,
}

impl Pose {
    pub fn to_transform(&self) -> RigidTransform {
        RigidTransform::new(self.translation, self.rotation)
    }
}
