// tagvision_sim/src/simulation/plugins/sensors/camera.rs

use nalgebra::{UnitQuaternion, Vector3};
use rand_distr::{Distribution, Normal};

use tagvision_core::geometry::{Pose3, RigidTransform};
use tagvision_core::mapping::FieldMap;
use tagvision_core::messages::{Detection, FrameResult};
use tagvision_core::types::TagId;

use crate::error::Result;
use crate::simulation::config::CameraConfig;
use crate::simulation::core::prng::SimulationRng;

/// A fiducial pipeline stand-in: sees the registered tags from a robot pose
/// and reports them the way a real solver would, noise and all.
///
/// Camera frame convention: +X out of the lens, +Y left, +Z up. A tag's
/// printed face points along its own +X axis.
#[derive(Debug)]
pub struct SyntheticCamera {
    config: CameraConfig,
    mount: RigidTransform,
    tags: Vec<(TagId, Pose3)>,
    rng: SimulationRng,
    // --- Noise models ---
    unit_noise: Normal<f64>,
    rotation_noise: Normal<f64>,
    ambiguity_noise: Normal<f64>,
    latency_jitter: Normal<f64>,
    /// Image extent at unit range: `2 tan(hfov/2) * 2 tan(vfov/2)`.
    image_area_at_unit_range: f64,
}

impl SyntheticCamera {
    pub fn new(config: &CameraConfig, field: &FieldMap, rng: SimulationRng) -> Result<Self> {
        let half_h = config.horizontal_fov_deg.to_radians() / 2.0;
        let half_v = config.vertical_fov_deg.to_radians() / 2.0;
        Ok(Self {
            config: config.clone(),
            mount: config.mount.to_transform(),
            tags: field.iter().collect(),
            rng,
            unit_noise: Normal::new(0.0, 1.0)?,
            rotation_noise: Normal::new(0.0, config.rotation_noise_deg.to_radians())?,
            ambiguity_noise: Normal::new(0.0, config.ambiguity_noise)?,
            latency_jitter: Normal::new(0.0, config.latency_jitter_ms)?,
            image_area_at_unit_range: 4.0 * half_h.tan() * half_v.tan(),
        })
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Seconds between captures.
    pub fn frame_period(&self) -> f64 {
        1.0 / self.config.rate_hz
    }

    /// One frame as captured at `capture_time` from `robot_pose`.
    pub fn capture(&mut self, robot_pose: &Pose3, capture_time: f64) -> FrameResult {
        let camera_to_field = robot_pose.compose(&self.mount).inverse();

        let mut detections = Vec::new();
        for index in 0..self.tags.len() {
            let (id, tag_pose) = self.tags[index];
            let camera_to_tag = camera_to_field.compose(&tag_pose);
            if let Some(detection) = self.observe(id, &camera_to_tag) {
                detections.push(detection);
            }
        }

        let jitter = self.latency_jitter.sample(&mut self.rng.0);
        let latency_ms = (self.config.latency_ms + jitter).max(0.0);
        tracing::trace!(
            camera = %self.config.name,
            capture_time,
            visible = detections.len(),
            "captured frame"
        );
        FrameResult::new(capture_time, latency_ms, detections)
    }

    fn observe(&mut self, id: TagId, camera_to_tag: &RigidTransform) -> Option<Detection> {
        let offset = camera_to_tag.translation();
        let distance = offset.norm();
        if offset.x <= 0.0 || distance > self.config.max_range {
            return None;
        }

        let half_h = self.config.horizontal_fov_deg.to_radians() / 2.0;
        let half_v = self.config.vertical_fov_deg.to_radians() / 2.0;
        if offset.y.atan2(offset.x).abs() > half_h || offset.z.atan2(offset.x).abs() > half_v {
            return None;
        }

        // Cosine between the tag's face normal and the ray back to the lens.
        let normal = camera_to_tag.rotation() * Vector3::x();
        let facing = normal.dot(&(-offset)) / distance;
        if facing <= 0.0 {
            return None;
        }

        let best = self.perturb(camera_to_tag, distance);
        let alt = mirrored_solution(&best);

        let ambiguity = (self.config.ambiguity_base
            + self.config.ambiguity_per_meter * distance / facing
            + self.ambiguity_noise.sample(&mut self.rng.0))
        .clamp(0.0, 1.0);

        let tag_area = self.config.tag_size * self.config.tag_size * facing;
        let area = (100.0 * tag_area / (distance * distance * self.image_area_at_unit_range))
            .min(100.0);

        Some(
            Detection::new(id, best, ambiguity)
                .with_alternate(alt)
                .with_area(area),
        )
    }

    /// Range-scaled translation noise and a small random rotation.
    fn perturb(&mut self, camera_to_tag: &RigidTransform, distance: f64) -> RigidTransform {
        let sigma = self.config.translation_noise_per_meter * distance;
        let rng = &mut self.rng.0;
        let translation_noise = Vector3::new(
            self.unit_noise.sample(rng),
            self.unit_noise.sample(rng),
            self.unit_noise.sample(rng),
        ) * sigma;
        let rotation_noise = UnitQuaternion::from_euler_angles(
            self.rotation_noise.sample(rng),
            self.rotation_noise.sample(rng),
            self.rotation_noise.sample(rng),
        );

        RigidTransform::new(
            camera_to_tag.translation() + translation_noise,
            rotation_noise * camera_to_tag.rotation(),
        )
    }
}

/// The other planar-pose solution: the tag's yaw reflected about the line of sight.
fn mirrored_solution(camera_to_tag: &RigidTransform) -> RigidTransform {
    let offset = camera_to_tag.translation();
    let normal = camera_to_tag.rotation() * Vector3::x();
    let sight_yaw = (-offset.y).atan2(-offset.x);
    let normal_yaw = normal.y.atan2(normal.x);
    let flip = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), 2.0 * (sight_yaw - normal_yaw));
    RigidTransform::new(offset, flip * camera_to_tag.rotation())
}
