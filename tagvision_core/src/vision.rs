// tagvision_core/src/vision.rs

use nalgebra::{Isometry2, Rotation2};
use std::sync::Arc;
use std::time::Duration;

use crate::cache::DetectionCache;
use crate::error::Result;
use crate::estimation::{PoseEstimator, SortMode};
use crate::geometry::{CameraMount, Pose3, RigidTransform};
use crate::mapping::FieldMap;
use crate::messages::{Detection, FrameResult, PoseEstimate};
use crate::types::{FrameSource, TagId};

/// Everything a robot program needs from one fiducial camera: the tag map,
/// the camera mount and the cached frame, behind one set of queries.
///
/// Each query reads the cached snapshot exactly once, so filtering,
/// selection and estimation inside a call always agree with each other.
#[derive(Debug)]
pub struct TagVision {
    field: FieldMap,
    estimator: PoseEstimator,
    cache: Arc<DetectionCache>,
}

impl TagVision {
    /// Fails when the mount transform is malformed.
    pub fn new(robot_to_camera: RigidTransform) -> Result<Self> {
        Ok(Self {
            field: FieldMap::new(),
            estimator: PoseEstimator::new(CameraMount::new(robot_to_camera)?),
            cache: Arc::new(DetectionCache::new()),
        })
    }

    pub fn with_field(mut self, field: FieldMap) -> Self {
        self.field = field;
        self
    }

    /// Shares an existing cache, e.g. one a camera thread already publishes into.
    pub fn with_cache(mut self, cache: Arc<DetectionCache>) -> Self {
        self.cache = cache;
        self
    }

    // --- Setup ---

    pub fn add_april_tag(&mut self, id: TagId, pose: Pose3) {
        if self.field.add_tag(id, pose).is_some() {
            tracing::debug!(tag_id = id, "replaced field pose of tag");
        }
    }

    // --- Accessors ---

    pub fn tag_pose(&self, id: TagId) -> Option<Pose3> {
        self.field.tag_pose(id)
    }

    pub fn field(&self) -> &FieldMap {
        &self.field
    }

    pub fn robot_to_camera(&self) -> RigidTransform {
        self.estimator.mount().robot_to_camera()
    }

    pub fn cache(&self) -> Arc<DetectionCache> {
        Arc::clone(&self.cache)
    }

    // --- Frame access ---

    /// Pulls the source's current frame into the cache and returns the
    /// now-current snapshot. Any snapshot other than the cached one replaces
    /// it, whatever its timestamp.
    pub fn update_from(&self, source: &dyn FrameSource) -> Option<Arc<FrameResult>> {
        if let Some(latest) = source.latest_result() {
            match self.cache.current() {
                Some(cached) if Arc::ptr_eq(&cached, &latest) => {}
                Some(cached) => {
                    if latest.timestamp() < cached.timestamp() {
                        tracing::debug!(
                            cached = cached.timestamp(),
                            latest = latest.timestamp(),
                            "camera timestamp went backwards"
                        );
                    }
                    self.cache.publish_shared(latest);
                }
                None => self.cache.publish_shared(latest),
            }
        }
        self.cache.current()
    }

    pub fn latest_result(&self) -> Option<Arc<FrameResult>> {
        self.cache.current()
    }

    /// Detections of the cached frame; empty when there is none.
    pub fn targets(&self) -> Vec<Detection> {
        self.cache
            .current()
            .map(|frame| frame.detections().to_vec())
            .unwrap_or_default()
    }

    pub fn has_targets(&self) -> bool {
        self.cache.has_targets()
    }

    pub fn latency(&self) -> Option<Duration> {
        self.cache.current().map(|frame| frame.latency())
    }

    /// Capture time of the cached frame in seconds.
    pub fn timestamp(&self) -> Option<f64> {
        self.cache.timestamp()
    }

    // --- Estimation ---

    pub fn robot_pose(&self, detection: &Detection) -> Option<Pose3> {
        self.estimator.robot_pose(detection, &self.field)
    }

    pub fn robot_pose_estimates(&self, max_ambiguity: f64) -> Vec<PoseEstimate> {
        let frame = self.cache.current();
        self.estimator
            .estimate(frame.as_deref(), &self.field, max_ambiguity)
    }

    /// The preferred detection among those at or below `max_ambiguity`.
    pub fn best_tag(&self, mode: SortMode, max_ambiguity: f64) -> Option<Detection> {
        self.best_tag_with(mode, max_ambiguity, 0.0)
    }

    /// [`best_tag`](Self::best_tag) with the policy hint used by
    /// [`SortMode::Weighted`].
    pub fn best_tag_with(&self, mode: SortMode, max_ambiguity: f64, extra: f64) -> Option<Detection> {
        let frame = self.cache.current()?;
        let candidates = crate::estimation::filter_ambiguous(frame.detections(), max_ambiguity);
        crate::estimation::select_best(&candidates, mode, extra).cloned()
    }

    /// Best detection and the robot pose it implies, from one snapshot.
    pub fn best_estimate(
        &self,
        mode: SortMode,
        max_ambiguity: f64,
        extra: f64,
    ) -> Option<(Detection, PoseEstimate)> {
        let frame = self.cache.current();
        self.estimator
            .estimate_best(frame.as_deref(), &self.field, mode, max_ambiguity, extra)
    }

    /// The heading the robot should hold to face `target`'s tag head-on,
    /// given its current planar pose.
    pub fn face_target_angle(
        &self,
        target: &Detection,
        robot_pose: &Isometry2<f64>,
    ) -> Option<Rotation2<f64>> {
        let tag_pose = self.tag_pose(target.tag_id)?.to_isometry2();

        let robot_to_tag = robot_pose.inverse() * tag_pose;
        let offset = robot_to_tag.translation.vector;
        let angle_to_tag = offset.y.atan2(offset.x);

        Some(Rotation2::new(robot_pose.rotation.angle()) * Rotation2::new(angle_to_tag))
    }
}
