// tagvision_core/src/estimation/estimator.rs

use crate::estimation::filters::filter_ambiguous;
use crate::estimation::selection::{select_best, SortMode};
use crate::geometry::{CameraMount, Pose3, RigidTransform};
use crate::mapping::FieldMap;
use crate::messages::{Detection, FrameResult, PoseEstimate};
use crate::types::TagId;

/// Turns tag observations into field-frame robot poses.
///
/// Stateless apart from the camera mount; every call works from the frame
/// it is handed, so nothing drifts between calls.
#[derive(Debug, Clone, Copy, Default)]
pub struct PoseEstimator {
    mount: CameraMount,
}

impl PoseEstimator {
    pub fn new(mount: CameraMount) -> Self {
        Self { mount }
    }

    pub fn mount(&self) -> &CameraMount {
        &self.mount
    }

    /// field→robot = field→tag ∘ tag→camera ∘ camera→robot, using the
    /// detection's preferred solution. `None` when the tag is not on the map.
    pub fn robot_pose(&self, detection: &Detection, field: &FieldMap) -> Option<Pose3> {
        self.robot_pose_from(detection.tag_id, &detection.best_camera_to_tag, field)
    }

    /// Same chain for the mirrored solution of the pose problem.
    pub fn alternate_robot_pose(&self, detection: &Detection, field: &FieldMap) -> Option<Pose3> {
        self.robot_pose_from(detection.tag_id, &detection.alt_camera_to_tag, field)
    }

    fn robot_pose_from(
        &self,
        tag_id: TagId,
        camera_to_tag: &RigidTransform,
        field: &FieldMap,
    ) -> Option<Pose3> {
        let field_to_tag = field.tag_pose(tag_id)?;
        let tag_to_camera = camera_to_tag.inverse();
        Some(
            field_to_tag
                .compose(&tag_to_camera)
                .compose(&self.mount.camera_to_robot()),
        )
    }

    /// One estimate per detection that survives the ambiguity filter and
    /// whose tag is on the map, in frame order. Invalid or missing frames
    /// yield nothing.
    pub fn estimate(
        &self,
        frame: Option<&FrameResult>,
        field: &FieldMap,
        max_ambiguity: f64,
    ) -> Vec<PoseEstimate> {
        let Some(frame) = frame.filter(|f| f.has_targets()) else {
            return Vec::new();
        };

        filter_ambiguous(frame.detections(), max_ambiguity)
            .iter()
            .filter_map(|detection| self.estimate_one(detection, frame.timestamp(), field))
            .collect()
    }

    /// Filters once, picks the best survivor under `mode`, and estimates from
    /// that detection only. The selection never sees detections the
    /// estimate would have rejected.
    pub fn estimate_best(
        &self,
        frame: Option<&FrameResult>,
        field: &FieldMap,
        mode: SortMode,
        max_ambiguity: f64,
        extra: f64,
    ) -> Option<(Detection, PoseEstimate)> {
        let frame = frame.filter(|f| f.has_targets())?;
        let candidates = filter_ambiguous(frame.detections(), max_ambiguity);
        let best = select_best(&candidates, mode, extra)?;
        let estimate = self.estimate_one(best, frame.timestamp(), field)?;
        Some((best.clone(), estimate))
    }

    fn estimate_one(
        &self,
        detection: &Detection,
        timestamp: f64,
        field: &FieldMap,
    ) -> Option<PoseEstimate> {
        match self.robot_pose(detection, field) {
            Some(robot_pose) => Some(PoseEstimate {
                robot_pose,
                tag_id: detection.tag_id,
                timestamp,
                ambiguity: detection.ambiguity,
            }),
            None => {
                tracing::debug!(tag_id = detection.tag_id, "skipping detection of unmapped tag");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use nalgebra::Vector3;
    use std::f64::consts::PI;

    const EPS: f64 = 1e-9;

    fn field_with(id: u32, pose: Pose3) -> FieldMap {
        let mut field = FieldMap::new();
        field.add_tag(id, pose);
        field
    }

    #[test]
    fn identity_mount_gives_tag_pose_times_inverse_detection() {
        let p = RigidTransform::from_euler(Vector3::new(8.0, 2.0, 1.0), 0.0, 0.0, PI);
        let t = RigidTransform::from_euler(Vector3::new(3.0, 0.5, 0.2), 0.0, 0.1, 0.2);
        let estimator = PoseEstimator::default();
        let field = field_with(3, p);

        let pose = estimator
            .robot_pose(&Detection::new(3, t, 0.1), &field)
            .expect("tag 3 is mapped");
        assert!(pose.approx_eq(&p.compose(&t.inverse()), EPS));
    }

    #[test]
    fn unknown_tag_is_skipped_not_fatal() {
        let field = field_with(1, RigidTransform::from_translation(5.0, 0.0, 0.0));
        let frame = FrameResult::new(
            4.0,
            20.0,
            vec![
                Detection::new(9, RigidTransform::from_translation(2.0, 0.0, 0.0), 0.0),
                Detection::new(1, RigidTransform::from_translation(2.0, 0.0, 0.0), 0.0),
            ],
        );

        let estimates = PoseEstimator::default().estimate(Some(&frame), &field, 0.5);
        assert_eq!(estimates.len(), 1);
        assert_eq!(estimates[0].tag_id, 1);
        assert_abs_diff_eq!(estimates[0].timestamp, 4.0);
        assert_abs_diff_eq!(estimates[0].robot_pose.translation().x, 3.0, epsilon = EPS);
    }

    #[test]
    fn missing_or_invalid_frame_yields_nothing() {
        let field = field_with(1, RigidTransform::identity());
        let estimator = PoseEstimator::default();
        assert!(estimator.estimate(None, &field, 1.0).is_empty());
        assert!(estimator
            .estimate(Some(&FrameResult::invalid(1.0, 0.0)), &field, 1.0)
            .is_empty());
        assert!(estimator
            .estimate_best(None, &field, SortMode::Closest, 1.0, 0.0)
            .is_none());
    }

    #[test]
    fn best_is_chosen_among_filtered_detections() {
        let mut field = FieldMap::new();
        field.add_tag(1, RigidTransform::from_translation(4.0, 0.0, 0.0));
        field.add_tag(2, RigidTransform::from_translation(4.0, 3.0, 0.0));

        // Tag 1 is closer but too ambiguous; selection must not pick it.
        let frame = FrameResult::new(
            2.0,
            10.0,
            vec![
                Detection::new(1, RigidTransform::from_translation(1.0, 0.0, 0.0), 0.6),
                Detection::new(2, RigidTransform::from_translation(3.0, 0.0, 0.0), 0.1),
            ],
        );

        let (best, estimate) = PoseEstimator::default()
            .estimate_best(Some(&frame), &field, SortMode::Closest, 0.2, 0.0)
            .expect("tag 2 survives");
        assert_eq!(best.tag_id, 2);
        assert_eq!(estimate.tag_id, 2);
        assert_abs_diff_eq!(estimate.robot_pose.translation().x, 1.0, epsilon = EPS);
        assert_abs_diff_eq!(estimate.robot_pose.translation().y, 3.0, epsilon = EPS);
    }

    #[test]
    fn best_of_unmapped_tag_gives_none() {
        let field = field_with(1, RigidTransform::identity());
        let frame = FrameResult::new(
            0.0,
            0.0,
            vec![Detection::new(4, RigidTransform::from_translation(1.0, 0.0, 0.0), 0.0)],
        );
        assert!(PoseEstimator::default()
            .estimate_best(Some(&frame), &field, SortMode::LowestAmbiguity, 1.0, 0.0)
            .is_none());
    }

    #[test]
    fn alternate_solution_uses_alt_transform() {
        let field = field_with(6, RigidTransform::from_translation(5.0, 0.0, 0.0));
        let detection = Detection::new(6, RigidTransform::from_translation(2.0, 0.0, 0.0), 0.3)
            .with_alternate(RigidTransform::from_translation(2.0, 0.5, 0.0));

        let estimator = PoseEstimator::default();
        let best = estimator.robot_pose(&detection, &field).expect("mapped");
        let alt = estimator.alternate_robot_pose(&detection, &field).expect("mapped");
        assert_abs_diff_eq!(best.translation().y, 0.0, epsilon = EPS);
        assert_abs_diff_eq!(alt.translation().y, -0.5, epsilon = EPS);
    }
}
