// tagvision_core/src/messages.rs

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::geometry::{Pose3, RigidTransform};
use crate::types::TagId;

// =========================================================================
// == Per-Frame Camera Data ==
// =========================================================================

/// One fiducial marker observed in a single camera frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// Identifier decoded from the marker.
    pub tag_id: TagId,
    /// Preferred solution of the planar pose problem.
    pub best_camera_to_tag: RigidTransform,
    /// The second, mirrored solution.
    pub alt_camera_to_tag: RigidTransform,
    /// Ratio of reprojection errors between the two solutions, in [0, 1].
    /// Lower is more trustworthy.
    pub ambiguity: f64,
    /// Apparent size of the marker as a percentage of the image.
    #[serde(default)]
    pub area: f64,
}

impl Detection {
    pub fn new(tag_id: TagId, best_camera_to_tag: RigidTransform, ambiguity: f64) -> Self {
        Self {
            tag_id,
            best_camera_to_tag,
            alt_camera_to_tag: best_camera_to_tag,
            ambiguity,
            area: 0.0,
        }
    }

    pub fn with_alternate(mut self, alt_camera_to_tag: RigidTransform) -> Self {
        self.alt_camera_to_tag = alt_camera_to_tag;
        self
    }

    pub fn with_area(mut self, area: f64) -> Self {
        self.area = area;
        self
    }

    /// Distance from the camera to the marker center.
    pub fn distance(&self) -> f64 {
        self.best_camera_to_tag.translation_norm()
    }

    /// Horizontal bearing of the marker in radians, positive to the left
    /// (camera frame: +X forward, +Y left, +Z up).
    pub fn yaw(&self) -> f64 {
        let t = self.best_camera_to_tag.translation();
        t.y.atan2(t.x)
    }

    /// Vertical bearing of the marker in radians, positive upward.
    pub fn pitch(&self) -> f64 {
        let t = self.best_camera_to_tag.translation();
        t.z.atan2(t.x)
    }

    /// Angle between the camera boresight and the ray to the marker.
    pub fn boresight_offset(&self) -> f64 {
        let t = self.best_camera_to_tag.translation();
        t.y.hypot(t.z).atan2(t.x)
    }
}

/// An immutable snapshot of one camera frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameResult {
    timestamp: f64,
    latency_ms: f64,
    has_targets: bool,
    detections: Vec<Detection>,
}

impl FrameResult {
    /// `timestamp` is the capture time in seconds, `latency_ms` the pipeline
    /// delay between capture and publication.
    pub fn new(timestamp: f64, latency_ms: f64, detections: Vec<Detection>) -> Self {
        Self {
            timestamp,
            latency_ms,
            has_targets: !detections.is_empty(),
            detections,
        }
    }

    /// A frame the pipeline delivered but flagged as unusable.
    pub fn invalid(timestamp: f64, latency_ms: f64) -> Self {
        Self {
            timestamp,
            latency_ms,
            has_targets: false,
            detections: Vec::new(),
        }
    }

    pub fn timestamp(&self) -> f64 {
        self.timestamp
    }

    pub fn latency_ms(&self) -> f64 {
        self.latency_ms
    }

    /// Negative latency clamps to zero; NaN or overflow saturates to `Duration::MAX`.
    pub fn latency(&self) -> Duration {
        if self.latency_ms.is_nan() {
            return Duration::MAX;
        }
        Duration::try_from_secs_f64(self.latency_ms.max(0.0) / 1000.0).unwrap_or(Duration::MAX)
    }

    pub fn has_targets(&self) -> bool {
        self.has_targets
    }

    /// The detections of this frame; empty whenever the frame is invalid.
    pub fn detections(&self) -> &[Detection] {
        if self.has_targets {
            &self.detections
        } else {
            &[]
        }
    }

    /// Seconds elapsed between capture and `now`.
    pub fn age(&self, now: f64) -> f64 {
        now - self.timestamp
    }

    pub fn is_stale(&self, now: f64, max_age: f64) -> bool {
        self.age(now) > max_age
    }
}

// =========================================================================
// == Estimator Output ==
// =========================================================================

/// A robot pose derived from a single tag observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PoseEstimate {
    /// field→robot.
    pub robot_pose: Pose3,
    /// The tag the estimate was derived from.
    pub tag_id: TagId,
    /// Capture time of the originating frame.
    pub timestamp: f64,
    /// Ambiguity of the contributing detection.
    pub ambiguity: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::f64::consts::FRAC_PI_4;

    #[test]
    fn validity_follows_detection_list() {
        let empty = FrameResult::new(1.0, 20.0, Vec::new());
        assert!(!empty.has_targets());

        let one = FrameResult::new(
            1.0,
            20.0,
            vec![Detection::new(4, RigidTransform::from_translation(2.0, 0.0, 0.0), 0.1)],
        );
        assert!(one.has_targets());
        assert_eq!(one.detections().len(), 1);
        assert!(FrameResult::invalid(1.0, 20.0).detections().is_empty());
    }

    #[test]
    fn latency_and_staleness() {
        let frame = FrameResult::new(10.0, 35.0, Vec::new());
        assert_abs_diff_eq!(frame.latency().as_secs_f64(), 0.035, epsilon = 1e-9);
        assert_abs_diff_eq!(frame.age(10.25), 0.25, epsilon = 1e-12);
        assert!(!frame.is_stale(10.25, 0.5));
        assert!(frame.is_stale(10.75, 0.5));
    }

    #[test]
    fn unusable_latency_saturates() {
        assert_eq!(FrameResult::new(0.0, f64::NAN, Vec::new()).latency(), Duration::MAX);
        assert_eq!(FrameResult::new(0.0, f64::INFINITY, Vec::new()).latency(), Duration::MAX);
        assert_eq!(FrameResult::new(0.0, -5.0, Vec::new()).latency(), Duration::ZERO);
    }

    #[test]
    fn bearings_follow_camera_axes() {
        let left = Detection::new(1, RigidTransform::from_translation(1.0, 1.0, 0.0), 0.0);
        assert_abs_diff_eq!(left.yaw(), FRAC_PI_4, epsilon = 1e-12);
        assert_abs_diff_eq!(left.pitch(), 0.0, epsilon = 1e-12);

        let up = Detection::new(1, RigidTransform::from_translation(1.0, 0.0, 1.0), 0.0);
        assert_abs_diff_eq!(up.pitch(), FRAC_PI_4, epsilon = 1e-12);
        assert_abs_diff_eq!(up.boresight_offset(), FRAC_PI_4, epsilon = 1e-12);
        assert_abs_diff_eq!(up.distance(), 2f64.sqrt(), epsilon = 1e-12);
    }
}
