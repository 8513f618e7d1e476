// tagvision_sim/src/simulation/plugins/debugging/state_error.rs

use nalgebra::UnitQuaternion;
use std::fmt;

use tagvision_core::geometry::Pose3;

/// Count, mean, RMS and max of one error channel.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ErrorSummary {
    pub count: u64,
    pub mean: f64,
    pub rms: f64,
    pub max: f64,
}

impl fmt::Display for ErrorSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "n={} mean={:.4} rms={:.4} max={:.4}",
            self.count, self.mean, self.rms, self.max
        )
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Accumulator {
    count: u64,
    sum: f64,
    sum_sq: f64,
    max: f64,
}

impl Accumulator {
    fn push(&mut self, value: f64) {
        self.count += 1;
        self.sum += value;
        self.sum_sq += value * value;
        self.max = self.max.max(value);
    }

    fn summary(&self) -> ErrorSummary {
        if self.count == 0 {
            return ErrorSummary::default();
        }
        let n = self.count as f64;
        ErrorSummary {
            count: self.count,
            mean: self.sum / n,
            rms: (self.sum_sq / n).sqrt(),
            max: self.max,
        }
    }
}

/// Running comparison of pose estimates against ground truth.
#[derive(Debug, Clone, Default)]
pub struct ErrorStats {
    translation: Accumulator,
    rotation_deg: Accumulator,
    no_estimate_cycles: u64,
    stale_cycles: u64,
}

impl ErrorStats {
    /// Scores one estimate; returns (position error m, attitude error deg).
    pub fn record(&mut self, truth: &Pose3, estimate: &Pose3) -> (f64, f64) {
        // --- Position Error ---
        let position_error = (truth.translation() - estimate.translation()).norm();

        // --- Attitude Error ---
        // The rotation taking the estimate onto the truth; its angle is the error.
        let true_rot: UnitQuaternion<f64> = truth.rotation();
        let error_rotation = true_rot * estimate.rotation().inverse();
        let attitude_error_degrees = error_rotation.angle().to_degrees();

        self.translation.push(position_error);
        self.rotation_deg.push(attitude_error_degrees);
        (position_error, attitude_error_degrees)
    }

    pub fn record_no_estimate(&mut self) {
        self.no_estimate_cycles += 1;
    }

    pub fn record_stale(&mut self) {
        self.stale_cycles += 1;
    }

    pub fn translation(&self) -> ErrorSummary {
        self.translation.summary()
    }

    pub fn rotation_deg(&self) -> ErrorSummary {
        self.rotation_deg.summary()
    }

    pub fn no_estimate_cycles(&self) -> u64 {
        self.no_estimate_cycles
    }

    pub fn stale_cycles(&self) -> u64 {
        self.stale_cycles
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use nalgebra::Vector3;
    use tagvision_core::geometry::RigidTransform;

    #[test]
    fn empty_stats_are_zero() {
        let stats = ErrorStats::default();
        assert_eq!(stats.translation(), ErrorSummary::default());
        assert_eq!(stats.rotation_deg().count, 0);
    }

    #[test]
    fn accumulates_mean_rms_and_max() {
        let mut stats = ErrorStats::default();
        let truth = RigidTransform::identity();
        stats.record(&truth, &RigidTransform::from_translation(3.0, 4.0, 0.0));
        stats.record(&truth, &RigidTransform::from_translation(0.0, 0.0, 1.0));

        let t = stats.translation();
        assert_eq!(t.count, 2);
        assert_abs_diff_eq!(t.mean, 3.0, epsilon = 1e-12);
        assert_abs_diff_eq!(t.rms, 13.0f64.sqrt(), epsilon = 1e-12);
        assert_abs_diff_eq!(t.max, 5.0, epsilon = 1e-12);
    }

    #[test]
    fn attitude_error_in_degrees() {
        let mut stats = ErrorStats::default();
        let truth = RigidTransform::from_euler(Vector3::zeros(), 0.0, 0.0, 0.5);
        let estimate = RigidTransform::from_euler(Vector3::zeros(), 0.0, 0.0, 0.5 + 10f64.to_radians());
        let (position, attitude) = stats.record(&truth, &estimate);
        assert_abs_diff_eq!(position, 0.0);
        assert_abs_diff_eq!(attitude, 10.0, epsilon = 1e-6);
    }

    #[test]
    fn counts_skipped_cycles() {
        let mut stats = ErrorStats::default();
        stats.record_no_estimate();
        stats.record_stale();
        stats.record_stale();
        assert_eq!(stats.no_estimate_cycles(), 1);
        assert_eq!(stats.stale_cycles(), 2);
    }
}
