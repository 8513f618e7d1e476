// tagvision_sim/src/simulation/core/trajectory.rs

use nalgebra::Vector3;
use serde::Deserialize;
use std::f64::consts::FRAC_PI_2;

use tagvision_core::geometry::{Pose3, RigidTransform};

/// Ground-truth motion of the robot on the field floor (z = 0).
///
/// Positions are field-frame meters; headings are degrees counter-clockwise
/// from +X. When `face` is set the robot keeps its front pointed at that
/// field point instead of along its direction of travel.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")] // `type = "Circle"` in TOML picks the variant
#[serde(rename_all = "PascalCase")]
pub enum Trajectory {
    Stationary {
        position: [f64; 2],
        #[serde(default)]
        heading_deg: f64,
    },
    Circle {
        center: [f64; 2],
        radius: f64,
        /// Signed; positive is counter-clockwise.
        angular_speed_deg: f64,
        #[serde(default)]
        phase_deg: f64,
        #[serde(default)]
        face: Option<[f64; 2]>,
    },
    /// Back and forth between `start` and `end` at constant speed.
    Line {
        start: [f64; 2],
        end: [f64; 2],
        speed: f64,
        #[serde(default)]
        face: Option<[f64; 2]>,
    },
}

impl Default for Trajectory {
    fn default() -> Self {
        Trajectory::Stationary {
            position: [0.0, 0.0],
            heading_deg: 0.0,
        }
    }
}

impl Trajectory {
    pub fn get_type_str(&self) -> &str {
        match self {
            Trajectory::Stationary { .. } => "Stationary",
            Trajectory::Circle { .. } => "Circle",
            Trajectory::Line { .. } => "Line",
        }
    }

    /// The robot's true field pose at simulation time `t` seconds.
    pub fn pose_at(&self, t: f64) -> Pose3 {
        let (x, y, heading) = match *self {
            Trajectory::Stationary {
                position,
                heading_deg,
            } => (position[0], position[1], heading_deg.to_radians()),

            Trajectory::Circle {
                center,
                radius,
                angular_speed_deg,
                phase_deg,
                face,
            } => {
                let theta = (phase_deg + angular_speed_deg * t).to_radians();
                let x = center[0] + radius * theta.cos();
                let y = center[1] + radius * theta.sin();
                let tangent = theta + FRAC_PI_2.copysign(angular_speed_deg);
                (x, y, heading_towards(face, x, y).unwrap_or(tangent))
            }

            Trajectory::Line {
                start,
                end,
                speed,
                face,
            } => {
                let (dx, dy) = (end[0] - start[0], end[1] - start[1]);
                let length = dx.hypot(dy);
                if length <= f64::EPSILON {
                    let heading = heading_towards(face, start[0], start[1]).unwrap_or(0.0);
                    (start[0], start[1], heading)
                } else {
                    // Fold travelled distance onto one out-and-back lap.
                    let lap = (speed * t).rem_euclid(2.0 * length);
                    let (along, outbound) = if lap <= length {
                        (lap, true)
                    } else {
                        (2.0 * length - lap, false)
                    };
                    let x = start[0] + dx * along / length;
                    let y = start[1] + dy * along / length;
                    let travel = if outbound {
                        dy.atan2(dx)
                    } else {
                        (-dy).atan2(-dx)
                    };
                    (x, y, heading_towards(face, x, y).unwrap_or(travel))
                }
            }
        };

        RigidTransform::from_euler(Vector3::new(x, y, 0.0), 0.0, 0.0, heading)
    }

    pub(crate) fn validate(&self) -> Result<(), String> {
        let finite = |values: &[f64]| values.iter().all(|v| v.is_finite());
        match *self {
            Trajectory::Stationary {
                position,
                heading_deg,
            } => {
                if !finite(&[position[0], position[1], heading_deg]) {
                    return Err("stationary trajectory has non-finite values".into());
                }
            }
            Trajectory::Circle {
                center,
                radius,
                angular_speed_deg,
                phase_deg,
                ..
            } => {
                if !finite(&[center[0], center[1], radius, angular_speed_deg, phase_deg]) {
                    return Err("circle trajectory has non-finite values".into());
                }
                if radius < 0.0 {
                    return Err(format!("circle radius must be >= 0, got {radius}"));
                }
            }
            Trajectory::Line {
                start, end, speed, ..
            } => {
                if !finite(&[start[0], start[1], end[0], end[1], speed]) {
                    return Err("line trajectory has non-finite values".into());
                }
                if speed < 0.0 {
                    return Err(format!("line speed must be >= 0, got {speed}"));
                }
            }
        }
        Ok(())
    }
}

fn heading_towards(target: Option<[f64; 2]>, x: f64, y: f64) -> Option<f64> {
    target.map(|p| (p[1] - y).atan2(p[0] - x))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::f64::consts::PI;

    fn planar(pose: &Pose3) -> (f64, f64, f64) {
        let iso = pose.to_isometry2();
        (iso.translation.x, iso.translation.y, iso.rotation.angle())
    }

    #[test]
    fn stationary_never_moves() {
        let trajectory = Trajectory::Stationary {
            position: [2.0, -1.0],
            heading_deg: 90.0,
        };
        for t in [0.0, 1.5, 100.0] {
            let (x, y, heading) = planar(&trajectory.pose_at(t));
            assert_abs_diff_eq!(x, 2.0);
            assert_abs_diff_eq!(y, -1.0);
            assert_abs_diff_eq!(heading, PI / 2.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn circle_heads_along_tangent() {
        let trajectory = Trajectory::Circle {
            center: [1.0, 1.0],
            radius: 2.0,
            angular_speed_deg: 90.0,
            phase_deg: 0.0,
            face: None,
        };
        let (x, y, heading) = planar(&trajectory.pose_at(1.0));
        assert_abs_diff_eq!(x, 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(y, 3.0, epsilon = 1e-12);
        // A quarter turn in, moving counter-clockwise: heading -X.
        assert_abs_diff_eq!(heading.abs(), PI, epsilon = 1e-12);
    }

    #[test]
    fn circle_can_face_a_point() {
        let trajectory = Trajectory::Circle {
            center: [0.0, 0.0],
            radius: 1.0,
            angular_speed_deg: -30.0,
            phase_deg: 0.0,
            face: Some([5.0, 0.0]),
        };
        let (x, y, heading) = planar(&trajectory.pose_at(3.0));
        assert_abs_diff_eq!(heading, (0.0 - y).atan2(5.0 - x), epsilon = 1e-12);
    }

    #[test]
    fn line_bounces_between_ends() {
        let trajectory = Trajectory::Line {
            start: [0.0, 0.0],
            end: [4.0, 0.0],
            speed: 1.0,
            face: None,
        };
        let (x, _, heading) = planar(&trajectory.pose_at(1.0));
        assert_abs_diff_eq!(x, 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(heading, 0.0, epsilon = 1e-12);

        let (x, _, heading) = planar(&trajectory.pose_at(6.0));
        assert_abs_diff_eq!(x, 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(heading.abs(), PI, epsilon = 1e-12);

        let (x, _, _) = planar(&trajectory.pose_at(8.0));
        assert_abs_diff_eq!(x, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn degenerate_line_stays_put() {
        let trajectory = Trajectory::Line {
            start: [1.0, 2.0],
            end: [1.0, 2.0],
            speed: 3.0,
            face: None,
        };
        let (x, y, _) = planar(&trajectory.pose_at(5.0));
        assert_abs_diff_eq!(x, 1.0);
        assert_abs_diff_eq!(y, 2.0);
    }

    #[test]
    fn validation_rejects_bad_geometry() {
        let circle = Trajectory::Circle {
            center: [0.0, 0.0],
            radius: -1.0,
            angular_speed_deg: 10.0,
            phase_deg: 0.0,
            face: None,
        };
        assert!(circle.validate().is_err());
        let line = Trajectory::Line {
            start: [0.0, f64::NAN],
            end: [1.0, 0.0],
            speed: 1.0,
            face: None,
        };
        assert!(line.validate().is_err());
        assert!(Trajectory::default().validate().is_ok());
    }
}
