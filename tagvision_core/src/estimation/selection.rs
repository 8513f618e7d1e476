// tagvision_core/src/estimation/selection.rs

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::messages::Detection;

/// Ranking policy used to pick one detection out of a frame.
///
/// Bearings are measured on the camera→tag translation with the camera
/// looking down +X, +Y to the left and +Z up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortMode {
    /// Ascending ambiguity, then lowest tag id.
    #[default]
    LowestAmbiguity,
    /// Ascending camera→tag distance.
    Closest,
    /// Descending apparent area.
    Largest,
    /// Ascending apparent area.
    Smallest,
    /// Ascending angle from the boresight.
    Centermost,
    Leftmost,
    Rightmost,
    Highest,
    Lowest,
    /// Ascending `ambiguity + extra * distance`, then lowest tag id.
    Weighted,
}

impl SortMode {
    pub const ALL: [SortMode; 10] = [
        SortMode::LowestAmbiguity,
        SortMode::Closest,
        SortMode::Largest,
        SortMode::Smallest,
        SortMode::Centermost,
        SortMode::Leftmost,
        SortMode::Rightmost,
        SortMode::Highest,
        SortMode::Lowest,
        SortMode::Weighted,
    ];

    /// The value this policy sorts ascending on.
    fn primary_key(self, detection: &Detection, extra: f64) -> f64 {
        match self {
            SortMode::LowestAmbiguity => detection.ambiguity,
            SortMode::Closest => detection.distance(),
            SortMode::Largest => -detection.area,
            SortMode::Smallest => detection.area,
            SortMode::Centermost => detection.boresight_offset(),
            SortMode::Leftmost => -detection.yaw(),
            SortMode::Rightmost => detection.yaw(),
            SortMode::Highest => -detection.pitch(),
            SortMode::Lowest => detection.pitch(),
            SortMode::Weighted => detection.ambiguity + weight(extra) * detection.distance(),
        }
    }

    /// Whether ties on the primary key fall back to ambiguity before tag id.
    fn ties_by_ambiguity(self) -> bool {
        !matches!(self, SortMode::LowestAmbiguity | SortMode::Weighted)
    }

    /// Strict total order over `(position, detection)` pairs; the position
    /// is the last resort so duplicates still rank deterministically.
    fn compare(self, extra: f64, a: (usize, &Detection), b: (usize, &Detection)) -> Ordering {
        let primary = key(self.primary_key(a.1, extra)).total_cmp(&key(self.primary_key(b.1, extra)));
        let ambiguity = if self.ties_by_ambiguity() {
            key(a.1.ambiguity).total_cmp(&key(b.1.ambiguity))
        } else {
            Ordering::Equal
        };
        primary
            .then(ambiguity)
            .then(a.1.tag_id.cmp(&b.1.tag_id))
            .then(a.0.cmp(&b.0))
    }
}

/// NaN keys sort after every real value; `-0.0` and `0.0` compare equal.
fn key(value: f64) -> f64 {
    if value.is_nan() {
        f64::INFINITY
    } else {
        value + 0.0
    }
}

fn weight(extra: f64) -> f64 {
    if extra.is_finite() && extra > 0.0 {
        extra
    } else {
        0.0
    }
}

/// Returns the most preferred detection under `mode`, or `None` for an
/// empty list. `extra` is only read by [`SortMode::Weighted`].
pub fn select_best(detections: &[Detection], mode: SortMode, extra: f64) -> Option<&Detection> {
    detections
        .iter()
        .enumerate()
        .min_by(|a, b| mode.compare(extra, *a, *b))
        .map(|(_, d)| d)
}

/// Full ranking, best first.
pub fn rank(detections: &[Detection], mode: SortMode, extra: f64) -> Vec<Detection> {
    let mut indexed: Vec<(usize, &Detection)> = detections.iter().enumerate().collect();
    indexed.sort_by(|a, b| mode.compare(extra, *a, *b));
    indexed.into_iter().map(|(_, d)| d.clone()).collect()
}
